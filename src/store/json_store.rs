use std::fs;
use std::path::Path;

use crate::error::{BackupError, BackupResult, ResultExt};
use crate::model::BackupFile;

/// Writes the archive as pretty-printed JSON. The document is built in
/// memory first, so a serialization failure leaves no file behind.
pub fn save_structured(archive: &BackupFile, path: &Path) -> BackupResult<()> {
    let data = serde_json::to_vec_pretty(archive).context("failed to serialize backup")?;
    fs::write(path, data)
        .with_context(|| format!("failed to write backup file {}", path.display()))?;
    tracing::debug!(path = %path.display(), contacts = archive.contact_count(), "wrote structured backup");
    Ok(())
}

pub fn load_structured(path: &Path) -> BackupResult<BackupFile> {
    let data = fs::read(path)
        .with_context(|| format!("failed to read backup file {}", path.display()))?;
    let mut archive: BackupFile = serde_json::from_slice(&data)
        .with_context(|| format!("failed to parse backup file {}", path.display()))?;

    if archive.version.trim().is_empty() {
        return Err(BackupError::InvalidArchive {
            reason: "missing version".into(),
        });
    }

    if archive.counts_mismatch() {
        tracing::warn!(
            path = %path.display(),
            stored_contacts = archive.contact_count(),
            actual_contacts = archive.contacts().len(),
            stored_groups = archive.group_count(),
            actual_groups = archive.groups().len(),
            "backup counts disagree with its contents, recounting"
        );
        archive.recount();
    }

    Ok(archive)
}
