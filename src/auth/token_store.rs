use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BackupResult, ResultExt};
use crate::model::Token;

/// Where the cached credential lives between runs.
pub trait CredentialStore {
    /// `Ok(None)` when nothing usable is cached.
    fn load(&self) -> BackupResult<Option<Token>>;

    fn save(&self, token: &Token) -> BackupResult<()>;
}

/// Plain JSON token file, readable by its owner only.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileTokenStore {
    fn load(&self) -> BackupResult<Option<Token>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read token file {}", self.path.display()))?;
        match serde_json::from_str::<Token>(&data) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable token file");
                Ok(None)
            }
        }
    }

    fn save(&self, token: &Token) -> BackupResult<()> {
        if let Some(parent) = self.path.parent() {
            create_private_dir(parent)
                .with_context(|| format!("failed to create token directory {}", parent.display()))?;
        }

        let data = serde_json::to_vec_pretty(token)?;
        write_private(&self.path, &data)
            .with_context(|| format!("failed to write token file {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "saved token");
        Ok(())
    }
}

fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        fs::DirBuilder::new().recursive(true).mode(0o700).create(dir)
    }
    #[cfg(not(unix))]
    {
        fs::create_dir_all(dir)
    }
}

fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        // mode() only applies on creation; tighten a pre-existing file too
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
        file.write_all(data)
    }
    #[cfg(not(unix))]
    {
        fs::write(path, data)
    }
}
