use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::directory::{DirectoryApi, DirectoryClient};
use crate::error::{BackupError, BackupResult, ResultExt};
use crate::model::BackupFile;
use crate::progress::Progress;
use crate::store::{csv_export, json_store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Full-fidelity archive; the only format restore accepts.
    Json,
    /// Spreadsheet export, write-only.
    Csv,
}

impl ExportFormat {
    /// Case-insensitive.
    pub fn parse(value: &str) -> BackupResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            _ => Err(BackupError::InvalidFormat(value.to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_uppercase())
    }
}

/// `contacts-YYYYMMDD-HHMMSS.<ext>` in the working directory.
pub fn default_output_path(format: ExportFormat, now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!(
        "contacts-{}.{}",
        now.format("%Y%m%d-%H%M%S"),
        format.extension()
    ))
}

/// Pulls every group, then every contact, into a fresh archive. Nothing
/// is written here, so a failed fetch never leaves a partial file.
pub fn capture_archive<A: DirectoryApi>(
    client: &DirectoryClient<A>,
    progress: &mut dyn Progress,
) -> BackupResult<BackupFile> {
    let mut archive = BackupFile::create();

    let groups = client.list_categories().context("failed to fetch contact groups")?;
    tracing::info!(count = groups.len(), "fetched contact groups");
    for group in groups {
        archive.add_group(group);
    }

    let contacts = client.list_records(progress).context("failed to fetch contacts")?;
    tracing::info!(count = contacts.len(), "fetched contacts");
    for contact in contacts {
        archive.add_contact(contact);
    }

    Ok(archive)
}

pub fn write_archive(archive: &BackupFile, format: ExportFormat, path: &Path) -> BackupResult<()> {
    match format {
        ExportFormat::Json => json_store::save_structured(archive, path),
        ExportFormat::Csv => csv_export::save_tabular(archive, path),
    }
    .context("failed to save backup")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_parse_is_case_insensitive() {
        assert_eq!(ExportFormat::parse("JSON").unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::parse("Csv").unwrap(), ExportFormat::Csv);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = ExportFormat::parse("xml").unwrap_err();
        assert_eq!(err.to_string(), "Invalid format \"xml\": must be 'json' or 'csv'");
    }

    #[test]
    fn default_path_is_timestamped() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(
            default_output_path(ExportFormat::Json, now),
            PathBuf::from("contacts-20240309-140507.json")
        );
        assert_eq!(
            default_output_path(ExportFormat::Csv, now),
            PathBuf::from("contacts-20240309-140507.csv")
        );
    }

    #[test]
    fn display_is_upper_case() {
        assert_eq!(ExportFormat::Csv.to_string(), "CSV");
    }
}
