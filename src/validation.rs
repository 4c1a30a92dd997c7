use crate::error::{BackupError, BackupResult};

/// Validates that a string is not blank (empty or whitespace-only).
/// Returns the trimmed string on success.
pub fn non_blank(value: &str, field: &str) -> BackupResult<String> {
    let trimmed = value.trim().to_string();
    if trimmed.is_empty() {
        Err(BackupError::BlankField {
            field: field.to_string(),
        })
    } else {
        Ok(trimmed)
    }
}

/// Validates a batch or page size (must be at least 1).
pub fn positive_size(value: usize, field: &str) -> BackupResult<usize> {
    if value == 0 {
        Err(BackupError::NonPositive {
            field: field.to_string(),
        })
    } else {
        Ok(value)
    }
}
