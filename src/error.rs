use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("{field} cannot be blank")]
    BlankField { field: String },

    #[error("{field} must be positive")]
    NonPositive { field: String },

    #[error("Credentials file not found: {path}")]
    MissingCredentials { path: PathBuf },

    #[error("Invalid credentials file {path}: {reason}")]
    InvalidClientSecret { path: PathBuf, reason: String },

    #[error("Invalid backup file: {reason}")]
    InvalidArchive { reason: String },

    #[error("Invalid format {0:?}: must be 'json' or 'csv'")]
    InvalidFormat(String),

    #[error("Authorization failed: {0}")]
    AuthorizationDenied(String),

    #[error("Authorization timed out after {0} seconds")]
    AuthorizationTimeout(u64),

    #[error("Authorization cancelled")]
    AuthorizationCancelled,

    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("{operation} failed (HTTP {status}): {body}")]
    Api {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("{operation} failed: {message}")]
    Transport { operation: String, message: String },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<BackupError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0}")]
    Other(String),
}

pub type BackupResult<T> = Result<T, BackupError>;

/// Attaches a description of the failing operation to an error.
pub trait ResultExt<T> {
    fn context<C: Into<String>>(self, context: C) -> BackupResult<T>;

    fn with_context<C: Into<String>, F: FnOnce() -> C>(self, f: F) -> BackupResult<T>;
}

impl<T, E: Into<BackupError>> ResultExt<T> for Result<T, E> {
    fn context<C: Into<String>>(self, context: C) -> BackupResult<T> {
        self.map_err(|e| BackupError::Context {
            context: context.into(),
            source: Box::new(e.into()),
        })
    }

    fn with_context<C: Into<String>, F: FnOnce() -> C>(self, f: F) -> BackupResult<T> {
        self.map_err(|e| BackupError::Context {
            context: f().into(),
            source: Box::new(e.into()),
        })
    }
}

impl BackupError {
    /// The innermost error, skipping any context wrappers.
    pub fn root(&self) -> &BackupError {
        match self {
            BackupError::Context { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_wraps_and_displays_chain() {
        let result: BackupResult<()> = Err(BackupError::Other("boom".into()));
        let err = result.context("failed to list contacts").unwrap_err();
        assert_eq!(err.to_string(), "failed to list contacts: boom");
    }

    #[test]
    fn root_skips_nested_context() {
        let result: BackupResult<()> = Err(BackupError::AuthorizationCancelled);
        let err = result
            .context("inner")
            .context("outer")
            .unwrap_err();
        assert!(matches!(err.root(), BackupError::AuthorizationCancelled));
    }

    #[test]
    fn io_errors_convert_through_context() {
        let result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = result.context("failed to read backup file").unwrap_err();
        assert!(matches!(err.root(), BackupError::Io(_)));
    }
}
