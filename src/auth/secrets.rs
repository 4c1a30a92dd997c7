use std::path::Path;

use serde::Deserialize;

use crate::error::{BackupError, BackupResult};
use crate::model::ClientSecret;
use crate::validation;

#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientBlock>,
    web: Option<ClientBlock>,
}

#[derive(Debug, Deserialize)]
struct ClientBlock {
    #[serde(default)]
    client_id: String,
    #[serde(default)]
    client_secret: String,
}

/// Loads the OAuth client registration downloaded from the cloud console.
/// Accepts either an `installed` or a `web` application block.
pub fn load_client_secret(path: &Path) -> BackupResult<ClientSecret> {
    if !path.exists() {
        return Err(BackupError::MissingCredentials {
            path: path.to_path_buf(),
        });
    }
    let data = std::fs::read_to_string(path)?;
    parse_client_secret(&data).map_err(|reason| BackupError::InvalidClientSecret {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse_client_secret(data: &str) -> Result<ClientSecret, String> {
    let file: ClientSecretFile =
        serde_json::from_str(data).map_err(|e| format!("unable to parse: {}", e))?;

    let block = file
        .installed
        .or(file.web)
        .ok_or("must contain 'installed' or 'web' application credentials")?;

    let client_id = validation::non_blank(&block.client_id, "client_id").map_err(|e| e.to_string())?;
    Ok(ClientSecret {
        client_id,
        client_secret: block.client_secret,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_installed_block() {
        let secret = parse_client_secret(
            r#"{"installed": {"client_id": "id.apps", "client_secret": "s3cret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "redirect_uris": ["http://localhost"]}}"#,
        )
        .unwrap();
        assert_eq!(secret.client_id, "id.apps");
        assert_eq!(secret.client_secret, "s3cret");
    }

    #[test]
    fn parses_web_block() {
        let secret =
            parse_client_secret(r#"{"web": {"client_id": "web.apps", "client_secret": "x"}}"#).unwrap();
        assert_eq!(secret.client_id, "web.apps");
    }

    #[test]
    fn rejects_file_without_either_block() {
        let err = parse_client_secret(r#"{"other": {}}"#).unwrap_err();
        assert!(err.contains("installed"));
    }

    #[test]
    fn rejects_blank_client_id() {
        assert!(parse_client_secret(r#"{"installed": {"client_id": " "}}"#).is_err());
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let err = load_client_secret(&dir.path().join("credentials.json")).unwrap_err();
        assert!(matches!(err, BackupError::MissingCredentials { .. }));
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();
        let err = load_client_secret(&path).unwrap_err();
        assert!(matches!(err, BackupError::InvalidClientSecret { .. }));
        assert!(err.to_string().contains("credentials.json"));
    }
}
