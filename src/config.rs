use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::BackupResult;
use crate::validation;

const APP_DIR: &str = "google-contacts-backup";
const TOKEN_DIR: &str = ".google-contacts-backup";
const TOKEN_FILE: &str = "token.json";
const CREDENTIALS_FILE: &str = "credentials.json";

const DEFAULT_API_URL: &str = "https://people.googleapis.com";
const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const CONTACTS_SCOPE: &str = "https://www.googleapis.com/auth/contacts";

/// How long the interactive flow waits for the browser callback.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Paging and batching limits for calls against the directory service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPolicy {
    pub page_size: usize,
    pub delete_batch_size: usize,
    pub create_batch_size: usize,
    /// Flat pause after each call, to stay under the service's rate limit.
    pub request_delay: Duration,
}

impl Default for RequestPolicy {
    fn default() -> Self {
        Self {
            page_size: 1000,
            delete_batch_size: 500,
            create_batch_size: 200,
            request_delay: Duration::from_millis(100),
        }
    }
}

impl RequestPolicy {
    /// Same limits with no pause between calls.
    pub fn without_delay(self) -> Self {
        Self {
            request_delay: Duration::ZERO,
            ..self
        }
    }

    pub fn validate(self) -> BackupResult<Self> {
        validation::positive_size(self.page_size, "page size")?;
        validation::positive_size(self.delete_batch_size, "delete batch size")?;
        validation::positive_size(self.create_batch_size, "create batch size")?;
        Ok(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub scope: String,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            scope: CONTACTS_SCOPE.to_string(),
        }
    }
}

/// Everything one invocation needs, resolved up front.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub credentials_file: PathBuf,
    pub token_file: PathBuf,
    pub api_base_url: String,
    pub endpoints: OAuthEndpoints,
    pub policy: RequestPolicy,
    pub callback_timeout: Duration,
}

impl AppConfig {
    pub fn new(credentials_file: Option<PathBuf>) -> Self {
        Self {
            credentials_file: credentials_file.unwrap_or_else(default_credentials_path),
            token_file: default_token_path(),
            api_base_url: api_base_url(),
            endpoints: OAuthEndpoints::default(),
            policy: RequestPolicy::default(),
            callback_timeout: CALLBACK_TIMEOUT,
        }
    }
}

fn api_base_url() -> String {
    env::var("CONTACTS_BACKUP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// `$XDG_CONFIG_HOME/google-contacts-backup/credentials.json`, else under
/// `~/.config`, else `credentials.json` in the working directory.
pub fn default_credentials_path() -> PathBuf {
    let config_dir = env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")));
    match config_dir {
        Some(dir) => dir.join(APP_DIR).join(CREDENTIALS_FILE),
        None => PathBuf::from(CREDENTIALS_FILE),
    }
}

pub fn default_token_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(TOKEN_DIR)
        .join(TOKEN_FILE)
}
