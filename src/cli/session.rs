use crate::auth::{
    load_client_secret, Authenticator, BrowserLauncher, FileTokenStore, PrintOnly, SystemBrowser,
};
use crate::directory::{DirectoryClient, PeopleApi};
use crate::error::{BackupError, BackupResult, ResultExt};
use crate::model::Token;

use super::CommandContext;

/// Fails early, with setup instructions, when there is no client secret.
pub fn require_credentials(ctx: &CommandContext) -> BackupResult<()> {
    let path = &ctx.config.credentials_file;
    if path.exists() {
        return Ok(());
    }
    eprintln!("Please download OAuth credentials from Google Cloud Console:");
    eprintln!("  1. Go to https://console.cloud.google.com/");
    eprintln!("  2. Create or select a project");
    eprintln!("  3. Enable the People API");
    eprintln!("  4. Create OAuth 2.0 credentials (Desktop application)");
    eprintln!("  5. Download the credentials JSON file");
    eprintln!("  6. Save it to: {}", crate::config::default_credentials_path().display());
    eprintln!("     (or specify a custom path with --credentials)");
    eprintln!();
    Err(BackupError::MissingCredentials { path: path.clone() })
}

pub fn authenticate(ctx: &CommandContext) -> BackupResult<Token> {
    let secret = load_client_secret(&ctx.config.credentials_file)?;
    let store = FileTokenStore::new(ctx.config.token_file.clone());
    let browser: Box<dyn BrowserLauncher> = if ctx.open_browser {
        Box::new(SystemBrowser)
    } else {
        Box::new(PrintOnly)
    };

    Authenticator::new(secret, ctx.config.endpoints.clone(), Box::new(store))
        .with_browser(browser)
        .with_cancel(ctx.cancel.clone())
        .with_timeout(ctx.config.callback_timeout)
        .get_token()
        .context("authentication failed")
}

pub fn connect(ctx: &CommandContext, token: &Token) -> BackupResult<DirectoryClient<PeopleApi>> {
    let policy = ctx.config.policy.clone().validate()?;
    Ok(DirectoryClient::new(
        PeopleApi::new(&ctx.config.api_base_url, token),
        policy,
    ))
}
