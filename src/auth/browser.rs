use crate::error::{BackupError, BackupResult};

/// Opens the authorization page for the user.
pub trait BrowserLauncher {
    fn open(&self, url: &str) -> BackupResult<()>;
}

/// Hands the URL to the desktop's default browser, and prints it so it
/// can be opened by hand.
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> BackupResult<()> {
        println!();
        println!("Opening browser for Google authorization...");
        println!("If the browser doesn't open automatically, please visit:");
        println!("{}", url);
        println!();

        open::that(url).map_err(|e| BackupError::Other(format!("failed to open browser: {}", e)))
    }
}

/// Only prints the URL; for headless machines.
pub struct PrintOnly;

impl BrowserLauncher for PrintOnly {
    fn open(&self, url: &str) -> BackupResult<()> {
        println!();
        println!("Open this URL in a browser to authorize access:");
        println!("{}", url);
        println!();
        Ok(())
    }
}
