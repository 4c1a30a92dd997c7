use crate::error::BackupResult;

use super::session;
use super::CommandContext;

pub fn run_auth(ctx: &CommandContext) -> BackupResult<()> {
    session::require_credentials(ctx)?;

    println!("Starting Google authentication...");
    println!();
    session::authenticate(ctx)?;

    println!();
    println!("Authentication successful!");
    println!();
    println!("Your credentials have been saved to {}", ctx.config.token_file.display());
    println!("and will be used automatically for future backup and restore operations.");
    println!();
    println!("You can now run:");
    println!("  contacts-backup backup    # to backup your contacts");
    println!("  contacts-backup restore   # to restore from a backup");
    Ok(())
}
