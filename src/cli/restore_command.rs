use std::io;
use std::path::Path;

use crate::error::{BackupError, BackupResult};
use crate::ops::restore_ops;
use crate::store::json_store;

use super::progress_bar::RestoreBars;
use super::prompt;
use super::session;
use super::CommandContext;

pub fn run_restore(ctx: &CommandContext, input: &Path, skip_confirm: bool) -> BackupResult<()> {
    if !input.exists() {
        return Err(BackupError::InvalidArchive {
            reason: format!("backup file not found: {}", input.display()),
        });
    }

    println!("Loading backup file: {}", input.display());
    let archive = json_store::load_structured(input)?;

    println!();
    println!("Backup file information:");
    println!("  Version:    {}", archive.version);
    println!("  Created:    {}", archive.created_at.to_rfc3339());
    println!("  Contacts:   {}", archive.contact_count());
    println!("  Groups:     {}", archive.group_count());
    println!();

    session::require_credentials(ctx)?;
    println!("Authenticating with Google...");
    let token = session::authenticate(ctx)?;
    println!("Authentication successful!");
    println!();

    if !skip_confirm {
        if !prompt::confirm_restore(&mut io::stdin().lock())? {
            println!("Restore cancelled.");
            return Ok(());
        }
        println!();
    }

    let client = session::connect(ctx, &token)?;
    let summary = restore_ops::run_restore(&client, &archive, &mut RestoreBars::default())?;

    println!("Restore completed successfully!");
    println!();
    println!("  Contacts restored: {}", summary.contacts_created);
    println!("  Groups restored:   {}", summary.groups_created);
    println!();
    println!("Note: Contact photos were not restored (API limitation).");
    println!("Photo URLs in the backup may have expired.");
    Ok(())
}
