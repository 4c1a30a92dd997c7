use std::path::PathBuf;

use chrono::Local;

use crate::error::BackupResult;
use crate::ops::backup_ops::{self, ExportFormat};

use super::progress_bar::TerminalProgress;
use super::session;
use super::CommandContext;

pub fn run_backup(ctx: &CommandContext, output: Option<PathBuf>, format: &str) -> BackupResult<()> {
    let format = ExportFormat::parse(format)?;
    let output = output.unwrap_or_else(|| backup_ops::default_output_path(format, Local::now()));
    session::require_credentials(ctx)?;

    println!("Authenticating with Google...");
    let token = session::authenticate(ctx)?;
    println!("Authentication successful!");
    println!();

    let client = session::connect(ctx, &token)?;

    println!("Fetching contact groups and contacts...");
    let mut progress = TerminalProgress::new("Downloading");
    let captured = backup_ops::capture_archive(&client, &mut progress);
    progress.finish();
    let archive = captured?;
    println!(
        "Found {} contact groups and {} contacts",
        archive.group_count(),
        archive.contact_count()
    );

    println!();
    println!("Saving backup to {}...", output.display());
    backup_ops::write_archive(&archive, format, &output)?;

    println!();
    println!("Backup completed successfully!");
    println!();
    println!("  Format:   {}", format);
    println!("  Contacts: {}", archive.contact_count());
    println!("  Groups:   {}", archive.group_count());
    println!("  File:     {}", output.display());
    println!();
    match format {
        ExportFormat::Json => {
            println!("Note: Contact photos are stored as URLs which may expire over time.")
        }
        ExportFormat::Csv => {
            println!("Note: CSV format can be imported directly via Google Contacts web UI.");
            println!("      Contact photos and some metadata are not included in CSV format.");
        }
    }
    Ok(())
}
