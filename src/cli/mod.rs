mod auth_command;
mod backup_command;
mod progress_bar;
mod prompt;
mod restore_command;
mod session;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::auth::CancelFlag;
use crate::config::AppConfig;
use crate::error::BackupResult;

const SETUP_HELP: &str = "\
Setup:
  1. Go to https://console.cloud.google.com/
  2. Create a new project (or select an existing one)
  3. Enable the People API
  4. Create OAuth 2.0 credentials (Desktop application)
  5. Download the credentials JSON file
  6. Save it to $XDG_CONFIG_HOME/google-contacts-backup/credentials.json
     (or ~/.config/google-contacts-backup/credentials.json)

Note: restore DELETES ALL existing contacts before restoring.
Always create a fresh backup first.";

/// Backup and restore Google Contacts
#[derive(Parser, Debug)]
#[command(name = "contacts-backup")]
#[command(version, about, after_long_help = SETUP_HELP)]
pub struct Cli {
    /// Path to the OAuth credentials JSON file from Google Cloud Console
    #[arg(short, long, global = true, value_name = "PATH")]
    pub credentials: Option<PathBuf>,

    /// Print the authorization URL instead of opening a browser
    #[arg(long, global = true)]
    pub no_browser: bool,

    /// Verbose logging to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authorize access to your contacts and cache the token
    Auth,

    /// Download all contacts and groups to a JSON or CSV file
    #[command(alias = "capture")]
    Backup {
        /// Output file (default: contacts-TIMESTAMP.json or .csv)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Output format: json (full backup) or csv (spreadsheet export)
        #[arg(short, long, default_value = "json")]
        format: String,
    },

    /// Replace every contact and group with the contents of a JSON backup
    Restore {
        /// Backup file to restore from
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        /// Skip the confirmation prompt
        #[arg(long)]
        confirm: bool,
    },
}

/// Everything a command needs, resolved once per invocation.
pub struct CommandContext {
    pub config: AppConfig,
    pub cancel: CancelFlag,
    pub open_browser: bool,
}

pub fn run(cli: Cli) -> BackupResult<()> {
    let ctx = CommandContext {
        config: AppConfig::new(cli.credentials),
        cancel: CancelFlag::from_ctrlc(),
        open_browser: !cli.no_browser,
    };
    tracing::debug!(
        credentials = %ctx.config.credentials_file.display(),
        token = %ctx.config.token_file.display(),
        "resolved configuration"
    );

    match cli.command {
        Commands::Auth => auth_command::run_auth(&ctx),
        Commands::Backup { output, format } => backup_command::run_backup(&ctx, output, &format),
        Commands::Restore { input, confirm } => restore_command::run_restore(&ctx, &input, confirm),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn capture_is_an_alias_for_backup() {
        let cli = Cli::try_parse_from(["contacts-backup", "capture", "-f", "csv", "-o", "out.csv"]).unwrap();
        match cli.command {
            Commands::Backup { output, format } => {
                assert_eq!(output, Some(PathBuf::from("out.csv")));
                assert_eq!(format, "csv");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn restore_requires_input() {
        assert!(Cli::try_parse_from(["contacts-backup", "restore"]).is_err());
        let cli = Cli::try_parse_from(["contacts-backup", "restore", "-i", "b.json", "--confirm", "-c", "creds.json"])
            .unwrap();
        assert_eq!(cli.credentials, Some(PathBuf::from("creds.json")));
        assert!(matches!(cli.command, Commands::Restore { confirm: true, .. }));
    }
}
