//! `weatherdesk` command-line front end for the records store.
//!
//! # Responsibility
//! - Resolve configuration from the environment and flags.
//! - Run one command per invocation and print one JSON envelope.
//!
//! ```bash
//! weatherdesk init
//! weatherdesk location add Paris --lat 48.85 --lon 2.35 --current
//! weatherdesk challenge board
//! weatherdesk progress record 3 --score 150 --completed
//! ```

mod commands;
mod envelope;

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use commands::Command;
use envelope::{render, CliError, Envelope};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use weatherdesk_core::{init_logging, StoreConfig, StoreContext};

#[derive(Parser, Debug)]
#[command(name = "weatherdesk")]
#[command(about = "Records store for saved locations, weather challenges and progress")]
#[command(version)]
struct Cli {
    /// Database file (overrides WEATHERDESK_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log directory (overrides WEATHERDESK_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err)
            if matches!(
                err.kind(),
                ClapErrorKind::DisplayHelp
                    | ClapErrorKind::DisplayVersion
                    | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            ) =>
        {
            err.exit()
        }
        Err(err) => {
            let message = err.render().to_string().trim().to_string();
            return emit(render(Err(CliError::Usage(message))));
        }
    };

    let config = resolve_config(StoreConfig::from_env(), &cli);
    emit(render(run(cli.command, &config)))
}

fn run(command: Command, config: &StoreConfig) -> Result<envelope::Outcome, CliError> {
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let context = StoreContext::from_config(config);
    command.execute(&context)
}

/// Applies flag overrides on top of environment configuration.
fn resolve_config(mut config: StoreConfig, cli: &Cli) -> StoreConfig {
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(log_dir) = &cli.log_dir {
        config.log_dir = Some(absolute(log_dir));
    }
    config
}

fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}

fn emit((envelope, code): (Envelope, u8)) -> ExitCode {
    match serde_json::to_string(&envelope) {
        Ok(line) => {
            println!("{line}");
            ExitCode::from(code)
        }
        Err(err) => {
            eprintln!("failed to render response: {err}");
            ExitCode::from(1)
        }
    }
}
