// yearlink CLI - links disclosure records across filing years

mod exit_codes;
mod link;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use exit_codes::{config_exit_code, io_exit_code, EXIT_ERROR, EXIT_RECORD, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "yearlink")]
#[command(about = "Link transactee and party records that denote the same entity across filing years")]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug). YEARLINK_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Log errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Link both collections and write them back
    #[command(after_help = "\
Examples:
  yearlink run
  yearlink run --config disclosure.toml --pretty
  yearlink run --dry-run --json
  yearlink run --report link-report.json")]
    Run {
        /// Settings file (default: ./yearlink.toml, else the user config dir)
        #[arg(long, short = 'c', env = "YEARLINK_CONFIG")]
        config: Option<PathBuf>,

        /// Override data_dir from the settings file
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Write sorted, indented JSON
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,

        /// Link and report without writing any collection
        #[arg(long)]
        dry_run: bool,

        /// Print the run report as JSON to stdout
        #[arg(long)]
        json: bool,

        /// Write the run report as JSON to a file
        #[arg(long, value_name = "FILE")]
        report: Option<PathBuf>,
    },

    /// Validate the settings file without running
    #[command(after_help = "\
Examples:
  yearlink validate
  yearlink validate --config disclosure.toml")]
    Validate {
        /// Settings file (default: ./yearlink.toml, else the user config dir)
        #[arg(long, short = 'c', env = "YEARLINK_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Show per-year and per-kind counts of one collection file
    #[command(after_help = "\
Examples:
  yearlink inspect data/parties.json
  yearlink inspect data/transactees.json --json")]
    Inspect {
        /// Collection file (JSON array of records)
        file: PathBuf,

        /// Print the profile as JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.quiet, cli.verbose) {
        eprintln!("error: {}", e.message);
        return ExitCode::from(e.code);
    }

    let result = match cli.command {
        Commands::Run {
            config,
            data_dir,
            pretty,
            compact,
            dry_run,
            json,
            report,
        } => link::cmd_run(link::RunArgs {
            config,
            data_dir,
            pretty: if pretty {
                Some(true)
            } else if compact {
                Some(false)
            } else {
                None
            },
            dry_run,
            json,
            report,
        }),
        Commands::Validate { config } => link::cmd_validate(config),
        Commands::Inspect { file, json } => link::cmd_inspect(file, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn init_tracing(quiet: bool, verbose: u8) -> Result<(), CliError> {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("YEARLINK_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| CliError::general(format!("failed to initialize logging: {e}")))
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn config(err: yearlink_config::ConfigError) -> Self {
        let hint = match &err {
            yearlink_config::ConfigError::Read { .. } => {
                Some("create ./yearlink.toml or pass --config".to_string())
            }
            _ => None,
        };
        Self { code: config_exit_code(&err), message: err.to_string(), hint }
    }

    pub fn io(err: yearlink_io::IoError) -> Self {
        Self { code: io_exit_code(&err), message: err.to_string(), hint: None }
    }

    pub fn record(err: yearlink_xref::XrefError) -> Self {
        let hint = match &err {
            yearlink_xref::XrefError::Collection { source, .. }
                if matches!(**source, yearlink_xref::XrefError::FieldTableMiss { .. }) =>
            {
                Some("set unknown_kind = \"isolate\" to leave such records unlinked".to_string())
            }
            _ => None,
        };
        Self { code: EXIT_RECORD, message: err.to_string(), hint }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
