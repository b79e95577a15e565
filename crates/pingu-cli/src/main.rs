use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use pingu_check::Verbosity;
use pingu_core::PinguConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "pingu",
    about = "A URL monitoring utility",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase output detail. Repeat up to three times (-vvv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML config file. Falls back to $PINGU_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding history files (default: platform data dir).
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a URL and record the outcome.
    ///
    /// Exits 0 when the check passes or a quiet window is active, 1 when
    /// the check fails, and 2 on configuration, storage, or email errors.
    Check(commands::check::CheckArgs),
    /// Show the recorded pass/fail history of a URL.
    Report(commands::report::ReportArgs),
}

const EXIT_CHECK_FAILED: u8 = 1;
const EXIT_ERROR: u8 = 2;

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        EnvFilter::new(format!("warn,pingu={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let ctx = commands::Context {
        config: PinguConfig::load(cli.config.as_deref())?,
        verbosity: Verbosity::from_count(cli.verbose),
        store_dir: cli.store_dir,
    };

    match cli.command {
        Commands::Check(args) => {
            let outcome = commands::check::check(&ctx, &args)?;
            if outcome.is_failure() {
                Ok(ExitCode::from(EXIT_CHECK_FAILED))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Commands::Report(args) => {
            commands::report::report(&ctx, &args)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
