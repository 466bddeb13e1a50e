use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, ValueHint};
use tracing_subscriber::EnvFilter;

mod run_impl;

pub use run_impl::execute;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "deploy-status",
    version,
    about = "Show Umbrella deployment status for a time range",
    long_about = None,
    after_help = "Values starting with '-' can be bound with '=', e.g. -f=-7days"
)]
pub struct Args {
    /// Start of the range: a timestamp (2024-03-01, 2024-03-01T08:00:00Z, @1709251200),
    /// `now`, or a relative offset such as -7days
    #[arg(short = 'f', long = "from", value_name = "EXPR", allow_hyphen_values = true)]
    pub from: String,

    /// End of the range, same syntax as --from
    #[arg(
        short = 't',
        long = "to",
        value_name = "EXPR",
        default_value = "now",
        allow_hyphen_values = true
    )]
    pub to: String,

    /// Maximum number of categories to request
    #[arg(
        long = "limit",
        value_name = "N",
        default_value_t = crate::request::DEFAULT_LIMIT,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub limit: u32,

    /// Read configuration from this env file (defaults to ./.env when present)
    #[arg(long = "env-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub env_file: Option<PathBuf>,

    /// Verbose logging to stderr (repeat for more detail)
    #[arg(long = "verbose", short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

/// Runs the CLI application.
///
/// # Errors
/// Returns an error if the time range, configuration, or API call fails.
pub fn run() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run_impl::run_with_args(&args)
}

/// `RUST_LOG` takes precedence over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
