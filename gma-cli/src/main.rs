// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! GMA CLI - staff report entry for the Global Measurements Application.
//!
//! # Examples
//!
//! ```bash
//! # Log in and show who you are
//! GMA_USERNAME=sam@example.com GMA_PASSWORD=... gma login
//!
//! # List assigned nodes
//! gma assignments
//!
//! # Reports of a node, by id or name
//! gma reports --node "Campus Ministry"
//!
//! # Measurements of the second most recent report
//! gma measurements --node 5 --index 1
//!
//! # Write a value through the autosave path
//! gma set --node 5 --measurement 17 --value 12 --debounce
//!
//! # Server profiles
//! gma profiles list
//! gma profiles select custom
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use gma_fetch::GmaError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{assignments, login, measurements, profiles, reports, set};

// ============================================================================
// CLI Definition
// ============================================================================

/// GMA CLI - staff report entry from the command line.
#[derive(Parser)]
#[command(name = "gma")]
#[command(about = "Staff report entry for the Global Measurements Application")]
#[command(long_about = r#"
Logs in to a GMA server through its CAS identity provider and reads or
writes staff report measurements.

Credentials are taken from --username / GMA_USERNAME and GMA_PASSWORD.

Examples:
  gma login                             # Log in and show the user
  gma assignments                       # Nodes you report for
  gma reports --node 5                  # Recent reports of a node
  gma measurements --node 5             # Measurements of the latest report
  gma set --node 5 --measurement 17 --value 3
  gma profiles list                     # Known servers
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Server profile to use (index or "custom"); defaults to the selected one.
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Login name.
    #[arg(long, short, env = "GMA_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password.
    #[arg(long, env = "GMA_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Log in and show the current user.
    Login,

    /// List the nodes you are assigned to.
    #[command(visible_alias = "a")]
    Assignments(assignments::AssignmentsArgs),

    /// List the recent reports of a node.
    #[command(visible_alias = "r")]
    Reports(reports::ReportsArgs),

    /// Show the measurements of a report.
    #[command(visible_alias = "m")]
    Measurements(measurements::MeasurementsArgs),

    /// Write a measurement value.
    Set(set::SetArgs),

    /// Manage server profiles.
    Profiles(profiles::ProfilesArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Credentials or service ticket rejected.
    AuthenticationFailed = 2,
    /// Session timed out.
    SessionExpired = 3,
    /// Server unreachable or misconfigured.
    Unreachable = 4,
}

impl ExitCode {
    /// Picks the exit code for an error.
    fn for_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<GmaError>() {
            Some(GmaError::SessionExpired { .. }) => Self::SessionExpired,
            Some(GmaError::CredentialsRejected { .. } | GmaError::AuthenticationFailed { .. }) => {
                Self::AuthenticationFailed
            }
            Some(GmaError::ServerUnreachable { .. }) => Self::Unreachable,
            _ => Self::Error,
        }
    }
}

/// Renders an error for the terminal.
fn error_message(error: &anyhow::Error) -> String {
    match error.downcast_ref::<GmaError>() {
        Some(e) if e.is_session_expired() => "Session timed out: please log in again".to_string(),
        _ => format!("{error:#}"),
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("gma=debug,gma_fetch=debug,gma_store=debug,warn")
    } else {
        EnvFilter::new("gma=warn,gma_fetch=warn,gma_store=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Commands::Login => login::run(&cli).await,
        Commands::Assignments(args) => assignments::run(args, &cli).await,
        Commands::Reports(args) => reports::run(args, &cli).await,
        Commands::Measurements(args) => measurements::run(args, &cli).await,
        Commands::Set(args) => set::run(args, &cli).await,
        Commands::Profiles(args) => profiles::run(args, &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {}", error_message(&e));
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    Ok(())
}
