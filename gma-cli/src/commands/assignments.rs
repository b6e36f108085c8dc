//! Assignments command - list the nodes the user reports for.

use anyhow::Result;
use clap::Args;
use gma_core::Role;
use tracing::debug;

use super::{emit, Connection};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the assignments command.
#[derive(Args, Debug)]
pub struct AssignmentsArgs {
    /// Role to list assignments for (staff or director).
    #[arg(long, default_value = "staff")]
    pub role: Role,
}

/// Runs the assignments command.
pub async fn run(args: &AssignmentsArgs, cli: &Cli) -> Result<()> {
    let conn = Connection::open(cli).await?;
    let result = conn.client.assignments(args.role).await;
    conn.close().await;

    let assignments = result?;
    debug!(role = %args.role, count = assignments.len(), "Assignments fetched");

    let output = match cli.format {
        OutputFormat::Text => TextFormatter::new(!cli.no_color).format_assignments(&assignments),
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format_assignments(&assignments)?,
    };
    emit(cli, &output);
    Ok(())
}
