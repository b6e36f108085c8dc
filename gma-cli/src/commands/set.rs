//! Set command - write one measurement value.

use anyhow::{Context, Result};
use clap::Args;
use gma_core::{Measurement, MeasurementId};
use gma_fetch::WriteOutcome;
use tracing::info;

use super::measurements::load_report;
use super::{emit, Connection, NodeArgs, ReportArgs};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the set command.
#[derive(Args, Debug)]
pub struct SetArgs {
    #[command(flatten)]
    pub node: NodeArgs,

    /// Measurement id.
    #[arg(long)]
    pub measurement: MeasurementId,

    /// New value.
    #[arg(long)]
    pub value: String,

    /// Report position, 0 being the most recent.
    #[arg(long, short, default_value_t = 0)]
    pub index: usize,

    /// Write through the debounced autosave path instead of immediately.
    #[arg(long)]
    pub debounce: bool,
}

/// Runs the set command.
pub async fn run(args: &SetArgs, cli: &Cli) -> Result<()> {
    let conn = Connection::open(cli).await?;
    let result = write(&conn, args).await;
    conn.close().await;

    let (measurement, outcome) = result?;
    let output = match cli.format {
        OutputFormat::Text => {
            TextFormatter::new(!cli.no_color).format_write(&measurement, outcome)
        }
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format_write(&measurement, outcome)?,
    };
    emit(cli, &output);
    Ok(())
}

async fn write(conn: &Connection, args: &SetArgs) -> Result<(Measurement, WriteOutcome)> {
    let report_args = ReportArgs {
        node: args.node.clone(),
        index: args.index,
    };
    let (report, groups) = load_report(&conn.client, &report_args).await?;
    let measurement = groups
        .find(args.measurement)
        .cloned()
        .with_context(|| {
            format!(
                "Measurement {} not found in report {}",
                args.measurement, report.report_id
            )
        })?;

    let field = conn.client.field(measurement);
    let outcome = if args.debounce {
        info!(delay = ?field.delay(), "Waiting for autosave");
        field.update(args.value.clone()).await?
    } else {
        field.set_value(args.value.clone());
        field.save_now().await?
    };
    Ok((field.measurement(), outcome))
}
