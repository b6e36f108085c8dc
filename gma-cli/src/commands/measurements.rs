//! Measurements command - show the measurements of one report.

use anyhow::{Context, Result};
use clap::Args;
use gma_core::{MeasurementGroups, Report};
use gma_fetch::GmaClient;
use tracing::debug;

use super::{emit, resolve_node, Connection, ReportArgs};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the measurements command.
#[derive(Args, Debug)]
pub struct MeasurementsArgs {
    #[command(flatten)]
    pub report: ReportArgs,
}

/// Runs the measurements command.
pub async fn run(args: &MeasurementsArgs, cli: &Cli) -> Result<()> {
    let conn = Connection::open(cli).await?;
    let result = load_report(&conn.client, &args.report).await;
    conn.close().await;

    let (report, groups) = result?;
    let output = match cli.format {
        OutputFormat::Text => {
            TextFormatter::new(!cli.no_color).format_measurements(&report, &groups)
        }
        OutputFormat::Json => {
            JsonFormatter::new(cli.pretty).format_measurements(&report, &groups)?
        }
    };
    emit(cli, &output);
    Ok(())
}

/// Resolves the node, picks the report at the requested position and
/// fetches its measurements. Positions past the oldest report clamp to it.
pub async fn load_report(
    client: &GmaClient,
    args: &ReportArgs,
) -> Result<(Report, MeasurementGroups)> {
    let node_id = resolve_node(client, &args.node.node).await?;
    let mut reports = client.reports_for_node(node_id).await?;

    let index = args.index.min(reports.len().saturating_sub(1));
    let report = reports
        .get_at(index)
        .cloned()
        .context("No reports available")?;
    debug!(report = report.report_id, index, "Report selected");

    let groups = client.measurements_for(&report).await?;
    Ok((report, groups))
}
