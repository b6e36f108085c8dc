//! Reports command - list the recent reports of a node.

use anyhow::Result;
use clap::Args;

use super::{emit, resolve_node, Connection, NodeArgs};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the reports command.
#[derive(Args, Debug)]
pub struct ReportsArgs {
    #[command(flatten)]
    pub node: NodeArgs,
}

/// Runs the reports command.
pub async fn run(args: &ReportsArgs, cli: &Cli) -> Result<()> {
    let conn = Connection::open(cli).await?;
    let result = async {
        let node_id = resolve_node(&conn.client, &args.node.node).await?;
        Ok::<_, anyhow::Error>(conn.client.reports_for_node(node_id).await?)
    }
    .await;
    conn.close().await;

    let reports = result?;
    let output = match cli.format {
        OutputFormat::Text => TextFormatter::new(!cli.no_color).format_reports(&reports),
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format_reports(&reports)?,
    };
    emit(cli, &output);
    Ok(())
}
