//! Login command - authenticate and show the current user.

use anyhow::Result;
use tracing::info;

use super::{emit, Connection};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the login command.
pub async fn run(cli: &Cli) -> Result<()> {
    let conn = Connection::open(cli).await?;
    info!(user = conn.identity.user_id, "Logged in");

    let output = match cli.format {
        OutputFormat::Text => {
            TextFormatter::new(!cli.no_color).format_login(&conn.profile.label, &conn.identity)
        }
        OutputFormat::Json => {
            JsonFormatter::new(cli.pretty).format_login(&conn.profile.label, &conn.identity)?
        }
    };
    emit(cli, &output);

    conn.close().await;
    Ok(())
}
