//! Profiles command - list, refresh and select server profiles.

use anyhow::Result;
use clap::{Args, Subcommand};
use gma_fetch::ReqwestTransport;
use gma_store::{Profile, ProfileKey, ProfileStore};
use tracing::info;

use super::emit;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the profiles command.
#[derive(Args, Debug)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    pub command: ProfilesCommand,
}

/// Profile subcommands.
#[derive(Subcommand, Debug)]
pub enum ProfilesCommand {
    /// List known profiles.
    List,

    /// Download the published profile list.
    Fetch {
        /// URL to fetch from instead of the configured authority.
        #[arg(long)]
        url: Option<String>,
    },

    /// Select a profile by index or "custom".
    Select {
        /// Profile key.
        key: ProfileKey,
    },

    /// Define and select the custom profile.
    Custom {
        /// GMA backend base URL.
        #[arg(long)]
        gma: String,

        /// CAS server URL.
        #[arg(long)]
        cas: String,

        /// Display label.
        #[arg(long, default_value = "Custom")]
        label: String,
    },
}

/// Runs the profiles command.
pub async fn run(args: &ProfilesArgs, cli: &Cli) -> Result<()> {
    let store = ProfileStore::load_default().await;

    match &args.command {
        ProfilesCommand::List => {}
        ProfilesCommand::Fetch { url } => {
            let transport = ReqwestTransport::new();
            let fetched = match url {
                Some(url) => store.refresh_from(&transport, url).await?,
                None => store.refresh(&transport).await?,
            };
            info!(count = fetched.len(), "Fetched profiles");
            store.save().await?;
        }
        ProfilesCommand::Select { key } => {
            let profile = store.select(*key).await?;
            info!(profile = %profile.label, "Profile selected");
            store.save().await?;
        }
        ProfilesCommand::Custom { gma, cas, label } => {
            store
                .set_custom(Profile::new(label.as_str(), gma.as_str(), cas.as_str()))
                .await;
            store.save().await?;
        }
    }

    let set = store.get().await;
    let output = match cli.format {
        OutputFormat::Text => TextFormatter::new(!cli.no_color).format_profiles(&set),
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format_profiles(&set)?,
    };
    emit(cli, &output);
    Ok(())
}
