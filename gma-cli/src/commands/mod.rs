//! CLI command implementations.

pub mod assignments;
pub mod login;
pub mod measurements;
pub mod profiles;
pub mod reports;
pub mod set;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use gma_core::{NodeId, Role, UserIdentity};
use gma_fetch::{
    ClientConfig, CredentialReauthenticator, GmaClient, ReqwestTransport, SessionController,
};
use gma_store::{Profile, ProfileKey, ProfileStore};
use tracing::{debug, info};

use crate::{Cli, OutputFormat};

/// Node selection shared by the report commands.
#[derive(Args, Debug, Clone)]
pub struct NodeArgs {
    /// Node id or name.
    #[arg(long, short)]
    pub node: String,
}

/// Report selection shared by the measurement commands.
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    #[command(flatten)]
    pub node: NodeArgs,

    /// Report position, 0 being the most recent.
    #[arg(long, short, default_value_t = 0)]
    pub index: usize,
}

/// Resolves the profile named on the command line, or the selected one.
pub async fn resolve_profile(cli: &Cli) -> Result<Profile> {
    let store = ProfileStore::load_default().await;
    match &cli.profile {
        Some(key) => {
            let key: ProfileKey = key.parse()?;
            let set = store.get().await;
            set.get(key)
                .cloned()
                .with_context(|| format!("Profile not found: {key}"))
        }
        None => Ok(store.current().await),
    }
}

/// A logged-in client for the selected profile.
pub struct Connection {
    pub client: GmaClient,
    pub profile: Profile,
    pub identity: UserIdentity,
}

impl Connection {
    /// Logs in with the command-line credentials.
    pub async fn open(cli: &Cli) -> Result<Self> {
        let profile = resolve_profile(cli).await?;
        let username = cli
            .username
            .clone()
            .context("No username: pass --username or set GMA_USERNAME")?;
        let password = cli
            .password
            .clone()
            .context("No password: set GMA_PASSWORD")?;

        let config = ClientConfig::builder(&profile.gma_base, &profile.cas_url)
            .reauthenticator(Arc::new(CredentialReauthenticator::new(
                username.clone(),
                password.clone(),
            )))
            .on_busy(|| debug!("Working..."), || debug!("Done"))
            .build()?;
        let transport = ReqwestTransport::new().for_urls(&[profile.gma_base.as_str(), profile.cas_url.as_str()]);
        let session = Arc::new(SessionController::new(config, Arc::new(transport)));
        let client = GmaClient::new(session);

        info!(server = %profile.label, "Logging in");
        let identity = client.login(&username, &password).await?;
        Ok(Self {
            client,
            profile,
            identity,
        })
    }

    /// Ends the web session.
    pub async fn close(self) {
        self.client.session().teardown().await;
    }
}

/// Finds a node among the user's staff and director assignments.
pub async fn resolve_node(client: &GmaClient, reference: &str) -> Result<NodeId> {
    for role in Role::all() {
        let assignments = client.assignments(*role).await?;
        if let Some(id) = assignments.resolve(reference) {
            debug!(node = id, role = %role, "Node resolved");
            return Ok(id);
        }
    }
    anyhow::bail!("Unknown node: {reference}")
}

/// Prints a formatted result unless quiet mode is on.
pub fn emit(cli: &Cli, output: &str) {
    if !cli.quiet || cli.format == OutputFormat::Json {
        println!("{output}");
    }
}
