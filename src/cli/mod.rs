pub mod commands;
pub mod utils;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::{self, ClientConfig};
use crate::error::ApiError;
use crate::session::{FileSessionStore, Navigator};
use crate::tenant::TenantError;
use crate::workspace::Workspace;

#[derive(Parser)]
#[command(name = "opsdesk")]
#[command(about = "OpsDesk CLI - Procurement and operations workspace for the OpsDesk API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "API base URL (overrides OPSDESK_API_URL)")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and token management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Organization membership and selection")]
    Tenant {
        #[command(subcommand)]
        cmd: commands::tenant::TenantCommands,
    },

    #[command(about = "Record operations on a collection (requisitions, purchase orders, suppliers, ...)")]
    Data {
        #[command(subcommand)]
        cmd: commands::data::DataCommands,
    },

    #[command(about = "Show which actions a status offers")]
    Actions {
        #[command(subcommand)]
        cmd: commands::actions::ActionsCommands,
    },

    #[command(about = "Tenant settings document")]
    Settings {
        #[command(subcommand)]
        cmd: commands::settings::SettingsCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// A terminal has no login page; tell the user how to get a new session
pub struct PromptNavigator;

impl Navigator for PromptNavigator {
    fn navigate(&self, route: &str) {
        tracing::debug!("Navigation requested: {}", route);
        eprintln!("Session expired or rejected. Run `opsdesk auth login <username>` to sign in again.");
    }
}

fn client_config(cli: &Cli) -> ClientConfig {
    let mut config = config::config().clone();
    if let Some(ref url) = cli.api_url {
        config.api.base_url = url.clone();
    }
    config
}

fn workspace(config: ClientConfig) -> anyhow::Result<Workspace> {
    let session = FileSessionStore::from_config(&config)?;
    tracing::debug!("Session directory: {}", session.dir().display());
    Ok(Workspace::new(config, Arc::new(session), Arc::new(PromptNavigator))?)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = client_config(&cli);

    let result = match cli.command {
        Commands::Actions { cmd } => commands::actions::handle(cmd, output_format.clone()),
        Commands::Auth { cmd } => commands::auth::handle(cmd, &workspace(config)?, output_format.clone()).await,
        Commands::Tenant { cmd } => commands::tenant::handle(cmd, &workspace(config)?, output_format.clone()).await,
        Commands::Data { cmd } => commands::data::handle(cmd, &workspace(config)?, output_format.clone()).await,
        Commands::Settings { cmd } => commands::settings::handle(cmd, &workspace(config)?, output_format.clone()).await,
    };

    result.map_err(|e| render_api_error(&output_format, e))
}

/// An API failure that has already been printed; the caller only sets the exit code
#[derive(Debug, thiserror::Error)]
#[error("request failed with status {status}")]
pub struct Reported {
    pub status: u16,
}

fn api_error(error: &anyhow::Error) -> Option<&ApiError> {
    if let Some(api) = error.downcast_ref::<ApiError>() {
        return Some(api);
    }
    match error.downcast_ref::<TenantError>() {
        Some(TenantError::Api(api)) => Some(api),
        _ => None,
    }
}

fn render_api_error(output_format: &OutputFormat, error: anyhow::Error) -> anyhow::Error {
    let Some(api) = api_error(&error) else {
        return error;
    };
    match utils::output_api_error(output_format, api) {
        Ok(()) => Reported { status: api.status() }.into(),
        Err(e) => e,
    }
}
