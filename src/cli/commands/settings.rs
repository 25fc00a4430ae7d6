use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_json, output_success, read_stdin_document};
use crate::cli::OutputFormat;
use crate::resources::Settings;
use crate::workspace::Workspace;

#[derive(Subcommand)]
pub enum SettingsCommands {
    #[command(about = "Show the organization's settings")]
    Get,

    #[command(about = "Replace the settings document from stdin (JSON or YAML)")]
    Set,
}

pub async fn handle(cmd: SettingsCommands, workspace: &Workspace, output_format: OutputFormat) -> anyhow::Result<()> {
    workspace.tenants().fetch_user_tenants().await?;
    if workspace.tenants().current_tenant().await.is_none() {
        return Err(anyhow::anyhow!("No organization selected. Use 'opsdesk tenant use <id>' first"));
    }

    let ctx = workspace.context().await;
    let settings = workspace.settings();

    let current = match cmd {
        SettingsCommands::Get => settings.get(&ctx).await?,
        SettingsCommands::Set => {
            let document: Settings = read_stdin_document()?;
            let saved = settings.replace(&ctx, &document).await?;
            if let OutputFormat::Text = output_format {
                output_success(&output_format, "Settings saved", None)?;
            }
            saved
        }
    };

    match output_format {
        OutputFormat::Json => output_json(&json!({ "settings": current })),
        OutputFormat::Text => {
            println!("{}", serde_yaml::to_string(&current)?);
            Ok(())
        }
    }
}
