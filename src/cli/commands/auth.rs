use std::io::BufRead;

use chrono::{TimeZone, Utc};
use clap::Subcommand;
use serde_json::json;

use crate::auth::{self, IdentityClient};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::error::ApiError;
use crate::workspace::Workspace;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login against the identity provider")]
    Login {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password (read from OPSDESK_PASSWORD or stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and drop stored tokens")]
    Logout {
        #[arg(long, help = "Also forget the selected organization")]
        forget_tenant: bool,
    },

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Refresh authentication token")]
    Refresh,
}

pub async fn handle(cmd: AuthCommands, workspace: &Workspace, output_format: OutputFormat) -> anyhow::Result<()> {
    let session = workspace.client().session().clone();

    match cmd {
        AuthCommands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password()?,
            };

            let identity = IdentityClient::new(workspace.config())?;
            let tokens = identity.login(&username, &password).await?;
            session.save_tokens(&tokens).await?;

            // Settle on an organization right away, same as landing in the app
            let tenants = workspace.tenants().fetch_user_tenants().await?;
            let current = workspace.tenants().current_tenant().await;

            output_success(
                &output_format,
                &format!("Logged in as {}", username),
                Some(json!({
                    "username": username,
                    "tenants": tenants.len(),
                    "current_tenant": current.as_ref().map(|t| t.id.clone()),
                })),
            )
        }
        AuthCommands::Logout { forget_tenant } => {
            workspace.logout(forget_tenant).await?;
            output_success(&output_format, "Logged out", None)
        }
        AuthCommands::Status => {
            let tokens = session.load_tokens().await?;
            let claims = tokens.access_token.as_deref().and_then(auth::peek_claims);
            let authenticated = tokens.access_token.as_deref().is_some_and(auth::is_usable);
            let tenant = session.load_active_tenant().await?;

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({
                        "authenticated": authenticated,
                        "user": claims.as_ref().and_then(|c| c.display_name()),
                        "expires_at": claims.as_ref().and_then(|c| c.exp),
                        "has_refresh_token": tokens.refresh_token.is_some(),
                        "current_tenant": tenant,
                    }))?);
                }
                OutputFormat::Text => {
                    if tokens.is_empty() {
                        println!("Not logged in");
                        return Ok(());
                    }
                    println!("Authenticated: {}", if authenticated { "yes" } else { "no (token expired)" });
                    if let Some(name) = claims.as_ref().and_then(|c| c.display_name()) {
                        println!("User: {}", name);
                    }
                    if let Some(exp) = claims.as_ref().and_then(|c| c.exp) {
                        if let Some(at) = Utc.timestamp_opt(exp, 0).single() {
                            println!("Expires: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
                        }
                    }
                    println!("Refresh token: {}", if tokens.refresh_token.is_some() { "present" } else { "none" });
                    println!("Tenant: {}", tenant.as_deref().unwrap_or("(none)"));
                }
            }
            Ok(())
        }
        AuthCommands::Refresh => {
            let tokens = session.load_tokens().await?;
            let Some(refresh_token) = tokens.refresh_token else {
                return Err(anyhow::anyhow!("No refresh token stored. Use 'opsdesk auth login' first"));
            };

            let identity = IdentityClient::new(workspace.config())?;
            match identity.refresh(&refresh_token).await {
                Ok(fresh) => {
                    session.save_tokens(&fresh).await?;
                    output_success(&output_format, "Token refreshed", None)
                }
                Err(e) => {
                    // A dead refresh token means the session is over
                    if matches!(e, ApiError::Unauthorized(_)) {
                        session.clear_tokens().await?;
                    }
                    Err(e.into())
                }
            }
        }
    }
}

fn read_password() -> anyhow::Result<String> {
    if let Ok(password) = std::env::var("OPSDESK_PASSWORD") {
        return Ok(password);
    }

    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err(anyhow::anyhow!("Password is required"));
    }
    Ok(password)
}
