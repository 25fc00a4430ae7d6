use clap::{Subcommand, ValueEnum};
use serde_json::json;

use crate::cli::utils::{output_empty_collection, output_json, output_no_current_item, output_success};
use crate::cli::OutputFormat;
use crate::tenant::{NewTenant, Plan};
use crate::workspace::Workspace;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PlanArg {
    Free,
    Starter,
    Professional,
    Enterprise,
}

impl From<PlanArg> for Plan {
    fn from(arg: PlanArg) -> Self {
        match arg {
            PlanArg::Free => Plan::Free,
            PlanArg::Starter => Plan::Starter,
            PlanArg::Professional => Plan::Professional,
            PlanArg::Enterprise => Plan::Enterprise,
        }
    }
}

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List organizations you belong to")]
    List,

    #[command(about = "Show the selected organization")]
    Current,

    #[command(about = "Switch to an organization (persistent selection)")]
    Use {
        #[arg(help = "Tenant ID to switch to")]
        tenant: String,
    },

    #[command(about = "Create an organization and switch to it")]
    Create {
        #[arg(help = "Organization name")]
        name: String,
        #[arg(long, help = "URL slug (derived from the name if not provided)")]
        slug: Option<String>,
        #[arg(long, help = "Custom domain")]
        domain: Option<String>,
        #[arg(long, value_enum, default_value = "starter", help = "Subscription plan")]
        plan: PlanArg,
    },
}

pub async fn handle(cmd: TenantCommands, workspace: &Workspace, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = workspace.tenants();

    match cmd {
        TenantCommands::List => {
            let tenants = store.fetch_user_tenants().await?;
            let current = store.current_tenant().await.map(|t| t.id);

            if tenants.is_empty() {
                return output_empty_collection(
                    &output_format,
                    "tenants",
                    "No organizations yet. Use 'opsdesk tenant create <name>' to create one",
                );
            }

            match output_format {
                OutputFormat::Json => {
                    output_json(&json!({ "tenants": tenants, "current_tenant": current }))?;
                }
                OutputFormat::Text => {
                    println!("{:<38} {:<25} {:<20} {:<13} {}", "ID", "NAME", "SLUG", "PLAN", "ROLE");
                    println!("{}", "-".repeat(110));

                    for tenant in &tenants {
                        let current_marker = if current.as_deref() == Some(tenant.id.as_str()) { "*" } else { " " };
                        println!(
                            "{}{:<37} {:<25} {:<20} {:<13} {}",
                            current_marker,
                            tenant.id,
                            tenant.name,
                            tenant.slug,
                            format!("{:?}", tenant.plan).to_lowercase(),
                            format!("{:?}", tenant.role).to_lowercase()
                        );
                    }
                }
            }
            Ok(())
        }
        TenantCommands::Current => {
            store.fetch_user_tenants().await?;

            match store.current_tenant().await {
                Some(tenant) => match output_format {
                    OutputFormat::Json => output_json(&json!({ "current_tenant": tenant })),
                    OutputFormat::Text => {
                        println!("Current tenant: {} ({})", tenant.name, tenant.id);
                        println!("Slug: {}", tenant.slug);
                        if let Some(domain) = tenant.domain {
                            println!("Domain: {}", domain);
                        }
                        Ok(())
                    }
                },
                None => output_no_current_item(&output_format, "tenant"),
            }
        }
        TenantCommands::Use { tenant } => {
            store.fetch_user_tenants().await?;

            if !store.switch_tenant(&tenant).await? {
                return Err(anyhow::anyhow!("Tenant '{}' not found", tenant));
            }

            output_success(
                &output_format,
                &format!("Switched to tenant '{}'", tenant),
                Some(json!({ "current_tenant": tenant })),
            )
        }
        TenantCommands::Create { name, slug, domain, plan } => {
            // Load memberships first so the new one is appended to a known list
            store.fetch_user_tenants().await?;

            let data = NewTenant {
                slug: slug.unwrap_or_else(|| slugify(&name)),
                name,
                domain,
                plan: plan.into(),
            };
            let created = store.create_tenant(&data).await?;

            output_success(
                &output_format,
                &format!("Tenant '{}' created and selected", created.name),
                Some(json!({ "tenant": created })),
            )
        }
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
