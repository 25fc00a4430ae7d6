use clap::Subcommand;
use serde_json::{json, Value};

use crate::actions::Action;
use crate::cli::utils::{
    output_empty_collection, output_json, output_page, output_record, output_success, read_stdin_document,
};
use crate::cli::OutputFormat;
use crate::filter::ListFilter;
use crate::resources::{
    Contract, Entity, Forecast, InventoryItem, PurchaseOrder, Requisition, RfxEvent, Supplier, User, Warehouse,
};
use crate::types::EntityKind;
use crate::workspace::Workspace;

#[derive(Subcommand)]
pub enum DataCommands {
    #[command(about = "List records with filters and pagination")]
    List {
        #[arg(help = "Collection (requisition, po, supplier, rfx, contract, user, inventory, warehouse, forecast)")]
        kind: EntityKind,
        #[arg(long, help = "JSON filter, e.g. '{\"status\":\"draft\",\"supplier_id\":\"s-1\"}'")]
        filter: Option<String>,
        #[arg(long, help = "Only records in this status")]
        status: Option<String>,
        #[arg(long, help = "Free-text search")]
        search: Option<String>,
        #[arg(long, help = "Sort field, prefix with '-' for descending")]
        sort: Option<String>,
        #[arg(long, help = "Page number, starting at 1")]
        page: Option<u32>,
        #[arg(long, help = "Records per page")]
        per_page: Option<u32>,
    },

    #[command(about = "Show record(s) by ID")]
    Get {
        #[arg(help = "Collection")]
        kind: EntityKind,
        #[arg(required = true, help = "Record ID(s)")]
        ids: Vec<String>,
    },

    #[command(about = "Create record from stdin (JSON or YAML)")]
    Create {
        #[arg(help = "Collection")]
        kind: EntityKind,
    },

    #[command(about = "Update record from stdin (JSON or YAML)")]
    Update {
        #[arg(help = "Collection")]
        kind: EntityKind,
        #[arg(help = "Record ID to update")]
        id: String,
    },

    #[command(about = "Delete record")]
    Delete {
        #[arg(help = "Collection")]
        kind: EntityKind,
        #[arg(help = "Record ID to delete")]
        id: String,
    },

    #[command(about = "Apply a status transition such as approve, send or receive")]
    Transition {
        #[arg(help = "Collection")]
        kind: EntityKind,
        #[arg(help = "Record ID")]
        id: String,
        #[arg(help = "Action name")]
        action: Action,
        #[arg(long, help = "Read a JSON or YAML payload from stdin (e.g. a rejection reason)")]
        payload: bool,
    },
}

impl DataCommands {
    fn kind(&self) -> EntityKind {
        match self {
            DataCommands::List { kind, .. }
            | DataCommands::Get { kind, .. }
            | DataCommands::Create { kind }
            | DataCommands::Update { kind, .. }
            | DataCommands::Delete { kind, .. }
            | DataCommands::Transition { kind, .. } => *kind,
        }
    }
}

pub async fn handle(cmd: DataCommands, workspace: &Workspace, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd.kind() {
        EntityKind::Requisition => run::<Requisition>(cmd, workspace, output_format).await,
        EntityKind::PurchaseOrder => run::<PurchaseOrder>(cmd, workspace, output_format).await,
        EntityKind::Supplier => run::<Supplier>(cmd, workspace, output_format).await,
        EntityKind::Rfx => run::<RfxEvent>(cmd, workspace, output_format).await,
        EntityKind::Contract => run::<Contract>(cmd, workspace, output_format).await,
        EntityKind::User => run::<User>(cmd, workspace, output_format).await,
        EntityKind::InventoryItem => run::<InventoryItem>(cmd, workspace, output_format).await,
        EntityKind::Warehouse => run::<Warehouse>(cmd, workspace, output_format).await,
        EntityKind::Forecast => run::<Forecast>(cmd, workspace, output_format).await,
        EntityKind::Tenant => Err(anyhow::anyhow!("Use 'opsdesk tenant' to manage organizations")),
        EntityKind::Settings => Err(anyhow::anyhow!("Use 'opsdesk settings' to manage settings")),
    }
}

async fn run<E: Entity>(cmd: DataCommands, workspace: &Workspace, output_format: OutputFormat) -> anyhow::Result<()> {
    let tenants = workspace.tenants();
    tenants.fetch_user_tenants().await?;
    if tenants.current_tenant().await.is_none() {
        return Err(anyhow::anyhow!(
            "No organization selected. Use 'opsdesk tenant create <name>' or 'opsdesk tenant use <id>' first"
        ));
    }

    let ctx = workspace.context().await;
    let resource = workspace.resource::<E>();

    match cmd {
        DataCommands::List { kind, filter, status, search, sort, page, per_page } => {
            let mut list_filter = match filter {
                Some(raw) => ListFilter::from_json(&serde_json::from_str::<Value>(&raw)?)?,
                None => ListFilter::new(),
            };
            if let Some(status) = status {
                list_filter.status(status);
            }
            if let Some(term) = search {
                list_filter.search(term);
            }
            if let Some(spec) = sort {
                list_filter.sort(&spec)?;
            }
            if let Some(page) = page {
                list_filter.page(page)?;
            }
            if let Some(per_page) = per_page {
                list_filter.per_page(per_page)?;
            }

            let records = resource.list(&ctx, &list_filter).await?;
            if records.is_empty() {
                return output_empty_collection(&output_format, kind.as_str(), &format!("No {} records match", kind));
            }
            output_page(&output_format, &records)
        }
        DataCommands::Get { ids, .. } => {
            let records = resource.get_many(&ctx, &ids).await?;
            if records.len() == 1 {
                return output_record(&output_format, &records[0]);
            }
            match output_format {
                OutputFormat::Json => output_json(&records),
                OutputFormat::Text => {
                    for record in &records {
                        output_record(&output_format, record)?;
                    }
                    Ok(())
                }
            }
        }
        DataCommands::Create { kind } => {
            let body: Value = read_stdin_document()?;
            let created = resource.create(&ctx, &body).await?;
            output_success(
                &output_format,
                &format!("Created {} {}", kind, created.id()),
                Some(json!({ "record": created })),
            )
        }
        DataCommands::Update { kind, id } => {
            let body: Value = read_stdin_document()?;
            let updated = resource.update(&ctx, &id, &body).await?;
            output_success(
                &output_format,
                &format!("Updated {} {}", kind, updated.id()),
                Some(json!({ "record": updated })),
            )
        }
        DataCommands::Delete { kind, id } => {
            resource.delete(&ctx, &id).await?;
            output_success(&output_format, &format!("Deleted {} {}", kind, id), None)
        }
        DataCommands::Transition { kind, id, action, payload } => {
            let body: Option<Value> = if payload { Some(read_stdin_document()?) } else { None };
            let updated = resource.transition(&ctx, &id, action, body.as_ref()).await?;
            output_success(
                &output_format,
                &format!("{} {} is now {}", kind, updated.id(), updated.status().unwrap_or("updated")),
                Some(json!({ "record": updated })),
            )
        }
    }
}
