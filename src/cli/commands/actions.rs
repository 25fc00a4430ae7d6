use clap::Subcommand;
use serde_json::json;

use crate::actions;
use crate::cli::utils::output_json;
use crate::cli::OutputFormat;
use crate::types::EntityKind;

#[derive(Subcommand)]
pub enum ActionsCommands {
    #[command(about = "Actions offered for a record in the given status")]
    Show {
        #[arg(help = "Collection")]
        kind: EntityKind,
        #[arg(help = "Status, e.g. draft or pending")]
        status: String,
    },

    #[command(about = "Every status of a collection with its actions")]
    Table {
        #[arg(help = "Collection")]
        kind: EntityKind,
    },
}

pub fn handle(cmd: ActionsCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ActionsCommands::Show { kind, status } => {
            if !actions::statuses(kind).contains(&status.as_str()) {
                tracing::warn!("'{}' is not a known {} status", status, kind);
            }
            let offered: Vec<&str> = actions::permitted(kind, &status)
                .actions()
                .iter()
                .map(|a| a.as_str())
                .collect();

            match output_format {
                OutputFormat::Json => output_json(&json!({
                    "kind": kind.as_str(),
                    "status": status,
                    "actions": offered,
                })),
                OutputFormat::Text => {
                    println!("{} in '{}': {}", kind, status, offered.join(", "));
                    Ok(())
                }
            }
        }
        ActionsCommands::Table { kind } => {
            let rows: Vec<(&str, Vec<&str>)> = actions::statuses(kind)
                .into_iter()
                .map(|status| {
                    let offered = actions::permitted(kind, status)
                        .actions()
                        .iter()
                        .map(|a| a.as_str())
                        .collect();
                    (status, offered)
                })
                .collect();

            match output_format {
                OutputFormat::Json => {
                    let table: serde_json::Map<String, serde_json::Value> = rows
                        .iter()
                        .map(|(status, offered)| (status.to_string(), json!(offered)))
                        .collect();
                    let transitions: Vec<&str> = actions::transitions(kind).iter().map(|a| a.as_str()).collect();
                    output_json(&json!({
                        "kind": kind.as_str(),
                        "statuses": table,
                        "transitions": transitions,
                    }))
                }
                OutputFormat::Text => {
                    if rows.is_empty() {
                        println!("{} has no status lifecycle", kind);
                        return Ok(());
                    }
                    println!("{:<22} {}", "STATUS", "ACTIONS");
                    println!("{}", "-".repeat(70));
                    for (status, offered) in &rows {
                        println!("{:<22} {}", status, offered.join(", "));
                    }
                    Ok(())
                }
            }
        }
    }
}
