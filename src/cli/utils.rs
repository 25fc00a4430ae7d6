use std::io::Read;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::error::ApiError;
use crate::resources::Entity;
use crate::types::Page;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(Value::Object(extra)) = data {
                if let Value::Object(ref mut map) = response {
                    map.extend(extra);
                }
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a normalized API error in the appropriate format
pub fn output_api_error(output_format: &OutputFormat, error: &ApiError) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&api_error_response(error))?);
        }
        OutputFormat::Text => {
            eprintln!("Error ({}): {}", error.status(), error.message());
            if let Some(errors) = error.errors() {
                for (field, messages) in errors {
                    eprintln!("  {}: {}", field, messages.join(", "));
                }
            }
        }
    }
    Ok(())
}

pub fn api_error_response(error: &ApiError) -> Value {
    let mut response = json!({
        "success": false,
        "error_code": error.error_code(),
    });
    if let Value::Object(ref mut map) = response {
        if let Value::Object(body) = error.to_json() {
            map.extend(body);
        }
    }
    response
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Output "no current item" message in the appropriate format
pub fn output_no_current_item(
    output_format: &OutputFormat,
    item_type: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                format!("current_{}", item_type): null
            }))?);
        }
        OutputFormat::Text => {
            println!("No current {} set", item_type);
        }
    }
    Ok(())
}

/// Print any serializable value as pretty JSON
pub fn output_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Render a page of records with the actions each one offers
pub fn output_page<E: Entity>(output_format: &OutputFormat, page: &Page<E>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => output_json(page),
        OutputFormat::Text => {
            println!("{:<38} {:<20} {:<40} {}", "ID", "STATUS", "LABEL", "ACTIONS");
            println!("{}", "-".repeat(110));
            for record in &page.items {
                print_record_row(record);
            }
            println!();
            println!(
                "Page {} ({} per page), {} total",
                page.page, page.per_page, page.total
            );
            Ok(())
        }
    }
}

/// Render a single record: key facts in text mode, the full body in JSON
pub fn output_record<E: Entity>(output_format: &OutputFormat, record: &E) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => output_json(record),
        OutputFormat::Text => {
            println!("ID:      {}", record.id());
            println!("Label:   {}", record.label());
            if let Some(status) = record.status() {
                println!("Status:  {}", status);
            }
            println!("Actions: {}", action_list(record));
            println!();
            println!("{}", serde_yaml::to_string(record)?);
            Ok(())
        }
    }
}

fn print_record_row<E: Entity>(record: &E) {
    println!(
        "{:<38} {:<20} {:<40} {}",
        record.id(),
        record.status().unwrap_or("-"),
        truncate(&record.label(), 40),
        action_list(record)
    );
}

fn action_list<E: Entity>(record: &E) -> String {
    record
        .permitted_actions()
        .actions()
        .iter()
        .map(|a| a.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Parse a YAML or JSON document (JSON is valid YAML)
pub fn parse_document<T: DeserializeOwned>(input: &str) -> anyhow::Result<T> {
    if input.trim().is_empty() {
        return Err(anyhow::anyhow!("Expected a JSON or YAML document on stdin"));
    }
    Ok(serde_yaml::from_str(input)?)
}

/// Read a payload document from stdin
pub fn read_stdin_document<T: DeserializeOwned>() -> anyhow::Result<T> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    parse_document(&input)
}
