use std::path::Path;

use clap::ValueEnum;
use serde_json::json;
use statusmon_state::{StatusEntry, StatusReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Print the stored status of every service.
pub fn status(database: &Path, format: OutputFormat) -> anyhow::Result<()> {
    if !database.exists() {
        anyhow::bail!("status database not found: {}", database.display());
    }
    let reader = StatusReader::open(database)?;
    let entries = reader.list()?;
    println!("{}", render(&entries, format)?);
    Ok(())
}

fn render(entries: &[StatusEntry], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = entries
                .iter()
                .map(|e| json!({ "service": e.service, "status": e.status }))
                .collect();
            Ok(serde_json::to_string_pretty(&rows)?)
        }
        OutputFormat::Text => {
            if entries.is_empty() {
                return Ok("no services recorded yet".to_string());
            }
            let width = entries.iter().map(|e| e.service.len()).max().unwrap_or(0);
            let lines: Vec<String> = entries
                .iter()
                .map(|e| {
                    let status = e.status.map(|s| s.as_str()).unwrap_or("<unreadable>");
                    format!("{:<width$}  {status}", e.service)
                })
                .collect();
            Ok(lines.join("\n"))
        }
    }
}
