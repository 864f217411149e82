//! `radv health`: advisor service component status

use anyhow::Result;
use tabled::Tabled;

use super::Backend;
use crate::output::{color_status, print_json, OutputFormat};

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
}

pub async fn show_health(backend: &Backend, format: OutputFormat) -> Result<()> {
    let client = match backend {
        Backend::Remote(client) => client,
        Backend::Local { .. } => {
            anyhow::bail!("health is reported by the advisor service; run without --local or --snapshot-file")
        }
    };

    let health = client.health().await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!(
                "Advisor at {}: {}",
                client.base_url(),
                color_status(health.status.as_str())
            );

            let mut rows: Vec<ComponentRow> = health
                .components
                .iter()
                .map(|(name, component)| ComponentRow {
                    name: name.clone(),
                    status: color_status(component.status.as_str()),
                    message: component.message.clone().unwrap_or_else(|| "-".to_string()),
                })
                .collect();
            rows.sort_by(|a, b| a.name.cmp(&b.name));

            let table = tabled::Table::new(rows)
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    Ok(())
}
