//! `radv usage`: per-node utilization table

use advisor_lib::{Resource, ResourceSnapshot, ResourceUsage, UtilizationPolicy};
use anyhow::Result;
use tabled::Tabled;

use super::Backend;
use crate::output::{color_percentage, color_ratio, print_json, print_warning, OutputFormat};

/// Row for the usage table
#[derive(Tabled)]
struct UsageRow {
    #[tabled(rename = "Node")]
    name: String,
    #[tabled(rename = "CPU")]
    cpu_usage: String,
    #[tabled(rename = "Memory")]
    memory_usage: String,
    #[tabled(rename = "Pods")]
    pod_count: usize,
}

pub async fn show_usage(backend: &Backend, format: OutputFormat) -> Result<()> {
    let (usage, snapshot) = backend.usage_with_snapshot().await?;
    render(&usage, snapshot.as_ref(), &backend.policy(), format)
}

/// Render a usage report; colors come from `snapshot` ratios when present
pub(crate) fn render(
    usage: &ResourceUsage,
    snapshot: Option<&ResourceSnapshot>,
    policy: &UtilizationPolicy,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(usage)?,
        OutputFormat::Table => {
            if usage.nodes.is_empty() {
                print_warning("No nodes found");
                return Ok(());
            }

            let table = tabled::Table::new(usage_rows(usage, snapshot, policy))
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
            println!("\nTotal: {} nodes", usage.nodes.len());
        }
    }

    Ok(())
}

fn usage_rows(
    usage: &ResourceUsage,
    snapshot: Option<&ResourceSnapshot>,
    policy: &UtilizationPolicy,
) -> Vec<UsageRow> {
    usage
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| {
            let node = snapshot
                .and_then(|s| s.nodes.get(i))
                .filter(|node| node.name == n.name);
            let color = |text: &str, resource: Resource| {
                let thresholds = policy.thresholds(resource);
                match node {
                    Some(node) => color_ratio(text, node.ratio(resource), thresholds),
                    None => color_percentage(text, thresholds),
                }
            };

            UsageRow {
                name: n.name.clone(),
                cpu_usage: color(&n.cpu_usage, Resource::Cpu),
                memory_usage: color(&n.memory_usage, Resource::Memory),
                pod_count: n.pod_count,
            }
        })
        .collect()
}
