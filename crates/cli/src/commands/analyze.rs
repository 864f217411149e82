//! `radv analyze`: threshold recommendations

use advisor_lib::ResourceAnalysis;
use anyhow::Result;
use colored::Colorize;

use super::Backend;
use crate::output::{print_info, print_json, OutputFormat};

pub async fn show_analysis(backend: &Backend, format: OutputFormat) -> Result<()> {
    let analysis = backend.analysis().await?;
    render(&analysis, format)
}

pub(crate) fn render(analysis: &ResourceAnalysis, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(analysis)?,
        OutputFormat::Table => {
            if analysis.recommendations.is_empty() {
                print_info("All nodes are within the configured utilization bands");
                return Ok(());
            }

            println!("{}", "Recommendations".bold());
            for (i, recommendation) in analysis.recommendations.iter().enumerate() {
                println!("  {}. {}", i + 1, recommendation);
            }
        }
    }

    Ok(())
}
