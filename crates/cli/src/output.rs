//! Output formatting utilities

use advisor_lib::{parse_percentage, Band, Thresholds};
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// Parse a format name from the config file
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "healthy" => status.green().to_string(),
        "degraded" => status.yellow().to_string(),
        "unhealthy" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color a rendered percentage by the band of its unrounded ratio
pub fn color_ratio(text: &str, ratio: f64, thresholds: &Thresholds) -> String {
    match thresholds.classify(ratio) {
        Some(Band::High) => text.red().to_string(),
        Some(Band::Low) => text.yellow().to_string(),
        None => text.green().to_string(),
    }
}

/// Color a rendered percentage when only the rounded text is known
pub fn color_percentage(text: &str, thresholds: &Thresholds) -> String {
    match parse_percentage(text) {
        Ok(ratio) => color_ratio(text, ratio, thresholds),
        Err(_) => text.to_string(),
    }
}
