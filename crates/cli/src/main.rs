//! Node Resource Advisor CLI
//!
//! Queries per-node utilization and capacity recommendations, either from a
//! running advisor service or directly from the cluster.

mod client;
mod commands;
mod config;
mod output;

use advisor_lib::{
    ClusterConfig, KubeClusterSource, StaticClusterSource, UsageCollector, UtilizationPolicy,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{analyze, chat, health, usage, Backend};
use output::{print_error, OutputFormat};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Node Resource Advisor CLI
#[derive(Parser)]
#[command(name = "radv")]
#[command(author, version, about = "CLI for the Node Resource Advisor", long_about = None)]
pub struct Cli {
    /// API endpoint URL (can also be set via RADV_API_URL env var)
    #[arg(long, env = "RADV_API_URL")]
    pub api_url: Option<String>,

    /// Path to kubeconfig file used with --local
    #[arg(long, env = "KUBECONFIG")]
    pub kubeconfig: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub format: Option<OutputFormat>,

    /// Read the cluster directly instead of calling the advisor service
    #[arg(long)]
    pub local: bool,

    /// Analyze exported cluster state from a JSON file
    #[arg(long, conflicts_with = "local")]
    pub snapshot_file: Option<PathBuf>,

    /// Per-query timeout in seconds for local collection
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show per-node CPU and memory utilization
    Usage,

    /// Show capacity recommendations
    Analyze,

    /// Ask about resource usage or optimization
    Chat {
        /// Message, e.g. "show resource usage" or "how can I optimize?"
        message: String,
    },

    /// Show advisor service health
    Health,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = config::Config::load()?;
    let format = cli
        .format
        .or_else(|| config.default_format.as_deref().and_then(OutputFormat::from_name))
        .unwrap_or_default();

    let backend = build_backend(&cli, &config).await?;

    match cli.command {
        Commands::Usage => usage::show_usage(&backend, format).await?,
        Commands::Analyze => analyze::show_analysis(&backend, format).await?,
        Commands::Chat { message } => chat::chat(&backend, &message, format).await?,
        Commands::Health => health::show_health(&backend, format).await?,
    }

    Ok(())
}

async fn build_backend(cli: &Cli, config: &config::Config) -> Result<Backend> {
    let timeout = Duration::from_secs(cli.timeout);

    if let Some(path) = &cli.snapshot_file {
        let source = load_snapshot_file(path)?;
        return Ok(local_backend(Arc::new(source), timeout));
    }

    if cli.local {
        let kubeconfig = config::kubeconfig_path(cli.kubeconfig.as_deref())?;
        let cluster = ClusterConfig {
            config_file_path: kubeconfig.exists().then_some(kubeconfig),
            request_timeout: Some(timeout),
            ..ClusterConfig::default()
        };
        let source = KubeClusterSource::connect(&cluster)
            .await
            .context("Failed to configure cluster API client")?;
        return Ok(local_backend(Arc::new(source), timeout));
    }

    let client = client::ApiClient::new(&config.api_url(cli.api_url.as_deref()))?;
    Ok(Backend::Remote(client))
}

fn local_backend(source: Arc<dyn advisor_lib::ClusterSource>, timeout: Duration) -> Backend {
    Backend::Local {
        collector: UsageCollector::new(source).with_query_timeout(timeout),
        policy: UtilizationPolicy::default(),
    }
}

fn load_snapshot_file(path: &Path) -> Result<StaticClusterSource> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;
    serde_json::from_str(&content).context("Failed to parse snapshot file")
}
