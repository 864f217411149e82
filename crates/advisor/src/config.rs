//! Advisor service configuration

use advisor_lib::{ClusterConfig, Thresholds, UtilizationPolicy, DEFAULT_HIGH_THRESHOLD, DEFAULT_LOW_THRESHOLD};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an optional configuration file
pub const CONFIG_FILE_ENV: &str = "ADVISOR_CONFIG_FILE";

/// Advisor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
    /// Instance name used in structured logs
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// HTTP port for the API, health and metrics endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Kubeconfig to load instead of the inferred default
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,

    /// Replacement API server URL
    #[serde(default)]
    pub override_host: Option<String>,

    /// Skip TLS verification for the override host
    #[serde(default)]
    pub insecure_skip_verify: bool,

    /// Timeout for each cluster API query in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_low_threshold")]
    pub cpu_low_threshold: f64,

    #[serde(default = "default_high_threshold")]
    pub cpu_high_threshold: f64,

    #[serde(default = "default_low_threshold")]
    pub memory_low_threshold: f64,

    #[serde(default = "default_high_threshold")]
    pub memory_high_threshold: f64,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "resource-advisor".to_string())
}

fn default_api_port() -> u16 {
    8089
}

fn default_request_timeout() -> u64 {
    10
}

fn default_low_threshold() -> f64 {
    DEFAULT_LOW_THRESHOLD
}

fn default_high_threshold() -> f64 {
    DEFAULT_HIGH_THRESHOLD
}

impl AdvisorConfig {
    /// Load configuration from `ADVISOR_CONFIG_FILE` (or `advisor.toml`) and
    /// `ADVISOR_*` environment variables
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_FILE_ENV).map(PathBuf::from).ok();
        Self::load_from(file.as_deref())
    }

    /// Load configuration layering an optional file under the environment
    pub fn load_from(file: Option<&Path>) -> Result<Self> {
        let file_source = match file {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("advisor").required(false),
        };

        let config = config::Config::builder()
            .add_source(file_source)
            .add_source(config::Environment::with_prefix("ADVISOR").try_parsing(true))
            .build()
            .context("Failed to read advisor configuration")?;

        config
            .try_deserialize()
            .context("Invalid advisor configuration")
    }

    pub fn cluster_config(&self) -> ClusterConfig {
        ClusterConfig {
            config_file_path: self.kubeconfig.clone(),
            override_host: self.override_host.clone(),
            insecure_skip_verify: self.insecure_skip_verify,
            request_timeout: Some(self.request_timeout()),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn policy(&self) -> Result<UtilizationPolicy> {
        let cpu = Thresholds::new(self.cpu_low_threshold, self.cpu_high_threshold)
            .context("Invalid CPU thresholds")?;
        let memory = Thresholds::new(self.memory_low_threshold, self.memory_high_threshold)
            .context("Invalid memory thresholds")?;
        Ok(UtilizationPolicy::new(cpu, memory)?)
    }
}
