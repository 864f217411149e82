//! CLI subcommands and the backend they run against

pub mod analyze;
pub mod chat;
pub mod health;
pub mod usage;

use advisor_lib::{
    ChatIntent, ChatResponse, ResourceAnalysis, ResourceSnapshot, ResourceUsage, UsageCollector,
    UtilizationPolicy,
};
use anyhow::{Context, Result};

use crate::client::ApiClient;

/// Where snapshots come from: the advisor service or a direct cluster read
pub enum Backend {
    Remote(ApiClient),
    Local {
        collector: UsageCollector,
        policy: UtilizationPolicy,
    },
}

impl Backend {
    pub fn policy(&self) -> UtilizationPolicy {
        match self {
            Backend::Remote(_) => UtilizationPolicy::default(),
            Backend::Local { policy, .. } => *policy,
        }
    }

    pub async fn usage(&self) -> Result<ResourceUsage> {
        Ok(self.usage_with_snapshot().await?.0)
    }

    /// Usage report plus the unrounded snapshot when collected locally
    pub async fn usage_with_snapshot(&self) -> Result<(ResourceUsage, Option<ResourceSnapshot>)> {
        match self {
            Backend::Remote(client) => Ok((client.resource_usage().await?, None)),
            Backend::Local { collector, .. } => {
                let snapshot = collector
                    .collect_usage()
                    .await
                    .context("Failed to collect cluster usage")?;
                Ok((ResourceUsage::from(&snapshot), Some(snapshot)))
            }
        }
    }

    pub async fn analysis(&self) -> Result<ResourceAnalysis> {
        match self {
            Backend::Remote(client) => client.analysis().await,
            Backend::Local { collector, policy } => {
                let snapshot = collector
                    .collect_usage()
                    .await
                    .context("Failed to collect cluster usage")?;
                let recommendations = policy.analyze(&snapshot)?;
                Ok(ResourceAnalysis::from(recommendations.as_slice()))
            }
        }
    }

    pub async fn chat(&self, message: &str) -> Result<ChatResponse> {
        match self {
            Backend::Remote(client) => client.chat(message).await,
            Backend::Local { .. } => Ok(match ChatIntent::classify(message) {
                ChatIntent::Usage => ChatResponse::usage(self.usage().await?),
                ChatIntent::Analysis => ChatResponse::analysis(self.analysis().await?),
                ChatIntent::Unknown => ChatResponse::help(),
            }),
        }
    }
}
