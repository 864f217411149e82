//! Keyword routing for conversational queries

use crate::report::{ResourceAnalysis, ResourceUsage};
use serde::{Deserialize, Serialize};

pub const USAGE_REPLY: &str = "Here's the current resource usage:";
pub const ANALYSIS_REPLY: &str = "Here's the resource analysis and optimization suggestions:";
pub const HELP_REPLY: &str =
    "I'm not sure how to help with that. You can ask about resource usage or optimization.";

/// What a chat message is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatIntent {
    Usage,
    Analysis,
    Unknown,
}

impl ChatIntent {
    /// Case-insensitive keyword match; usage wins when both keywords appear
    pub fn classify(message: &str) -> Self {
        let text = message.to_lowercase();
        if text.contains("resource usage") {
            ChatIntent::Usage
        } else if text.contains("optimize") {
            ChatIntent::Analysis
        } else {
            ChatIntent::Unknown
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Report attached to a chat reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatData {
    Usage(ResourceUsage),
    Analysis(ResourceAnalysis),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ChatData>,
}

impl ChatResponse {
    pub fn usage(usage: ResourceUsage) -> Self {
        Self {
            response: USAGE_REPLY.to_string(),
            data: Some(ChatData::Usage(usage)),
        }
    }

    pub fn analysis(analysis: ResourceAnalysis) -> Self {
        Self {
            response: ANALYSIS_REPLY.to_string(),
            data: Some(ChatData::Analysis(analysis)),
        }
    }

    pub fn help() -> Self {
        Self {
            response: HELP_REPLY.to_string(),
            data: None,
        }
    }
}
