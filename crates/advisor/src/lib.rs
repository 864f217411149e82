//! Resource advisor service
//!
//! HTTP front end over the advisor library: per-node usage reports,
//! threshold analysis, a keyword chat endpoint, health probes and metrics.

pub mod api;
pub mod config;
