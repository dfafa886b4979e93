// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::ConcurrencyLimit;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [engine]
/// concurrency = 4          # or "unbounded"
/// node_timeout = "5s"
/// ```
///
/// Every section and key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub engine: RawEngineSection,
}

/// `[engine]` section as written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawEngineSection {
    /// Maximum simultaneously running node executions.
    #[serde(default)]
    pub concurrency: Option<RawConcurrency>,

    /// Per-node deadline, e.g. `"500ms"` or `"5s"`. No deadline if absent.
    #[serde(default)]
    pub node_timeout: Option<String>,
}

/// `concurrency` accepts either a number or a string such as `"unbounded"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawConcurrency {
    Count(i64),
    Named(String),
}

/// Validated configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub engine: EngineSection,
}

/// Validated `[engine]` settings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSection {
    pub concurrency: ConcurrencyLimit,
    pub node_timeout: Option<Duration>,
}
