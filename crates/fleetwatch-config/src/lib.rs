//! fleetwatch configuration.
//!
//! A config file lists the services whose rollout is being watched, plus an
//! environment token used to materialize address templates before polling
//! starts. Configuration problems are fatal: they are surfaced before the
//! poll loop runs, never during it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or materializing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("unresolved placeholder in address template: {0}")]
    UnresolvedPlaceholder(String),
}

/// Top-level config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Environment token substituted for `{env}` in address templates.
    pub env: Option<String>,
    /// Seconds between polling rounds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Services to watch.
    #[serde(default)]
    pub services: Vec<ServiceEntry>,
}

fn default_poll_interval() -> u64 {
    3
}

/// One `[[services]]` block as written in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    /// Address template; may embed `{env}`.
    pub url: String,
    /// Path of the version endpoint on each instance.
    pub version_endpoint: String,
    /// Target version, pre-formatted with the same `v` prefix the prober
    /// applies to instance responses.
    pub target_version: String,
    /// Exact number of instances expected to report the target version.
    pub expected_nodes: u32,
}

/// A materialized service spec: template resolved, ready for the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    pub url: String,
    pub version_endpoint: String,
    pub target_version: String,
    pub expected_nodes: u32,
}

impl Config {
    /// Load a config file from disk.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Materialize address templates into ready-to-poll service specs.
    ///
    /// Fails if any template still contains a placeholder after
    /// substitution (e.g. `{env}` used without `env` configured).
    pub fn service_specs(&self) -> ConfigResult<Vec<ServiceSpec>> {
        self.services
            .iter()
            .map(|entry| {
                let url = match &self.env {
                    Some(env) => entry.url.replace("{env}", env),
                    None => entry.url.clone(),
                };
                if url.contains('{') {
                    return Err(ConfigError::UnresolvedPlaceholder(url));
                }
                Ok(ServiceSpec {
                    name: entry.name.clone(),
                    url,
                    version_endpoint: entry.version_endpoint.clone(),
                    target_version: entry.target_version.clone(),
                    expected_nodes: entry.expected_nodes,
                })
            })
            .collect()
    }
}
