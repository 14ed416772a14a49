//! Settings for the gather pipeline.
//!
//! Stored as a machine-readable TOML file when the embedding application
//! wants persistent defaults; every value can also be built in code. All
//! behavior toggles that vary per call live on `GatherOptions` instead;
//! nothing here is read from the process environment.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Root settings handed to the orchestrator at construction.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatherSettings {
    /// Outbound HTTP defaults shared by all provider fetchers.
    #[serde(default)]
    pub http: HttpSettings,
    /// Generative-model collaborator defaults (expansion and re-ranking).
    #[serde(default)]
    pub model: ModelSettings,
}

impl GatherSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        toml::from_str(&raw)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings dir {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, raw)
            .with_context(|| format!("Failed to write settings file {}", path.display()))
    }
}

/// Outbound HTTP defaults for provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout applied to every provider call.
    #[serde(default = "default_http_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Contact address forwarded to providers that run a polite pool.
    #[serde(default)]
    pub mailto: Option<String>,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_http_timeout_ms(),
            user_agent: default_user_agent(),
            mailto: None,
        }
    }
}

/// Defaults for generative-model calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_model_name")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Per-call timeout; a timed-out call degrades to the deterministic path.
    #[serde(default = "default_model_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: default_model_name(),
            temperature: default_temperature(),
            timeout_ms: default_model_timeout_ms(),
        }
    }
}

const fn default_http_timeout_ms() -> u64 {
    12_000
}

fn default_user_agent() -> String {
    concat!("referencebase/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_model_name() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_temperature() -> f32 {
    0.2
}

const fn default_model_timeout_ms() -> u64 {
    10_000
}
