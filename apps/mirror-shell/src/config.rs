//! Shell configuration

use anyhow::Context;
use capture_session::SessionConfig;
use serde::Deserialize;
use shared_protocol::PlatformCapabilities;
use std::path::Path;

/// Shell configuration, read once at startup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Platform API level the shell runs against
    pub api_level: u32,
    /// Notification channel and texts
    pub session: SessionConfig,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            api_level: 34,
            session: SessionConfig::default(),
        }
    }
}

impl ShellConfig {
    /// Load from a JSON file, or fall back to defaults when no path is given
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Platform capabilities, resolved once for the process
    pub fn capabilities(&self) -> anyhow::Result<PlatformCapabilities> {
        Ok(PlatformCapabilities::for_api_level(self.api_level)?)
    }
}
