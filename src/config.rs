//! Aggregated configuration, loadable from YAML.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use network_tap::{ExtractorConfig, TapConfig};
use pagetap_correlation_store::StoreConfig;
use serde::{Deserialize, Serialize};
use structural_watcher::WatcherConfig;
use tracing::info;

/// Every section is optional; missing sections and fields take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageTapConfig {
    pub store: StoreConfig,
    pub extractor: ExtractorConfig,
    pub tap: TapSection,
    pub watcher: WatcherConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapSection {
    pub max_logged_body_bytes: usize,
}

impl Default for TapSection {
    fn default() -> Self {
        Self {
            max_logged_body_bytes: TapConfig::default().max_logged_body_bytes,
        }
    }
}

impl PageTapConfig {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).context("Failed to parse pagetap config")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_yaml_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Network tap settings with the extractor section folded in.
    pub fn tap_config(&self) -> TapConfig {
        TapConfig {
            max_logged_body_bytes: self.tap.max_logged_body_bytes,
            extractor: self.extractor.clone(),
        }
    }
}
