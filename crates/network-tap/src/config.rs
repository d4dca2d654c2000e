//! Configuration types for the network tap.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TapConfig {
    /// Request and response bodies longer than this are cut in trace output.
    pub max_logged_body_bytes: usize,
    pub extractor: ExtractorConfig,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self {
            max_logged_body_bytes: 2048,
            extractor: ExtractorConfig::default(),
        }
    }
}

/// Field names checked in a parsed response, in priority order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub entry_fields: Vec<String>,
    pub session_fields: Vec<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            entry_fields: vec!["entryId".into(), "pid".into()],
            session_fields: vec!["sessionId".into(), "tid".into()],
        }
    }
}
