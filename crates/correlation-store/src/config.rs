//! Persistence keys used by the correlation store.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub history_key: String,
    pub last_entry_key: String,
    pub last_session_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_key: "correlationHistory".into(),
            last_entry_key: "lastEntryId".into(),
            last_session_key: "lastSessionId".into(),
        }
    }
}
