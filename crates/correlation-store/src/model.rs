use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted capture. Field names match the on-disk history document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationRecord {
    #[serde(default)]
    pub session_id: Option<String>,
    pub entry_id: String,
    pub captured_at: DateTime<Utc>,
    pub source_context: String,
}

/// Most recent value ever seen for each identifier, tracked independently.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestPointers {
    pub last_entry_id: Option<String>,
    pub last_session_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Record appended; `history_len` counts it.
    Persisted {
        record: CorrelationRecord,
        history_len: usize,
    },
    /// No entry id, but a session id moved the session pointer.
    PointersOnly,
    /// Nothing usable in the candidate.
    Ignored,
}

impl AppendOutcome {
    pub fn persisted(&self) -> bool {
        matches!(self, AppendOutcome::Persisted { .. })
    }
}
