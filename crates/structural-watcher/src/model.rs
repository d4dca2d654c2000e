use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatcherState {
    Scanning,
    Idle,
}

/// Nodes inserted by one structural change.
#[derive(Clone, Debug)]
pub struct MutationRecord<E> {
    pub added_nodes: Vec<E>,
}

/// What a click on an instrumented control saw. Diagnostic output only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickDiagnostic {
    pub control_label: String,
    /// `None` when the control has no enclosing form.
    pub form_entries: Option<Vec<(String, String)>>,
    pub observed_at: DateTime<Utc>,
}
