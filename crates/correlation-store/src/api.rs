//! Append-only correlation history.
//!
//! The history lives under a single key as a pretty-printed JSON array and is
//! rewritten in full on every append. Appends through one store are serialized
//! by `append_lock`; another writer on the same backing store that interleaves
//! between our read and write still wins (its copy of the array replaces ours).

use std::sync::Arc;

use chrono::Utc;
use pagetap_core_types::{CaptureOrigin, CorrelationCandidate, CorrelationSink, PageContext};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::errors::StoreError;
use crate::kv::KvStore;
use crate::metrics::{StoreMetrics, StoreMetricsSnapshot};
use crate::model::{AppendOutcome, CorrelationRecord, LatestPointers};

pub type StoreResult<T> = Result<T, StoreError>;

pub struct CorrelationStore {
    kv: Arc<dyn KvStore>,
    config: StoreConfig,
    page: PageContext,
    append_lock: Mutex<()>,
    metrics: StoreMetrics,
}

impl CorrelationStore {
    pub fn new(kv: Arc<dyn KvStore>, config: StoreConfig, page: PageContext) -> Self {
        Self {
            kv,
            config,
            page,
            append_lock: Mutex::new(()),
            metrics: StoreMetrics::default(),
        }
    }

    pub fn metrics(&self) -> StoreMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Persist a record when the candidate carries an entry id, and move the
    /// latest pointers for every usable field either way.
    ///
    /// A failed history write is returned only after the pointers have been
    /// updated.
    pub fn append(&self, candidate: &CorrelationCandidate) -> StoreResult<AppendOutcome> {
        let entry_id = usable(candidate.entry_id.as_deref());
        let session_id = usable(candidate.session_id.as_deref());
        if entry_id.is_none() && session_id.is_none() {
            self.metrics.record_ignored();
            return Ok(AppendOutcome::Ignored);
        }

        // Pointers are written under the same lock as the history so they
        // always name the last record persisted through this store.
        let guard = self.append_lock.lock();
        let persisted = entry_id.map(|entry| {
            let record = CorrelationRecord {
                session_id: session_id.map(str::to_string),
                entry_id: entry.to_string(),
                captured_at: Utc::now(),
                source_context: self.page.location(),
            };
            self.push_record(record)
        });
        let pointers = self.update_pointers(entry_id, session_id);
        drop(guard);

        match persisted {
            Some(Ok((record, history_len))) => {
                pointers?;
                self.metrics.record_appended();
                info!(
                    target: "correlation_store",
                    entry_id = %record.entry_id,
                    session_id = record.session_id.as_deref().unwrap_or("-"),
                    history_len,
                    "correlation record saved"
                );
                Ok(AppendOutcome::Persisted {
                    record,
                    history_len,
                })
            }
            Some(Err(err)) => {
                self.metrics.record_write_error();
                Err(err)
            }
            None => {
                pointers?;
                self.metrics.record_pointers_only();
                debug!(
                    target: "correlation_store",
                    session_id = session_id.unwrap_or("-"),
                    "session pointer updated without entry id"
                );
                Ok(AppendOutcome::PointersOnly)
            }
        }
    }

    /// Full history in capture order. Missing or unreadable state reads as empty.
    pub fn read_all(&self) -> Vec<CorrelationRecord> {
        self.load_history()
    }

    pub fn len(&self) -> usize {
        self.load_history().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn latest(&self) -> LatestPointers {
        LatestPointers {
            last_entry_id: self.read_scalar(&self.config.last_entry_key),
            last_session_id: self.read_scalar(&self.config.last_session_key),
        }
    }

    // Caller holds `append_lock`.
    fn push_record(&self, record: CorrelationRecord) -> StoreResult<(CorrelationRecord, usize)> {
        let mut history = self.load_history();
        history.push(record.clone());
        let encoded = serde_json::to_string_pretty(&history)?;
        self.kv.set(&self.config.history_key, &encoded)?;
        Ok((record, history.len()))
    }

    fn update_pointers(&self, entry_id: Option<&str>, session_id: Option<&str>) -> StoreResult<()> {
        let mut first_err = None;
        let slots = [
            (&self.config.last_entry_key, entry_id),
            (&self.config.last_session_key, session_id),
        ];
        for (key, value) in slots {
            let Some(value) = value else {
                continue;
            };
            if let Err(err) = self.kv.set(key, value) {
                warn!(
                    target: "correlation_store",
                    key = %key,
                    %err,
                    "failed to update latest pointer"
                );
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn load_history(&self) -> Vec<CorrelationRecord> {
        let raw = match self.kv.get(&self.config.history_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(target: "correlation_store", %err, "history unreadable; treating as empty");
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(history) => history,
            Err(err) => {
                self.metrics.record_history_reset();
                warn!(
                    target: "correlation_store",
                    %err,
                    "failed to parse existing history, resetting"
                );
                Vec::new()
            }
        }
    }

    fn read_scalar(&self, key: &str) -> Option<String> {
        match self.kv.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(target: "correlation_store", key, %err, "latest pointer unreadable");
                None
            }
        }
    }
}

impl CorrelationSink for CorrelationStore {
    fn accept(&self, candidate: CorrelationCandidate, origin: &CaptureOrigin) {
        match self.append(&candidate) {
            Ok(outcome) => debug!(
                target: "correlation_store",
                request = %origin.request,
                transport = %origin.transport,
                url = %origin.target_url,
                persisted = outcome.persisted(),
                "candidate accepted"
            ),
            Err(err) => warn!(
                target: "correlation_store",
                request = %origin.request,
                url = %origin.target_url,
                %err,
                "failed to persist correlation record"
            ),
        }
    }
}

// Any non-empty value counts and is stored exactly as given.
fn usable(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
