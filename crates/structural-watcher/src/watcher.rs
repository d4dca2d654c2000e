//! Structural watcher: finds matching controls and instruments each one once.
//!
//! `start` subscribes to structural changes before the first full scan, so a
//! control inserted while that scan runs is seen either by the scan or by the
//! change feed. Whichever sees it second finds it already instrumented.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::select;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::WatcherConfig;
use crate::dedup::InstrumentedSet;
use crate::errors::WatcherError;
use crate::events;
use crate::matcher::{control_label, ControlMatcher};
use crate::metrics;
use crate::model::{ClickDiagnostic, MutationRecord, WatcherState};
use crate::ports::{ClickListener, HostDocument, HostElement};

pub struct StructuralWatcher<D: HostDocument> {
    document: Arc<D>,
    matcher: ControlMatcher,
    instrumented: InstrumentedSet<D::Element>,
    clicks: broadcast::Sender<ClickDiagnostic>,
    active_scans: AtomicUsize,
    started: AtomicBool,
}

impl<D: HostDocument> StructuralWatcher<D> {
    pub fn new(document: Arc<D>, config: WatcherConfig) -> Arc<Self> {
        let (clicks, _) = broadcast::channel(config.click_buffer.max(1));
        Arc::new(Self {
            document,
            matcher: ControlMatcher::from_config(&config),
            instrumented: InstrumentedSet::new(),
            clicks,
            active_scans: AtomicUsize::new(0),
            started: AtomicBool::new(false),
        })
    }

    pub fn subscribe_clicks(&self) -> broadcast::Receiver<ClickDiagnostic> {
        self.clicks.subscribe()
    }

    pub fn state(&self) -> WatcherState {
        if self.active_scans.load(Ordering::Acquire) > 0 {
            WatcherState::Scanning
        } else {
            WatcherState::Idle
        }
    }

    /// Live controls currently carrying the click listener.
    pub fn instrumented_count(&self) -> usize {
        self.instrumented.live_len()
    }

    pub fn is_instrumented(&self, element: &D::Element) -> bool {
        self.instrumented.contains(element)
    }

    /// Instrument every matching control in `root`'s subtree, `root` included.
    /// Returns how many were newly instrumented.
    pub fn scan(&self, root: &D::Element) -> usize {
        self.active_scans.fetch_add(1, Ordering::AcqRel);
        let started = Instant::now();

        let mut candidates = 0;
        let mut fresh = 0;
        for element in root.subtree() {
            if !self.matcher.matches(&element) {
                continue;
            }
            candidates += 1;
            let label = control_label(&element);
            if self.instrumented.insert(&element) {
                element.add_click_listener(self.click_listener(), true);
                events::emit_instrumented(&label);
                fresh += 1;
            } else {
                events::emit_duplicate(&label);
            }
        }

        events::emit_scan(candidates, fresh, started.elapsed());
        self.active_scans.fetch_sub(1, Ordering::AcqRel);
        fresh
    }

    /// Scan the whole document once, then follow structural changes on a
    /// background task until the handle is shut down or the feed closes.
    pub fn start(self: &Arc<Self>) -> Result<WatcherHandle, WatcherError> {
        let runtime =
            Handle::try_current().map_err(|err| WatcherError::NoRuntime(err.to_string()))?;
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(WatcherError::AlreadyStarted);
        }

        let mut feed = self.document.observe();
        let initial = self.scan(&self.document.body());
        info!(target: "structural_watcher", initial, "structural watcher started");

        let cancel = CancellationToken::new();
        let shutdown = cancel.clone();
        let watcher = Arc::clone(self);
        let task = runtime.spawn(async move {
            loop {
                select! {
                    _ = shutdown.cancelled() => {
                        debug!(target: "structural_watcher", "structural watcher shutting down");
                        break;
                    }
                    batch = feed.recv() => match batch {
                        Some(records) => watcher.apply(records),
                        None => {
                            debug!(target: "structural_watcher", "mutation feed closed");
                            break;
                        }
                    }
                }
            }
            watcher.instrumented.prune();
        });

        Ok(WatcherHandle {
            cancel,
            task: Some(task),
        })
    }

    fn apply(&self, records: Vec<MutationRecord<D::Element>>) {
        metrics::record_mutation_batch();
        for record in records {
            for node in record.added_nodes {
                if node.is_element() {
                    self.scan(&node);
                }
            }
        }
        self.instrumented.prune();
    }

    fn click_listener(&self) -> ClickListener<D::Element> {
        let clicks = self.clicks.clone();
        Arc::new(move |control: &D::Element| {
            let diagnostic = ClickDiagnostic {
                control_label: control_label(control),
                form_entries: control.closest("form").map(|form| form.form_entries()),
                observed_at: Utc::now(),
            };
            events::emit_click(&diagnostic);
            let _ = clicks.send(diagnostic);
        })
    }
}

/// Owns the background loop started by [`StructuralWatcher::start`].
pub struct WatcherHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    /// Stop following changes and wait for the loop to exit. Controls that
    /// were already instrumented keep their listener.
    pub async fn shutdown(mut self) -> Result<(), tokio::task::JoinError> {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            match task.await {
                Ok(_) => Ok(()),
                Err(err) if err.is_cancelled() => Ok(()),
                Err(err) => Err(err),
            }
        } else {
            Ok(())
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryDocument, MemoryElement};

    fn post_button() -> MemoryElement {
        MemoryElement::element("button").with_text("Submit Post")
    }

    #[test]
    fn scan_is_idempotent() {
        let doc = Arc::new(MemoryDocument::new());
        let button = post_button();
        doc.append(&doc.body(), button.clone());
        let watcher = StructuralWatcher::new(Arc::clone(&doc), WatcherConfig::default());

        assert_eq!(watcher.scan(&doc.body()), 1);
        assert_eq!(watcher.scan(&doc.body()), 0);
        assert_eq!(button.listener_count(), 1);
        assert_eq!(watcher.state(), WatcherState::Idle);
    }

    #[test]
    fn non_matching_and_text_nodes_are_skipped() {
        let doc = Arc::new(MemoryDocument::new());
        let body = doc.body();
        doc.append(&body, MemoryElement::element("button").with_text("Cancel"));
        doc.append(&body, MemoryElement::element("a").with_text("Post"));
        doc.append(&body, MemoryElement::text("Post"));
        doc.append(
            &body,
            MemoryElement::element("input")
                .with_attr("type", "submit")
                .with_value("New Post"),
        );
        let watcher = StructuralWatcher::new(doc, WatcherConfig::default());

        assert_eq!(watcher.scan(&body), 1);
        assert_eq!(watcher.instrumented_count(), 1);
    }

    #[test]
    fn start_requires_a_runtime() {
        let watcher =
            StructuralWatcher::new(Arc::new(MemoryDocument::new()), WatcherConfig::default());
        assert!(matches!(watcher.start(), Err(WatcherError::NoRuntime(_))));
    }

    #[tokio::test]
    async fn click_publishes_label_and_form_snapshot() {
        let doc = Arc::new(MemoryDocument::new());
        let button = post_button();
        let form = MemoryElement::element("form")
            .with_child(
                MemoryElement::element("input")
                    .with_attr("name", "com")
                    .with_value("hello"),
            )
            .with_child(button.clone());
        doc.append(&doc.body(), form);
        let loose = MemoryElement::element("button").with_text("Post");
        doc.append(&doc.body(), loose.clone());

        let watcher = StructuralWatcher::new(Arc::clone(&doc), WatcherConfig::default());
        let mut clicks = watcher.subscribe_clicks();
        assert_eq!(watcher.scan(&doc.body()), 2);

        button.click();
        let seen = clicks.recv().await.expect("diagnostic");
        assert_eq!(seen.control_label, "Submit Post");
        assert_eq!(
            seen.form_entries,
            Some(vec![("com".to_string(), "hello".to_string())])
        );

        loose.click();
        let seen = clicks.recv().await.expect("diagnostic");
        assert_eq!(seen.control_label, "Post");
        assert_eq!(seen.form_entries, None);
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let watcher =
            StructuralWatcher::new(Arc::new(MemoryDocument::new()), WatcherConfig::default());
        let handle = watcher.start().expect("first start");
        assert_eq!(watcher.start().err(), Some(WatcherError::AlreadyStarted));
        handle.shutdown().await.expect("shutdown");
    }
}
