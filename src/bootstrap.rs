//! Page start-up: the single place where the store, the transport interceptor
//! and the structural watcher are put together.

use std::sync::Arc;

use anyhow::{Context, Result};
use network_tap::{
    EventTransport, FetchTransport, InterceptorState, TapSnapshot, TappedEventTransport,
    TappedFetch,
};
use pagetap_core_types::PageContext;
use pagetap_correlation_store::{CorrelationStore, KvStore};
use structural_watcher::{ClickDiagnostic, HostDocument, StructuralWatcher, WatcherHandle};
use tokio::sync::broadcast;
use tracing::info;

use crate::config::PageTapConfig;

/// What the host page hands over at start-up.
pub struct HostEnvironment<F, E, D> {
    pub fetch: F,
    pub event: E,
    pub document: Arc<D>,
    pub kv: Arc<dyn KvStore>,
    pub page: PageContext,
}

/// A running instrumentation session for one page.
pub struct PageTap<F, E, D>
where
    D: HostDocument,
{
    store: Arc<CorrelationStore>,
    interceptor: InterceptorState<F, E>,
    watcher: Arc<StructuralWatcher<D>>,
    watcher_handle: Option<WatcherHandle>,
}

impl<F, E, D> PageTap<F, E, D>
where
    F: FetchTransport,
    E: EventTransport,
    D: HostDocument,
{
    /// Install interception, then start watching the document.
    ///
    /// Must be called from inside a tokio runtime; the watcher loop and the
    /// fetch body decoding both run on it.
    pub fn start(host: HostEnvironment<F, E, D>, config: PageTapConfig) -> Result<Self> {
        let store = Arc::new(CorrelationStore::new(
            host.kv,
            config.store.clone(),
            host.page,
        ));
        let interceptor =
            InterceptorState::new(host.fetch, host.event, store.clone(), config.tap_config());
        interceptor.install();

        let watcher = StructuralWatcher::new(host.document, config.watcher.clone());
        let watcher_handle = watcher.start().context("Failed to start structural watcher")?;

        info!(
            history = store.len(),
            keyword = %config.watcher.keyword,
            "pagetap started"
        );

        Ok(Self {
            store,
            interceptor,
            watcher,
            watcher_handle: Some(watcher_handle),
        })
    }

    /// The promise-style transport the page should call from now on.
    pub fn fetch(&self) -> Arc<TappedFetch<Arc<F>>> {
        Arc::clone(&self.interceptor.install().fetch)
    }

    /// The open/send transport the page should call from now on.
    pub fn event_transport(&self) -> Arc<TappedEventTransport<Arc<E>>> {
        Arc::clone(&self.interceptor.install().event)
    }

    pub fn store(&self) -> &Arc<CorrelationStore> {
        &self.store
    }

    pub fn interceptor(&self) -> &InterceptorState<F, E> {
        &self.interceptor
    }

    pub fn watcher(&self) -> &Arc<StructuralWatcher<D>> {
        &self.watcher
    }

    pub fn subscribe_clicks(&self) -> broadcast::Receiver<ClickDiagnostic> {
        self.watcher.subscribe_clicks()
    }

    pub fn tap_snapshot(&self) -> TapSnapshot {
        self.interceptor.snapshot()
    }

    /// Stop following document changes. Interception stays installed, as do
    /// listeners already attached to controls.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.watcher_handle.take() {
            handle
                .shutdown()
                .await
                .context("Structural watcher loop panicked")?;
        }
        info!("pagetap watcher stopped");
        Ok(())
    }
}
