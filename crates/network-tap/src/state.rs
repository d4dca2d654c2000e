//! Process-wide interception state.
//!
//! Holds the unwrapped host transports and builds the instrumented pair once.
//! Later `install` calls hand back the same pair, so nothing is ever wrapped
//! twice.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use pagetap_core_types::CorrelationSink;
use tracing::info;

use crate::config::TapConfig;
use crate::event_style::TappedEventTransport;
use crate::fetch::TappedFetch;
use crate::metrics::TapSnapshot;
use crate::tap::NetworkTap;
use crate::transport::{EventTransport, FetchTransport};

pub struct InstalledTransports<F, E> {
    pub fetch: Arc<TappedFetch<Arc<F>>>,
    pub event: Arc<TappedEventTransport<Arc<E>>>,
}

pub struct InterceptorState<F, E> {
    original_fetch: Arc<F>,
    original_event: Arc<E>,
    tap: Arc<NetworkTap>,
    installed: OnceCell<InstalledTransports<F, E>>,
}

impl<F, E> InterceptorState<F, E>
where
    F: FetchTransport,
    E: EventTransport,
{
    pub fn new(fetch: F, event: E, sink: Arc<dyn CorrelationSink>, config: TapConfig) -> Self {
        Self {
            original_fetch: Arc::new(fetch),
            original_event: Arc::new(event),
            tap: NetworkTap::new(config, sink),
            installed: OnceCell::new(),
        }
    }

    pub fn install(&self) -> &InstalledTransports<F, E> {
        self.installed.get_or_init(|| {
            info!(target: "network_tap", "transport interception installed");
            InstalledTransports {
                fetch: Arc::new(self.tap.wrap_fetch(Arc::clone(&self.original_fetch))),
                event: Arc::new(
                    self.tap
                        .wrap_event_transport(Arc::clone(&self.original_event)),
                ),
            }
        })
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get().is_some()
    }

    pub fn installed(&self) -> Option<&InstalledTransports<F, E>> {
        self.installed.get()
    }

    pub fn original_fetch(&self) -> &Arc<F> {
        &self.original_fetch
    }

    pub fn original_event(&self) -> &Arc<E> {
        &self.original_event
    }

    pub fn snapshot(&self) -> TapSnapshot {
        self.tap.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ScriptedEventTransport, ScriptedFetch};
    use pagetap_core_types::NullSink;

    #[test]
    fn install_is_idempotent() {
        let state = InterceptorState::new(
            ScriptedFetch::new(),
            ScriptedEventTransport::new(),
            Arc::new(NullSink),
            TapConfig::default(),
        );
        assert!(!state.is_installed());

        let first = state.install();
        let first_fetch = Arc::clone(&first.fetch);
        let first_event = Arc::clone(&first.event);

        let second = state.install();
        assert!(Arc::ptr_eq(&first_fetch, &second.fetch));
        assert!(Arc::ptr_eq(&first_event, &second.event));
        assert!(Arc::ptr_eq(second.fetch.inner(), state.original_fetch()));
        assert!(state.is_installed());
    }
}
