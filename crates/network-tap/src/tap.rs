use std::sync::Arc;

use pagetap_core_types::{CaptureOrigin, CorrelationSink};
use tracing::debug;

use crate::config::TapConfig;
use crate::event_style::TappedEventTransport;
use crate::extract::{Extraction, PayloadExtractor};
use crate::fetch::TappedFetch;
use crate::metrics::{TapMetrics, TapSnapshot};
use crate::redact::clip;
use crate::transport::{EventTransport, FetchResponse, FetchTransport};

/// Shared observation pipeline behind both transport decorators.
pub struct NetworkTap {
    config: TapConfig,
    extractor: PayloadExtractor,
    sink: Arc<dyn CorrelationSink>,
    metrics: TapMetrics,
}

impl NetworkTap {
    pub fn new(config: TapConfig, sink: Arc<dyn CorrelationSink>) -> Arc<Self> {
        Arc::new(Self {
            extractor: PayloadExtractor::new(config.extractor.clone()),
            config,
            sink,
            metrics: TapMetrics::default(),
        })
    }

    pub fn wrap_fetch<T>(self: &Arc<Self>, inner: T) -> TappedFetch<T>
    where
        T: FetchTransport,
    {
        TappedFetch::new(inner, Arc::clone(self))
    }

    pub fn wrap_event_transport<T>(self: &Arc<Self>, inner: T) -> TappedEventTransport<T>
    where
        T: EventTransport,
    {
        TappedEventTransport::new(inner, Arc::clone(self))
    }

    pub fn snapshot(&self) -> TapSnapshot {
        self.metrics.snapshot()
    }

    pub(crate) fn metrics(&self) -> &TapMetrics {
        &self.metrics
    }

    pub(crate) fn clip<'a>(&self, text: &'a str) -> std::borrow::Cow<'a, str> {
        clip(text, self.config.max_logged_body_bytes)
    }

    /// Decode a duplicated response body and feed it to extraction.
    pub(crate) async fn observe_response(&self, copy: FetchResponse, origin: CaptureOrigin) {
        match copy.text().await {
            Ok(text) => {
                self.metrics.body_decoded();
                debug!(
                    target: "network_tap.fetch",
                    request = %origin.request,
                    url = %origin.target_url,
                    text = %self.clip(&text),
                    "fetch() response text"
                );
                self.observe_text(&text, &origin);
            }
            Err(err) => {
                self.metrics.body_error();
                debug!(
                    target: "network_tap.fetch",
                    request = %origin.request,
                    %err,
                    "response copy could not be decoded"
                );
            }
        }
    }

    pub(crate) fn observe_text(&self, text: &str, origin: &CaptureOrigin) {
        let outcome = self.extractor.extract(text);
        self.metrics.extraction(&outcome);
        match outcome {
            Extraction::Candidate(candidate) => {
                debug!(
                    target: "network_tap",
                    request = %origin.request,
                    transport = %origin.transport,
                    entry_id = candidate.entry_id.as_deref().unwrap_or("-"),
                    session_id = candidate.session_id.as_deref().unwrap_or("-"),
                    "identifiers found in response"
                );
                self.sink.accept(candidate, origin);
            }
            Extraction::NoIdentifier | Extraction::NotStructured => {}
        }
    }
}
