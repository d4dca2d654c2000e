use std::sync::Arc;

use pagetap_core_types::{CaptureOrigin, RequestId, TransportKind};
use parking_lot::Mutex;
use tracing::debug;

use crate::tap::NetworkTap;
use crate::transport::{EventRequest, EventTransport, LoadEvent, LoadListener, TransportError};

/// What `open` recorded for the request currently being prepared on a handle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingRequestContext {
    pub request: RequestId,
    pub method: String,
    pub target_url: String,
}

pub struct TappedEventTransport<T> {
    inner: T,
    tap: Arc<NetworkTap>,
}

impl<T> TappedEventTransport<T>
where
    T: EventTransport,
{
    pub fn new(inner: T, tap: Arc<NetworkTap>) -> Self {
        Self { inner, tap }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl<T> EventTransport for TappedEventTransport<T>
where
    T: EventTransport,
{
    type Request = TappedRequest<T::Request>;

    fn create_request(&self) -> Self::Request {
        TappedRequest {
            inner: self.inner.create_request(),
            pending: Mutex::new(None),
            tap: Arc::clone(&self.tap),
        }
    }
}

/// Open/send handle that observes its own completion.
///
/// The context recorded by `open` is consumed by the next `send`, which arms
/// a single load listener. Sending again without re-opening is passed through
/// but not observed a second time.
pub struct TappedRequest<R> {
    inner: R,
    pending: Mutex<Option<PendingRequestContext>>,
    tap: Arc<NetworkTap>,
}

impl<R> TappedRequest<R> {
    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn pending_context(&self) -> Option<PendingRequestContext> {
        self.pending.lock().clone()
    }
}

impl<R> EventRequest for TappedRequest<R>
where
    R: EventRequest,
{
    fn open(&self, method: &str, url: &str) -> Result<(), TransportError> {
        let context = PendingRequestContext {
            request: RequestId::new(),
            method: method.to_string(),
            target_url: url.to_string(),
        };
        debug!(
            target: "network_tap.xhr",
            request = %context.request,
            method,
            url,
            "open()"
        );
        *self.pending.lock() = Some(context);
        self.inner.open(method, url)
    }

    fn send(&self, body: Option<&str>) -> Result<(), TransportError> {
        let context = self.pending.lock().take();
        let request = context
            .as_ref()
            .map(|c| c.request.to_string())
            .unwrap_or_else(|| "-".into());
        debug!(
            target: "network_tap.xhr",
            %request,
            body = %self.tap.clip(body.unwrap_or("")),
            "send()"
        );

        let armed = context.is_some();
        match context {
            Some(context) => {
                let tap = Arc::clone(&self.tap);
                tap.metrics().request_started();
                self.inner.add_load_listener(Box::new(move |event: &LoadEvent| {
                    tap.metrics().response_received(event.status);
                    debug!(
                        target: "network_tap.xhr",
                        request = %context.request,
                        method = %context.method,
                        url = %context.target_url,
                        status = event.status,
                        text = %tap.clip(&event.response_text),
                        "response received"
                    );
                    let origin = CaptureOrigin {
                        request: context.request,
                        transport: TransportKind::EventStyle,
                        target_url: context.target_url,
                    };
                    tap.observe_text(&event.response_text, &origin);
                }));
            }
            None => self.tap.metrics().send_without_context(),
        }

        let result = self.inner.send(body);
        if armed && result.is_err() {
            self.tap.metrics().request_failed();
        }
        result
    }

    fn add_load_listener(&self, listener: LoadListener) {
        self.inner.add_load_listener(listener);
    }
}
