use std::sync::Arc;

use async_trait::async_trait;
use pagetap_core_types::{CaptureOrigin, RequestId, TransportKind};
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

use crate::tap::NetworkTap;
use crate::transport::{FetchResponse, FetchTransport, RequestInit, TransportError};

/// Promise-style transport with response observation.
///
/// The response handed back is the one the inner transport produced. Its body
/// copy is decoded on a detached task, so the caller never waits on
/// extraction.
pub struct TappedFetch<T> {
    inner: T,
    tap: Arc<NetworkTap>,
}

impl<T> TappedFetch<T>
where
    T: FetchTransport,
{
    pub fn new(inner: T, tap: Arc<NetworkTap>) -> Self {
        Self { inner, tap }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T> FetchTransport for TappedFetch<T>
where
    T: FetchTransport,
{
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<FetchResponse, TransportError> {
        let request = RequestId::new();
        let metrics = self.tap.metrics();
        metrics.request_started();
        debug!(
            target: "network_tap.fetch",
            %request,
            url,
            method = init.method(),
            body = %self.tap.clip(init.body.as_deref().unwrap_or("")),
            "fetch() called"
        );

        match self.inner.fetch(url, init).await {
            Ok(response) => {
                metrics.response_received(response.status);
                debug!(
                    target: "network_tap.fetch",
                    %request,
                    status = response.status,
                    response_url = %response.url,
                    "fetch() response"
                );
                let copy = response.duplicate();
                let origin = CaptureOrigin {
                    request,
                    transport: TransportKind::Fetch,
                    target_url: url.to_string(),
                };
                match Handle::try_current() {
                    Ok(handle) => {
                        let tap = Arc::clone(&self.tap);
                        handle.spawn(async move { tap.observe_response(copy, origin).await });
                    }
                    Err(_) => warn!(
                        target: "network_tap.fetch",
                        %request,
                        "no async runtime to decode response copy; skipping observation"
                    ),
                }
                Ok(response)
            }
            Err(err) => {
                metrics.request_failed();
                error!(target: "network_tap.fetch", %request, url, %err, "fetch() error");
                Err(err)
            }
        }
    }
}
