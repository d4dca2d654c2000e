//! Transport interception for the instrumented page.
//!
//! Both host request mechanisms are wrapped by decorators that keep the
//! original signature: [`TappedFetch`] for the promise-style call and
//! [`TappedEventTransport`] for the open/send handle. Every response body is
//! run through the [`PayloadExtractor`] and usable candidates are handed to a
//! [`CorrelationSink`](pagetap_core_types::CorrelationSink). The page always
//! gets back exactly what the wrapped transport produced.

pub mod config;
pub mod event_style;
pub mod extract;
pub mod fetch;
pub mod memory;
pub mod metrics;
mod redact;
pub mod state;
pub mod tap;
pub mod transport;

pub use config::{ExtractorConfig, TapConfig};
pub use event_style::{PendingRequestContext, TappedEventTransport, TappedRequest};
pub use extract::{Extraction, PayloadExtractor};
pub use fetch::TappedFetch;
pub use memory::{ScriptedEventTransport, ScriptedFetch, ScriptedRequest};
pub use metrics::{TapMetrics, TapSnapshot};
pub use state::{InstalledTransports, InterceptorState};
pub use tap::NetworkTap;
pub use transport::{
    EventRequest, EventTransport, FetchResponse, FetchTransport, LoadEvent, LoadListener,
    RequestInit, ResponseBody, TransportError,
};
