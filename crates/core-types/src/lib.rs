//! Shared primitives for the pagetap crates.
//!
//! Everything that crosses a crate boundary lives here: identifiers, the
//! candidate produced by payload extraction, the page context the store stamps
//! onto records, and the sink trait that joins the network tap to the store.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier attached to every request observed by the tap.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which transport mechanism a response arrived through.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Fetch,
    EventStyle,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Fetch => f.write_str("fetch"),
            TransportKind::EventStyle => f.write_str("event"),
        }
    }
}

/// Identifier pair pulled out of a response body.
///
/// At least one field is set; a candidate with neither is never constructed by
/// the extractor.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CorrelationCandidate {
    pub entry_id: Option<String>,
    pub session_id: Option<String>,
}

impl CorrelationCandidate {
    pub fn is_empty(&self) -> bool {
        self.entry_id.is_none() && self.session_id.is_none()
    }
}

/// Where a candidate came from. Used only for tracing.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CaptureOrigin {
    pub request: RequestId,
    pub transport: TransportKind,
    pub target_url: String,
}

/// Live view of the page location, shared between the host and the store.
///
/// The host updates it on navigation; readers take a copy at capture time.
#[derive(Clone, Debug, Default)]
pub struct PageContext {
    location: Arc<RwLock<String>>,
}

impl PageContext {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: Arc::new(RwLock::new(location.into())),
        }
    }

    pub fn location(&self) -> String {
        self.location.read().clone()
    }

    pub fn set_location(&self, location: impl Into<String>) {
        *self.location.write() = location.into();
    }
}

/// Receives candidates produced by payload extraction.
///
/// Implementations must not fail the caller; persistence problems are handled
/// (and logged) behind this seam.
pub trait CorrelationSink: Send + Sync {
    fn accept(&self, candidate: CorrelationCandidate, origin: &CaptureOrigin);
}

/// Sink that drops everything. Handy when only the transport wrapping is wanted.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl CorrelationSink for NullSink {
    fn accept(&self, _candidate: CorrelationCandidate, _origin: &CaptureOrigin) {}
}
