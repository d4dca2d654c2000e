//! pagetap: transparent request interception and response correlation for an
//! instrumented page, plus a watcher that instruments matching controls.
//!
//! The member crates do the work. This crate wires them together at one
//! integration point, [`PageTap::start`], and owns configuration loading and
//! logging setup.

pub mod bootstrap;
pub mod config;
pub mod telemetry;

pub use bootstrap::{HostEnvironment, PageTap};
pub use config::{PageTapConfig, TapSection};

pub use network_tap::{
    EventRequest, EventTransport, FetchResponse, FetchTransport, RequestInit, TransportError,
};
pub use pagetap_core_types::{CorrelationCandidate, CorrelationSink, PageContext};
pub use pagetap_correlation_store::{
    CorrelationRecord, CorrelationStore, FileKv, KvStore, LatestPointers, MemoryKv,
};
pub use structural_watcher::{ClickDiagnostic, HostDocument, HostElement, WatcherState};
