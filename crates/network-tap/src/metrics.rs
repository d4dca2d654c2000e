//! Cumulative counters for intercepted traffic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::extract::Extraction;

/// Point-in-time copy of the tap counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TapSnapshot {
    pub req: u64,
    pub res2xx: u64,
    pub res4xx: u64,
    pub res5xx: u64,
    /// Informational, redirect and non-standard statuses.
    pub res_other: u64,
    pub failed: u64,
    pub inflight: u64,
    pub sends_without_context: u64,
    pub bodies_decoded: u64,
    pub body_errors: u64,
    pub candidates: u64,
    pub no_identifier: u64,
    pub not_structured: u64,
}

#[derive(Clone, Default)]
pub struct TapMetrics {
    inner: Arc<Counters>,
}

#[derive(Default)]
struct Counters {
    requests: AtomicU64,
    res2xx: AtomicU64,
    res4xx: AtomicU64,
    res5xx: AtomicU64,
    res_other: AtomicU64,
    failed: AtomicU64,
    inflight: AtomicU64,
    sends_without_context: AtomicU64,
    bodies_decoded: AtomicU64,
    body_errors: AtomicU64,
    candidates: AtomicU64,
    no_identifier: AtomicU64,
    not_structured: AtomicU64,
}

impl TapMetrics {
    pub(crate) fn request_started(&self) {
        self.inner.requests.fetch_add(1, Ordering::Relaxed);
        self.inner.inflight.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn response_received(&self, status: u16) {
        match status {
            200..=299 => self.inner.res2xx.fetch_add(1, Ordering::Relaxed),
            400..=499 => self.inner.res4xx.fetch_add(1, Ordering::Relaxed),
            500..=599 => self.inner.res5xx.fetch_add(1, Ordering::Relaxed),
            _ => self.inner.res_other.fetch_add(1, Ordering::Relaxed),
        };
        self.settle();
    }

    pub(crate) fn request_failed(&self) {
        self.inner.failed.fetch_add(1, Ordering::Relaxed);
        self.settle();
    }

    pub(crate) fn send_without_context(&self) {
        self.inner
            .sends_without_context
            .fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn body_decoded(&self) {
        self.inner.bodies_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn body_error(&self) {
        self.inner.body_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn extraction(&self, outcome: &Extraction) {
        let counter = match outcome {
            Extraction::Candidate(_) => &self.inner.candidates,
            Extraction::NoIdentifier => &self.inner.no_identifier,
            Extraction::NotStructured => &self.inner.not_structured,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TapSnapshot {
        let c = &self.inner;
        TapSnapshot {
            req: c.requests.load(Ordering::Relaxed),
            res2xx: c.res2xx.load(Ordering::Relaxed),
            res4xx: c.res4xx.load(Ordering::Relaxed),
            res5xx: c.res5xx.load(Ordering::Relaxed),
            res_other: c.res_other.load(Ordering::Relaxed),
            failed: c.failed.load(Ordering::Relaxed),
            inflight: c.inflight.load(Ordering::Relaxed),
            sends_without_context: c.sends_without_context.load(Ordering::Relaxed),
            bodies_decoded: c.bodies_decoded.load(Ordering::Relaxed),
            body_errors: c.body_errors.load(Ordering::Relaxed),
            candidates: c.candidates.load(Ordering::Relaxed),
            no_identifier: c.no_identifier.load(Ordering::Relaxed),
            not_structured: c.not_structured.load(Ordering::Relaxed),
        }
    }

    fn settle(&self) {
        let _ = self
            .inner
            .inflight
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }
}
