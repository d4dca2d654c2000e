//! Process-wide counters for the structural watcher.
//!
//! Scans carry a latency aggregate; the rest are plain totals.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

static SCAN_TOTAL: AtomicU64 = AtomicU64::new(0);
static SCAN_LAT_NS: AtomicU64 = AtomicU64::new(0);
static SCAN_LAT_SAMPLES: AtomicU64 = AtomicU64::new(0);

static INSTRUMENTED_TOTAL: AtomicU64 = AtomicU64::new(0);
static DUPLICATE_SKIPS: AtomicU64 = AtomicU64::new(0);
static CLICKS_TOTAL: AtomicU64 = AtomicU64::new(0);
static MUTATION_BATCHES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricCounter {
    pub total: u64,
    pub avg_ms: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MetricSnapshot {
    pub scan: MetricCounter,
    pub instrumented: u64,
    pub duplicate_skips: u64,
    pub clicks: u64,
    pub mutation_batches: u64,
}

pub fn record_scan(duration: Duration) {
    SCAN_TOTAL.fetch_add(1, Ordering::Relaxed);
    record_latency(&SCAN_LAT_NS, &SCAN_LAT_SAMPLES, duration);
}

pub fn record_instrumented() {
    INSTRUMENTED_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn record_duplicate_skip() {
    DUPLICATE_SKIPS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_click() {
    CLICKS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub fn record_mutation_batch() {
    MUTATION_BATCHES.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> MetricSnapshot {
    MetricSnapshot {
        scan: make_counter(
            SCAN_TOTAL.load(Ordering::Relaxed),
            SCAN_LAT_NS.load(Ordering::Relaxed),
            SCAN_LAT_SAMPLES.load(Ordering::Relaxed),
        ),
        instrumented: INSTRUMENTED_TOTAL.load(Ordering::Relaxed),
        duplicate_skips: DUPLICATE_SKIPS.load(Ordering::Relaxed),
        clicks: CLICKS_TOTAL.load(Ordering::Relaxed),
        mutation_batches: MUTATION_BATCHES.load(Ordering::Relaxed),
    }
}

fn make_counter(total: u64, nanos: u64, samples: u64) -> MetricCounter {
    let avg_ms = if samples == 0 {
        0.0
    } else {
        (nanos as f64 / samples as f64) / 1_000_000.0
    };
    MetricCounter { total, avg_ms }
}

fn record_latency(total_ns: &AtomicU64, samples: &AtomicU64, duration: Duration) {
    let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
    total_ns.fetch_add(nanos, Ordering::Relaxed);
    samples.fetch_add(1, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_only_grow() {
        let before = snapshot();
        record_scan(Duration::from_millis(2));
        record_instrumented();
        record_duplicate_skip();
        record_click();
        let after = snapshot();
        assert!(after.scan.total > before.scan.total);
        assert!(after.scan.avg_ms > 0.0);
        assert!(after.instrumented > before.instrumented);
        assert!(after.duplicate_skips > before.duplicate_skips);
        assert!(after.clicks > before.clicks);
    }
}
