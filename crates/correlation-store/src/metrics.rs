use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

#[derive(Clone, Default)]
pub struct StoreMetrics {
    inner: Arc<StoreMetricsInner>,
}

#[derive(Default)]
struct StoreMetricsInner {
    appended: AtomicU64,
    pointers_only: AtomicU64,
    ignored: AtomicU64,
    history_resets: AtomicU64,
    write_errors: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreMetricsSnapshot {
    pub appended: u64,
    pub pointers_only: u64,
    pub ignored: u64,
    pub history_resets: u64,
    pub write_errors: u64,
}

impl StoreMetrics {
    pub fn record_appended(&self) {
        self.inner.appended.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pointers_only(&self) {
        self.inner.pointers_only.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.inner.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_history_reset(&self) {
        self.inner.history_resets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_error(&self) {
        self.inner.write_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StoreMetricsSnapshot {
        StoreMetricsSnapshot {
            appended: self.inner.appended.load(Ordering::Relaxed),
            pointers_only: self.inner.pointers_only.load(Ordering::Relaxed),
            ignored: self.inner.ignored.load(Ordering::Relaxed),
            history_resets: self.inner.history_resets.load(Ordering::Relaxed),
            write_errors: self.inner.write_errors.load(Ordering::Relaxed),
        }
    }
}
