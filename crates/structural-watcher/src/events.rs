use std::time::Duration;

use tracing::{debug, info};

use crate::metrics;
use crate::model::ClickDiagnostic;

pub fn emit_scan(candidates: usize, instrumented: usize, duration: Duration) {
    metrics::record_scan(duration);
    debug!(
        target: "structural_watcher",
        candidates,
        instrumented,
        elapsed_us = duration.as_micros() as u64,
        "structural.scan.completed"
    );
}

pub fn emit_instrumented(label: &str) {
    metrics::record_instrumented();
    debug!(target: "structural_watcher", label, "structural.control.instrumented");
}

pub fn emit_duplicate(label: &str) {
    metrics::record_duplicate_skip();
    debug!(target: "structural_watcher", label, "structural.control.already_instrumented");
}

pub fn emit_click(diagnostic: &ClickDiagnostic) {
    metrics::record_click();
    match &diagnostic.form_entries {
        Some(entries) => info!(
            target: "structural_watcher",
            label = %diagnostic.control_label,
            fields = entries.len(),
            entries = ?entries,
            "structural.control.clicked"
        ),
        None => info!(
            target: "structural_watcher",
            label = %diagnostic.control_label,
            "structural.control.clicked without enclosing form"
        ),
    }
}
