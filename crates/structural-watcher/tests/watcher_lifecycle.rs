use std::sync::Arc;
use std::time::Duration;

use structural_watcher::{
    HostDocument, HostElement, MemoryDocument, MemoryElement, StructuralWatcher, WatcherConfig,
    WatcherState, WeakElement,
};
use tokio::time::{sleep, timeout};

async fn eventually(mut check: impl FnMut() -> bool) {
    timeout(Duration::from_secs(2), async {
        while !check() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn post_form(comment: &str) -> (MemoryElement, MemoryElement) {
    let button = MemoryElement::element("button").with_text("Submit Post");
    let form = MemoryElement::element("form")
        .with_child(
            MemoryElement::element("textarea")
                .with_attr("name", "com")
                .with_text(comment),
        )
        .with_child(button.clone());
    (form, button)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn controls_present_at_start_are_instrumented_synchronously() {
    let doc = Arc::new(MemoryDocument::new());
    let (form, button) = post_form("first");
    doc.append(&doc.body(), form);

    let watcher = StructuralWatcher::new(Arc::clone(&doc), WatcherConfig::default());
    let handle = watcher.start().expect("start");

    assert!(watcher.is_instrumented(&button));
    assert_eq!(button.listener_count(), 1);
    assert_eq!(watcher.state(), WatcherState::Idle);
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn late_insertions_are_instrumented_from_one_notification() {
    let doc = Arc::new(MemoryDocument::new());
    let watcher = StructuralWatcher::new(Arc::clone(&doc), WatcherConfig::default());
    let handle = watcher.start().expect("start");
    assert_eq!(watcher.instrumented_count(), 0);

    let late = MemoryElement::element("button").with_text("Submit Post");
    doc.append(&doc.body(), late.clone());
    eventually(|| watcher.is_instrumented(&late)).await;

    let (form, nested) = post_form("nested");
    let section = MemoryElement::element("section").with_child(form);
    let wrapper = MemoryElement::element("div").with_child(section);
    doc.append(&doc.body(), wrapper);
    eventually(|| watcher.is_instrumented(&nested)).await;

    assert_eq!(late.listener_count(), 1);
    assert_eq!(nested.listener_count(), 1);
    assert_eq!(watcher.instrumented_count(), 2);
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reinserting_a_control_does_not_add_a_second_listener() {
    let doc = Arc::new(MemoryDocument::new());
    let button = MemoryElement::element("button").with_text("Post");
    doc.append(&doc.body(), button.clone());
    let watcher = StructuralWatcher::new(Arc::clone(&doc), WatcherConfig::default());
    let handle = watcher.start().expect("start");

    let holder = MemoryElement::element("div");
    doc.append(&doc.body(), holder.clone());
    doc.remove(&button);
    doc.append(&holder, button.clone());

    let mut clicks = watcher.subscribe_clicks();
    eventually(|| doc.is_connected(&button)).await;
    sleep(Duration::from_millis(50)).await;
    assert_eq!(button.listener_count(), 1);

    button.click();
    let seen = timeout(Duration::from_secs(1), clicks.recv())
        .await
        .expect("click diagnostic")
        .expect("channel open");
    assert_eq!(seen.control_label, "Post");
    assert!(clicks.try_recv().is_err());
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn click_reports_form_state_at_click_time() {
    let doc = Arc::new(MemoryDocument::new());
    let watcher = StructuralWatcher::new(Arc::clone(&doc), WatcherConfig::default());
    let mut clicks = watcher.subscribe_clicks();
    let handle = watcher.start().expect("start");

    let name = MemoryElement::element("input").with_attr("name", "name");
    let button = MemoryElement::element("input")
        .with_attr("type", "submit")
        .with_value("Post");
    let form = MemoryElement::element("form")
        .with_child(name.clone())
        .with_child(button.clone());
    doc.append(&doc.body(), form);
    eventually(|| watcher.is_instrumented(&button)).await;

    name.set_attr("value", "Anonymous");
    button.click();
    let seen = clicks.recv().await.expect("diagnostic");
    assert_eq!(seen.control_label, "Post");
    assert_eq!(
        seen.form_entries,
        Some(vec![("name".to_string(), "Anonymous".to_string())])
    );
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn case_insensitive_keyword_matches_lowercase_labels() {
    let doc = Arc::new(MemoryDocument::new());
    let reply = MemoryElement::element("button").with_text("repost");
    doc.append(&doc.body(), reply.clone());

    let strict = StructuralWatcher::new(Arc::clone(&doc), WatcherConfig::default());
    assert_eq!(strict.scan(&doc.body()), 0);

    let config = WatcherConfig {
        case_sensitive: false,
        ..WatcherConfig::default()
    };
    let relaxed = StructuralWatcher::new(Arc::clone(&doc), config);
    assert_eq!(relaxed.scan(&doc.body()), 1);
    assert!(relaxed.is_instrumented(&reply));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn removed_controls_are_not_kept_alive() {
    let doc = Arc::new(MemoryDocument::new());
    let watcher = StructuralWatcher::new(Arc::clone(&doc), WatcherConfig::default());
    let handle = watcher.start().expect("start");

    let button = MemoryElement::element("button").with_text("Post");
    doc.append(&doc.body(), button.clone());
    eventually(|| watcher.is_instrumented(&button)).await;

    let weak = button.downgrade();
    doc.remove(&button);
    drop(button);

    // The notification batch may still be buffered in the feed; let the loop drain it.
    doc.append(&doc.body(), MemoryElement::element("p"));
    eventually(|| weak.upgrade().is_none()).await;
    assert_eq!(watcher.instrumented_count(), 0);
    handle.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_stops_following_changes() {
    let doc = Arc::new(MemoryDocument::new());
    let watcher = StructuralWatcher::new(Arc::clone(&doc), WatcherConfig::default());
    let handle = watcher.start().expect("start");
    assert!(!handle.is_finished());
    handle.shutdown().await.expect("shutdown");

    let button = MemoryElement::element("button").with_text("Post");
    doc.append(&doc.body(), button.clone());
    sleep(Duration::from_millis(50)).await;
    assert!(!watcher.is_instrumented(&button));
    assert_eq!(button.listener_count(), 0);
    assert_eq!(doc.observer_count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn loop_ends_when_the_document_goes_away() {
    let doc = Arc::new(MemoryDocument::new());
    let watcher = StructuralWatcher::new(Arc::clone(&doc), WatcherConfig::default());
    let handle = watcher.start().expect("start");

    doc.disconnect_observers();
    eventually(|| handle.is_finished()).await;
    handle.shutdown().await.expect("shutdown after close");
}
