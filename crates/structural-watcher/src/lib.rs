pub mod config;
pub mod dedup;
pub mod errors;
pub mod events;
pub mod matcher;
pub mod memory;
pub mod metrics;
pub mod model;
pub mod ports;
pub mod watcher;

pub use config::WatcherConfig;
pub use dedup::InstrumentedSet;
pub use errors::WatcherError;
pub use matcher::ControlMatcher;
pub use memory::{MemoryDocument, MemoryElement};
pub use model::{ClickDiagnostic, MutationRecord, WatcherState};
pub use ports::{ClickListener, ElementKey, HostDocument, HostElement, WeakElement};
pub use watcher::{StructuralWatcher, WatcherHandle};
