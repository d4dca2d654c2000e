pub mod api;
pub mod config;
pub mod errors;
pub mod kv;
pub mod metrics;
pub mod model;

pub use api::CorrelationStore;
pub use config::StoreConfig;
pub use errors::StoreError;
pub use kv::{FileKv, KvStore, MemoryKv};
pub use model::{AppendOutcome, CorrelationRecord, LatestPointers};
