use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WatcherError {
    #[error("watcher already started")]
    AlreadyStarted,
    #[error("no async runtime available: {0}")]
    NoRuntime(String),
}
