//! Host transport ports.
//!
//! These traits describe the two request mechanisms a page has: a
//! promise-style call taking a destination plus configuration, and a handle
//! driven through `open`/`send` that reports completion through listeners.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure raised by a host transport. The tap passes it through untouched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request aborted")]
    Aborted,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("body stream failed: {0}")]
    Body(String),
}

/// Second positional argument of the promise-style call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInit {
    pub method: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestInit {
    pub fn method(&self) -> &str {
        self.method.as_deref().unwrap_or("GET")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResponseBody {
    Bytes(Arc<[u8]>),
    /// The stream errors when read.
    Errored(String),
}

impl ResponseBody {
    pub fn text(text: impl AsRef<str>) -> Self {
        Self::Bytes(Arc::from(text.as_ref().as_bytes()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: ResponseBody,
}

impl FetchResponse {
    pub fn new(status: u16, url: impl Into<String>, body: ResponseBody) -> Self {
        Self {
            status,
            url: url.into(),
            headers: Vec::new(),
            body,
        }
    }

    /// Independent copy whose body can be consumed without touching this one.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Consume the body and decode it as UTF-8 text (lossy, like a browser).
    pub async fn text(self) -> Result<String, TransportError> {
        match self.body {
            ResponseBody::Bytes(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            ResponseBody::Errored(reason) => Err(TransportError::Body(reason)),
        }
    }
}

#[async_trait]
pub trait FetchTransport: Send + Sync {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<FetchResponse, TransportError>;
}

#[async_trait]
impl<T> FetchTransport for Arc<T>
where
    T: FetchTransport + ?Sized,
{
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<FetchResponse, TransportError> {
        (**self).fetch(url, init).await
    }
}

/// Completion notification for an open/send request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadEvent {
    pub status: u16,
    pub response_text: String,
}

pub type LoadListener = Box<dyn FnOnce(&LoadEvent) + Send + 'static>;

pub trait EventRequest: Send + Sync {
    fn open(&self, method: &str, url: &str) -> Result<(), TransportError>;
    fn send(&self, body: Option<&str>) -> Result<(), TransportError>;
    fn add_load_listener(&self, listener: LoadListener);
}

pub trait EventTransport: Send + Sync {
    type Request: EventRequest;

    fn create_request(&self) -> Self::Request;
}

impl<T> EventTransport for Arc<T>
where
    T: EventTransport + ?Sized,
{
    type Request = T::Request;

    fn create_request(&self) -> Self::Request {
        (**self).create_request()
    }
}
