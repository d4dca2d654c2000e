//! In-memory transports for tests and offline embedding.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;

use crate::transport::{
    EventRequest, EventTransport, FetchResponse, FetchTransport, LoadEvent, LoadListener,
    RequestInit, TransportError,
};

/// Promise-style transport answering from a URL → outcome table.
#[derive(Default)]
pub struct ScriptedFetch {
    routes: DashMap<String, Result<FetchResponse, TransportError>>,
    calls: Mutex<Vec<(String, RequestInit)>>,
}

impl ScriptedFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: impl Into<String>, response: FetchResponse) {
        self.routes.insert(url.into(), Ok(response));
    }

    pub fn fail(&self, url: impl Into<String>, err: TransportError) {
        self.routes.insert(url.into(), Err(err));
    }

    pub fn calls(&self) -> Vec<(String, RequestInit)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl FetchTransport for ScriptedFetch {
    async fn fetch(&self, url: &str, init: RequestInit) -> Result<FetchResponse, TransportError> {
        self.calls.lock().push((url.to_string(), init));
        match self.routes.get(url) {
            Some(route) => route.value().clone(),
            None => Err(TransportError::Network(format!("no route for {url}"))),
        }
    }
}

/// Open/send transport whose requests are completed by the test driver.
#[derive(Default)]
pub struct ScriptedEventTransport {
    created: Mutex<Vec<ScriptedRequest>>,
}

impl ScriptedEventTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request handle created so far, oldest first.
    pub fn requests(&self) -> Vec<ScriptedRequest> {
        self.created.lock().clone()
    }
}

impl EventTransport for ScriptedEventTransport {
    type Request = ScriptedRequest;

    fn create_request(&self) -> ScriptedRequest {
        let request = ScriptedRequest::default();
        self.created.lock().push(request.clone());
        request
    }
}

#[derive(Clone, Default)]
pub struct ScriptedRequest {
    inner: Arc<Mutex<RequestState>>,
}

#[derive(Default)]
struct RequestState {
    opened: Option<(String, String)>,
    sent: Vec<Option<String>>,
    listeners: Vec<LoadListener>,
    send_error: Option<TransportError>,
}

impl ScriptedRequest {
    pub fn opened(&self) -> Option<(String, String)> {
        self.inner.lock().opened.clone()
    }

    pub fn sent_bodies(&self) -> Vec<Option<String>> {
        self.inner.lock().sent.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    pub fn fail_next_send(&self, err: TransportError) {
        self.inner.lock().send_error = Some(err);
    }

    /// Fire every registered load listener once, in registration order.
    pub fn complete(&self, status: u16, response_text: impl Into<String>) {
        let listeners = std::mem::take(&mut self.inner.lock().listeners);
        let event = LoadEvent {
            status,
            response_text: response_text.into(),
        };
        for listener in listeners {
            listener(&event);
        }
    }
}

impl EventRequest for ScriptedRequest {
    fn open(&self, method: &str, url: &str) -> Result<(), TransportError> {
        if method.trim().is_empty() {
            return Err(TransportError::InvalidRequest("empty method".into()));
        }
        self.inner.lock().opened = Some((method.to_string(), url.to_string()));
        Ok(())
    }

    fn send(&self, body: Option<&str>) -> Result<(), TransportError> {
        let mut state = self.inner.lock();
        if let Some(err) = state.send_error.take() {
            return Err(err);
        }
        if state.opened.is_none() {
            return Err(TransportError::InvalidState("send() before open()".into()));
        }
        state.sent.push(body.map(str::to_string));
        Ok(())
    }

    fn add_load_listener(&self, listener: LoadListener) {
        self.inner.lock().listeners.push(listener);
    }
}
