//! In-memory transport that replays scripted replies.
//!
//! Compiled for tests and with the `testing` feature. Each expectation matches a
//! method and a URL fragment and is consumed by the first call it matches;
//! expectations are tried in the order they were added. Unmatched calls fail
//! with a `404` status.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use super::{Method, RequestBody, Transport, TransportRequest, TransportResponse};
use crate::error::TransportError;

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Succeed with this response.
    Respond(TransportResponse),
    /// Fail with this error.
    Fail(TransportError),
}

#[derive(Debug)]
struct Expectation {
    method: Method,
    url_fragment: String,
    reply: Reply,
    repeat: bool,
}

/// A call the transport received.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Request body.
    pub body: RequestBody,
}

impl RecordedCall {
    /// Returns the JSON body, if the call carried one.
    pub fn json_body(&self) -> Option<&Value> {
        match &self.body {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Transport replaying scripted replies and recording every call.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    expectations: Mutex<Vec<Expectation>>,
    calls: Mutex<Vec<RecordedCall>>,
    cookie_clears: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ScriptedTransport {
    /// Creates a transport with no expectations.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, url_fragment: &str, reply: Reply, repeat: bool) {
        lock(&self.expectations).push(Expectation {
            method,
            url_fragment: url_fragment.to_string(),
            reply,
            repeat,
        });
    }

    /// Answers the next matching call with `response`.
    pub fn respond(&self, method: Method, url_fragment: &str, response: TransportResponse) {
        self.push(method, url_fragment, Reply::Respond(response), false);
    }

    /// Answers the next matching call with `error`.
    pub fn fail(&self, method: Method, url_fragment: &str, error: TransportError) {
        self.push(method, url_fragment, Reply::Fail(error), false);
    }

    /// Answers every matching call with `reply`.
    pub fn always(&self, method: Method, url_fragment: &str, reply: Reply) {
        self.push(method, url_fragment, reply, true);
    }

    /// Returns all calls received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Returns the calls whose URL contains `fragment`.
    pub fn calls_to(&self, method: Method, fragment: &str) -> Vec<RecordedCall> {
        lock(&self.calls)
            .iter()
            .filter(|c| c.method == method && c.url.contains(fragment))
            .cloned()
            .collect()
    }

    /// Number of times cookies were cleared.
    pub fn cookie_clears(&self) -> usize {
        self.cookie_clears.load(Ordering::SeqCst)
    }

    /// Number of expectations not yet consumed (repeating ones included).
    pub fn pending_expectations(&self) -> usize {
        lock(&self.expectations).len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn call(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        lock(&self.calls).push(RecordedCall {
            method: request.method,
            url: request.url.clone(),
            body: request.body.clone(),
        });

        let reply = {
            let mut expectations = lock(&self.expectations);
            let index = expectations
                .iter()
                .position(|e| e.method == request.method && request.url.contains(&e.url_fragment));
            match index {
                Some(i) if expectations[i].repeat => Some(expectations[i].reply.clone()),
                Some(i) => Some(expectations.remove(i).reply),
                None => None,
            }
        };

        // Yield once so callers observe a real suspension point.
        tokio::task::yield_now().await;

        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(error)) => Err(error),
            None => Err(TransportError::status(404, "Not Found")),
        }
    }

    fn clear_cookies(&self) {
        self.cookie_clears.fetch_add(1, Ordering::SeqCst);
    }
}
