//! Transport abstraction.
//!
//! A transport performs exactly one network call and reports either a
//! structured response or a [`TransportError`]. The session controller only
//! depends on the [`Transport`] trait:
//!
//! - [`http`] - `reqwest` implementation with a clearable cookie jar
//! - `scripted` - in-memory implementation replaying canned replies
//!   (tests and the `testing` feature)

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use crate::error::TransportError;

pub mod http;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

// ============================================================================
// Request
// ============================================================================

/// HTTP method of a transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// HEAD
    Head,
}

impl Method {
    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Head => "HEAD",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON-encoded body.
    Json(Value),
    /// `application/x-www-form-urlencoded` key/value pairs.
    Form(Vec<(String, String)>),
    /// Pre-encoded body sent verbatim.
    Raw {
        /// Content type header.
        content_type: String,
        /// Body text.
        body: String,
    },
}

/// How the response body should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Parse as JSON; a body that does not parse is a decode failure.
    Json,
    /// Keep as text.
    Text,
}

/// One transport call.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Request body.
    pub body: RequestBody,
    /// Expected response kind.
    pub expect: ResponseKind,
}

impl TransportRequest {
    /// Creates a request without a body.
    pub fn new(method: Method, url: impl Into<String>, expect: ResponseKind) -> Self {
        Self {
            method,
            url: url.into(),
            body: RequestBody::Empty,
            expect,
        }
    }

    /// Sets the body.
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }
}

// ============================================================================
// Response
// ============================================================================

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Parsed JSON.
    Json(Value),
    /// Raw text.
    Text(String),
}

impl ResponseBody {
    /// Returns the body as text; JSON bodies are re-serialized.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Json(value) => value.to_string(),
        }
    }
}

/// A successful transport response.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status.
    pub status: u16,
    /// Decoded body.
    pub body: ResponseBody,
    /// `Location` header, if present.
    pub location: Option<String>,
}

impl TransportResponse {
    /// A `200` JSON response.
    pub fn json(value: Value) -> Self {
        Self {
            status: 200,
            body: ResponseBody::Json(value),
            location: None,
        }
    }

    /// A `200` text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: ResponseBody::Text(text.into()),
            location: None,
        }
    }

    /// A `201 Created` response pointing at `location`.
    pub fn created(location: impl Into<String>) -> Self {
        Self {
            status: 201,
            body: ResponseBody::Text(String::new()),
            location: Some(location.into()),
        }
    }
}

// ============================================================================
// Transport Trait
// ============================================================================

/// Performs single network calls for the session controller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one call.
    ///
    /// Non-success statuses are reported as errors carrying the status; a
    /// body that does not match `request.expect` is a decode error.
    async fn call(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;

    /// Drops every stored session cookie.
    fn clear_cookies(&self);
}
