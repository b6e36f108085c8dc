//! `reqwest` transport with tracing, a clearable cookie jar, and a domain allowlist.
//!
//! The backend keeps its web session in cookies, so every client built here
//! carries its own cookie jar. Clearing cookies swaps in a fresh client.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{header, Client};
use tracing::{debug, instrument, warn};
use url::Url;

use super::{Method, RequestBody, ResponseBody, ResponseKind, Transport, TransportRequest, TransportResponse};
use crate::error::{TransportError, TransportErrorKind};

/// Default request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent string.
const USER_AGENT: &str = concat!("gma-client/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Reqwest Transport
// ============================================================================

/// Transport backed by `reqwest`.
#[derive(Debug)]
pub struct ReqwestTransport {
    client: RwLock<Client>,
    timeout: Duration,
    allowed_domains: Option<Vec<String>>,
}

fn build_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .cookie_provider(Arc::new(Jar::default()))
        .build()
}

impl ReqwestTransport {
    /// Creates a transport with default settings.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a transport with a custom timeout.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built. This should only occur
    /// if the system's TLS/SSL configuration is fundamentally broken,
    /// making network operations impossible.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = build_client(timeout).unwrap_or_else(|e| {
            panic!(
                "Failed to create HTTP client: {}. \
                This usually indicates a broken TLS/SSL configuration.",
                e
            )
        });

        Self {
            client: RwLock::new(client),
            timeout,
            allowed_domains: None,
        }
    }

    /// Restricts requests to the given domains and their subdomains.
    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    /// Restricts requests to the hosts of the given URLs.
    ///
    /// URLs that do not parse or have no host are ignored.
    pub fn for_urls(self, urls: &[&str]) -> Self {
        let domains = urls
            .iter()
            .filter_map(|u| Url::parse(u).ok())
            .filter_map(|u| u.host_str().map(str::to_string))
            .collect();
        self.with_allowed_domains(domains)
    }

    /// Checks if a URL's domain is allowed.
    fn is_domain_allowed(&self, url: &str) -> Result<(), TransportError> {
        let parsed = Url::parse(url)
            .map_err(|e| TransportError::new(TransportErrorKind::InvalidUrl, e.to_string()))?;

        let Some(ref allowed) = self.allowed_domains else {
            return Ok(());
        };

        let host = parsed.host_str().ok_or_else(|| {
            TransportError::new(TransportErrorKind::InvalidUrl, "No host in URL")
        })?;

        let allowed = allowed
            .iter()
            .any(|domain| host == domain || host.ends_with(&format!(".{}", domain)));

        if allowed {
            Ok(())
        } else {
            Err(TransportError::new(
                TransportErrorKind::DomainNotAllowed,
                format!("Domain not allowed: {host}"),
            ))
        }
    }

    fn client(&self) -> Client {
        self.client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Head => reqwest::Method::HEAD,
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes a response body according to the expected kind.
fn decode_body(text: String, expect: ResponseKind) -> Result<ResponseBody, TransportError> {
    match expect {
        ResponseKind::Text => Ok(ResponseBody::Text(text)),
        ResponseKind::Json => {
            if text.trim().is_empty() {
                return Err(TransportError::decode("JSON parse error: unexpected end of input"));
            }
            serde_json::from_str(&text)
                .map(ResponseBody::Json)
                .map_err(|e| TransportError::decode(format!("JSON parse error: {e}")))
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn call(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.is_domain_allowed(&request.url)?;
        debug!("Sending request");

        let mut builder = self
            .client()
            .request(Self::method(request.method), &request.url)
            .header(header::CACHE_CONTROL, "no-cache");

        if request.expect == ResponseKind::Json {
            builder = builder.header(header::ACCEPT, "application/json");
        }

        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(pairs) => builder.form(&pairs),
            RequestBody::Raw { content_type, body } => {
                builder.header(header::CONTENT_TYPE, content_type).body(body)
            }
        };

        let response = builder.send().await?;
        let status = response.status();
        debug!(status = %status, "Response received");

        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            return Err(TransportError::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            ));
        }

        let text = response.text().await?;
        let body = decode_body(text, request.expect)?;

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
            location,
        })
    }

    fn clear_cookies(&self) {
        match build_client(self.timeout) {
            Ok(client) => {
                *self.client.write().unwrap_or_else(PoisonError::into_inner) = client;
                debug!("Cookie jar cleared");
            }
            Err(e) => warn!(error = %e, "Failed to rebuild HTTP client, keeping old cookies"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
