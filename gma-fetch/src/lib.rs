// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # GMA Fetch
//!
//! Authenticated session client for the GMA reporting backend.
//!
//! ## Layers
//!
//! - [`transport`] - single network calls ([`transport::Transport`]), with a
//!   `reqwest` implementation, plus an in-memory scripted one behind the
//!   `testing` feature
//! - [`session`] - CAS ticket login, logout, and the authenticated request
//!   that detects an expired session and logs in again
//! - [`client`] - typed operations: identity, assignments, reports,
//!   measurements, measurement writes
//! - [`autosave`] - debounced measurement writes
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gma_fetch::{ClientConfig, GmaClient, ReqwestTransport, SessionController};
//!
//! let config = ClientConfig::builder("https://gma.example.com/", "https://signin.example.com/cas")
//!     .build()?;
//! let session = Arc::new(SessionController::new(config, Arc::new(ReqwestTransport::new())));
//! let client = GmaClient::new(session);
//!
//! client.login("user@example.com", "secret").await?;
//! let reports = client.reports_for_node(42).await?;
//! ```

pub mod autosave;
pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod session;
pub mod transport;

// Re-export key types at crate root

// Errors
pub use error::{GmaError, TransportError, TransportErrorKind};

// Configuration & hooks
pub use config::{
    BusyIndicator, CallbackBusyIndicator, ClientConfig, ClientConfigBuilder,
    CredentialReauthenticator, NoopBusyIndicator, Reauthenticator, DEFAULT_AUTOSAVE_DELAY,
};

// Transport
#[cfg(any(test, feature = "testing"))]
pub use transport::scripted::{RecordedCall, Reply, ScriptedTransport};
pub use transport::{
    http::ReqwestTransport, Method, RequestBody, ResponseBody, ResponseKind, Transport, TransportRequest,
    TransportResponse,
};

// Session & resources
pub use autosave::{MeasurementField, PendingWrite, WriteOutcome};
pub use client::GmaClient;
pub use session::{LoginStep, ServiceRequest, Session, SessionController};
