//! Session controller: CAS login, logout, and authenticated requests.
//!
//! ## Login flow
//!
//! 1. **Reset**: log out an existing session (best effort) and clear cookies
//! 2. **Ticket-granting ticket**: POST credentials to `<cas>/v1/tickets`
//! 3. **Service ticket**: POST `service=<serviceURL>` to the TGT location
//! 4. **Validate**: GET `<serviceURL>&ticket=<ST>` on the backend
//! 5. **Identity**: fetch the current user; log out again if that fails
//!
//! ## Authenticated requests
//!
//! [`SessionController::request`] sends one backend call and unwraps the
//! service envelope. A response that does not parse as JSON means the
//! backend served its login page instead, i.e. the session expired. With a
//! [`Reauthenticator`](crate::config::Reauthenticator) configured the
//! controller logs in again and resends the request once; without one the
//! call fails with [`GmaError::SessionExpired`]. Requests that expire at
//! the same time share a single re-authentication.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use gma_core::UserIdentity;

use crate::config::ClientConfig;
use crate::envelope::{self, UserWire};
use crate::error::{GmaError, TransportError};
use crate::transport::{
    Method, RequestBody, ResponseBody, ResponseKind, Transport, TransportRequest, TransportResponse,
};

// ============================================================================
// Constants
// ============================================================================

/// Service path of the current-user lookup.
pub const IDENTITY_PATH: &str = "?q=gmaservices/gma_user&type=current";

/// Service path that ends the backend web session.
pub const LOGOUT_PATH: &str = "?q=logout";

/// Marker the backend puts in the page when ticket validation fails.
const CAS_FAILURE_MARKER: &str = "CAS Authentication failed";

const MSG_MISCONFIGURED: &str = "Make sure your VPN and server settings are correct";
const MSG_CREDENTIALS: &str = "Credentials were not accepted";
const MSG_AUTH_FAILED: &str = "Sorry, there was a problem authenticating with the server";

// ============================================================================
// Session
// ============================================================================

/// Authentication state owned by the [`SessionController`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    authenticated: bool,
    identity: Option<UserIdentity>,
    pending_requests: usize,
}

impl Session {
    /// Returns true after a completed login.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// The identity recorded by the last identity fetch.
    pub fn identity(&self) -> Option<&UserIdentity> {
        self.identity.as_ref()
    }

    /// Backend user id, if known.
    pub fn user_id(&self) -> Option<u64> {
        self.identity.as_ref().map(|i| i.user_id)
    }

    /// Display name, if known.
    pub fn display_name(&self) -> Option<&str> {
        self.identity.as_ref().map(|i| i.display_name.as_str())
    }

    /// Number of outstanding requests that show the busy indicator.
    pub fn pending_requests(&self) -> usize {
        self.pending_requests
    }

    /// Returns true while the busy indicator is shown.
    pub fn is_busy(&self) -> bool {
        self.pending_requests > 0
    }

    fn reset(&mut self) {
        self.authenticated = false;
        self.identity = None;
    }
}

// ============================================================================
// Login Steps
// ============================================================================

/// Steps of the login flow, used for logging and error origins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStep {
    /// Tearing down a previous session.
    LoggingOut,
    /// Posting credentials to the identity provider.
    AcquiringTicketGrantingTicket,
    /// Exchanging the TGT for a service ticket.
    AcquiringServiceTicket,
    /// Presenting the service ticket to the backend.
    ValidatingService,
    /// Looking up the logged-in user.
    FetchingIdentity,
}

impl fmt::Display for LoginStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoggingOut => "logging out",
            Self::AcquiringTicketGrantingTicket => "acquiring ticket-granting ticket",
            Self::AcquiringServiceTicket => "acquiring service ticket",
            Self::ValidatingService => "validating service ticket",
            Self::FetchingIdentity => "fetching identity",
        };
        f.write_str(name)
    }
}

/// Location of a ticket-granting ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TicketGrantingTicket(String);

/// One-time service ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ServiceTicket(String);

// ============================================================================
// Service Request
// ============================================================================

/// An authenticated backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRequest {
    method: Method,
    path: String,
    body: Option<Value>,
    no_animation: bool,
    reauthenticate: bool,
}

impl ServiceRequest {
    /// Creates a request for a service path such as `?q=gmaservices/...`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            no_animation: false,
            reauthenticate: true,
        }
    }

    /// GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// POST request with a JSON body.
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    /// PUT request with a JSON body.
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    /// Sets the JSON body.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Keeps this call out of the busy indicator.
    pub fn no_animation(mut self) -> Self {
        self.no_animation = true;
        self
    }

    /// Skips the re-authentication hook if the session turns out expired.
    pub fn without_reauthentication(mut self) -> Self {
        self.reauthenticate = false;
        self
    }

    /// The service path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// `METHOD path`, used as the origin of errors.
    pub fn origin(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    fn to_transport(&self, config: &ClientConfig, expect: ResponseKind) -> TransportRequest {
        let body = match &self.body {
            Some(value) => RequestBody::Json(value.clone()),
            None => RequestBody::Empty,
        };
        TransportRequest::new(self.method, config.endpoint(&self.path), expect).with_body(body)
    }
}

// ============================================================================
// Busy Guard
// ============================================================================

/// Counts one outstanding operation for as long as it lives.
struct BusyGuard<'a> {
    controller: &'a SessionController,
}

impl<'a> BusyGuard<'a> {
    fn enter(controller: &'a SessionController) -> Self {
        controller.state().pending_requests += 1;
        controller.config.busy().show();
        Self { controller }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let idle = {
            let mut state = self.controller.state();
            state.pending_requests = state.pending_requests.saturating_sub(1);
            state.pending_requests == 0
        };
        if idle {
            self.controller.config.busy().hide();
        }
    }
}

// ============================================================================
// Session Controller
// ============================================================================

/// Owns the session and performs every authenticated call.
///
/// Construct one per server profile and share it through `Arc`.
pub struct SessionController {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    state: Mutex<Session>,
    login_flow: tokio::sync::Mutex<()>,
    /// Serializes re-authentication after an expired session.
    reauth: tokio::sync::Mutex<()>,
    /// Bumped by every completed login or re-authentication.
    generation: AtomicU64,
}

impl SessionController {
    /// Creates a controller with an unauthenticated session.
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            state: Mutex::new(Session::default()),
            login_flow: tokio::sync::Mutex::new(()),
            reauth: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, Session> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// A snapshot of the session.
    pub fn session(&self) -> Session {
        self.state().clone()
    }

    /// Returns true after a completed login.
    pub fn is_authenticated(&self) -> bool {
        self.state().authenticated
    }

    // ========================================================================
    // Login
    // ========================================================================

    /// Logs in through the identity provider.
    ///
    /// Always starts from a clean slate: an existing session is logged out
    /// and all cookies are dropped before credentials are sent. The busy
    /// indicator stays up for the whole flow and is hidden once at the end.
    ///
    /// # Errors
    ///
    /// - `CredentialsRejected` when the identity provider answers `400`
    /// - `ServerUnreachable` on `404` or when it cannot be reached
    /// - `AuthenticationFailed` when the backend rejects the service ticket
    /// - the identity fetch's error when the backend rejects the user, after
    ///   the partial web session has been logged out
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<UserIdentity, GmaError> {
        let _flow = self.login_flow.lock().await;
        let _busy = BusyGuard::enter(self);

        let result = self.run_login(username, password).await;
        match &result {
            Ok(identity) => {
                {
                    let mut state = self.state();
                    state.authenticated = true;
                    state.identity = Some(identity.clone());
                }
                self.generation.fetch_add(1, Ordering::SeqCst);
                info!(user_id = identity.user_id, "Logged in");
            }
            Err(e) => {
                self.state().reset();
                warn!(error = %e, "Login failed");
            }
        }
        result
    }

    async fn run_login(&self, username: &str, password: &str) -> Result<UserIdentity, GmaError> {
        if self.is_authenticated() {
            debug!(step = %LoginStep::LoggingOut, "Resetting existing session");
            self.logout_quietly().await;
        }
        self.transport.clear_cookies();

        debug!(step = %LoginStep::AcquiringTicketGrantingTicket, "Login step");
        let tgt = self.acquire_ticket_granting_ticket(username, password).await?;

        debug!(step = %LoginStep::AcquiringServiceTicket, "Login step");
        let st = self.acquire_service_ticket(&tgt).await?;

        debug!(step = %LoginStep::ValidatingService, "Login step");
        self.validate_service(&st).await?;

        debug!(step = %LoginStep::FetchingIdentity, "Login step");
        match self.fetch_identity_with(false).await {
            Ok(identity) => Ok(identity),
            Err(e) => {
                // Web session is valid but the backend rejected the user.
                self.logout_quietly().await;
                Err(e)
            }
        }
    }

    async fn acquire_ticket_granting_ticket(
        &self,
        username: &str,
        password: &str,
    ) -> Result<TicketGrantingTicket, GmaError> {
        let step = LoginStep::AcquiringTicketGrantingTicket;
        let request = TransportRequest::new(Method::Post, self.config.tickets_url(), ResponseKind::Text)
            .with_body(RequestBody::Form(vec![
                ("username".to_string(), username.to_string()),
                ("password".to_string(), password.to_string()),
            ]));

        let response = self
            .transport
            .call(request)
            .await
            .map_err(|e| classify_ticket_error(step, e))?;

        response
            .location
            .filter(|l| !l.trim().is_empty())
            .map(TicketGrantingTicket)
            .ok_or_else(|| GmaError::invalid_response(step.to_string(), "no ticket location returned"))
    }

    async fn acquire_service_ticket(
        &self,
        tgt: &TicketGrantingTicket,
    ) -> Result<ServiceTicket, GmaError> {
        let step = LoginStep::AcquiringServiceTicket;
        let request = TransportRequest::new(Method::Post, tgt.0.clone(), ResponseKind::Text).with_body(
            RequestBody::Raw {
                content_type: "application/x-www-form-urlencoded".to_string(),
                body: format!("service={}", self.config.service_url()),
            },
        );

        let response = self
            .transport
            .call(request)
            .await
            .map_err(|e| GmaError::transport(step.to_string(), e))?;

        let ticket = response.body.into_text().trim().to_string();
        if ticket.is_empty() {
            return Err(GmaError::invalid_response(step.to_string(), "empty service ticket"));
        }
        Ok(ServiceTicket(ticket))
    }

    async fn validate_service(&self, st: &ServiceTicket) -> Result<(), GmaError> {
        let step = LoginStep::ValidatingService;
        let service = self.config.service_url();
        let separator = if service.contains('?') { '&' } else { '?' };
        let url = format!("{service}{separator}ticket={}", st.0);

        let response = self
            .transport
            .call(TransportRequest::new(Method::Get, url, ResponseKind::Text))
            .await
            .map_err(|e| GmaError::transport(step.to_string(), e))?;

        if response.body.into_text().contains(CAS_FAILURE_MARKER) {
            return Err(GmaError::authentication_failed(step.to_string(), MSG_AUTH_FAILED));
        }
        Ok(())
    }

    // ========================================================================
    // Identity & Logout
    // ========================================================================

    /// Fetches the current user and records it in the session.
    ///
    /// # Errors
    ///
    /// Propagates request errors; an application failure carries the
    /// server's message.
    pub async fn fetch_identity(&self) -> Result<UserIdentity, GmaError> {
        self.fetch_identity_with(true).await
    }

    async fn fetch_identity_with(&self, reauthenticate: bool) -> Result<UserIdentity, GmaError> {
        let mut request = ServiceRequest::get(IDENTITY_PATH);
        if !reauthenticate {
            request = request.without_reauthentication();
        }
        let origin = request.origin();

        let data = self.request(request).await?;
        let users: Vec<UserWire> = envelope::decode(data, &origin)?;
        let user = users
            .into_iter()
            .next()
            .ok_or_else(|| GmaError::invalid_response(&origin, "no user returned"))?;

        let identity = UserIdentity {
            user_id: user.ren_id,
            display_name: user.preferred_name,
            guid: user.guid.filter(|g| !g.is_empty()),
        };
        self.state().identity = Some(identity.clone());
        debug!(user_id = identity.user_id, "Identity recorded");
        Ok(identity)
    }

    /// Ends the backend web session and clears the session state.
    ///
    /// # Errors
    ///
    /// Propagates the transport error; the session is left unchanged then.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), GmaError> {
        let request = ServiceRequest::new(Method::Head, LOGOUT_PATH).without_reauthentication();
        self.send(&request, ResponseKind::Text).await?;
        self.state().reset();
        info!("Logged out");
        Ok(())
    }

    async fn logout_quietly(&self) {
        if let Err(e) = self.logout().await {
            warn!(error = %e, "Logout failed, continuing");
        }
    }

    /// Best-effort logout followed by dropping all cookies.
    pub async fn teardown(&self) {
        if self.is_authenticated() {
            self.logout_quietly().await;
        }
        self.state().reset();
        self.transport.clear_cookies();
    }

    // ========================================================================
    // Authenticated Requests
    // ========================================================================

    /// Sends an authenticated request and returns the envelope's `data`.
    ///
    /// # Errors
    ///
    /// - `SessionExpired` when the response is not data and the session
    ///   cannot be renewed
    /// - `Application` when the envelope reports failure
    /// - `Transport` for every other transport failure
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn request(&self, request: ServiceRequest) -> Result<Value, GmaError> {
        let origin = request.origin();
        let response = self.send(&request, ResponseKind::Json).await?;
        match response.body {
            ResponseBody::Json(value) => envelope::unwrap_data(value, &origin),
            ResponseBody::Text(_) => {
                Err(GmaError::invalid_response(origin, "expected a JSON response"))
            }
        }
    }

    async fn send(
        &self,
        request: &ServiceRequest,
        expect: ResponseKind,
    ) -> Result<TransportResponse, GmaError> {
        let origin = request.origin();
        let dispatched_in = self.generation.load(Ordering::SeqCst);
        let error = match self.dispatch(request, expect).await {
            Ok(response) => return Ok(response),
            Err(e) if e.is_parse_failure() => e,
            Err(e) => return Err(GmaError::transport(origin, e)),
        };

        let hook = self
            .config
            .reauthenticator()
            .filter(|_| request.reauthenticate)
            .cloned();
        let Some(hook) = hook else {
            warn!(origin = %origin, error = %error, "Response was not data, session timed out");
            self.state().reset();
            return Err(GmaError::session_expired(origin));
        };

        {
            // Requests that expire together share one re-authentication.
            let _reauth = self.reauth.lock().await;
            if self.generation.load(Ordering::SeqCst) == dispatched_in {
                info!(origin = %origin, "Session expired, re-authenticating");
                hook.reauthenticate(self).await?;
                self.generation.fetch_add(1, Ordering::SeqCst);
            } else {
                debug!(origin = %origin, "Session renewed since dispatch, retrying");
            }
        }

        match self.dispatch(request, expect).await {
            Ok(response) => Ok(response),
            Err(e) if e.is_parse_failure() => {
                warn!(origin = %origin, "Retry after re-authentication was not data either");
                self.state().reset();
                Err(GmaError::session_expired(origin))
            }
            Err(e) => Err(GmaError::transport(origin, e)),
        }
    }

    async fn dispatch(
        &self,
        request: &ServiceRequest,
        expect: ResponseKind,
    ) -> Result<TransportResponse, TransportError> {
        let _busy = (!request.no_animation).then(|| BusyGuard::enter(self));
        self.transport.call(request.to_transport(&self.config, expect)).await
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("config", &self.config)
            .field("session", &self.session())
            .finish_non_exhaustive()
    }
}

/// Maps a failed ticket-granting request to a user-facing error.
fn classify_ticket_error(step: LoginStep, error: TransportError) -> GmaError {
    match error.status_code() {
        Some(404) => GmaError::server_unreachable(step.to_string(), MSG_MISCONFIGURED),
        Some(400) => GmaError::credentials_rejected(step.to_string(), MSG_CREDENTIALS),
        Some(status) => GmaError::transport(
            step.to_string(),
            TransportError::status(status, format!("error: {status}")),
        ),
        None => GmaError::server_unreachable(
            step.to_string(),
            format!("{MSG_MISCONFIGURED} ({})", error.message()),
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================
