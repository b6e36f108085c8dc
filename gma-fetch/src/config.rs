//! Client configuration and collaborator hooks.
//!
//! The configuration names the two servers the client talks to and carries
//! the hooks the session controller calls out to:
//! - [`BusyIndicator`] - shown while requests are outstanding
//! - [`Reauthenticator`] - renews an expired session (optional)

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::GmaError;
use crate::session::SessionController;

/// Default delay before a debounced measurement write fires.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_secs(3);

// ============================================================================
// Busy Indicator
// ============================================================================

/// Externally visible "busy" indicator.
///
/// Both calls must be safe to repeat. `hide` is only issued when the
/// controller's outstanding request count drops to zero.
pub trait BusyIndicator: Send + Sync {
    /// Shows the indicator.
    fn show(&self);

    /// Hides the indicator.
    fn hide(&self);
}

/// Indicator that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBusyIndicator;

impl BusyIndicator for NoopBusyIndicator {
    fn show(&self) {}

    fn hide(&self) {}
}

type Callback = Box<dyn Fn() + Send + Sync>;

/// Indicator built from two closures.
pub struct CallbackBusyIndicator {
    on_show: Callback,
    on_hide: Callback,
}

impl CallbackBusyIndicator {
    /// Creates an indicator calling `on_show` and `on_hide`.
    pub fn new<S, H>(on_show: S, on_hide: H) -> Self
    where
        S: Fn() + Send + Sync + 'static,
        H: Fn() + Send + Sync + 'static,
    {
        Self {
            on_show: Box::new(on_show),
            on_hide: Box::new(on_hide),
        }
    }
}

impl BusyIndicator for CallbackBusyIndicator {
    fn show(&self) {
        (self.on_show)();
    }

    fn hide(&self) {
        (self.on_hide)();
    }
}

impl fmt::Debug for CallbackBusyIndicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackBusyIndicator").finish_non_exhaustive()
    }
}

// ============================================================================
// Reauthenticator
// ============================================================================

/// Renews an expired session.
///
/// Called by the session controller when an authenticated request comes back
/// as something other than data. On success the original request is sent
/// once more.
#[async_trait]
pub trait Reauthenticator: Send + Sync {
    /// Logs in again through `session`.
    async fn reauthenticate(&self, session: &SessionController) -> Result<(), GmaError>;
}

/// Re-authenticates by logging in again with stored credentials.
#[derive(Clone)]
pub struct CredentialReauthenticator {
    username: String,
    password: String,
}

impl CredentialReauthenticator {
    /// Creates a reauthenticator for the given credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for CredentialReauthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialReauthenticator")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[async_trait]
impl Reauthenticator for CredentialReauthenticator {
    async fn reauthenticate(&self, session: &SessionController) -> Result<(), GmaError> {
        session.login(&self.username, &self.password).await.map(|_| ())
    }
}

// ============================================================================
// Client Config
// ============================================================================

/// Configuration consumed by the session controller.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: String,
    identity_provider_url: String,
    busy: Arc<dyn BusyIndicator>,
    reauthenticator: Option<Arc<dyn Reauthenticator>>,
    autosave_delay: Duration,
}

impl ClientConfig {
    /// Creates a builder for the given backend and identity provider URLs.
    pub fn builder(
        base_url: impl Into<String>,
        identity_provider_url: impl Into<String>,
    ) -> ClientConfigBuilder {
        ClientConfigBuilder::new(base_url, identity_provider_url)
    }

    /// Backend base URL as configured; service paths are appended verbatim.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Identity provider (CAS) base URL, without a trailing `/`.
    pub fn identity_provider_url(&self) -> &str {
        &self.identity_provider_url
    }

    /// CAS ticket endpoint.
    pub fn tickets_url(&self) -> String {
        format!("{}/v1/tickets", self.identity_provider_url)
    }

    /// The service URL tickets are issued for.
    pub fn service_url(&self) -> String {
        format!("{}?q=node", self.base_url)
    }

    /// Absolute URL of a backend service path such as `?q=logout`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// The busy indicator.
    pub fn busy(&self) -> &Arc<dyn BusyIndicator> {
        &self.busy
    }

    /// The re-authentication hook, if configured.
    pub fn reauthenticator(&self) -> Option<&Arc<dyn Reauthenticator>> {
        self.reauthenticator.as_ref()
    }

    /// Delay before a debounced write fires.
    pub fn autosave_delay(&self) -> Duration {
        self.autosave_delay
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("identity_provider_url", &self.identity_provider_url)
            .field("reauthenticate", &self.reauthenticator.is_some())
            .field("autosave_delay", &self.autosave_delay)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Client Config Builder
// ============================================================================

/// Builder for [`ClientConfig`].
pub struct ClientConfigBuilder {
    base_url: String,
    identity_provider_url: String,
    busy: Option<Arc<dyn BusyIndicator>>,
    reauthenticator: Option<Arc<dyn Reauthenticator>>,
    autosave_delay: Duration,
}

impl ClientConfigBuilder {
    /// Creates a builder.
    pub fn new(base_url: impl Into<String>, identity_provider_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            identity_provider_url: identity_provider_url.into(),
            busy: None,
            reauthenticator: None,
            autosave_delay: DEFAULT_AUTOSAVE_DELAY,
        }
    }

    /// Sets the busy indicator.
    pub fn busy_indicator(mut self, busy: Arc<dyn BusyIndicator>) -> Self {
        self.busy = Some(busy);
        self
    }

    /// Sets the busy indicator from two closures.
    pub fn on_busy<S, H>(self, on_show: S, on_hide: H) -> Self
    where
        S: Fn() + Send + Sync + 'static,
        H: Fn() + Send + Sync + 'static,
    {
        self.busy_indicator(Arc::new(CallbackBusyIndicator::new(on_show, on_hide)))
    }

    /// Sets the re-authentication hook.
    pub fn reauthenticator(mut self, hook: Arc<dyn Reauthenticator>) -> Self {
        self.reauthenticator = Some(hook);
        self
    }

    /// Sets the debounce delay for measurement writes.
    pub fn autosave_delay(mut self, delay: Duration) -> Self {
        self.autosave_delay = delay;
        self
    }

    /// Validates the URLs and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns `GmaError::InvalidConfig` if either URL is not an absolute
    /// `http`/`https` URL.
    pub fn build(self) -> Result<ClientConfig, GmaError> {
        let base_url = base_url(&self.base_url)?;
        let (identity_provider_url, _) =
            validate_url(&self.identity_provider_url, "identity provider URL")?;
        let identity_provider_url = identity_provider_url.trim_end_matches('/').to_string();

        Ok(ClientConfig {
            base_url,
            identity_provider_url,
            busy: self.busy.unwrap_or_else(|| Arc::new(NoopBusyIndicator)),
            reauthenticator: self.reauthenticator,
            autosave_delay: self.autosave_delay,
        })
    }
}

/// Checks that the URL is an absolute `http`/`https` URL.
fn validate_url<'a>(raw: &'a str, what: &str) -> Result<(&'a str, Url), GmaError> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|e| GmaError::InvalidConfig(format!("{what} {trimmed:?}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(GmaError::InvalidConfig(format!(
            "{what} {trimmed:?}: unsupported scheme {}",
            parsed.scheme()
        )));
    }
    Ok((trimmed, parsed))
}

/// Validates the backend URL and keeps it as given.
///
/// A bare host (`https://gma.example.com`) gets its root `/` so that
/// `?q=...` lands on the path; any other base is left untouched.
fn base_url(raw: &str) -> Result<String, GmaError> {
    let (trimmed, parsed) = validate_url(raw, "base URL")?;
    let bare_host = parsed.path() == "/"
        && parsed.query().is_none()
        && parsed.fragment().is_none()
        && !trimmed.ends_with('/');
    if bare_host {
        Ok(format!("{trimmed}/"))
    } else {
        Ok(trimmed.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_urls_are_normalized() {
        let config = ClientConfig::builder("https://gma.example.com/gma47/", "https://signin.example.com/cas/")
            .build()
            .unwrap();

        assert_eq!(config.base_url(), "https://gma.example.com/gma47/");
        assert_eq!(config.tickets_url(), "https://signin.example.com/cas/v1/tickets");
        assert_eq!(config.service_url(), "https://gma.example.com/gma47/?q=node");
        assert_eq!(config.endpoint("?q=logout"), "https://gma.example.com/gma47/?q=logout");
    }

    #[test]
    fn test_script_base_url_is_kept() {
        let config = ClientConfig::builder(" https://gma.example.com/index.php ", "https://signin.example.com/cas")
            .build()
            .unwrap();

        assert_eq!(config.base_url(), "https://gma.example.com/index.php");
        assert_eq!(config.endpoint("?q=logout"), "https://gma.example.com/index.php?q=logout");
        assert_eq!(config.service_url(), "https://gma.example.com/index.php?q=node");
    }

    #[test]
    fn test_bare_host_gets_root_path() {
        let config = ClientConfig::builder("https://gma.example.com", "https://signin.example.com/cas")
            .build()
            .unwrap();

        assert_eq!(config.endpoint("?q=logout"), "https://gma.example.com/?q=logout");
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::builder("http://gma.example.com/", "https://signin.example.com/cas")
            .build()
            .unwrap();

        assert!(config.reauthenticator().is_none());
        assert_eq!(config.autosave_delay(), DEFAULT_AUTOSAVE_DELAY);
    }

    #[test]
    fn test_rejects_invalid_urls() {
        assert!(matches!(
            ClientConfig::builder("gma.example.com", "https://cas").build(),
            Err(GmaError::InvalidConfig(_))
        ));
        assert!(matches!(
            ClientConfig::builder("https://gma.example.com", "ftp://cas.example.com").build(),
            Err(GmaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_callback_busy_indicator() {
        let shows = Arc::new(AtomicUsize::new(0));
        let hides = Arc::new(AtomicUsize::new(0));
        let (s, h) = (Arc::clone(&shows), Arc::clone(&hides));

        let config = ClientConfig::builder("https://gma.example.com", "https://cas.example.com")
            .on_busy(
                move || {
                    s.fetch_add(1, Ordering::SeqCst);
                },
                move || {
                    h.fetch_add(1, Ordering::SeqCst);
                },
            )
            .build()
            .unwrap();

        config.busy().show();
        config.busy().hide();
        config.busy().hide();
        assert_eq!(shows.load(Ordering::SeqCst), 1);
        assert_eq!(hides.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_credentials_are_redacted() {
        let hook = CredentialReauthenticator::new("sam", "hunter2");
        let debug = format!("{hook:?}");
        assert!(debug.contains("sam"));
        assert!(!debug.contains("hunter2"));
    }
}
