//! Shared fixtures for the gma-fetch integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use gma_fetch::{
    BusyIndicator, ClientConfig, GmaClient, GmaError, Method, Reauthenticator, ScriptedTransport,
    SessionController, TransportResponse,
};

pub const BASE_URL: &str = "https://gma.example.com/gma/";
pub const CAS_URL: &str = "https://signin.example.com/cas";
pub const TGT_LOCATION: &str = "https://signin.example.com/cas/v1/tickets/TGT-1";
pub const IDENTITY_FRAGMENT: &str = "gma_user&type=current";

/// Busy indicator that records every call.
#[derive(Debug, Default)]
pub struct RecordingBusy {
    events: Mutex<Vec<&'static str>>,
}

impl RecordingBusy {
    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }

    pub fn hides(&self) -> usize {
        self.events().iter().filter(|e| **e == "hide").count()
    }

    pub fn shows(&self) -> usize {
        self.events().iter().filter(|e| **e == "show").count()
    }
}

impl BusyIndicator for RecordingBusy {
    fn show(&self) {
        self.events.lock().unwrap().push("show");
    }

    fn hide(&self) {
        self.events.lock().unwrap().push("hide");
    }
}

/// Reauthenticator that counts calls and succeeds or fails on demand.
#[derive(Debug, Default)]
pub struct CountingReauth {
    calls: AtomicUsize,
    fail: bool,
}

impl CountingReauth {
    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reauthenticator for CountingReauth {
    async fn reauthenticate(&self, _session: &SessionController) -> Result<(), GmaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(GmaError::credentials_rejected(
                "acquiring ticket-granting ticket",
                "Credentials were not accepted",
            ))
        } else {
            Ok(())
        }
    }
}

pub struct Fixture {
    pub transport: Arc<ScriptedTransport>,
    pub busy: Arc<RecordingBusy>,
    pub session: Arc<SessionController>,
    pub client: GmaClient,
}

pub fn fixture() -> Fixture {
    fixture_with(None)
}

pub fn fixture_with(hook: Option<Arc<dyn Reauthenticator>>) -> Fixture {
    let transport = Arc::new(ScriptedTransport::new());
    let busy = Arc::new(RecordingBusy::default());

    let mut builder = ClientConfig::builder(BASE_URL, CAS_URL)
        .busy_indicator(Arc::clone(&busy) as Arc<dyn BusyIndicator>)
        .autosave_delay(Duration::from_secs(3));
    if let Some(hook) = hook {
        builder = builder.reauthenticator(hook);
    }
    let config = builder.build().unwrap();

    let session = Arc::new(SessionController::new(config, Arc::clone(&transport) as _));
    let client = GmaClient::new(Arc::clone(&session));
    Fixture {
        transport,
        busy,
        session,
        client,
    }
}

pub fn ok(data: Value) -> TransportResponse {
    TransportResponse::json(json!({ "success": true, "data": data }))
}

pub fn app_error(message: &str) -> TransportResponse {
    TransportResponse::json(json!({ "success": false, "error": { "errorMessage": message } }))
}

/// Scripts one successful CAS login for user 42.
pub fn script_login(transport: &ScriptedTransport) {
    transport.respond(Method::Post, "/cas/v1/tickets", TransportResponse::created(TGT_LOCATION));
    transport.respond(Method::Post, "tickets/TGT-1", TransportResponse::text("ST-1"));
    transport.respond(Method::Get, "ticket=ST-1", TransportResponse::text("<html>Welcome</html>"));
    transport.respond(
        Method::Get,
        IDENTITY_FRAGMENT,
        ok(json!([{ "renId": "42", "preferredName": "Sam", "GUID": "F00D-42" }])),
    );
}

pub fn script_logout(transport: &ScriptedTransport) {
    transport.respond(Method::Head, "?q=logout", TransportResponse::text(""));
}
