//! Backend response envelope and wire types.
//!
//! Every backend service answers with
//! `{ "success": bool, "data": ..., "error": { "errorMessage": ... } }`.
//! The wire types below describe the `data` payloads and are converted into
//! `gma_core` models by the resource client.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::error::GmaError;

/// Message used when the backend reports failure without a message.
const UNKNOWN_SERVER_ERROR: &str = "Unknown server error";

// ============================================================================
// Envelope
// ============================================================================

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    success: bool,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    #[serde(default)]
    error_message: Option<String>,
}

/// Unwraps an envelope, returning its `data` on success.
///
/// # Errors
///
/// `GmaError::Application` with the server message when `success` is false,
/// `GmaError::InvalidResponse` when the value is not an envelope at all.
pub fn unwrap_data(value: Value, origin: &str) -> Result<Value, GmaError> {
    let envelope: ApiEnvelope = serde_json::from_value(value)
        .map_err(|e| GmaError::invalid_response(origin, format!("not a service envelope: {e}")))?;

    if envelope.success {
        return Ok(envelope.data);
    }

    let message = envelope
        .error
        .and_then(|e| e.error_message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_SERVER_ERROR.to_string());
    Err(GmaError::application(origin, message))
}

/// Decodes a `data` payload into a wire type.
pub fn decode<T: DeserializeOwned>(data: Value, origin: &str) -> Result<T, GmaError> {
    serde_json::from_value(data)
        .map_err(|e| GmaError::invalid_response(origin, format!("unexpected data: {e}")))
}

// ============================================================================
// Lenient Scalars
// ============================================================================

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(serde_json::Number),
    Text(String),
    Bool(bool),
}

/// Accepts an id sent either as a number or as a numeric string.
pub(crate) fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Scalar::deserialize(deserializer)? {
        Scalar::Number(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom(format!("invalid id {n}"))),
        Scalar::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid id {s:?}"))),
        Scalar::Bool(b) => Err(de::Error::custom(format!("invalid id {b}"))),
    }
}

/// Accepts a measurement value as a number, a string, or null.
fn lenient_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Number(n)) => n.to_string(),
        Some(Scalar::Text(s)) => s,
        Some(Scalar::Bool(b)) => b.to_string(),
        None => default_value(),
    })
}

fn default_value() -> String {
    "0".to_string()
}

// ============================================================================
// Wire Types
// ============================================================================

/// One entry of the "current user" payload.
#[derive(Debug, Deserialize)]
pub(crate) struct UserWire {
    #[serde(rename = "renId", deserialize_with = "lenient_id")]
    pub ren_id: u64,
    #[serde(rename = "preferredName", default)]
    pub preferred_name: String,
    #[serde(rename = "GUID", default)]
    pub guid: Option<String>,
}

/// One assigned node.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssignmentWire {
    #[serde(deserialize_with = "lenient_id")]
    pub node_id: u64,
    pub short_name: String,
}

/// Payload of the report search.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReportSearchWire {
    #[serde(default)]
    pub staff_reports: Option<Vec<StaffReportWire>>,
}

/// One staff report.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StaffReportWire {
    #[serde(deserialize_with = "lenient_id")]
    pub staff_report_id: u64,
    pub node: NodeWire,
    pub start_date: gma_core::DateCode,
    pub end_date: gma_core::DateCode,
}

/// Node reference inside a staff report.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NodeWire {
    #[serde(default)]
    pub short_name: String,
}

/// Payload of the numeric measurement fetch.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct NumericWire {
    #[serde(default)]
    pub numeric_measurements: Vec<serde_json::Map<String, Value>>,
}

/// One measurement inside a strategy group.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MeasurementWire {
    #[serde(deserialize_with = "lenient_id")]
    pub measurement_id: u64,
    #[serde(default)]
    pub measurement_name: Option<String>,
    #[serde(default)]
    pub measurement_description: Option<String>,
    #[serde(default = "default_value", deserialize_with = "lenient_value")]
    pub measurement_value: String,
}

// ============================================================================
// Tests
// ============================================================================
