//! Typed backend operations built on the session controller.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, instrument};

use gma_core::{
    AssignmentNode, Assignments, Measurement, MeasurementGroups, NodeId, Report, ReportId,
    ReportSequence, Role, UserIdentity,
};

use crate::autosave::MeasurementField;
use crate::envelope::{self, AssignmentWire, MeasurementWire, NumericWire, ReportSearchWire};
use crate::error::GmaError;
use crate::session::{ServiceRequest, SessionController};

/// Most reports a node search returns.
pub const MAX_REPORTS: usize = 10;

/// Service path of the report search.
pub const REPORT_SEARCH_PATH: &str = "?q=gmaservices/gma_staffReport/searchOwn";

const NO_REPORTS: &str = "No reports available";

/// Service path listing a user's assigned nodes for a role.
pub fn assignments_path(user_id: u64, role: Role) -> String {
    format!("?q=gmaservices/gma_user/{user_id}/assignments/{}", role.as_str())
}

/// Service path of a report's numeric measurements.
pub fn measurements_path(report_id: ReportId) -> String {
    format!("?q=gmaservices/gma_staffReport/{report_id}/numeric")
}

/// Service path a report's measurements are written to.
pub fn report_path(report_id: ReportId) -> String {
    format!("?q=gmaservices/gma_staffReport/{report_id}")
}

// ============================================================================
// GMA Client
// ============================================================================

/// Resource client for the GMA backend.
///
/// Cheap to clone; every clone shares the same session.
#[derive(Debug, Clone)]
pub struct GmaClient {
    session: Arc<SessionController>,
}

impl GmaClient {
    /// Creates a client on top of a shared session controller.
    pub fn new(session: Arc<SessionController>) -> Self {
        Self { session }
    }

    /// The underlying session controller.
    pub fn session(&self) -> &Arc<SessionController> {
        &self.session
    }

    /// Logs in; see [`SessionController::login`].
    ///
    /// # Errors
    ///
    /// Propagates the login flow's error.
    pub async fn login(&self, username: &str, password: &str) -> Result<UserIdentity, GmaError> {
        self.session.login(username, password).await
    }

    /// Logs out; see [`SessionController::logout`].
    ///
    /// # Errors
    ///
    /// Propagates the transport error.
    pub async fn logout(&self) -> Result<(), GmaError> {
        self.session.logout().await
    }

    /// Fetches the current user.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn identity(&self) -> Result<UserIdentity, GmaError> {
        self.session.fetch_identity().await
    }

    /// Fetches the nodes the user is assigned to for `role`.
    ///
    /// A missing or empty list is an empty result.
    ///
    /// # Errors
    ///
    /// `SessionExpired` when no identity is known; otherwise request errors.
    #[instrument(skip(self))]
    pub async fn assignments(&self, role: Role) -> Result<Assignments, GmaError> {
        let user_id = self.session.session().user_id().ok_or_else(|| {
            GmaError::session_expired(format!("GET ?q=gmaservices/gma_user/assignments/{role}"))
        })?;
        let request = ServiceRequest::get(assignments_path(user_id, role));
        let origin = request.origin();

        let data = self.session.request(request).await?;
        let wire: Vec<AssignmentWire> = match data.get(role.as_str()) {
            None | Some(Value::Null) => Vec::new(),
            Some(list) => envelope::decode(list.clone(), &origin)?,
        };

        let nodes = wire
            .into_iter()
            .map(|a| AssignmentNode {
                id: a.node_id,
                display_name: a.short_name,
                role,
            })
            .collect::<Vec<_>>();
        debug!(count = nodes.len(), "Assignments fetched");
        Ok(Assignments::new(nodes))
    }

    /// Fetches the most recent reports of a node, newest first.
    ///
    /// # Errors
    ///
    /// `Application` with "No reports available" when the node has none;
    /// otherwise request errors.
    #[instrument(skip(self))]
    pub async fn reports_for_node(&self, node_id: NodeId) -> Result<ReportSequence, GmaError> {
        let request = ServiceRequest::post(
            REPORT_SEARCH_PATH,
            json!({ "nodeId": [node_id], "maxResult": MAX_REPORTS }),
        );
        let origin = request.origin();

        let data = self.session.request(request).await?;
        // An empty search result arrives as `[]` rather than an object.
        let search: ReportSearchWire = if data.is_object() {
            envelope::decode(data, &origin)?
        } else {
            ReportSearchWire::default()
        };

        let reports = search
            .staff_reports
            .unwrap_or_default()
            .into_iter()
            .take(MAX_REPORTS)
            .map(|r| Report {
                report_id: r.staff_report_id,
                node_id,
                node_name: r.node.short_name,
                start_date: r.start_date,
                end_date: r.end_date,
            })
            .collect::<Vec<_>>();

        if reports.is_empty() {
            return Err(GmaError::application(origin, NO_REPORTS));
        }
        debug!(count = reports.len(), "Reports fetched");
        Ok(ReportSequence::new(reports))
    }

    /// Fetches a report's numeric measurements grouped by strategy.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    #[instrument(skip(self))]
    pub async fn measurements(&self, report_id: ReportId) -> Result<MeasurementGroups, GmaError> {
        let request = ServiceRequest::get(measurements_path(report_id));
        let origin = request.origin();

        let data = self.session.request(request).await?;
        let wire: NumericWire = if data.is_object() {
            envelope::decode(data, &origin)?
        } else {
            NumericWire {
                numeric_measurements: Vec::new(),
            }
        };

        let mut groups = MeasurementGroups::new();
        for entry in wire.numeric_measurements {
            for (strategy, list) in entry {
                let items: Vec<MeasurementWire> = envelope::decode(list, &origin)?;
                let measurements = items
                    .into_iter()
                    .map(|m| to_measurement(report_id, m))
                    .collect();
                groups.insert(strategy, measurements);
            }
        }
        debug!(
            strategies = groups.len(),
            measurements = groups.measurement_count(),
            "Measurements fetched"
        );
        Ok(groups)
    }

    /// Fetches the measurements of `report`.
    ///
    /// # Errors
    ///
    /// Propagates request errors.
    pub async fn measurements_for(&self, report: &Report) -> Result<MeasurementGroups, GmaError> {
        self.measurements(report.report_id).await
    }

    /// Writes one measurement value without showing the busy indicator.
    ///
    /// # Errors
    ///
    /// `Application` with origin `PUT <path>` when the backend refuses the
    /// write; otherwise request errors.
    #[instrument(skip(self, measurement), fields(report_id = measurement.report_id, measurement_id = measurement.measurement_id))]
    pub async fn save_measurement(&self, measurement: &Measurement) -> Result<(), GmaError> {
        let body = json!([{
            "measurementId": measurement.measurement_id,
            "type": "numeric",
            "value": measurement.value,
        }]);
        let request = ServiceRequest::put(report_path(measurement.report_id), body).no_animation();

        self.session.request(request).await?;
        debug!(value = %measurement.value, "Measurement saved");
        Ok(())
    }

    /// Wraps a measurement in a debounced field writer.
    pub fn field(&self, measurement: Measurement) -> MeasurementField {
        MeasurementField::new(
            self.clone(),
            measurement,
            self.session.config().autosave_delay(),
        )
    }
}

fn to_measurement(report_id: ReportId, wire: MeasurementWire) -> Measurement {
    let mut measurement = Measurement::new(report_id, wire.measurement_id).with_value(wire.measurement_value);
    if let Some(name) = wire.measurement_name.filter(|n| !n.is_empty()) {
        measurement = measurement.with_name(name);
    }
    if let Some(description) = wire.measurement_description.filter(|d| !d.is_empty()) {
        measurement = measurement.with_description(description);
    }
    measurement
}

// ============================================================================
// Tests
// ============================================================================
