//! JSON output formatting.

use anyhow::Result;
use gma_core::{Assignments, Measurement, MeasurementGroups, Report, ReportSequence, UserIdentity};
use gma_fetch::WriteOutcome;
use gma_store::{Profile, ProfileKey, ProfileSet};
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// Logged-in user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutput<'a> {
    pub server: &'a str,
    #[serde(flatten)]
    pub identity: &'a UserIdentity,
}

/// One assigned node.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeOutput<'a> {
    pub id: u64,
    pub name: &'a str,
    pub role: &'a str,
}

/// One report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutput<'a> {
    #[serde(flatten)]
    pub report: &'a Report,
    pub period: String,
    pub current: bool,
}

/// A report's measurements.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementsOutput<'a> {
    pub report: ReportOutput<'a>,
    pub strategies: Vec<StrategyOutput<'a>>,
}

/// One strategy group.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyOutput<'a> {
    pub strategy: &'a str,
    pub measurements: &'a [Measurement],
}

/// Result of a write.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOutput<'a> {
    pub report_id: u64,
    pub measurement_id: u64,
    pub value: &'a str,
    pub outcome: &'static str,
}

/// One profile.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileOutput<'a> {
    pub key: String,
    #[serde(flatten)]
    pub profile: &'a Profile,
    pub selected: bool,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats the logged-in user.
    pub fn format_login(&self, server: &str, identity: &UserIdentity) -> Result<String> {
        self.format(&LoginOutput { server, identity })
    }

    /// Formats assigned nodes.
    pub fn format_assignments(&self, assignments: &Assignments) -> Result<String> {
        let nodes: Vec<NodeOutput<'_>> = assignments
            .nodes()
            .iter()
            .map(|n| NodeOutput {
                id: n.id,
                name: &n.display_name,
                role: n.role.as_str(),
            })
            .collect();
        self.format(&nodes)
    }

    /// Formats a report sequence.
    pub fn format_reports(&self, reports: &ReportSequence) -> Result<String> {
        let outputs: Vec<ReportOutput<'_>> = reports
            .reports()
            .iter()
            .enumerate()
            .map(|(i, r)| report_output(r, i == reports.position()))
            .collect();
        self.format(&outputs)
    }

    /// Formats a report's measurements.
    pub fn format_measurements(&self, report: &Report, groups: &MeasurementGroups) -> Result<String> {
        let output = MeasurementsOutput {
            report: report_output(report, true),
            strategies: groups
                .iter()
                .map(|(strategy, measurements)| StrategyOutput {
                    strategy,
                    measurements,
                })
                .collect(),
        };
        self.format(&output)
    }

    /// Formats the result of a write.
    pub fn format_write(&self, measurement: &Measurement, outcome: WriteOutcome) -> Result<String> {
        self.format(&WriteOutput {
            report_id: measurement.report_id,
            measurement_id: measurement.measurement_id,
            value: &measurement.value,
            outcome: outcome_name(outcome),
        })
    }

    /// Formats the profile list.
    pub fn format_profiles(&self, set: &ProfileSet) -> Result<String> {
        let outputs: Vec<ProfileOutput<'_>> = set
            .labels()
            .into_iter()
            .filter_map(|(key, _)| set.get(key).map(|profile| profile_output(key, profile, set.current)))
            .collect();
        self.format(&outputs)
    }
}

fn report_output(report: &Report, current: bool) -> ReportOutput<'_> {
    ReportOutput {
        report,
        period: report.period(),
        current,
    }
}

fn profile_output(key: ProfileKey, profile: &Profile, selected: ProfileKey) -> ProfileOutput<'_> {
    ProfileOutput {
        key: key.to_string(),
        profile,
        selected: key == selected,
    }
}

/// Lowercase name of a write outcome.
pub fn outcome_name(outcome: WriteOutcome) -> &'static str {
    match outcome {
        WriteOutcome::Saved => "saved",
        WriteOutcome::Cancelled => "cancelled",
    }
}

// ============================================================================
// Tests
// ============================================================================
