//! Measurement types.

use serde::{Deserialize, Serialize};

use super::report::ReportId;

/// Identifier of a measurement within a report.
pub type MeasurementId = u64;

// ============================================================================
// Measurement
// ============================================================================

/// One numeric measurement of a report.
///
/// The value is kept in its numeric-as-string wire form so edits round-trip
/// exactly as the user typed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    /// Report this measurement belongs to.
    pub report_id: ReportId,
    /// Measurement id.
    pub measurement_id: MeasurementId,
    /// Display label.
    pub name: String,
    /// Longer description.
    pub description: String,
    /// Current value.
    pub value: String,
}

impl Measurement {
    /// Creates a measurement with the backend's default label, description and value.
    pub fn new(report_id: ReportId, measurement_id: MeasurementId) -> Self {
        Self {
            report_id,
            measurement_id,
            name: "Measurement".to_string(),
            description: "This is a GMA measurement".to_string(),
            value: "0".to_string(),
        }
    }

    /// Sets the display label.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

// ============================================================================
// Measurement Groups
// ============================================================================

/// Measurements grouped by strategy name, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MeasurementGroups {
    groups: Vec<(String, Vec<Measurement>)>,
}

impl MeasurementGroups {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a strategy group.
    ///
    /// A repeated strategy name replaces the earlier group's measurements
    /// but keeps its original position.
    pub fn insert(&mut self, strategy: impl Into<String>, measurements: Vec<Measurement>) {
        let strategy = strategy.into();
        match self.groups.iter_mut().find(|(name, _)| *name == strategy) {
            Some((_, existing)) => *existing = measurements,
            None => self.groups.push((strategy, measurements)),
        }
    }

    /// Returns the measurements of a strategy.
    pub fn get(&self, strategy: &str) -> Option<&[Measurement]> {
        self.groups
            .iter()
            .find(|(name, _)| name == strategy)
            .map(|(_, m)| m.as_slice())
    }

    /// Iterates over `(strategy, measurements)` in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Measurement])> {
        self.groups.iter().map(|(name, m)| (name.as_str(), m.as_slice()))
    }

    /// Returns the strategy names in order.
    pub fn strategies(&self) -> Vec<&str> {
        self.groups.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Finds a measurement by id across all strategies.
    pub fn find(&self, measurement_id: MeasurementId) -> Option<&Measurement> {
        self.groups
            .iter()
            .flat_map(|(_, m)| m.iter())
            .find(|m| m.measurement_id == measurement_id)
    }

    /// Number of strategy groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if there are no groups.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total number of measurements across all groups.
    pub fn measurement_count(&self) -> usize {
        self.groups.iter().map(|(_, m)| m.len()).sum()
    }
}
