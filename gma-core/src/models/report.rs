//! Report types.
//!
//! - [`DateCode`] - `YYYYMMDD` date code used by the backend
//! - [`Report`] - One staff report
//! - [`ReportSequence`] - Cursor over the reports of a node

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::assignment::NodeId;
use crate::error::CoreError;

/// Identifier of a staff report.
pub type ReportId = u64;

/// Date format of backend date codes.
const DATE_CODE_FORMAT: &str = "%Y%m%d";

// ============================================================================
// Date Code
// ============================================================================

/// An 8-digit `YYYYMMDD` date code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateCode(NaiveDate);

impl DateCode {
    /// Parses an 8-digit date code.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidDateCode` unless the input is exactly
    /// eight digits forming a valid calendar date.
    pub fn parse(code: &str) -> Result<Self, CoreError> {
        let code = code.trim();
        if code.len() != 8 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidDateCode(code.to_string()));
        }
        NaiveDate::parse_from_str(code, DATE_CODE_FORMAT)
            .map(Self)
            .map_err(|_| CoreError::InvalidDateCode(code.to_string()))
    }

    /// Returns the calendar date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Returns the code in its `YYYYMMDD` wire form.
    pub fn code(&self) -> String {
        self.0.format(DATE_CODE_FORMAT).to_string()
    }

    /// Formats the date as `YYYY-MM-DD`.
    pub fn to_iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for DateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code())
    }
}

impl Serialize for DateCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for DateCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        let raw = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Number(n) => n.to_string(),
        };
        DateCode::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Report
// ============================================================================

/// One staff report for a node and reporting period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Report id.
    pub report_id: ReportId,
    /// Node the report belongs to.
    pub node_id: NodeId,
    /// Node display name.
    pub node_name: String,
    /// First day of the reporting period.
    pub start_date: DateCode,
    /// Last day of the reporting period.
    pub end_date: DateCode,
}

impl Report {
    /// Returns the reporting period as `YYYY-MM-DD – YYYY-MM-DD`.
    pub fn period(&self) -> String {
        format!("{} \u{2013} {}", self.start_date.to_iso(), self.end_date.to_iso())
    }
}

// ============================================================================
// Report Sequence
// ============================================================================

/// Ordered cursor over the reports of one node (most recent first).
///
/// Navigation never wraps and never fails: moving past either end keeps the
/// cursor on the boundary report.
#[derive(Debug, Clone, Default)]
pub struct ReportSequence {
    reports: Vec<Report>,
    position: usize,
}

impl ReportSequence {
    /// Creates a sequence positioned on the first report.
    pub fn new(reports: Vec<Report>) -> Self {
        Self {
            reports,
            position: 0,
        }
    }

    /// Returns the current report.
    pub fn get(&self) -> Option<&Report> {
        self.reports.get(self.position)
    }

    /// Moves to `index` if it is in range and returns that report.
    ///
    /// Out-of-range indexes return `None` and leave the cursor unchanged.
    pub fn get_at(&mut self, index: usize) -> Option<&Report> {
        if index >= self.reports.len() {
            return None;
        }
        self.position = index;
        self.reports.get(index)
    }

    /// Moves to the next (older) report, staying on the last one at the end.
    pub fn next(&mut self) -> Option<&Report> {
        if self.position + 1 < self.reports.len() {
            self.position += 1;
        }
        self.get()
    }

    /// Moves to the previous (newer) report, staying on the first one at the start.
    pub fn prev(&mut self) -> Option<&Report> {
        self.position = self.position.saturating_sub(1);
        self.get()
    }

    /// Returns the cursor position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of reports.
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Returns true if there are no reports.
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Returns all reports in order.
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }
}
