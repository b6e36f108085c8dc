//! Domain models for the GMA client.
//!
//! ## Submodules
//!
//! - [`assignment`] - Identity and assignment types (UserIdentity, Role, Assignments)
//! - [`report`] - Report types (DateCode, Report, ReportSequence)
//! - [`measurement`] - Measurement types (Measurement, MeasurementGroups)

mod assignment;
mod measurement;
mod report;

pub use assignment::{AssignmentNode, Assignments, NodeId, Role, UserIdentity};
pub use measurement::{Measurement, MeasurementGroups, MeasurementId};
pub use report::{DateCode, Report, ReportId, ReportSequence};
