// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # GMA Core
//!
//! Core types and models for the GMA reporting client.
//!
//! This crate provides the domain models shared by the other GMA crates:
//!
//! ### Identity & Assignments
//! - [`UserIdentity`] - The logged-in user as reported by the backend
//! - [`Role`] - Assignment role (staff or director)
//! - [`AssignmentNode`] - A node the user is assigned to
//! - [`Assignments`] - Assignment set with id/name lookups
//!
//! ### Reports
//! - [`DateCode`] - 8-digit `YYYYMMDD` date code
//! - [`Report`] - One staff report for a node and period
//! - [`ReportSequence`] - Navigable cursor over fetched reports
//!
//! ### Measurements
//! - [`Measurement`] - One numeric measurement of a report
//! - [`MeasurementGroups`] - Measurements grouped by strategy name

pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Identity & assignments
    AssignmentNode,
    Assignments,
    NodeId,
    Role,
    UserIdentity,
    // Reports
    DateCode,
    Report,
    ReportId,
    ReportSequence,
    // Measurements
    Measurement,
    MeasurementGroups,
    MeasurementId,
};
