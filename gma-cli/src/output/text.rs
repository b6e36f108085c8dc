//! Text output formatting with colors.

use gma_core::{Assignments, Measurement, MeasurementGroups, Report, ReportSequence, UserIdentity};
use gma_fetch::WriteOutcome;
use gma_store::{Profile, ProfileKey, ProfileSet};

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";

/// Marker in front of the current report or selected profile.
const CURRENT_MARK: char = '▸';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    value_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            value_width: 6,
        }
    }

    /// Formats the logged-in user.
    pub fn format_login(&self, server: &str, identity: &UserIdentity) -> String {
        let mut lines = vec![format!(
            "Logged in to {} as {}",
            self.bold(server),
            self.cyan(&identity.display_name)
        )];
        lines.push(format!("User id: {}", identity.user_id));
        if let Some(guid) = &identity.guid {
            lines.push(format!("GUID:    {}", self.dim(guid)));
        }
        lines.join("\n")
    }

    /// Formats assigned nodes.
    pub fn format_assignments(&self, assignments: &Assignments) -> String {
        if assignments.is_empty() {
            return self.dim("No assignments");
        }

        let mut lines = vec![format!("{:<8} {}", self.bold("Node"), self.bold("Name"))];
        lines.push("─".repeat(40));
        for node in assignments.nodes() {
            lines.push(format!("{:<8} {}", node.id, node.display_name));
        }
        lines.join("\n")
    }

    /// Formats a report sequence, marking the current report.
    pub fn format_reports(&self, reports: &ReportSequence) -> String {
        let Some(first) = reports.reports().first() else {
            return self.dim("No reports available");
        };

        let mut lines = vec![self.bold(&first.node_name)];
        lines.push("─".repeat(40));
        for (i, report) in reports.reports().iter().enumerate() {
            lines.push(self.format_report_line(i, report, i == reports.position()));
        }
        lines.join("\n")
    }

    /// Formats one report line.
    pub fn format_report_line(&self, index: usize, report: &Report, current: bool) -> String {
        let mark = if current { CURRENT_MARK } else { ' ' };
        let line = format!("{mark} {index:>2}  {}  {}", report.period(), self.dim(&format!("#{}", report.report_id)));
        if current { self.bold(&line) } else { line }
    }

    /// Formats a report's measurements grouped by strategy.
    pub fn format_measurements(&self, report: &Report, groups: &MeasurementGroups) -> String {
        let mut lines = vec![format!("{} {}", self.bold(&report.node_name), report.period())];
        lines.push("─".repeat(50));

        if groups.is_empty() {
            lines.push(self.dim("No measurements"));
            return lines.join("\n");
        }

        for (strategy, measurements) in groups.iter() {
            lines.push(String::new());
            lines.push(self.yellow(strategy));
            for measurement in measurements {
                lines.push(self.format_measurement(measurement));
            }
        }
        lines.join("\n")
    }

    /// Formats one measurement line.
    pub fn format_measurement(&self, measurement: &Measurement) -> String {
        format!(
            "  {:>w$}  {}  {}",
            measurement.value,
            measurement.name,
            self.dim(&format!("#{}", measurement.measurement_id)),
            w = self.value_width
        )
    }

    /// Formats the result of a write.
    pub fn format_write(&self, measurement: &Measurement, outcome: WriteOutcome) -> String {
        match outcome {
            WriteOutcome::Saved => format!(
                "{} {} = {}",
                self.green("Saved"),
                measurement.name,
                self.bold(&measurement.value)
            ),
            WriteOutcome::Cancelled => format!(
                "{} {} (superseded by a newer value)",
                self.yellow("Cancelled"),
                measurement.name
            ),
        }
    }

    /// Formats the profile list, marking the selected profile.
    pub fn format_profiles(&self, set: &ProfileSet) -> String {
        let mut lines = vec![format!("{:<8} {}", self.bold("Key"), self.bold("Server"))];
        lines.push("─".repeat(60));
        for (key, _) in set.labels() {
            if let Some(profile) = set.get(key) {
                lines.push(self.format_profile(key, profile, key == set.current));
            }
        }
        lines.join("\n")
    }

    /// Formats one profile line.
    pub fn format_profile(&self, key: ProfileKey, profile: &Profile, selected: bool) -> String {
        let mark = if selected { CURRENT_MARK } else { ' ' };
        let line = format!(
            "{mark} {:<6} {}\n           {}  {}",
            key.to_string(),
            profile.label,
            self.dim(&profile.gma_base),
            self.dim(&profile.cas_url)
        );
        if selected { self.bold(&line) } else { line }
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

// ============================================================================
// Tests
// ============================================================================
