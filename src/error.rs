//! Crate-wide error taxonomy for dispatch model construction and solving.

use std::error::Error;
use std::fmt;

/// Errors surfaced by model construction, window solving, and the driver.
///
/// Configuration problems are detected eagerly, before any solve, and are
/// never silently corrected. Infeasibility and solver unavailability are
/// fatal for the run; previously committed periods remain available on the
/// driver for partial reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// Invalid static parameter, with a dotted field path and constraint.
    Configuration {
        /// Dotted field path (e.g., `"storage.min_soc"`).
        field: String,
        /// Human-readable constraint description.
        message: String,
    },
    /// The joint optimization has no feasible solution for a window.
    InfeasibleWindow {
        /// Period index at which the infeasible window starts.
        window_start: usize,
    },
    /// A window's objective is unbounded (a modeling error, not a data one).
    UnboundedWindow {
        /// Period index at which the unbounded window starts.
        window_start: usize,
    },
    /// The external solver could not be invoked at all.
    SolverUnavailable {
        /// Backend-reported reason.
        message: String,
    },
}

impl DispatchError {
    /// Shorthand for a configuration error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration { field, message } => {
                write!(f, "configuration error: {field} — {message}")
            }
            Self::InfeasibleWindow { window_start } => {
                write!(f, "no feasible dispatch for window starting at period {window_start}")
            }
            Self::UnboundedWindow { window_start } => {
                write!(f, "unbounded objective for window starting at period {window_start}")
            }
            Self::SolverUnavailable { message } => {
                write!(f, "optimization solver unavailable: {message}")
            }
        }
    }
}

impl Error for DispatchError {}

#[cfg(test)]
mod tests {
    use super::DispatchError;

    #[test]
    fn configuration_display_includes_field_path() {
        let e = DispatchError::config("storage.min_soc", "must be < storage.max_soc");
        let s = format!("{e}");
        assert!(s.contains("storage.min_soc"));
        assert!(s.contains("must be <"));
    }

    #[test]
    fn infeasible_display_includes_window_index() {
        let e = DispatchError::InfeasibleWindow { window_start: 4320 };
        assert!(format!("{e}").contains("4320"));
    }
}
