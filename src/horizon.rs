//! Discretized time horizon shared by the optimizer and the driver.

use crate::error::DispatchError;

/// Rolling-horizon timing parameters.
///
/// The full simulation spans `total_steps` periods of `dt_hours` each. Every
/// optimization call covers `dispatch_horizon` periods; of those, only the
/// first `dispatch_solution` are committed before the window advances.
///
/// Invariant: `dispatch_solution <= dispatch_horizon <= total_steps`.
#[derive(Debug, Clone, Copy)]
pub struct TimeHorizon {
    /// Duration of one period in hours.
    pub dt_hours: f64,
    /// Periods solved jointly per optimization call.
    pub dispatch_horizon: usize,
    /// Periods committed (simulated) before re-solving.
    pub dispatch_solution: usize,
    /// Length of the full simulation in periods.
    pub total_steps: usize,
}

impl TimeHorizon {
    /// Creates a validated time horizon.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any length is zero, if `dt_hours` is
    /// not positive, or if the ordering invariant is violated.
    pub fn new(
        dt_hours: f64,
        dispatch_horizon: usize,
        dispatch_solution: usize,
        total_steps: usize,
    ) -> Result<Self, DispatchError> {
        if !(dt_hours > 0.0) {
            return Err(DispatchError::config("horizon.dt_hours", "must be > 0"));
        }
        if dispatch_solution == 0 {
            return Err(DispatchError::config(
                "horizon.dispatch_solution",
                "must be > 0",
            ));
        }
        if dispatch_solution > dispatch_horizon {
            return Err(DispatchError::config(
                "horizon.dispatch_solution",
                "must be <= horizon.dispatch_horizon",
            ));
        }
        if dispatch_horizon > total_steps {
            return Err(DispatchError::config(
                "horizon.dispatch_horizon",
                "must be <= horizon.total_steps",
            ));
        }
        Ok(Self {
            dt_hours,
            dispatch_horizon,
            dispatch_solution,
            total_steps,
        })
    }

    /// Number of rolling-horizon iterations needed to cover the full run.
    pub fn num_windows(&self) -> usize {
        self.total_steps.div_ceil(self.dispatch_solution)
    }

    /// Number of periods actually committed for the window starting at `t`.
    ///
    /// Equal to `dispatch_solution` except possibly for the final window,
    /// which is truncated at `total_steps`.
    pub fn committed_len(&self, window_start: usize) -> usize {
        self.dispatch_solution.min(self.total_steps - window_start)
    }

    /// Start indices of every rolling-horizon window, in order.
    pub fn window_starts(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.total_steps).step_by(self.dispatch_solution)
    }
}

#[cfg(test)]
mod tests {
    use super::TimeHorizon;

    #[test]
    fn annual_hourly_horizon_has_365_windows() {
        let h = TimeHorizon::new(1.0, 48, 24, 8760).ok();
        assert_eq!(h.map(|h| h.num_windows()), Some(365));
    }

    #[test]
    fn window_starts_cover_the_run() {
        let h = TimeHorizon::new(1.0, 48, 24, 8760).ok();
        let starts: Vec<usize> = h.map(|h| h.window_starts().collect()).unwrap_or_default();
        assert_eq!(starts.len(), 365);
        assert_eq!(starts.first(), Some(&0));
        assert_eq!(starts.last(), Some(&8736));
    }

    #[test]
    fn final_window_is_truncated() {
        let h = TimeHorizon::new(1.0, 48, 24, 100).ok();
        // windows start at 0, 24, 48, 72, 96; last commits only 4 periods
        assert_eq!(h.map(|h| h.num_windows()), Some(5));
        assert_eq!(h.map(|h| h.committed_len(96)), Some(4));
        assert_eq!(h.map(|h| h.committed_len(0)), Some(24));
    }

    #[test]
    fn solution_longer_than_horizon_is_rejected() {
        let err = TimeHorizon::new(1.0, 24, 48, 8760);
        assert!(err.is_err());
    }

    #[test]
    fn horizon_longer_than_run_is_rejected() {
        let err = TimeHorizon::new(1.0, 48, 24, 40);
        assert!(err.is_err());
    }

    #[test]
    fn zero_dt_is_rejected() {
        assert!(TimeHorizon::new(0.0, 48, 24, 8760).is_err());
    }
}
