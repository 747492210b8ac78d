//! Solver backend access and error translation.

use good_lp::{ProblemVariables, ResolutionError, Solution, SolverModel, default_solver, variable};

use crate::error::DispatchError;

/// Verifies the MILP backend works before any window is attempted.
///
/// Solves a one-variable problem; a failure here means the backend is
/// missing or broken, and the run should not start.
///
/// # Errors
///
/// Returns [`DispatchError::SolverUnavailable`] on any solve failure.
pub fn probe() -> Result<(), DispatchError> {
    let mut vars = ProblemVariables::new();
    let x = vars.add(variable().min(0.0).max(1.0));
    let solution = vars
        .minimise(x)
        .using(default_solver)
        .solve()
        .map_err(|e| DispatchError::SolverUnavailable {
            message: format!("backend probe failed: {e}"),
        })?;
    let value = solution.value(x);
    if value.abs() > 1e-6 {
        return Err(DispatchError::SolverUnavailable {
            message: format!("backend probe returned {value} for a problem with optimum 0"),
        });
    }
    Ok(())
}

/// Maps a window solve failure onto the dispatch error taxonomy.
///
/// Infeasibility and unboundedness are window-level outcomes carrying the
/// window's start index; anything else is a backend fault.
pub fn map_resolution(window_start: usize, err: ResolutionError) -> DispatchError {
    match err {
        ResolutionError::Infeasible => DispatchError::InfeasibleWindow { window_start },
        ResolutionError::Unbounded => DispatchError::UnboundedWindow { window_start },
        other => DispatchError::SolverUnavailable {
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use good_lp::ResolutionError;

    use super::{map_resolution, probe};
    use crate::error::DispatchError;

    #[test]
    fn probe_succeeds_with_bundled_backend() {
        assert!(probe().is_ok());
    }

    #[test]
    fn infeasible_maps_to_window_error() {
        match map_resolution(120, ResolutionError::Infeasible) {
            DispatchError::InfeasibleWindow { window_start } => assert_eq!(window_start, 120),
            other => panic!("expected InfeasibleWindow, got {other:?}"),
        }
    }

    #[test]
    fn unbounded_maps_to_window_error() {
        match map_resolution(48, ResolutionError::Unbounded) {
            DispatchError::UnboundedWindow { window_start } => assert_eq!(window_start, 48),
            other => panic!("expected UnboundedWindow, got {other:?}"),
        }
    }

    #[test]
    fn other_failures_map_to_solver_unavailable() {
        let err = map_resolution(0, ResolutionError::Other("license"));
        assert!(matches!(err, DispatchError::SolverUnavailable { .. }));
    }
}
