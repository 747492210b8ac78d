//! Equivalent-cycle estimators for a committed dispatch segment.
//!
//! Two formulas are kept side by side: the throughput approximation the
//! optimizer prices cycling with, and a depth-weighted recomputation from
//! the realized SOC trajectory. Comparing the two quantifies how far the
//! planning model's cycling estimate drifts from what the pack actually did.

/// Discounted-throughput cycle estimate over decided charge flows.
///
/// This is the same quantity the optimizer's lifecycle cost term is built
/// on: charge throughput in capacity units, discounted by `gamma^t`.
pub fn approx_lifecycles(decided_charge: &[f64], dt_hours: f64, capacity: f64, gamma: f64) -> f64 {
    let throughput: f64 = decided_charge
        .iter()
        .enumerate()
        .map(|(t, &charge)| gamma.powi(t as i32) * charge)
        .sum();
    dt_hours / capacity * throughput
}

/// Depth-weighted cycle estimate from decided discharge and realized SOC.
///
/// Each period's discharge is weighted by `0.8 - 0.8 * soc_prev`, so energy
/// drawn from a depleted pack counts for more cycle wear than energy drawn
/// near full. `realized_prev_soc[t]` is the realized state at the start of
/// period `t`.
pub fn lifecycles_from_soc(
    decided_discharge: &[f64],
    realized_prev_soc: &[f64],
    dt_hours: f64,
    capacity: f64,
) -> f64 {
    let weighted: f64 = decided_discharge
        .iter()
        .zip(realized_prev_soc)
        .map(|(&discharge, &soc_prev)| discharge * (0.8 - 0.8 * soc_prev))
        .sum();
    dt_hours / capacity * weighted
}

#[cfg(test)]
mod tests {
    use super::{approx_lifecycles, lifecycles_from_soc};

    #[test]
    fn idle_segment_has_zero_cycles() {
        assert_eq!(approx_lifecycles(&[0.0; 24], 1.0, 1000.0, 0.999), 0.0);
        assert_eq!(
            lifecycles_from_soc(&[0.0; 24], &[0.5; 24], 1.0, 1000.0),
            0.0
        );
    }

    #[test]
    fn undiscounted_full_charge_counts_capacity_over_capacity() {
        // 250 kW for 4 h into a 1000 kWh pack is one full charge.
        let cycles = approx_lifecycles(&[250.0; 4], 1.0, 1000.0, 1.0);
        assert!((cycles - 1.0).abs() < 1e-12);
    }

    #[test]
    fn discounting_reduces_later_throughput() {
        let flat = approx_lifecycles(&[100.0; 24], 1.0, 1000.0, 1.0);
        let discounted = approx_lifecycles(&[100.0; 24], 1.0, 1000.0, 0.99);
        assert!(discounted < flat);
    }

    #[test]
    fn deep_discharge_wears_more_than_shallow() {
        let deep = lifecycles_from_soc(&[100.0; 4], &[0.2; 4], 1.0, 1000.0);
        let shallow = lifecycles_from_soc(&[100.0; 4], &[0.8; 4], 1.0, 1000.0);
        assert!(deep > shallow);
    }

    #[test]
    fn full_soc_discharge_has_zero_depth_weight() {
        let cycles = lifecycles_from_soc(&[100.0], &[1.0], 1.0, 1000.0);
        assert!(cycles.abs() < 1e-12);
    }
}
