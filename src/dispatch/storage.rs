//! Storage dispatch blocks: SOC inventory dynamics over one window.

use good_lp::{Constraint, Expression, ProblemVariables, Variable, constraint, variable};

use super::{Commodity, TimeWeights};
use crate::error::DispatchError;

/// One storage asset (battery, hydrogen tank).
///
/// `initial_soc` is the carried state seeding the next window's first
/// period. The rolling-horizon driver is its sole mutator, strictly between
/// windows, using the realized state from the physical simulator.
#[derive(Debug, Clone)]
pub struct StorageDevice {
    /// Commodity stored.
    pub commodity: Commodity,
    /// Usable capacity (kWh for electricity, kg for hydrogen).
    pub capacity: f64,
    /// Lower state-of-charge bound, fraction of capacity.
    pub min_soc: f64,
    /// Upper state-of-charge bound, fraction of capacity.
    pub max_soc: f64,
    /// Charging efficiency in `(0, 1]`.
    pub charge_efficiency: f64,
    /// Discharging efficiency in `(0, 1]`.
    pub discharge_efficiency: f64,
    /// Maximum charge flow per period (units per hour).
    pub max_charge_rate: f64,
    /// Maximum discharge flow per period (units per hour).
    pub max_discharge_rate: f64,
    /// State of charge at the start of the next window, fraction.
    pub initial_soc: f64,
    /// Operating cost per unit charged.
    pub cost_per_charge: f64,
    /// Operating cost per unit discharged.
    pub cost_per_discharge: f64,
    /// Cost per equivalent full lifecycle.
    pub lifecycle_cost: f64,
}

impl StorageDevice {
    /// Checks static parameters.
    pub(crate) fn validate(&self, name: &str) -> Result<(), DispatchError> {
        if !(self.capacity > 0.0) {
            return Err(DispatchError::config(
                format!("{name}.capacity"),
                "must be > 0",
            ));
        }
        if !(0.0..1.0).contains(&self.min_soc) || self.min_soc >= self.max_soc {
            return Err(DispatchError::config(
                format!("{name}.min_soc"),
                "must satisfy 0 <= min_soc < max_soc",
            ));
        }
        if self.max_soc > 1.0 {
            return Err(DispatchError::config(
                format!("{name}.max_soc"),
                "must be <= 1",
            ));
        }
        for (field, eff) in [
            ("charge_efficiency", self.charge_efficiency),
            ("discharge_efficiency", self.discharge_efficiency),
        ] {
            if !(eff > 0.0 && eff <= 1.0) {
                return Err(DispatchError::config(
                    format!("{name}.{field}"),
                    "must be in (0, 1]",
                ));
            }
        }
        if self.max_charge_rate < 0.0 || self.max_discharge_rate < 0.0 {
            return Err(DispatchError::config(
                format!("{name}.max_charge_rate"),
                "rates must be >= 0",
            ));
        }
        self.check_initial_soc(name, self.initial_soc)
    }

    /// Rejects an out-of-bounds initial condition (never clamps it).
    fn check_initial_soc(&self, name: &str, initial_soc: f64) -> Result<(), DispatchError> {
        if !(self.min_soc..=self.max_soc).contains(&initial_soc) {
            return Err(DispatchError::config(
                format!("{name}.initial_soc"),
                format!(
                    "{initial_soc} is outside [{}, {}]",
                    self.min_soc, self.max_soc
                ),
            ));
        }
        Ok(())
    }

    /// Creates the window's decision variables.
    ///
    /// The SOC vector has `periods + 1` entries: `soc[t]` is the state at the
    /// start of period `t` and `soc[t + 1]` the state at its end, so the
    /// inter-period linking `soc_start[t] = soc_end[t-1]` holds by
    /// construction and only `soc[0] = initial_soc` needs pinning.
    ///
    /// # Errors
    ///
    /// Fails fast if `initial_soc` lies outside `[min_soc, max_soc]`.
    pub fn create_variables(
        &self,
        name: &str,
        vars: &mut ProblemVariables,
        periods: usize,
        initial_soc: f64,
    ) -> Result<StorageBlock, DispatchError> {
        self.check_initial_soc(name, initial_soc)?;
        Ok(StorageBlock {
            charge: vars.add_vector(variable().min(0.0).max(self.max_charge_rate), periods),
            discharge: vars.add_vector(variable().min(0.0).max(self.max_discharge_rate), periods),
            soc: vars.add_vector(
                variable().min(self.min_soc).max(self.max_soc),
                periods + 1,
            ),
            is_charging: vars.add_vector(variable().binary(), periods),
            is_discharging: vars.add_vector(variable().binary(), periods),
            initial_soc,
        })
    }

    /// Builds the window's constraint set:
    ///
    /// - flow is zero unless the matching binary indicator is set, and
    ///   bounded by the rate while it is;
    /// - charging and discharging are mutually exclusive per period;
    /// - SOC inventory balance
    ///   `soc[t+1] = soc[t] + dt·(η_c·charge − discharge/η_d)/capacity`;
    /// - `soc[0]` pinned to the carried initial state.
    pub fn create_constraints(&self, block: &StorageBlock, dt_hours: f64) -> Vec<Constraint> {
        let n = block.charge.len();
        let mut cons = Vec::with_capacity(4 * n + 1);

        cons.push(constraint!(block.soc[0] == block.initial_soc));

        for t in 0..n {
            let charge = block.charge[t];
            let discharge = block.discharge[t];
            cons.push(constraint!(
                charge <= self.max_charge_rate * block.is_charging[t]
            ));
            cons.push(constraint!(
                discharge <= self.max_discharge_rate * block.is_discharging[t]
            ));
            cons.push(constraint!(
                block.is_charging[t] + block.is_discharging[t] <= 1.0
            ));

            let delta: Expression = (dt_hours / self.capacity)
                * (self.charge_efficiency * charge
                    - (1.0 / self.discharge_efficiency) * discharge);
            cons.push(constraint!(block.soc[t + 1] == block.soc[t] + delta));
        }
        cons
    }

    /// Discounted operating-cost contribution plus the lifecycle-cost term
    /// on discounted charge throughput.
    pub fn objective(&self, block: &StorageBlock, weights: &TimeWeights) -> Expression {
        let mut expr = Expression::default();
        for (t, (&charge, &discharge)) in block.charge.iter().zip(&block.discharge).enumerate() {
            expr += weights.cost(t)
                * (self.cost_per_charge * charge + self.cost_per_discharge * discharge);
            expr += self.lifecycle_cost
                * (weights.gamma.powi(t as i32) * weights.dt_hours / self.capacity)
                * charge;
        }
        expr
    }

    pub(crate) fn port_commodity(&self, port: &str) -> Option<Commodity> {
        matches!(port, "charge_in" | "discharge_out").then_some(self.commodity)
    }
}

/// Decision variables for one storage device over one window.
#[derive(Debug, Clone)]
pub struct StorageBlock {
    /// Charge flow per period (units per hour).
    pub charge: Vec<Variable>,
    /// Discharge flow per period (units per hour).
    pub discharge: Vec<Variable>,
    /// State of charge at period boundaries; length `periods + 1`.
    pub soc: Vec<Variable>,
    /// 1 while the device charges in a period.
    pub is_charging: Vec<Variable>,
    /// 1 while the device discharges in a period.
    pub is_discharging: Vec<Variable>,
    /// Carried state pinned onto `soc[0]`.
    pub initial_soc: f64,
}

impl StorageBlock {
    pub(crate) fn port_flows(&self, port: &str) -> Option<&[Variable]> {
        match port {
            "charge_in" => Some(&self.charge),
            "discharge_out" => Some(&self.discharge),
            _ => None,
        }
    }
}

/// Solved storage values for the window.
#[derive(Debug, Clone)]
pub struct StorageDecision {
    /// Charge flow per period.
    pub charge: Vec<f64>,
    /// Discharge flow per period.
    pub discharge: Vec<f64>,
    /// End-of-period SOC per period (the optimizer's idealized trajectory).
    pub soc_end: Vec<f64>,
    /// Charging indicator per period.
    pub is_charging: Vec<bool>,
    /// Discharging indicator per period.
    pub is_discharging: Vec<bool>,
}

#[cfg(test)]
mod tests {
    use super::{Commodity, StorageDevice};

    pub(crate) fn battery() -> StorageDevice {
        StorageDevice {
            commodity: Commodity::Electricity,
            capacity: 1000.0,
            min_soc: 0.1,
            max_soc: 0.9,
            charge_efficiency: 0.938,
            discharge_efficiency: 0.938,
            max_charge_rate: 250.0,
            max_discharge_rate: 250.0,
            initial_soc: 0.5,
            cost_per_charge: 0.0,
            cost_per_discharge: 3.0 / 8760.0,
            lifecycle_cost: 0.6,
        }
    }

    #[test]
    fn valid_device_passes() {
        assert!(battery().validate("battery").is_ok());
    }

    #[test]
    fn inverted_soc_bounds_are_rejected() {
        let mut b = battery();
        b.min_soc = 0.9;
        b.max_soc = 0.1;
        assert!(b.validate("battery").is_err());
    }

    #[test]
    fn efficiency_above_one_is_rejected() {
        let mut b = battery();
        b.charge_efficiency = 1.2;
        assert!(b.validate("battery").is_err());
    }

    #[test]
    fn zero_efficiency_is_rejected() {
        let mut b = battery();
        b.discharge_efficiency = 0.0;
        assert!(b.validate("battery").is_err());
    }

    #[test]
    fn out_of_bounds_initial_soc_fails_fast() {
        let b = battery();
        let mut vars = good_lp::ProblemVariables::new();
        let err = b.create_variables("battery", &mut vars, 24, 0.05);
        assert!(err.is_err(), "initial SOC below min_soc must be rejected");
        let err = b.create_variables("battery", &mut vars, 24, 0.95);
        assert!(err.is_err(), "initial SOC above max_soc must be rejected");
    }

    #[test]
    fn block_has_one_extra_soc_slot() {
        let b = battery();
        let mut vars = good_lp::ProblemVariables::new();
        let block = b.create_variables("battery", &mut vars, 24, 0.5).ok();
        assert_eq!(block.as_ref().map(|b| b.soc.len()), Some(25));
        assert_eq!(block.as_ref().map(|b| b.charge.len()), Some(24));
    }

    #[test]
    fn constraint_count_matches_window_length() {
        let b = battery();
        let mut vars = good_lp::ProblemVariables::new();
        let block = b
            .create_variables("battery", &mut vars, 6, 0.5)
            .expect("in-bounds initial SOC");
        // 1 pin + 4 per period
        assert_eq!(b.create_constraints(&block, 1.0).len(), 25);
    }
}
