//! Forecast-capped generator dispatch blocks (wind, solar).

use good_lp::{Constraint, Expression, ProblemVariables, Variable, constraint, variable};

use super::{Commodity, TimeWeights};
use crate::error::DispatchError;

/// A non-dispatchable generator whose output is bounded by a per-period
/// resource forecast. Output below the forecast is curtailment.
#[derive(Debug, Clone)]
pub struct GeneratorTech {
    /// Commodity produced (electricity for wind/solar).
    pub commodity: Commodity,
    /// Nameplate capacity (kW); static upper bound on output.
    pub capacity_kw: f64,
    /// Operating cost per unit of production ($/kWh).
    pub cost_per_kwh: f64,
}

impl GeneratorTech {
    /// Checks static parameters.
    pub(crate) fn validate(&self, name: &str) -> Result<(), DispatchError> {
        if !(self.capacity_kw > 0.0) {
            return Err(DispatchError::config(
                format!("{name}.capacity_kw"),
                "must be > 0",
            ));
        }
        if self.cost_per_kwh < 0.0 {
            return Err(DispatchError::config(
                format!("{name}.cost_per_kwh"),
                "must be >= 0",
            ));
        }
        Ok(())
    }

    /// Creates one generation variable per period, bounded by capacity.
    pub fn create_variables(&self, vars: &mut ProblemVariables, periods: usize) -> GeneratorBlock {
        GeneratorBlock {
            generation: vars.add_vector(variable().min(0.0).max(self.capacity_kw), periods),
        }
    }

    /// Caps each period's output at the forecast resource.
    pub fn create_constraints(&self, block: &GeneratorBlock, forecast: &[f64]) -> Vec<Constraint> {
        block
            .generation
            .iter()
            .zip(forecast)
            .map(|(&output, &avail)| constraint!(output <= avail))
            .collect()
    }

    /// Discounted operating-cost contribution.
    pub fn objective(&self, block: &GeneratorBlock, weights: &TimeWeights) -> Expression {
        block
            .generation
            .iter()
            .enumerate()
            .map(|(t, &output)| weights.cost(t) * self.cost_per_kwh * output)
            .sum()
    }

    pub(crate) fn port_commodity(&self, port: &str) -> Option<Commodity> {
        (port == "out").then_some(self.commodity)
    }
}

/// Decision variables for one generator over one window.
#[derive(Debug, Clone)]
pub struct GeneratorBlock {
    /// Dispatched output per period (kW), `0 <= generation[t] <= forecast[t]`.
    pub generation: Vec<Variable>,
}

impl GeneratorBlock {
    pub(crate) fn port_flows(&self, port: &str) -> Option<&[Variable]> {
        (port == "out").then_some(self.generation.as_slice())
    }
}

/// Solved generator values for the window.
#[derive(Debug, Clone)]
pub struct GeneratorDecision {
    /// Dispatched output per period (kW).
    pub generation: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::{Commodity, GeneratorTech};

    fn wind() -> GeneratorTech {
        GeneratorTech {
            commodity: Commodity::Electricity,
            capacity_kw: 50_000.0,
            cost_per_kwh: 43.0 / 8760.0,
        }
    }

    #[test]
    fn valid_generator_passes() {
        assert!(wind().validate("wind").is_ok());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut g = wind();
        g.capacity_kw = 0.0;
        assert!(g.validate("wind").is_err());
    }

    #[test]
    fn negative_cost_is_rejected() {
        let mut g = wind();
        g.cost_per_kwh = -1.0;
        assert!(g.validate("wind").is_err());
    }

    #[test]
    fn one_forecast_constraint_per_period() {
        let g = wind();
        let mut vars = good_lp::ProblemVariables::new();
        let block = g.create_variables(&mut vars, 24);
        assert_eq!(block.generation.len(), 24);
        let cons = g.create_constraints(&block, &vec![1000.0; 24]);
        assert_eq!(cons.len(), 24);
    }
}
