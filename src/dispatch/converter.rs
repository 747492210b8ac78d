//! Commodity-conversion dispatch blocks (e.g. electrolyzer).

use good_lp::{Constraint, Expression, ProblemVariables, Variable, constraint, variable};

use super::{Commodity, TimeWeights};
use crate::error::DispatchError;

/// A converter that turns one commodity into another at a fixed rate.
///
/// For an electrolyzer, `conversion_rate` is kg of hydrogen per kWh of
/// electricity and `max_input_kw` the stack's rated draw.
#[derive(Debug, Clone)]
pub struct ConverterTech {
    /// Commodity consumed.
    pub commodity_in: Commodity,
    /// Commodity produced.
    pub commodity_out: Commodity,
    /// Output units per input unit-hour.
    pub conversion_rate: f64,
    /// Maximum input draw per period (input units per hour).
    pub max_input_kw: f64,
    /// Operating cost per unit of output.
    pub cost_per_output: f64,
}

impl ConverterTech {
    /// Checks static parameters.
    pub(crate) fn validate(&self, name: &str) -> Result<(), DispatchError> {
        if self.commodity_in == self.commodity_out {
            return Err(DispatchError::config(
                format!("{name}.commodity_out"),
                "must differ from commodity_in",
            ));
        }
        if !(self.conversion_rate > 0.0) {
            return Err(DispatchError::config(
                format!("{name}.conversion_rate"),
                "must be > 0",
            ));
        }
        if !(self.max_input_kw > 0.0) {
            return Err(DispatchError::config(
                format!("{name}.max_input_kw"),
                "must be > 0",
            ));
        }
        if self.cost_per_output < 0.0 {
            return Err(DispatchError::config(
                format!("{name}.cost_per_output"),
                "must be >= 0",
            ));
        }
        Ok(())
    }

    /// Creates bounded input and free non-negative output variables.
    pub fn create_variables(&self, vars: &mut ProblemVariables, periods: usize) -> ConverterBlock {
        ConverterBlock {
            input: vars.add_vector(variable().min(0.0).max(self.max_input_kw), periods),
            output: vars.add_vector(variable().min(0.0), periods),
        }
    }

    /// Ties output to input through the conversion rate; optionally bounds
    /// input by available feedstock.
    pub fn create_constraints(
        &self,
        block: &ConverterBlock,
        available_input: Option<&[f64]>,
    ) -> Vec<Constraint> {
        let mut cons: Vec<Constraint> = block
            .input
            .iter()
            .zip(&block.output)
            .map(|(&inp, &out)| constraint!(out == self.conversion_rate * inp))
            .collect();
        if let Some(avail) = available_input {
            cons.extend(
                block
                    .input
                    .iter()
                    .zip(avail)
                    .map(|(&inp, &a)| constraint!(inp <= a)),
            );
        }
        cons
    }

    /// Discounted operating-cost contribution.
    pub fn objective(&self, block: &ConverterBlock, weights: &TimeWeights) -> Expression {
        block
            .output
            .iter()
            .enumerate()
            .map(|(t, &out)| weights.cost(t) * self.cost_per_output * out)
            .sum()
    }

    pub(crate) fn port_commodity(&self, port: &str) -> Option<Commodity> {
        match port {
            "in" => Some(self.commodity_in),
            "out" => Some(self.commodity_out),
            _ => None,
        }
    }
}

/// Decision variables for one converter over one window.
#[derive(Debug, Clone)]
pub struct ConverterBlock {
    /// Input draw per period (input units per hour).
    pub input: Vec<Variable>,
    /// Product output per period (output units per hour).
    pub output: Vec<Variable>,
}

impl ConverterBlock {
    pub(crate) fn port_flows(&self, port: &str) -> Option<&[Variable]> {
        match port {
            "in" => Some(&self.input),
            "out" => Some(&self.output),
            _ => None,
        }
    }
}

/// Solved converter values for the window.
#[derive(Debug, Clone)]
pub struct ConverterDecision {
    /// Input draw per period.
    pub input: Vec<f64>,
    /// Product output per period.
    pub output: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::{Commodity, ConverterTech};

    fn electrolyzer() -> ConverterTech {
        ConverterTech {
            commodity_in: Commodity::Electricity,
            commodity_out: Commodity::Hydrogen,
            conversion_rate: 1.0 / 55.0, // kg H2 per kWh
            max_input_kw: 10_000.0,
            cost_per_output: 0.02,
        }
    }

    #[test]
    fn valid_converter_passes() {
        assert!(electrolyzer().validate("electrolyzer").is_ok());
    }

    #[test]
    fn same_commodity_in_and_out_is_rejected() {
        let mut c = electrolyzer();
        c.commodity_out = Commodity::Electricity;
        assert!(c.validate("electrolyzer").is_err());
    }

    #[test]
    fn feedstock_bound_adds_constraints() {
        let c = electrolyzer();
        let mut vars = good_lp::ProblemVariables::new();
        let block = c.create_variables(&mut vars, 6);
        let unbounded = c.create_constraints(&block, None);
        let bounded = c.create_constraints(&block, Some(&vec![500.0; 6]));
        assert_eq!(unbounded.len(), 6);
        assert_eq!(bounded.len(), 12);
    }
}
