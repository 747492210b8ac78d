//! Grid interconnection dispatch blocks.

use good_lp::{Constraint, Expression, ProblemVariables, Variable, constraint, variable};

use super::{Commodity, TimeWeights};
use crate::error::DispatchError;

/// The point of interconnection: sells plant output at the per-period price
/// and optionally buys back at the same price up to `buy_limit_kw`.
///
/// The grid is the only technology whose objective term is revenue rather
/// than cost. At most one grid may exist per model.
#[derive(Debug, Clone)]
pub struct GridTech {
    /// Maximum export per period (kW); the interconnection limit.
    pub sell_limit_kw: f64,
    /// Maximum import per period (kW). Zero disables buy-back.
    pub buy_limit_kw: f64,
}

impl GridTech {
    /// Checks static parameters.
    pub(crate) fn validate(&self, name: &str) -> Result<(), DispatchError> {
        if !(self.sell_limit_kw > 0.0) {
            return Err(DispatchError::config(
                format!("{name}.sell_limit_kw"),
                "must be > 0",
            ));
        }
        if self.buy_limit_kw < 0.0 {
            return Err(DispatchError::config(
                format!("{name}.buy_limit_kw"),
                "must be >= 0",
            ));
        }
        Ok(())
    }

    /// Creates bounded sell and buy variables.
    pub fn create_variables(&self, vars: &mut ProblemVariables, periods: usize) -> GridBlock {
        GridBlock {
            sell: vars.add_vector(variable().min(0.0).max(self.sell_limit_kw), periods),
            buy: vars.add_vector(variable().min(0.0).max(self.buy_limit_kw), periods),
        }
    }

    /// Optional firm-delivery floor: export must meet the contracted demand
    /// in every period it is given for.
    pub fn create_constraints(
        &self,
        block: &GridBlock,
        firm_delivery: Option<&[f64]>,
    ) -> Vec<Constraint> {
        match firm_delivery {
            Some(demand) => block
                .sell
                .iter()
                .zip(demand)
                .map(|(&sell, &d)| constraint!(sell >= d))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Negated discounted revenue on net export, so minimizing the total
    /// objective maximizes market value.
    pub fn objective(
        &self,
        block: &GridBlock,
        prices: &[f64],
        weights: &TimeWeights,
    ) -> Expression {
        let mut expr = Expression::default();
        for (t, (&sell, &buy)) in block.sell.iter().zip(&block.buy).enumerate() {
            expr -= weights.revenue(t) * prices[t] * (sell - buy);
        }
        expr
    }

    pub(crate) fn port_commodity(&self, port: &str) -> Option<Commodity> {
        matches!(port, "sell_in" | "buy_out").then_some(Commodity::Electricity)
    }
}

/// Decision variables for the grid over one window.
#[derive(Debug, Clone)]
pub struct GridBlock {
    /// Export per period (kW).
    pub sell: Vec<Variable>,
    /// Import per period (kW).
    pub buy: Vec<Variable>,
}

impl GridBlock {
    pub(crate) fn port_flows(&self, port: &str) -> Option<&[Variable]> {
        match port {
            "sell_in" => Some(&self.sell),
            "buy_out" => Some(&self.buy),
            _ => None,
        }
    }
}

/// Solved grid values for the window.
#[derive(Debug, Clone)]
pub struct GridDecision {
    /// Export per period (kW).
    pub sell: Vec<f64>,
    /// Import per period (kW).
    pub buy: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::GridTech;

    fn interconnect() -> GridTech {
        GridTech {
            sell_limit_kw: 50_000.0,
            buy_limit_kw: 0.0,
        }
    }

    #[test]
    fn valid_grid_passes() {
        assert!(interconnect().validate("grid").is_ok());
    }

    #[test]
    fn zero_sell_limit_is_rejected() {
        let mut g = interconnect();
        g.sell_limit_kw = 0.0;
        assert!(g.validate("grid").is_err());
    }

    #[test]
    fn firm_delivery_adds_one_constraint_per_period() {
        let g = interconnect();
        let mut vars = good_lp::ProblemVariables::new();
        let block = g.create_variables(&mut vars, 24);
        assert!(g.create_constraints(&block, None).is_empty());
        let cons = g.create_constraints(&block, Some(&vec![1000.0; 24]));
        assert_eq!(cons.len(), 24);
    }
}
