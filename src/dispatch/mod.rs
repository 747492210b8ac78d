//! Per-technology dispatch block builders and their composition contract.
//!
//! Each technology variant translates its static configuration plus a
//! per-window forecast into decision variables, constraints, and objective
//! terms, and exposes its external flow terminals as named ports. Variants
//! form a closed enumeration dispatched by `match`, and solved values come
//! back as structured per-technology decision records keyed by tech name.

pub mod converter;
pub mod generator;
pub mod grid;
pub mod hybrid;
pub mod solver;
pub mod storage;

pub use converter::{ConverterBlock, ConverterDecision, ConverterTech};
pub use generator::{GeneratorBlock, GeneratorDecision, GeneratorTech};
pub use grid::{GridBlock, GridDecision, GridTech};
pub use hybrid::{HybridDispatchModel, WindowData, WindowSolution};
pub use storage::{StorageBlock, StorageDecision, StorageDevice};

use good_lp::Variable;

use crate::error::DispatchError;

/// Commodity carried on a technology's external flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Commodity {
    /// Electric energy (kWh as flow-hours of kW).
    Electricity,
    /// Converted product mass (kg), e.g. electrolytic hydrogen.
    Hydrogen,
}

/// Per-period weighting applied to objective terms.
///
/// Revenue terms are discounted with `gamma^t`; operating-cost terms carry
/// the inverse weight `gamma^-t`, matching the original pro-forma convention.
#[derive(Debug, Clone, Copy)]
pub struct TimeWeights {
    /// Exponential time-weighting factor in `(0, 1]`.
    pub gamma: f64,
    /// Period duration in hours.
    pub dt_hours: f64,
}

impl TimeWeights {
    /// Discount weight for a revenue term at period `t` (includes `dt`).
    pub fn revenue(&self, t: usize) -> f64 {
        self.gamma.powi(t as i32) * self.dt_hours
    }

    /// Weight for an operating-cost term at period `t` (includes `dt`).
    pub fn cost(&self, t: usize) -> f64 {
        self.gamma.powi(-(t as i32)) * self.dt_hours
    }
}

/// Equality link between two technologies' flow terminals.
///
/// An arc equates the source port's flow with the destination port's flow in
/// every period of the window. Ports are looked up by tech name and port
/// name; commodities must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowArc {
    /// Tech name of the flow source.
    pub source_tech: String,
    /// Port name on the source technology.
    pub source_port: String,
    /// Tech name of the flow destination.
    pub dest_tech: String,
    /// Port name on the destination technology.
    pub dest_port: String,
}

/// One technology in the hybrid plant, as a closed set of variants.
#[derive(Debug, Clone)]
pub enum Technology {
    /// Wind/solar generator: output capped by the per-period forecast.
    Generator(GeneratorTech),
    /// Commodity converter with a fixed conversion rate (e.g. electrolyzer).
    Converter(ConverterTech),
    /// Storage device with SOC inventory dynamics.
    Storage(StorageDevice),
    /// Grid interconnection with bounded buy/sell flows.
    Grid(GridTech),
}

impl Technology {
    /// Eagerly validates the variant's static parameters.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found; nothing is clamped.
    pub fn validate(&self, name: &str) -> Result<(), DispatchError> {
        match self {
            Self::Generator(g) => g.validate(name),
            Self::Converter(c) => c.validate(name),
            Self::Storage(s) => s.validate(name),
            Self::Grid(g) => g.validate(name),
        }
    }

    /// Commodity flowing through the named port, if the variant has it.
    pub fn port_commodity(&self, port: &str) -> Option<Commodity> {
        match self {
            Self::Generator(g) => g.port_commodity(port),
            Self::Converter(c) => c.port_commodity(port),
            Self::Storage(s) => s.port_commodity(port),
            Self::Grid(g) => g.port_commodity(port),
        }
    }
}

/// Decision-variable block for one technology over one window.
#[derive(Debug, Clone)]
pub enum TechBlock {
    /// Generator block.
    Generator(GeneratorBlock),
    /// Converter block.
    Converter(ConverterBlock),
    /// Storage block.
    Storage(StorageBlock),
    /// Grid block.
    Grid(GridBlock),
}

impl TechBlock {
    /// Per-period flow variables behind the named port.
    pub fn port_flows(&self, port: &str) -> Option<&[Variable]> {
        match self {
            Self::Generator(b) => b.port_flows(port),
            Self::Converter(b) => b.port_flows(port),
            Self::Storage(b) => b.port_flows(port),
            Self::Grid(b) => b.port_flows(port),
        }
    }

    /// Variables contributing to system production of `commodity`.
    pub fn production_vars(&self, tech: &Technology, commodity: Commodity) -> Option<&[Variable]> {
        match (self, tech) {
            (Self::Generator(b), Technology::Generator(g)) if g.commodity == commodity => {
                Some(&b.generation)
            }
            (Self::Converter(b), Technology::Converter(c)) if c.commodity_out == commodity => {
                Some(&b.output)
            }
            (Self::Storage(b), Technology::Storage(s)) if s.commodity == commodity => {
                Some(&b.discharge)
            }
            _ => None,
        }
    }

    /// Variables contributing to system load of `commodity`.
    pub fn load_vars(&self, tech: &Technology, commodity: Commodity) -> Option<&[Variable]> {
        match (self, tech) {
            (Self::Converter(b), Technology::Converter(c)) if c.commodity_in == commodity => {
                Some(&b.input)
            }
            (Self::Storage(b), Technology::Storage(s)) if s.commodity == commodity => {
                Some(&b.charge)
            }
            _ => None,
        }
    }
}

/// Solved per-period decision values for one technology.
#[derive(Debug, Clone)]
pub enum TechDecision {
    /// Generator decisions.
    Generator(GeneratorDecision),
    /// Converter decisions.
    Converter(ConverterDecision),
    /// Storage decisions.
    Storage(StorageDecision),
    /// Grid decisions.
    Grid(GridDecision),
}

impl TechDecision {
    /// Storage decisions, if this technology is a storage device.
    pub fn as_storage(&self) -> Option<&StorageDecision> {
        match self {
            Self::Storage(d) => Some(d),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TimeWeights;

    #[test]
    fn weights_at_t0_equal_dt() {
        let w = TimeWeights {
            gamma: 0.999,
            dt_hours: 1.0,
        };
        assert_eq!(w.revenue(0), 1.0);
        assert_eq!(w.cost(0), 1.0);
    }

    #[test]
    fn revenue_decays_and_cost_grows_with_t() {
        let w = TimeWeights {
            gamma: 0.99,
            dt_hours: 1.0,
        };
        assert!(w.revenue(10) < w.revenue(1));
        assert!(w.cost(10) > w.cost(1));
        // revenue(t) * cost(t) == dt^2 for any t
        assert!((w.revenue(7) * w.cost(7) - 1.0).abs() < 1e-12);
    }
}
