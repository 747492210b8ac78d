//! Joint plant-level dispatch optimization over one window.
//!
//! The model owns a named set of technologies and the flow arcs wiring
//! their ports, and assembles one mixed-integer program per window: every
//! technology contributes its block of variables, constraints, and
//! objective terms, then system-level balance rows tie the blocks together.

use std::collections::{BTreeMap, BTreeSet};

use good_lp::{
    Constraint, Expression, ProblemVariables, Solution, SolverModel, Variable, constraint,
    default_solver, variable,
};
use tracing::debug;

use super::{
    Commodity, ConverterDecision, FlowArc, GeneratorDecision, GridDecision, StorageDecision,
    TechBlock, TechDecision, Technology, TimeWeights, solver,
};
use crate::error::DispatchError;

/// Inputs that vary per window: forecasts, prices, and carried storage state.
#[derive(Debug, Clone)]
pub struct WindowData {
    /// Period index of the window's first period.
    pub start: usize,
    /// Number of periods in the window.
    pub len: usize,
    /// Electricity price per period ($/kWh); length `len`.
    pub prices: Vec<f64>,
    /// Resource forecast per generator name; each of length `len`.
    pub forecasts: BTreeMap<String, Vec<f64>>,
    /// Carried state of charge per storage name, fraction of capacity.
    pub initial_soc: BTreeMap<String, f64>,
    /// Contracted minimum export per period, if the plant sells firm.
    pub firm_delivery: Option<Vec<f64>>,
}

/// Solved dispatch for one window.
///
/// All per-period vectors cover the full window, not just the committed
/// prefix; the driver decides how much of the plan to act on.
#[derive(Debug, Clone)]
pub struct WindowSolution {
    /// Period index of the window's first period.
    pub start: usize,
    /// Solved decisions keyed by technology name.
    pub decisions: BTreeMap<String, TechDecision>,
    /// Total non-grid electricity production per period (kW).
    pub system_production: Vec<f64>,
    /// Total non-grid electricity load per period (kW).
    pub system_load: Vec<f64>,
    /// Net electricity leaving the plant per period (kW); equals grid
    /// sell minus buy and may be negative.
    pub commodity_out: Vec<f64>,
    /// Minimized objective (weighted costs minus weighted revenue).
    pub objective_value: f64,
    /// Negated objective: the window's net market value.
    pub net_value: f64,
}

/// A hybrid plant model: named technologies plus port wiring.
#[derive(Debug, Clone)]
pub struct HybridDispatchModel {
    techs: BTreeMap<String, Technology>,
    arcs: Vec<FlowArc>,
    gamma: f64,
    dt_hours: f64,
}

impl HybridDispatchModel {
    /// Creates an empty model.
    ///
    /// # Errors
    ///
    /// Returns a configuration error unless `gamma` is in `(0, 1]` and
    /// `dt_hours` is positive.
    pub fn new(gamma: f64, dt_hours: f64) -> Result<Self, DispatchError> {
        if !(gamma > 0.0 && gamma <= 1.0) {
            return Err(DispatchError::config("model.gamma", "must be in (0, 1]"));
        }
        if !(dt_hours > 0.0) {
            return Err(DispatchError::config("model.dt_hours", "must be > 0"));
        }
        Ok(Self {
            techs: BTreeMap::new(),
            arcs: Vec::new(),
            gamma,
            dt_hours,
        })
    }

    /// Registers a technology under a unique name, validating it eagerly.
    ///
    /// # Errors
    ///
    /// Rejects duplicate names, invalid parameters, and a second grid.
    pub fn add_technology(
        &mut self,
        name: impl Into<String>,
        tech: Technology,
    ) -> Result<(), DispatchError> {
        let name = name.into();
        tech.validate(&name)?;
        if self.techs.contains_key(&name) {
            return Err(DispatchError::config(
                name,
                "technology name already registered",
            ));
        }
        if matches!(tech, Technology::Grid(_))
            && self
                .techs
                .values()
                .any(|t| matches!(t, Technology::Grid(_)))
        {
            return Err(DispatchError::config(
                name,
                "model already has a grid interconnection",
            ));
        }
        self.techs.insert(name, tech);
        Ok(())
    }

    /// Wires two technology ports together with a per-period equality.
    ///
    /// # Errors
    ///
    /// Both endpoints must name a registered technology and an existing
    /// port, and the two ports must carry the same commodity.
    pub fn add_arc(&mut self, arc: FlowArc) -> Result<(), DispatchError> {
        let src = self.port_commodity_of(&arc.source_tech, &arc.source_port)?;
        let dst = self.port_commodity_of(&arc.dest_tech, &arc.dest_port)?;
        if src != dst {
            return Err(DispatchError::config(
                format!("arc.{}.{}", arc.source_tech, arc.source_port),
                format!("carries {src:?} but destination port carries {dst:?}"),
            ));
        }
        self.arcs.push(arc);
        Ok(())
    }

    fn port_commodity_of(&self, tech: &str, port: &str) -> Result<Commodity, DispatchError> {
        let t = self.techs.get(tech).ok_or_else(|| {
            DispatchError::config(format!("arc.{tech}"), "unknown technology name")
        })?;
        t.port_commodity(port).ok_or_else(|| {
            DispatchError::config(format!("arc.{tech}.{port}"), "technology has no such port")
        })
    }

    /// Registered technologies, keyed by name.
    pub fn technologies(&self) -> &BTreeMap<String, Technology> {
        &self.techs
    }

    /// Names of all storage devices, in name order.
    pub fn storage_names(&self) -> Vec<String> {
        self.techs
            .iter()
            .filter(|(_, t)| matches!(t, Technology::Storage(_)))
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// The storage device registered under `name`, if any.
    pub fn storage(&self, name: &str) -> Option<&super::StorageDevice> {
        match self.techs.get(name) {
            Some(Technology::Storage(s)) => Some(s),
            _ => None,
        }
    }

    /// Objective weights for one window.
    pub fn weights(&self) -> TimeWeights {
        TimeWeights {
            gamma: self.gamma,
            dt_hours: self.dt_hours,
        }
    }

    fn grid_entry(&self) -> Option<(&String, &super::GridTech)> {
        self.techs.iter().find_map(|(n, t)| match t {
            Technology::Grid(g) => Some((n, g)),
            _ => None,
        })
    }

    fn check_window(&self, data: &WindowData) -> Result<(), DispatchError> {
        if data.len == 0 {
            return Err(DispatchError::config("window.len", "must be > 0"));
        }
        if data.prices.len() != data.len {
            return Err(DispatchError::config(
                "window.prices",
                format!("has {} periods, window needs {}", data.prices.len(), data.len),
            ));
        }
        for (name, tech) in &self.techs {
            match tech {
                Technology::Generator(_) => match data.forecasts.get(name) {
                    Some(f) if f.len() == data.len => {}
                    Some(f) => {
                        return Err(DispatchError::config(
                            format!("window.forecasts.{name}"),
                            format!("has {} periods, window needs {}", f.len(), data.len),
                        ));
                    }
                    None => {
                        return Err(DispatchError::config(
                            format!("window.forecasts.{name}"),
                            "missing forecast for generator",
                        ));
                    }
                },
                Technology::Storage(_) => {
                    if !data.initial_soc.contains_key(name) {
                        return Err(DispatchError::config(
                            format!("window.initial_soc.{name}"),
                            "missing carried state of charge",
                        ));
                    }
                }
                _ => {}
            }
        }
        if let Some(demand) = &data.firm_delivery {
            if self.grid_entry().is_none() {
                return Err(DispatchError::config(
                    "window.firm_delivery",
                    "requires a grid interconnection",
                ));
            }
            if demand.len() != data.len {
                return Err(DispatchError::config(
                    "window.firm_delivery",
                    format!("has {} periods, window needs {}", demand.len(), data.len),
                ));
            }
        }
        Ok(())
    }

    /// Solves the joint dispatch problem for one window.
    ///
    /// Solving has no side effects on the model; calling it twice with the
    /// same data yields the same solution.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed window data, an
    /// infeasible- or unbounded-window error carrying `data.start`, or a
    /// solver-unavailable error for backend faults.
    pub fn solve_window(&self, data: &WindowData) -> Result<WindowSolution, DispatchError> {
        self.check_window(data)?;
        let n = data.len;
        let weights = self.weights();

        let mut vars = ProblemVariables::new();
        let mut blocks: BTreeMap<String, TechBlock> = BTreeMap::new();
        for (name, tech) in &self.techs {
            let block = match tech {
                Technology::Generator(g) => TechBlock::Generator(g.create_variables(&mut vars, n)),
                Technology::Converter(c) => TechBlock::Converter(c.create_variables(&mut vars, n)),
                Technology::Storage(s) => TechBlock::Storage(s.create_variables(
                    name,
                    &mut vars,
                    n,
                    data.initial_soc[name],
                )?),
                Technology::Grid(g) => TechBlock::Grid(g.create_variables(&mut vars, n)),
            };
            blocks.insert(name.clone(), block);
        }

        // System-level aggregates for electricity. Net export may be
        // negative when the plant buys back.
        let system_production = vars.add_vector(variable().min(0.0), n);
        let system_load = vars.add_vector(variable().min(0.0), n);
        let commodity_out = vars.add_vector(variable(), n);

        let mut cons: Vec<Constraint> = Vec::new();
        let mut objective = Expression::default();

        for (name, tech) in &self.techs {
            let block = &blocks[name];
            match (tech, block) {
                (Technology::Generator(g), TechBlock::Generator(b)) => {
                    cons.extend(g.create_constraints(b, &data.forecasts[name]));
                    objective += g.objective(b, &weights);
                }
                (Technology::Converter(c), TechBlock::Converter(b)) => {
                    cons.extend(c.create_constraints(b, None));
                    objective += c.objective(b, &weights);
                }
                (Technology::Storage(s), TechBlock::Storage(b)) => {
                    cons.extend(s.create_constraints(b, self.dt_hours));
                    objective += s.objective(b, &weights);
                }
                (Technology::Grid(g), TechBlock::Grid(b)) => {
                    cons.extend(g.create_constraints(b, data.firm_delivery.as_deref()));
                    objective += g.objective(b, &data.prices, &weights);
                }
                _ => unreachable!("block variant always matches its technology"),
            }
        }

        // Electricity balance rows.
        for t in 0..n {
            let mut production = Expression::default();
            let mut load = Expression::default();
            for (name, tech) in &self.techs {
                if matches!(tech, Technology::Grid(_)) {
                    continue;
                }
                let block = &blocks[name];
                if let Some(p) = block.production_vars(tech, Commodity::Electricity) {
                    production += p[t];
                }
                if let Some(l) = block.load_vars(tech, Commodity::Electricity) {
                    load += l[t];
                }
            }
            cons.push(constraint!(system_production[t] == production));
            cons.push(constraint!(system_load[t] == load));
            cons.push(constraint!(
                commodity_out[t] == system_production[t] - system_load[t]
            ));
            match self.grid_entry() {
                Some((grid_name, _)) => {
                    if let TechBlock::Grid(b) = &blocks[grid_name] {
                        cons.push(constraint!(commodity_out[t] == b.sell[t] - b.buy[t]));
                    }
                }
                // Islanded plant: production and load must balance exactly.
                None => cons.push(constraint!(commodity_out[t] == 0.0)),
            }
        }

        // Non-electric commodities close internally.
        let mut other: BTreeSet<Commodity> = BTreeSet::new();
        for tech in self.techs.values() {
            for port in ["out", "in", "charge_in", "discharge_out"] {
                if let Some(c) = tech.port_commodity(port) {
                    if c != Commodity::Electricity {
                        other.insert(c);
                    }
                }
            }
        }
        for commodity in other {
            for t in 0..n {
                let mut balance = Expression::default();
                for (name, tech) in &self.techs {
                    let block = &blocks[name];
                    if let Some(p) = block.production_vars(tech, commodity) {
                        balance += p[t];
                    }
                    if let Some(l) = block.load_vars(tech, commodity) {
                        balance -= l[t];
                    }
                }
                cons.push(constraint!(balance == 0.0));
            }
        }

        // Explicit port wiring.
        for arc in &self.arcs {
            let src = blocks[&arc.source_tech]
                .port_flows(&arc.source_port)
                .ok_or_else(|| {
                    DispatchError::config(
                        format!("arc.{}.{}", arc.source_tech, arc.source_port),
                        "technology has no such port",
                    )
                })?;
            let dst = blocks[&arc.dest_tech]
                .port_flows(&arc.dest_port)
                .ok_or_else(|| {
                    DispatchError::config(
                        format!("arc.{}.{}", arc.dest_tech, arc.dest_port),
                        "technology has no such port",
                    )
                })?;
            for t in 0..n {
                cons.push(constraint!(src[t] == dst[t]));
            }
        }

        debug!(
            window_start = data.start,
            periods = n,
            constraints = cons.len(),
            "solving dispatch window"
        );

        let mut model = vars.minimise(objective.clone()).using(default_solver);
        for c in cons {
            model = model.with(c);
        }
        let solution = model
            .solve()
            .map_err(|e| solver::map_resolution(data.start, e))?;

        let mut decisions = BTreeMap::new();
        for (name, block) in &blocks {
            decisions.insert(name.clone(), extract_decision(block, &solution));
        }
        let objective_value = objective.eval_with(&solution);
        Ok(WindowSolution {
            start: data.start,
            decisions,
            system_production: eval_all(&system_production, &solution),
            system_load: eval_all(&system_load, &solution),
            commodity_out: eval_all(&commodity_out, &solution),
            objective_value,
            net_value: -objective_value,
        })
    }

    /// Closed-form market value of the committed prefix with storage idle.
    ///
    /// With no storage the best dispatch sells every forecast kilowatt up to
    /// the interconnection limit, so no optimization is needed. Used as the
    /// baseline when reporting the value storage adds.
    pub fn objective_without_storage(&self, data: &WindowData, committed_len: usize) -> f64 {
        let weights = self.weights();
        let sell_limit = self
            .grid_entry()
            .map(|(_, g)| g.sell_limit_kw)
            .unwrap_or(f64::INFINITY);
        let mut value = 0.0;
        for t in 0..committed_len.min(data.len) {
            let mut available = 0.0;
            let mut cost = 0.0;
            for (name, tech) in &self.techs {
                if let Technology::Generator(g) = tech {
                    let f = data.forecasts.get(name).map_or(0.0, |v| v[t]);
                    available += f;
                    cost += g.cost_per_kwh * f;
                }
            }
            value += weights.revenue(t) * data.prices[t] * available.min(sell_limit);
            value -= weights.cost(t) * cost;
        }
        value
    }
}

fn eval_all(vars: &[Variable], solution: &impl Solution) -> Vec<f64> {
    vars.iter().map(|&v| solution.value(v)).collect()
}

fn extract_decision(block: &TechBlock, solution: &impl Solution) -> TechDecision {
    match block {
        TechBlock::Generator(b) => TechDecision::Generator(GeneratorDecision {
            generation: eval_all(&b.generation, solution),
        }),
        TechBlock::Converter(b) => TechDecision::Converter(ConverterDecision {
            input: eval_all(&b.input, solution),
            output: eval_all(&b.output, solution),
        }),
        TechBlock::Storage(b) => TechDecision::Storage(StorageDecision {
            charge: eval_all(&b.charge, solution),
            discharge: eval_all(&b.discharge, solution),
            soc_end: b.soc[1..].iter().map(|&v| solution.value(v)).collect(),
            is_charging: b
                .is_charging
                .iter()
                .map(|&v| solution.value(v) > 0.5)
                .collect(),
            is_discharging: b
                .is_discharging
                .iter()
                .map(|&v| solution.value(v) > 0.5)
                .collect(),
        }),
        TechBlock::Grid(b) => TechDecision::Grid(GridDecision {
            sell: eval_all(&b.sell, solution),
            buy: eval_all(&b.buy, solution),
        }),
    }
}
