//! Rolling-horizon execution: solve, commit, simulate, advance.
//!
//! The driver owns the only mutable run state. Each iteration builds a
//! lookahead window, solves the joint dispatch problem, commits the first
//! `dispatch_solution` periods, re-simulates the committed storage plan on
//! the high-fidelity pack model, and carries the realized state of charge
//! into the next window. A failed window aborts the run; everything
//! committed before it stays available for partial reporting.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::battery::{StatefulBattery, approx_lifecycles, lifecycles_from_soc};
use crate::dispatch::{
    HybridDispatchModel, StorageDecision, Technology, WindowData, WindowSolution, solver,
};
use crate::error::DispatchError;
use crate::forecast::{ForecastSeries, TailPolicy};
use crate::horizon::TimeHorizon;

/// Where the driver is in its solve-commit-advance loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    /// No window attempted yet.
    Idle,
    /// Window data assembled for the period at the contained start index.
    WindowBuilt(usize),
    /// Window solved, not yet committed.
    Solved(usize),
    /// Committed prefix simulated.
    Committed(usize),
    /// Carried state advanced past the window.
    Advanced(usize),
    /// All windows processed.
    Done,
}

/// One committed period of the run.
#[derive(Debug, Clone)]
pub struct PeriodRecord {
    /// Absolute period index.
    pub period: usize,
    /// Electricity price, $/kWh.
    pub price: f64,
    /// Total non-grid production, kW.
    pub system_production: f64,
    /// Total non-grid load, kW.
    pub system_load: f64,
    /// Net export to the grid, kW.
    pub net_export: f64,
    /// Storage charge flow the optimizer decided, kW.
    pub decided_charge: f64,
    /// Storage discharge flow the optimizer decided, kW.
    pub decided_discharge: f64,
    /// End-of-period SOC the optimizer planned, fraction.
    pub decided_soc: f64,
    /// End-of-period SOC the pack simulator realized, fraction.
    pub realized_soc: f64,
    /// Mean realized pack power, kW (positive discharging).
    pub realized_power_kw: f64,
    /// Pack temperature at the end of the period, °C, when simulated.
    pub temp_c: Option<f64>,
}

/// Per-window diagnostics.
#[derive(Debug, Clone)]
pub struct WindowRecord {
    /// Period index the window starts at.
    pub start: usize,
    /// Periods committed from this window.
    pub committed_len: usize,
    /// Solved net market value over the full lookahead.
    pub net_value: f64,
    /// Closed-form net value with storage idle, same lookahead.
    pub baseline_value: f64,
    /// Cycle count the optimizer's throughput formula implies for the
    /// committed prefix.
    pub approx_lifecycles: f64,
    /// Depth-weighted cycle count recomputed from realized SOC.
    pub realized_lifecycles: f64,
    /// Hottest simulated pack temperature in the committed prefix, °C.
    pub max_temp_c: Option<f64>,
    /// Largest absolute realized-minus-decided SOC gap in the prefix.
    pub max_soc_divergence: f64,
}

/// Rolling-horizon dispatch driver.
pub struct RollingHorizonDriver {
    model: HybridDispatchModel,
    horizon: TimeHorizon,
    prices: ForecastSeries,
    forecasts: BTreeMap<String, ForecastSeries>,
    firm_delivery: Option<ForecastSeries>,
    tail_policy: TailPolicy,
    simulators: BTreeMap<String, StatefulBattery>,
    carried_soc: BTreeMap<String, f64>,
    records: Vec<PeriodRecord>,
    windows: Vec<WindowRecord>,
    phase: DriverPhase,
}

impl RollingHorizonDriver {
    /// Builds a driver, probing the solver backend before anything runs.
    ///
    /// Every generator in the model needs a forecast series, and every
    /// series (including prices) must cover the full run.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for missing or short series, or a
    /// solver-unavailable error if the backend probe fails.
    pub fn new(
        model: HybridDispatchModel,
        horizon: TimeHorizon,
        prices: ForecastSeries,
        forecasts: BTreeMap<String, ForecastSeries>,
        tail_policy: TailPolicy,
    ) -> Result<Self, DispatchError> {
        solver::probe()?;
        if prices.len() < horizon.total_steps {
            return Err(DispatchError::config(
                "prices",
                format!(
                    "covers {} periods, run needs {}",
                    prices.len(),
                    horizon.total_steps
                ),
            ));
        }
        let mut carried_soc = BTreeMap::new();
        for (name, tech) in model.technologies() {
            match tech {
                Technology::Generator(_) => match forecasts.get(name) {
                    Some(f) if f.len() >= horizon.total_steps => {}
                    Some(f) => {
                        return Err(DispatchError::config(
                            format!("forecasts.{name}"),
                            format!(
                                "covers {} periods, run needs {}",
                                f.len(),
                                horizon.total_steps
                            ),
                        ));
                    }
                    None => {
                        return Err(DispatchError::config(
                            format!("forecasts.{name}"),
                            "missing forecast for generator",
                        ));
                    }
                },
                Technology::Storage(s) => {
                    carried_soc.insert(name.clone(), s.initial_soc);
                }
                _ => {}
            }
        }
        Ok(Self {
            model,
            horizon,
            prices,
            forecasts,
            firm_delivery: None,
            tail_policy,
            simulators: BTreeMap::new(),
            carried_soc,
            records: Vec::with_capacity(horizon.total_steps),
            windows: Vec::with_capacity(horizon.num_windows()),
            phase: DriverPhase::Idle,
        })
    }

    /// Adds a contracted firm-delivery series (minimum export per period).
    ///
    /// # Errors
    ///
    /// The series must cover the full run and the model must have a grid.
    pub fn with_firm_delivery(mut self, demand: ForecastSeries) -> Result<Self, DispatchError> {
        if !self
            .model
            .technologies()
            .values()
            .any(|t| matches!(t, Technology::Grid(_)))
        {
            return Err(DispatchError::config(
                "firm_delivery",
                "requires a grid interconnection",
            ));
        }
        if demand.len() < self.horizon.total_steps {
            return Err(DispatchError::config(
                "firm_delivery",
                format!(
                    "covers {} periods, run needs {}",
                    demand.len(),
                    self.horizon.total_steps
                ),
            ));
        }
        self.firm_delivery = Some(demand);
        Ok(self)
    }

    /// Attaches a high-fidelity pack simulator to a named storage device.
    ///
    /// Storage devices without a simulator carry the optimizer's idealized
    /// SOC forward unchanged.
    ///
    /// # Errors
    ///
    /// The name must refer to a registered storage technology.
    pub fn with_simulator(
        mut self,
        name: impl Into<String>,
        simulator: StatefulBattery,
    ) -> Result<Self, DispatchError> {
        let name = name.into();
        if self.model.storage(&name).is_none() {
            return Err(DispatchError::config(
                format!("simulator.{name}"),
                "no storage technology with this name",
            ));
        }
        self.carried_soc.insert(name.clone(), simulator.soc());
        self.simulators.insert(name, simulator);
        Ok(self)
    }

    /// Current phase of the solve-commit-advance loop.
    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    /// SOC that will seed the next window for the named storage device.
    pub fn carried_soc(&self, name: &str) -> Option<f64> {
        self.carried_soc.get(name).copied()
    }

    /// Committed period records so far. Populated even after a failed run.
    pub fn records(&self) -> &[PeriodRecord] {
        &self.records
    }

    /// Per-window diagnostics so far.
    pub fn windows(&self) -> &[WindowRecord] {
        &self.windows
    }

    /// The model driven by this run.
    pub fn model(&self) -> &HybridDispatchModel {
        &self.model
    }

    /// The timing parameters of this run.
    pub fn horizon(&self) -> TimeHorizon {
        self.horizon
    }

    /// Runs every rolling-horizon window to completion.
    ///
    /// # Errors
    ///
    /// Stops at the first failed window; [`records`](Self::records) and
    /// [`windows`](Self::windows) keep everything committed before it.
    pub fn run(&mut self) -> Result<(), DispatchError> {
        let starts: Vec<usize> = self.horizon.window_starts().collect();
        for start in starts {
            self.step_window(start)?;
        }
        self.phase = DriverPhase::Done;
        info!(
            windows = self.windows.len(),
            periods = self.records.len(),
            "rolling-horizon run complete"
        );
        Ok(())
    }

    /// Builds, solves, commits, and advances one window.
    fn step_window(&mut self, start: usize) -> Result<(), DispatchError> {
        let data = self.build_window(start)?;
        self.phase = DriverPhase::WindowBuilt(start);

        let solution = self.model.solve_window(&data)?;
        self.phase = DriverPhase::Solved(start);

        let committed = self.horizon.committed_len(start);
        let baseline = self.model.objective_without_storage(&data, data.len);
        self.commit(&data, &solution, committed, baseline);
        self.phase = DriverPhase::Committed(start);

        self.phase = DriverPhase::Advanced(start);
        Ok(())
    }

    fn build_window(&self, start: usize) -> Result<WindowData, DispatchError> {
        let len = self.horizon.dispatch_horizon;
        let mut forecasts = BTreeMap::new();
        for (name, series) in &self.forecasts {
            forecasts.insert(name.clone(), series.window(start, len, self.tail_policy)?);
        }
        let firm_delivery = match &self.firm_delivery {
            Some(series) => Some(series.window(start, len, self.tail_policy)?),
            None => None,
        };
        Ok(WindowData {
            start,
            len,
            prices: self.prices.window(start, len, self.tail_policy)?,
            forecasts,
            initial_soc: self.carried_soc.clone(),
            firm_delivery,
        })
    }

    /// Steps the pack simulators through the committed prefix and records
    /// the outcome.
    fn commit(
        &mut self,
        data: &WindowData,
        solution: &WindowSolution,
        committed: usize,
        baseline_value: f64,
    ) {
        let storages: Vec<(String, StorageDecision)> = solution
            .decisions
            .iter()
            .filter_map(|(n, d)| d.as_storage().map(|s| (n.clone(), s.clone())))
            .collect();

        let mut max_temp: Option<f64> = None;
        let mut max_divergence = 0.0_f64;
        let mut approx_cycles = 0.0;
        let mut realized_cycles = 0.0;

        // Realized per-storage SOC at the start of each committed period,
        // for the depth-weighted cycle recomputation.
        let mut prev_soc: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for (name, _) in &storages {
            prev_soc.insert(name, Vec::with_capacity(committed));
        }

        for t in 0..committed {
            let mut decided_charge = 0.0;
            let mut decided_discharge = 0.0;
            let mut decided_energy = 0.0;
            let mut realized_energy = 0.0;
            let mut total_capacity = 0.0;
            let mut realized_power = 0.0;
            let mut temp_c: Option<f64> = None;

            for (name, decision) in &storages {
                let Some(device) = self.model.storage(name) else {
                    continue;
                };
                if let Some(trace) = prev_soc.get_mut(name.as_str()) {
                    trace.push(self.carried_soc[name]);
                }

                decided_charge += decision.charge[t];
                decided_discharge += decision.discharge[t];
                decided_energy += decision.soc_end[t] * device.capacity;
                total_capacity += device.capacity;

                let realized = match self.simulators.get_mut(name) {
                    Some(sim) => {
                        let command = decision.discharge[t] - decision.charge[t];
                        let state = sim.step(command, self.horizon.dt_hours);
                        realized_power += state.power_kw;
                        temp_c = Some(temp_c.unwrap_or(f64::MIN).max(state.temp_c));
                        state.soc
                    }
                    None => decision.soc_end[t],
                };
                realized_energy += realized * device.capacity;

                let divergence = (realized - decision.soc_end[t]).abs();
                max_divergence = max_divergence.max(divergence);
                if divergence > 1e-6 {
                    debug!(
                        period = data.start + t,
                        storage = name.as_str(),
                        decided = decision.soc_end[t],
                        realized,
                        "pack state diverged from plan"
                    );
                }

                // The carried state is the realized one, clamped into the
                // device's operating band.
                self.carried_soc.insert(
                    name.clone(),
                    realized.clamp(device.min_soc, device.max_soc),
                );
            }

            if let Some(t_c) = temp_c {
                max_temp = Some(max_temp.unwrap_or(f64::MIN).max(t_c));
            }

            let (decided_soc, realized_soc) = if total_capacity > 0.0 {
                (
                    decided_energy / total_capacity,
                    realized_energy / total_capacity,
                )
            } else {
                (0.0, 0.0)
            };

            self.records.push(PeriodRecord {
                period: data.start + t,
                price: data.prices[t],
                system_production: solution.system_production[t],
                system_load: solution.system_load[t],
                net_export: solution.commodity_out[t],
                decided_charge,
                decided_discharge,
                decided_soc,
                realized_soc,
                realized_power_kw: realized_power,
                temp_c,
            });
        }

        let weights = self.model.weights();
        for (name, decision) in &storages {
            let Some(device) = self.model.storage(name) else {
                continue;
            };
            approx_cycles += approx_lifecycles(
                &decision.charge[..committed],
                weights.dt_hours,
                device.capacity,
                weights.gamma,
            );
            realized_cycles += lifecycles_from_soc(
                &decision.discharge[..committed],
                &prev_soc[name.as_str()],
                weights.dt_hours,
                device.capacity,
            );
        }

        info!(
            window_start = data.start,
            committed,
            net_value = solution.net_value,
            baseline_value,
            max_soc_divergence = max_divergence,
            "window committed"
        );

        self.windows.push(WindowRecord {
            start: data.start,
            committed_len: committed,
            net_value: solution.net_value,
            baseline_value,
            approx_lifecycles: approx_cycles,
            realized_lifecycles: realized_cycles,
            max_temp_c: max_temp,
            max_soc_divergence: max_divergence,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{DriverPhase, RollingHorizonDriver};
    use crate::dispatch::{
        Commodity, GeneratorTech, GridTech, HybridDispatchModel, StorageDevice, Technology,
    };
    use crate::forecast::{ForecastSeries, TailPolicy};
    use crate::horizon::TimeHorizon;

    fn small_model() -> HybridDispatchModel {
        let mut m = HybridDispatchModel::new(1.0, 1.0).expect("valid gamma and dt");
        m.add_technology(
            "wind",
            Technology::Generator(GeneratorTech {
                commodity: Commodity::Electricity,
                capacity_kw: 1000.0,
                cost_per_kwh: 0.0,
            }),
        )
        .expect("valid generator");
        m.add_technology(
            "battery",
            Technology::Storage(StorageDevice {
                commodity: Commodity::Electricity,
                capacity: 1000.0,
                min_soc: 0.1,
                max_soc: 0.9,
                charge_efficiency: 1.0,
                discharge_efficiency: 1.0,
                max_charge_rate: 250.0,
                max_discharge_rate: 250.0,
                initial_soc: 0.5,
                cost_per_charge: 0.0,
                cost_per_discharge: 0.0,
                lifecycle_cost: 0.0,
            }),
        )
        .expect("valid storage");
        m.add_technology(
            "grid",
            Technology::Grid(GridTech {
                sell_limit_kw: 1000.0,
                buy_limit_kw: 0.0,
            }),
        )
        .expect("valid grid");
        m
    }

    fn driver(total: usize, horizon: usize, solution: usize) -> RollingHorizonDriver {
        let h = TimeHorizon::new(1.0, horizon, solution, total).expect("valid horizon");
        let prices = ForecastSeries::new("price", vec![0.05; total]).expect("non-empty");
        let wind = ForecastSeries::new("wind", vec![500.0; total]).expect("non-empty");
        RollingHorizonDriver::new(
            small_model(),
            h,
            prices,
            BTreeMap::from([("wind".to_string(), wind)]),
            TailPolicy::Wrap,
        )
        .expect("valid driver")
    }

    #[test]
    fn run_covers_every_period_exactly_once() {
        let mut d = driver(48, 12, 6);
        d.run().expect("feasible run");
        assert_eq!(d.phase(), DriverPhase::Done);
        assert_eq!(d.records().len(), 48);
        assert_eq!(d.windows().len(), 8);
        for (i, r) in d.records().iter().enumerate() {
            assert_eq!(r.period, i);
        }
        assert_eq!(d.records().last().map(|r| r.period), Some(47));
    }

    #[test]
    fn truncated_final_window_commits_the_remainder() {
        let mut d = driver(20, 12, 6);
        d.run().expect("feasible run");
        // Windows at 0, 6, 12, 18; the last commits 2 periods.
        assert_eq!(d.windows().len(), 4);
        assert_eq!(d.windows()[3].committed_len, 2);
        assert_eq!(d.records().len(), 20);
    }

    #[test]
    fn carried_soc_follows_the_plan_without_a_simulator() {
        let mut d = driver(12, 12, 6);
        d.run().expect("feasible run");
        let last = d.records().last().expect("records");
        let carried = d.carried_soc("battery").expect("battery registered");
        assert!((carried - last.realized_soc).abs() < 1e-9);
        // No simulator attached, so realized equals decided everywhere.
        for r in d.records() {
            assert!((r.realized_soc - r.decided_soc).abs() < 1e-9);
            assert!(r.temp_c.is_none());
        }
    }

    #[test]
    fn missing_generator_forecast_is_rejected() {
        let h = TimeHorizon::new(1.0, 12, 6, 24).expect("valid horizon");
        let prices = ForecastSeries::new("price", vec![0.05; 24]).expect("non-empty");
        let err = RollingHorizonDriver::new(
            small_model(),
            h,
            prices,
            BTreeMap::new(),
            TailPolicy::Wrap,
        );
        assert!(err.is_err());
    }

    #[test]
    fn short_price_series_is_rejected() {
        let h = TimeHorizon::new(1.0, 12, 6, 24).expect("valid horizon");
        let prices = ForecastSeries::new("price", vec![0.05; 10]).expect("non-empty");
        let wind = ForecastSeries::new("wind", vec![500.0; 24]).expect("non-empty");
        let err = RollingHorizonDriver::new(
            small_model(),
            h,
            prices,
            BTreeMap::from([("wind".to_string(), wind)]),
            TailPolicy::Wrap,
        );
        assert!(err.is_err());
    }

    #[test]
    fn simulator_name_must_match_a_storage() {
        use crate::battery::{ControlMode, StatefulBattery, StatefulBatteryParams};
        let sim = StatefulBattery::new(StatefulBatteryParams {
            capacity_kwh: 1000.0,
            nominal_voltage_v: 500.0,
            internal_resistance_ohm: 0.0,
            charge_efficiency: 1.0,
            discharge_efficiency: 1.0,
            min_soc: 0.1,
            max_soc: 0.9,
            initial_soc: 0.5,
            max_charge_kw: 250.0,
            max_discharge_kw: 250.0,
            sub_steps: 1,
            ambient_temp_c: 20.0,
            thermal_mass_kwh_per_c: 5.0,
            cooling_per_hour: 0.1,
            control_mode: ControlMode::Power,
        })
        .expect("valid params");
        assert!(driver(12, 12, 6).with_simulator("wind", sim).is_err());
    }
}
