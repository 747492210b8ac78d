//! TOML-based scenario configuration and preset definitions.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::battery::{ControlMode, StatefulBattery, StatefulBatteryParams};
use crate::dispatch::{
    Commodity, ConverterTech, FlowArc, GeneratorTech, GridTech, HybridDispatchModel,
    StorageDevice, Technology,
};
use crate::driver::RollingHorizonDriver;
use crate::error::DispatchError;
use crate::forecast::{ForecastSeries, TailPolicy};
use crate::horizon::TimeHorizon;
use crate::profile;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Rolling-horizon timing and discounting.
    #[serde(default)]
    pub horizon: HorizonConfig,
    /// Run-level parameters (seed, forecast tail policy).
    #[serde(default)]
    pub run: RunConfig,
    /// Wind farm parameters.
    #[serde(default)]
    pub wind: WindConfig,
    /// Solar PV parameters.
    #[serde(default)]
    pub solar: SolarConfig,
    /// Synthetic price curve parameters.
    #[serde(default)]
    pub prices: PriceConfig,
    /// Battery storage parameters.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Grid interconnection parameters.
    #[serde(default)]
    pub grid: GridConfig,
    /// High-fidelity pack simulator parameters.
    #[serde(default)]
    pub simulator: SimulatorConfig,
    /// Optional electrolyzer plus hydrogen tank.
    #[serde(default)]
    pub hydrogen: HydrogenConfig,
}

/// Rolling-horizon timing and discounting.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HorizonConfig {
    /// Duration of one period in hours.
    pub dt_hours: f64,
    /// Periods solved jointly per optimization call.
    pub dispatch_horizon: usize,
    /// Periods committed before re-solving.
    pub dispatch_solution: usize,
    /// Length of the full run in periods.
    pub total_steps: usize,
    /// Exponential time-weighting factor (0.0-1.0].
    pub gamma: f64,
}

impl Default for HorizonConfig {
    fn default() -> Self {
        Self {
            dt_hours: 1.0,
            dispatch_horizon: 48,
            dispatch_solution: 24,
            total_steps: 8760,
            gamma: 0.999,
        }
    }
}

/// Run-level parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Master random seed for the synthetic profiles.
    pub seed: u64,
    /// Forecast tail policy: `"wrap"`, `"pad_with_last"`, or `"error"`.
    pub tail_policy: TailPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tail_policy: TailPolicy::Wrap,
        }
    }
}

/// Wind farm parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindConfig {
    /// Nameplate capacity (kW). Zero disables the wind farm.
    pub capacity_kw: f64,
    /// Long-run mean output (kW).
    pub mean_kw: f64,
    /// AR(1) persistence coefficient (0.0-1.0).
    pub alpha: f64,
    /// Innovation noise standard deviation, relative to the mean.
    pub noise_std: f64,
    /// Operating cost ($/kWh).
    pub cost_per_kwh: f64,
}

impl Default for WindConfig {
    fn default() -> Self {
        Self {
            capacity_kw: 50_000.0,
            mean_kw: 18_000.0,
            alpha: 0.95,
            noise_std: 0.15,
            cost_per_kwh: 43.0 / 8760.0,
        }
    }
}

/// Solar PV parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolarConfig {
    /// Peak generation (kW). Zero disables the array.
    pub capacity_kw: f64,
    /// Sunrise period index within the day (inclusive).
    pub sunrise_idx: usize,
    /// Sunset period index within the day (exclusive).
    pub sunset_idx: usize,
    /// Multiplicative noise standard deviation.
    pub noise_std: f64,
    /// Operating cost ($/kWh).
    pub cost_per_kwh: f64,
}

impl Default for SolarConfig {
    fn default() -> Self {
        Self {
            capacity_kw: 0.0,
            sunrise_idx: 6,
            sunset_idx: 18,
            noise_std: 0.1,
            cost_per_kwh: 13.0 / 8760.0,
        }
    }
}

/// Synthetic price curve parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PriceConfig {
    /// Periods per constant-price block.
    pub block_len: usize,
    /// Upper bound of the uniform price draw ($/kWh).
    pub max_price: f64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            block_len: 3,
            max_price: 0.1,
        }
    }
}

/// Battery storage parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Total energy capacity (kWh).
    pub capacity_kwh: f64,
    /// Lower SOC bound (0.0-1.0).
    pub min_soc: f64,
    /// Upper SOC bound (0.0-1.0).
    pub max_soc: f64,
    /// Initial state of charge (0.0-1.0).
    pub initial_soc: f64,
    /// Charge efficiency (0.0-1.0).
    pub eta_charge: f64,
    /// Discharge efficiency (0.0-1.0).
    pub eta_discharge: f64,
    /// Maximum charging power (kW).
    pub max_charge_kw: f64,
    /// Maximum discharging power (kW).
    pub max_discharge_kw: f64,
    /// Operating cost per kWh discharged ($/kWh).
    pub cost_per_discharge: f64,
    /// Cost per equivalent full cycle ($).
    pub lifecycle_cost: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_kwh: 40_000.0,
            min_soc: 0.1,
            max_soc: 0.9,
            initial_soc: 0.5,
            eta_charge: 0.938,
            eta_discharge: 0.938,
            max_charge_kw: 10_000.0,
            max_discharge_kw: 10_000.0,
            cost_per_discharge: 3.0 / 8760.0,
            lifecycle_cost: 0.6,
        }
    }
}

/// Grid interconnection parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Maximum export (kW).
    pub sell_limit_kw: f64,
    /// Maximum import (kW). Zero disables buy-back.
    pub buy_limit_kw: f64,
    /// Contracted firm delivery (kW). Zero disables the floor.
    pub firm_delivery_kw: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            sell_limit_kw: 50_000.0,
            buy_limit_kw: 0.0,
            firm_delivery_kw: 0.0,
        }
    }
}

/// High-fidelity pack simulator parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Whether the committed battery plan is re-simulated.
    pub enabled: bool,
    /// Nominal pack voltage (V).
    pub nominal_voltage_v: f64,
    /// Series internal resistance (ohm).
    pub internal_resistance_ohm: f64,
    /// Simulation sub-steps per dispatch period.
    pub sub_steps: usize,
    /// Ambient temperature (°C).
    pub ambient_temp_c: f64,
    /// Pack heat capacity (kWh per °C).
    pub thermal_mass_kwh_per_c: f64,
    /// Fractional relaxation toward ambient per hour.
    pub cooling_per_hour: f64,
    /// Command interpretation: `"power"` or `"current"`.
    pub control_mode: String,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            nominal_voltage_v: 500.0,
            internal_resistance_ohm: 0.002,
            sub_steps: 4,
            ambient_temp_c: 20.0,
            thermal_mass_kwh_per_c: 50.0,
            cooling_per_hour: 0.1,
            control_mode: "power".to_string(),
        }
    }
}

/// Optional electrolyzer plus hydrogen tank.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HydrogenConfig {
    /// Whether the hydrogen chain is present.
    pub enabled: bool,
    /// Electrolyzer rated draw (kW).
    pub electrolyzer_kw: f64,
    /// Hydrogen yield (kg per kWh).
    pub kg_per_kwh: f64,
    /// Electrolyzer operating cost ($/kg).
    pub cost_per_kg: f64,
    /// Tank capacity (kg).
    pub tank_capacity_kg: f64,
    /// Tank lower fill bound (0.0-1.0).
    pub tank_min_soc: f64,
    /// Tank upper fill bound (0.0-1.0).
    pub tank_max_soc: f64,
    /// Tank initial fill (0.0-1.0).
    pub tank_initial_soc: f64,
    /// Maximum tank flow (kg per hour).
    pub tank_max_flow_kg_per_h: f64,
}

impl Default for HydrogenConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            electrolyzer_kw: 10_000.0,
            kg_per_kwh: 1.0 / 55.0,
            cost_per_kg: 0.02,
            tank_capacity_kg: 2_000.0,
            tank_min_soc: 0.0,
            tank_max_soc: 1.0,
            tank_initial_soc: 0.1,
            tank_max_flow_kg_per_h: 200.0,
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: wind, battery, and grid export only.
    pub fn baseline() -> Self {
        Self {
            horizon: HorizonConfig::default(),
            run: RunConfig::default(),
            wind: WindConfig::default(),
            solar: SolarConfig::default(),
            prices: PriceConfig::default(),
            battery: BatteryConfig::default(),
            grid: GridConfig::default(),
            simulator: SimulatorConfig::default(),
            hydrogen: HydrogenConfig::default(),
        }
    }

    /// Returns the firm-power preset: a contracted delivery floor with
    /// buy-back enabled to cover shortfalls.
    pub fn firm_power() -> Self {
        Self {
            grid: GridConfig {
                sell_limit_kw: 50_000.0,
                buy_limit_kw: 10_000.0,
                firm_delivery_kw: 5_000.0,
            },
            solar: SolarConfig {
                capacity_kw: 20_000.0,
                ..SolarConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Returns the hydrogen preset: an electrolyzer and tank alongside the
    /// battery.
    pub fn hydrogen_coupled() -> Self {
        Self {
            hydrogen: HydrogenConfig {
                enabled: true,
                ..HydrogenConfig::default()
            },
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "firm_power", "hydrogen_coupled"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, DispatchError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "firm_power" => Ok(Self::firm_power()),
            "hydrogen_coupled" => Ok(Self::hydrogen_coupled()),
            _ => Err(DispatchError::config(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the file cannot be read or the TOML
    /// is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, DispatchError> {
        let content = fs::read_to_string(path).map_err(|e| {
            DispatchError::config("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the TOML is invalid or contains
    /// unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, DispatchError> {
        toml::from_str(s).map_err(|e| DispatchError::config("toml", e.to_string()))
    }

    /// Validates cross-field constraints and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid. Per-technology
    /// parameter checks run again, eagerly, when the model is built.
    pub fn validate(&self) -> Vec<DispatchError> {
        let mut errors = Vec::new();
        let h = &self.horizon;
        if let Err(e) = TimeHorizon::new(h.dt_hours, h.dispatch_horizon, h.dispatch_solution, h.total_steps) {
            errors.push(e);
        }
        if !(h.gamma > 0.0 && h.gamma <= 1.0) {
            errors.push(DispatchError::config("horizon.gamma", "must be in (0, 1]"));
        }

        if self.wind.capacity_kw <= 0.0 && self.solar.capacity_kw <= 0.0 {
            errors.push(DispatchError::config(
                "wind.capacity_kw",
                "at least one generator must have capacity > 0",
            ));
        }
        let steps_per_day = self.steps_per_day();
        if self.solar.capacity_kw > 0.0 {
            if self.solar.sunrise_idx >= self.solar.sunset_idx {
                errors.push(DispatchError::config(
                    "solar.sunrise_idx",
                    "must be < solar.sunset_idx",
                ));
            }
            if self.solar.sunset_idx > steps_per_day {
                errors.push(DispatchError::config(
                    "solar.sunset_idx",
                    "must fit within one day of periods",
                ));
            }
        }
        if self.prices.block_len == 0 {
            errors.push(DispatchError::config("prices.block_len", "must be > 0"));
        }
        if self.prices.max_price <= 0.0 {
            errors.push(DispatchError::config("prices.max_price", "must be > 0"));
        }
        if self.simulator.control_mode != "power" && self.simulator.control_mode != "current" {
            errors.push(DispatchError::config(
                "simulator.control_mode",
                format!(
                    "must be \"power\" or \"current\", got \"{}\"",
                    self.simulator.control_mode
                ),
            ));
        }
        if self.grid.firm_delivery_kw < 0.0 {
            errors.push(DispatchError::config(
                "grid.firm_delivery_kw",
                "must be >= 0",
            ));
        }
        errors
    }

    fn steps_per_day(&self) -> usize {
        ((24.0 / self.horizon.dt_hours).round() as usize).max(1)
    }

    /// Builds the plant model this scenario describes.
    ///
    /// # Errors
    ///
    /// Returns the first per-technology configuration error found.
    pub fn build_model(&self) -> Result<HybridDispatchModel, DispatchError> {
        let mut model = HybridDispatchModel::new(self.horizon.gamma, self.horizon.dt_hours)?;
        if self.wind.capacity_kw > 0.0 {
            model.add_technology(
                "wind",
                Technology::Generator(GeneratorTech {
                    commodity: Commodity::Electricity,
                    capacity_kw: self.wind.capacity_kw,
                    cost_per_kwh: self.wind.cost_per_kwh,
                }),
            )?;
        }
        if self.solar.capacity_kw > 0.0 {
            model.add_technology(
                "solar",
                Technology::Generator(GeneratorTech {
                    commodity: Commodity::Electricity,
                    capacity_kw: self.solar.capacity_kw,
                    cost_per_kwh: self.solar.cost_per_kwh,
                }),
            )?;
        }
        let b = &self.battery;
        model.add_technology(
            "battery",
            Technology::Storage(StorageDevice {
                commodity: Commodity::Electricity,
                capacity: b.capacity_kwh,
                min_soc: b.min_soc,
                max_soc: b.max_soc,
                charge_efficiency: b.eta_charge,
                discharge_efficiency: b.eta_discharge,
                max_charge_rate: b.max_charge_kw,
                max_discharge_rate: b.max_discharge_kw,
                initial_soc: b.initial_soc,
                cost_per_charge: 0.0,
                cost_per_discharge: b.cost_per_discharge,
                lifecycle_cost: b.lifecycle_cost,
            }),
        )?;
        model.add_technology(
            "grid",
            Technology::Grid(GridTech {
                sell_limit_kw: self.grid.sell_limit_kw,
                buy_limit_kw: self.grid.buy_limit_kw,
            }),
        )?;
        if self.hydrogen.enabled {
            let hy = &self.hydrogen;
            model.add_technology(
                "electrolyzer",
                Technology::Converter(ConverterTech {
                    commodity_in: Commodity::Electricity,
                    commodity_out: Commodity::Hydrogen,
                    conversion_rate: hy.kg_per_kwh,
                    max_input_kw: hy.electrolyzer_kw,
                    cost_per_output: hy.cost_per_kg,
                }),
            )?;
            model.add_technology(
                "h2_tank",
                Technology::Storage(StorageDevice {
                    commodity: Commodity::Hydrogen,
                    capacity: hy.tank_capacity_kg,
                    min_soc: hy.tank_min_soc,
                    max_soc: hy.tank_max_soc,
                    charge_efficiency: 1.0,
                    discharge_efficiency: 1.0,
                    max_charge_rate: hy.tank_max_flow_kg_per_h,
                    max_discharge_rate: 0.0,
                    initial_soc: hy.tank_initial_soc,
                    cost_per_charge: 0.0,
                    cost_per_discharge: 0.0,
                    lifecycle_cost: 0.0,
                }),
            )?;
            model.add_arc(FlowArc {
                source_tech: "electrolyzer".to_string(),
                source_port: "out".to_string(),
                dest_tech: "h2_tank".to_string(),
                dest_port: "charge_in".to_string(),
            })?;
        }
        Ok(model)
    }

    /// Builds a ready-to-run driver with synthetic profiles.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found, or a solver-unavailable
    /// error from the backend probe.
    pub fn build_driver(&self) -> Result<RollingHorizonDriver, DispatchError> {
        if let Some(first) = self.validate().into_iter().next() {
            return Err(first);
        }
        let model = self.build_model()?;
        let h = &self.horizon;
        let horizon =
            TimeHorizon::new(h.dt_hours, h.dispatch_horizon, h.dispatch_solution, h.total_steps)?;

        let seed = self.run.seed;
        let mut forecasts = BTreeMap::new();
        if self.wind.capacity_kw > 0.0 {
            forecasts.insert(
                "wind".to_string(),
                ForecastSeries::new(
                    "wind",
                    profile::wind_profile(
                        h.total_steps,
                        self.wind.mean_kw,
                        self.wind.capacity_kw,
                        self.wind.alpha,
                        self.wind.noise_std,
                        seed,
                    ),
                )?,
            );
        }
        if self.solar.capacity_kw > 0.0 {
            forecasts.insert(
                "solar".to_string(),
                ForecastSeries::new(
                    "solar",
                    profile::solar_profile(
                        h.total_steps,
                        self.steps_per_day(),
                        self.solar.capacity_kw,
                        self.solar.sunrise_idx,
                        self.solar.sunset_idx,
                        self.solar.noise_std,
                        seed.wrapping_add(1),
                    ),
                )?,
            );
        }
        let prices = ForecastSeries::new(
            "prices",
            profile::price_profile(
                h.total_steps,
                self.prices.block_len,
                self.prices.max_price,
                seed.wrapping_add(2),
            ),
        )?;

        let mut driver =
            RollingHorizonDriver::new(model, horizon, prices, forecasts, self.run.tail_policy)?;
        if self.grid.firm_delivery_kw > 0.0 {
            let demand = ForecastSeries::new(
                "firm_delivery",
                vec![self.grid.firm_delivery_kw; h.total_steps],
            )?;
            driver = driver.with_firm_delivery(demand)?;
        }
        if self.simulator.enabled {
            driver = driver.with_simulator("battery", self.build_simulator()?)?;
        }
        Ok(driver)
    }

    fn build_simulator(&self) -> Result<StatefulBattery, DispatchError> {
        let b = &self.battery;
        let s = &self.simulator;
        let control_mode = match s.control_mode.as_str() {
            "current" => ControlMode::Current,
            _ => ControlMode::Power,
        };
        StatefulBattery::new(StatefulBatteryParams {
            capacity_kwh: b.capacity_kwh,
            nominal_voltage_v: s.nominal_voltage_v,
            internal_resistance_ohm: s.internal_resistance_ohm,
            charge_efficiency: b.eta_charge,
            discharge_efficiency: b.eta_discharge,
            min_soc: b.min_soc,
            max_soc: b.max_soc,
            initial_soc: b.initial_soc,
            max_charge_kw: b.max_charge_kw,
            max_discharge_kw: b.max_discharge_kw,
            sub_steps: s.sub_steps,
            ambient_temp_c: s.ambient_temp_c,
            thermal_mass_kwh_per_c: s.thermal_mass_kwh_per_c,
            cooling_per_hour: s.cooling_per_hour,
            control_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn from_preset_unknown() {
        let err = ScenarioConfig::from_preset("nonexistent");
        assert!(err.is_err());
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[horizon]
dt_hours = 1.0
dispatch_horizon = 48
dispatch_solution = 24
total_steps = 720
gamma = 0.999

[run]
seed = 7
tail_policy = "pad_with_last"

[wind]
capacity_kw = 20000.0
mean_kw = 8000.0

[battery]
capacity_kwh = 10000.0
initial_soc = 0.4

[grid]
sell_limit_kw = 20000.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.horizon.total_steps), Some(720));
        assert_eq!(cfg.as_ref().map(|c| c.run.seed), Some(7));
        assert_eq!(
            cfg.as_ref().map(|c| c.run.tail_policy),
            Some(crate::forecast::TailPolicy::PadWithLast)
        );
        // unspecified sections keep defaults
        assert_eq!(cfg.as_ref().map(|c| c.battery.max_charge_kw), Some(10_000.0));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[horizon]
dt_hours = 1.0
bogus_field = true
"#;
        assert!(ScenarioConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_bad_horizon_ordering() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.horizon.dispatch_solution = 96;
        let errors = cfg.validate();
        assert!(!errors.is_empty());
    }

    #[test]
    fn validation_catches_bad_control_mode() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulator.control_mode = "voltage".to_string();
        let errors = cfg.validate();
        assert!(!errors.is_empty());
    }

    #[test]
    fn validation_requires_a_generator() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.wind.capacity_kw = 0.0;
        cfg.solar.capacity_kw = 0.0;
        let errors = cfg.validate();
        assert!(!errors.is_empty());
    }

    #[test]
    fn baseline_model_has_wind_battery_grid() {
        let model = ScenarioConfig::baseline().build_model().expect("valid model");
        let names: Vec<_> = model.technologies().keys().cloned().collect();
        assert_eq!(names, ["battery", "grid", "wind"]);
    }

    #[test]
    fn hydrogen_preset_adds_converter_and_tank() {
        let model = ScenarioConfig::hydrogen_coupled()
            .build_model()
            .expect("valid model");
        assert!(model.technologies().contains_key("electrolyzer"));
        assert!(model.technologies().contains_key("h2_tank"));
    }

    #[test]
    fn firm_power_preset_enables_buy_back() {
        let cfg = ScenarioConfig::firm_power();
        assert!(cfg.grid.buy_limit_kw > 0.0);
        assert!(cfg.grid.firm_delivery_kw > 0.0);
    }
}
