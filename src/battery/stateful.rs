//! Sub-period battery simulator with losses, clamping, and a thermal model.

use crate::error::DispatchError;

/// How dispatch commands are interpreted by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    /// Commands are terminal power in kW.
    #[default]
    Power,
    /// Commands are terminal current in A, converted through the nominal
    /// pack voltage.
    Current,
}

/// Static pack parameters for the stateful simulator.
#[derive(Debug, Clone)]
pub struct StatefulBatteryParams {
    /// Usable capacity in kWh.
    pub capacity_kwh: f64,
    /// Nominal pack voltage in V.
    pub nominal_voltage_v: f64,
    /// Series internal resistance in ohm.
    pub internal_resistance_ohm: f64,
    /// Charging efficiency in `(0, 1]`.
    pub charge_efficiency: f64,
    /// Discharging efficiency in `(0, 1]`.
    pub discharge_efficiency: f64,
    /// Hard lower SOC bound, fraction.
    pub min_soc: f64,
    /// Hard upper SOC bound, fraction.
    pub max_soc: f64,
    /// SOC at construction, fraction.
    pub initial_soc: f64,
    /// Maximum charging power at the terminal, kW.
    pub max_charge_kw: f64,
    /// Maximum discharging power at the terminal, kW.
    pub max_discharge_kw: f64,
    /// Simulation sub-steps per dispatch period.
    pub sub_steps: usize,
    /// Ambient temperature in °C.
    pub ambient_temp_c: f64,
    /// Pack heat capacity in kWh per °C.
    pub thermal_mass_kwh_per_c: f64,
    /// Fractional relaxation toward ambient per hour.
    pub cooling_per_hour: f64,
    /// Command interpretation.
    pub control_mode: ControlMode,
}

impl StatefulBatteryParams {
    /// Checks static parameters.
    pub fn validate(&self) -> Result<(), DispatchError> {
        if !(self.capacity_kwh > 0.0) {
            return Err(DispatchError::config("simulator.capacity_kwh", "must be > 0"));
        }
        if !(self.nominal_voltage_v > 0.0) {
            return Err(DispatchError::config(
                "simulator.nominal_voltage_v",
                "must be > 0",
            ));
        }
        if self.internal_resistance_ohm < 0.0 {
            return Err(DispatchError::config(
                "simulator.internal_resistance_ohm",
                "must be >= 0",
            ));
        }
        for (field, eff) in [
            ("charge_efficiency", self.charge_efficiency),
            ("discharge_efficiency", self.discharge_efficiency),
        ] {
            if !(eff > 0.0 && eff <= 1.0) {
                return Err(DispatchError::config(
                    format!("simulator.{field}"),
                    "must be in (0, 1]",
                ));
            }
        }
        if !(0.0..1.0).contains(&self.min_soc) || self.min_soc >= self.max_soc || self.max_soc > 1.0
        {
            return Err(DispatchError::config(
                "simulator.min_soc",
                "must satisfy 0 <= min_soc < max_soc <= 1",
            ));
        }
        if !(self.min_soc..=self.max_soc).contains(&self.initial_soc) {
            return Err(DispatchError::config(
                "simulator.initial_soc",
                "must lie within [min_soc, max_soc]",
            ));
        }
        if self.sub_steps == 0 {
            return Err(DispatchError::config("simulator.sub_steps", "must be > 0"));
        }
        if !(self.thermal_mass_kwh_per_c > 0.0) {
            return Err(DispatchError::config(
                "simulator.thermal_mass_kwh_per_c",
                "must be > 0",
            ));
        }
        Ok(())
    }
}

/// Realized pack state after one dispatch period.
#[derive(Debug, Clone, Copy)]
pub struct BatteryState {
    /// State of charge, fraction of capacity.
    pub soc: f64,
    /// Mean achieved terminal power over the period, kW. Positive is
    /// discharge, matching the command convention.
    pub power_kw: f64,
    /// Mean terminal current over the period, A.
    pub current_a: f64,
    /// Pack temperature at the end of the period, °C.
    pub temp_c: f64,
}

/// Mutable pack simulator stepped by the rolling-horizon driver.
///
/// Each call to [`step`](Self::step) covers one dispatch period, internally
/// split into `sub_steps` slices. The achieved power can fall short of the
/// command when a SOC bound or rate limit intervenes; the realized state is
/// what carries into the next optimization window.
#[derive(Debug, Clone)]
pub struct StatefulBattery {
    params: StatefulBatteryParams,
    soc: f64,
    temp_c: f64,
    throughput_kwh: f64,
}

impl StatefulBattery {
    /// Builds a simulator at the configured initial state.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid parameters.
    pub fn new(params: StatefulBatteryParams) -> Result<Self, DispatchError> {
        params.validate()?;
        Ok(Self {
            soc: params.initial_soc,
            temp_c: params.ambient_temp_c,
            throughput_kwh: 0.0,
            params,
        })
    }

    /// Current state of charge, fraction of capacity.
    pub fn soc(&self) -> f64 {
        self.soc
    }

    /// Current pack temperature, °C.
    pub fn temp_c(&self) -> f64 {
        self.temp_c
    }

    /// Equivalent full cycles so far, counted as total terminal throughput
    /// over twice the capacity.
    pub fn cycles(&self) -> f64 {
        self.throughput_kwh / (2.0 * self.params.capacity_kwh)
    }

    /// Simulates one dispatch period under `command`.
    ///
    /// Positive commands discharge, negative commands charge. In
    /// [`ControlMode::Power`] the command is kW at the terminal; in
    /// [`ControlMode::Current`] it is A, converted through the nominal
    /// voltage.
    pub fn step(&mut self, command: f64, dt_hours: f64) -> BatteryState {
        let requested_kw = match self.params.control_mode {
            ControlMode::Power => command,
            ControlMode::Current => command * self.params.nominal_voltage_v / 1000.0,
        };
        let dt_sub = dt_hours / self.params.sub_steps as f64;
        let mut power_sum = 0.0;

        for _ in 0..self.params.sub_steps {
            let achieved_kw = self.apply_sub_step(requested_kw, dt_sub);
            power_sum += achieved_kw;
            self.update_thermal(achieved_kw, dt_sub);
            self.throughput_kwh += achieved_kw.abs() * dt_sub;
        }

        let power_kw = power_sum / self.params.sub_steps as f64;
        BatteryState {
            soc: self.soc,
            power_kw,
            current_a: power_kw * 1000.0 / self.params.nominal_voltage_v,
            temp_c: self.temp_c,
        }
    }

    /// Clamps one sub-step's power to rate and SOC limits, applies the SOC
    /// update, and returns the achieved terminal power.
    fn apply_sub_step(&mut self, requested_kw: f64, dt_sub: f64) -> f64 {
        let p = &self.params;
        if requested_kw >= 0.0 {
            // Discharge: cells supply more than the terminal delivers.
            let headroom_kwh = (self.soc - p.min_soc) * p.capacity_kwh;
            let soc_limit_kw = headroom_kwh * p.discharge_efficiency / dt_sub;
            let achieved = requested_kw.min(p.max_discharge_kw).min(soc_limit_kw).max(0.0);
            self.soc -= achieved * dt_sub / (p.discharge_efficiency * p.capacity_kwh);
            achieved
        } else {
            // Charge: only part of the terminal power reaches the cells.
            let headroom_kwh = (p.max_soc - self.soc) * p.capacity_kwh;
            let soc_limit_kw = headroom_kwh / (p.charge_efficiency * dt_sub);
            let achieved = (-requested_kw).min(p.max_charge_kw).min(soc_limit_kw).max(0.0);
            self.soc += achieved * p.charge_efficiency * dt_sub / p.capacity_kwh;
            -achieved
        }
    }

    /// Joule heating from I²R losses with first-order relaxation to ambient.
    fn update_thermal(&mut self, power_kw: f64, dt_sub: f64) {
        let p = &self.params;
        let current_a = power_kw.abs() * 1000.0 / p.nominal_voltage_v;
        let heat_kw = current_a * current_a * p.internal_resistance_ohm / 1000.0;
        self.temp_c += heat_kw * dt_sub / p.thermal_mass_kwh_per_c;
        self.temp_c -= p.cooling_per_hour * (self.temp_c - p.ambient_temp_c) * dt_sub;
    }
}
