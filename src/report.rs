//! End-of-run summary assembled from driver records.

use std::fmt;

use crate::driver::{PeriodRecord, RollingHorizonDriver, WindowRecord};

/// Histogram bin edges for absolute SOC divergence, as fractions.
const DIVERGENCE_BINS: [f64; 4] = [0.001, 0.01, 0.05, 0.1];

/// Bins plus the overflow bucket.
const DIVERGENCE_BIN_COUNT: usize = 5;

/// Plan-versus-realized SOC statistics over the whole run.
#[derive(Debug, Clone, Default)]
pub struct DivergenceStats {
    /// Committed periods with an absolute gap above the first bin edge.
    pub periods_diverged: usize,
    /// Mean absolute gap over all committed periods.
    pub mean_abs: f64,
    /// Largest absolute gap seen.
    pub max_abs: f64,
    /// Period counts per bin: `<0.001`, `<0.01`, `<0.05`, `<0.1`, `>=0.1`.
    pub histogram: [usize; DIVERGENCE_BIN_COUNT],
}

impl DivergenceStats {
    fn from_records(records: &[PeriodRecord]) -> Self {
        let mut stats = Self::default();
        if records.is_empty() {
            return stats;
        }
        let mut sum = 0.0;
        for r in records {
            let gap = (r.realized_soc - r.decided_soc).abs();
            sum += gap;
            stats.max_abs = stats.max_abs.max(gap);
            if gap >= DIVERGENCE_BINS[0] {
                stats.periods_diverged += 1;
            }
            let bin = DIVERGENCE_BINS
                .iter()
                .position(|&edge| gap < edge)
                .unwrap_or(DIVERGENCE_BINS.len());
            stats.histogram[bin] += 1;
        }
        stats.mean_abs = sum / records.len() as f64;
        stats
    }
}

/// Run-level summary of a rolling-horizon dispatch run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Committed periods.
    pub periods: usize,
    /// Windows solved.
    pub windows: usize,
    /// Energy exported to the grid, kWh.
    pub energy_exported_kwh: f64,
    /// Energy imported from the grid, kWh.
    pub energy_imported_kwh: f64,
    /// Realized market value of net export, $.
    pub market_value: f64,
    /// Mean per-window value uplift over the storage-idle baseline, as a
    /// fraction. `None` when every baseline was zero.
    pub mean_uplift: Option<f64>,
    /// Cycle count from the optimizer's throughput formula.
    pub approx_lifecycles: f64,
    /// Cycle count recomputed from realized SOC depth.
    pub realized_lifecycles: f64,
    /// Hottest simulated pack temperature, °C.
    pub max_temp_c: Option<f64>,
    /// Plan-versus-realized SOC statistics.
    pub divergence: DivergenceStats,
}

impl RunReport {
    /// Summarizes a driver's records, complete or partial.
    pub fn from_driver(driver: &RollingHorizonDriver) -> Self {
        Self::from_records(driver.records(), driver.windows(), driver.horizon().dt_hours)
    }

    fn from_records(records: &[PeriodRecord], windows: &[WindowRecord], dt_hours: f64) -> Self {
        let mut exported = 0.0;
        let mut imported = 0.0;
        let mut value = 0.0;
        for r in records {
            if r.net_export >= 0.0 {
                exported += r.net_export * dt_hours;
            } else {
                imported -= r.net_export * dt_hours;
            }
            value += r.price * r.net_export * dt_hours;
        }

        let uplifts: Vec<f64> = windows
            .iter()
            .filter(|w| w.baseline_value.abs() > f64::EPSILON)
            .map(|w| (w.net_value - w.baseline_value) / w.baseline_value.abs())
            .collect();
        let mean_uplift = if uplifts.is_empty() {
            None
        } else {
            Some(uplifts.iter().sum::<f64>() / uplifts.len() as f64)
        };

        let max_temp_c = windows
            .iter()
            .filter_map(|w| w.max_temp_c)
            .fold(None, |acc: Option<f64>, t| {
                Some(acc.map_or(t, |a| a.max(t)))
            });

        Self {
            periods: records.len(),
            windows: windows.len(),
            energy_exported_kwh: exported,
            energy_imported_kwh: imported,
            market_value: value,
            mean_uplift,
            approx_lifecycles: windows.iter().map(|w| w.approx_lifecycles).sum(),
            realized_lifecycles: windows.iter().map(|w| w.realized_lifecycles).sum(),
            max_temp_c,
            divergence: DivergenceStats::from_records(records),
        }
    }

    /// Relative gap between the two cycle estimates, when defined.
    pub fn lifecycle_error(&self) -> Option<f64> {
        if self.realized_lifecycles.abs() > f64::EPSILON {
            Some((self.approx_lifecycles - self.realized_lifecycles) / self.realized_lifecycles)
        } else {
            None
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run summary")?;
        writeln!(f, "  periods committed:   {}", self.periods)?;
        writeln!(f, "  windows solved:      {}", self.windows)?;
        writeln!(f, "  energy exported:     {:.1} kWh", self.energy_exported_kwh)?;
        writeln!(f, "  energy imported:     {:.1} kWh", self.energy_imported_kwh)?;
        writeln!(f, "  market value:        ${:.2}", self.market_value)?;
        match self.mean_uplift {
            Some(u) => writeln!(f, "  storage uplift:      {:+.2}% per window", u * 100.0)?,
            None => writeln!(f, "  storage uplift:      n/a")?,
        }
        writeln!(
            f,
            "  cycles (plan/real):  {:.2} / {:.2}",
            self.approx_lifecycles, self.realized_lifecycles
        )?;
        if let Some(err) = self.lifecycle_error() {
            writeln!(f, "  cycle estimate gap:  {:+.1}%", err * 100.0)?;
        }
        if let Some(t) = self.max_temp_c {
            writeln!(f, "  max pack temp:       {t:.1} C")?;
        }
        writeln!(
            f,
            "  soc divergence:      {} periods, mean {:.4}, max {:.4}",
            self.divergence.periods_diverged, self.divergence.mean_abs, self.divergence.max_abs
        )?;
        write!(
            f,
            "  divergence bins:     <0.001: {}  <0.01: {}  <0.05: {}  <0.1: {}  >=0.1: {}",
            self.divergence.histogram[0],
            self.divergence.histogram[1],
            self.divergence.histogram[2],
            self.divergence.histogram[3],
            self.divergence.histogram[4]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::RunReport;
    use crate::driver::{PeriodRecord, WindowRecord};

    fn record(period: usize, net_export: f64, decided: f64, realized: f64) -> PeriodRecord {
        PeriodRecord {
            period,
            price: 0.1,
            system_production: net_export.max(0.0),
            system_load: 0.0,
            net_export,
            decided_charge: 0.0,
            decided_discharge: 0.0,
            decided_soc: decided,
            realized_soc: realized,
            realized_power_kw: 0.0,
            temp_c: None,
        }
    }

    fn window(net: f64, baseline: f64) -> WindowRecord {
        WindowRecord {
            start: 0,
            committed_len: 2,
            net_value: net,
            baseline_value: baseline,
            approx_lifecycles: 0.5,
            realized_lifecycles: 0.4,
            max_temp_c: Some(31.0),
            max_soc_divergence: 0.02,
        }
    }

    #[test]
    fn export_and_import_are_split_by_sign() {
        let records = vec![record(0, 100.0, 0.5, 0.5), record(1, -40.0, 0.5, 0.5)];
        let r = RunReport::from_records(&records, &[], 1.0);
        assert!((r.energy_exported_kwh - 100.0).abs() < 1e-9);
        assert!((r.energy_imported_kwh - 40.0).abs() < 1e-9);
        assert!((r.market_value - 6.0).abs() < 1e-9);
    }

    #[test]
    fn uplift_is_averaged_over_windows_with_a_baseline() {
        let windows = vec![window(110.0, 100.0), window(120.0, 100.0)];
        let r = RunReport::from_records(&[], &windows, 1.0);
        assert!((r.mean_uplift.unwrap() - 0.15).abs() < 1e-9);
        assert!((r.approx_lifecycles - 1.0).abs() < 1e-9);
        assert!((r.lifecycle_error().unwrap() - 0.25).abs() < 1e-9);
        assert_eq!(r.max_temp_c, Some(31.0));
    }

    #[test]
    fn divergence_histogram_buckets_by_magnitude() {
        let records = vec![
            record(0, 0.0, 0.5, 0.5),      // exact
            record(1, 0.0, 0.5, 0.505),    // < 0.01
            record(2, 0.0, 0.5, 0.58),     // < 0.1
            record(3, 0.0, 0.5, 0.9),      // >= 0.1
        ];
        let r = RunReport::from_records(&records, &[], 1.0);
        assert_eq!(r.divergence.histogram, [1, 1, 0, 1, 1]);
        assert_eq!(r.divergence.periods_diverged, 3);
        assert!((r.divergence.max_abs - 0.4).abs() < 1e-9);
    }

    #[test]
    fn report_renders_without_panicking() {
        let records = vec![record(0, 100.0, 0.5, 0.52)];
        let windows = vec![window(110.0, 100.0)];
        let r = RunReport::from_records(&records, &windows, 1.0);
        let text = format!("{r}");
        assert!(text.contains("market value"));
        assert!(text.contains("storage uplift"));
    }
}
