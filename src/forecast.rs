//! Windowed access to annual forecast series with a configurable tail policy.

use serde::Deserialize;

use crate::error::DispatchError;

/// Policy for filling a forecast window that runs past the end of the series.
///
/// The original rolling-horizon drivers disagreed on this behavior, so it is
/// configurable rather than hard-coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TailPolicy {
    /// Reuse the beginning of the series (annual wraparound).
    #[default]
    Wrap,
    /// Repeat the final value of the series.
    PadWithLast,
    /// Refuse to build a window extending past the series.
    Error,
}

/// One annual time series (generation forecast, demand, or price).
#[derive(Debug, Clone)]
pub struct ForecastSeries {
    name: &'static str,
    values: Vec<f64>,
}

impl ForecastSeries {
    /// Wraps a series of per-period values under a diagnostic name.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the series is empty.
    pub fn new(name: &'static str, values: Vec<f64>) -> Result<Self, DispatchError> {
        if values.is_empty() {
            return Err(DispatchError::config(name, "forecast series must not be empty"));
        }
        Ok(Self { name, values })
    }

    /// Length of the underlying series in periods.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the series holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Full underlying series.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Extracts the window `[start, start + len)` applying `policy` at the tail.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `start` is past the end of the series,
    /// or if the window overruns the series under [`TailPolicy::Error`].
    pub fn window(
        &self,
        start: usize,
        len: usize,
        policy: TailPolicy,
    ) -> Result<Vec<f64>, DispatchError> {
        if start >= self.values.len() {
            return Err(DispatchError::config(
                self.name,
                format!(
                    "window start {start} is past the series end ({} periods)",
                    self.values.len()
                ),
            ));
        }

        let available = self.values.len() - start;
        if len <= available {
            return Ok(self.values[start..start + len].to_vec());
        }

        let mut out = self.values[start..].to_vec();
        match policy {
            TailPolicy::Wrap => {
                // Reuse the head of the series, cycling if the window is
                // longer than the whole series.
                let mut i = 0;
                while out.len() < len {
                    out.push(self.values[i % self.values.len()]);
                    i += 1;
                }
            }
            TailPolicy::PadWithLast => {
                let last = self.values[self.values.len() - 1];
                out.resize(len, last);
            }
            TailPolicy::Error => {
                return Err(DispatchError::config(
                    self.name,
                    format!(
                        "window [{start}, {}) overruns the {}-period series",
                        start + len,
                        self.values.len()
                    ),
                ));
            }
        }
        Ok(out)
    }
}
