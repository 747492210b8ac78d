//! Rolling-horizon dispatch optimization for hybrid energy plants.

pub mod battery;
pub mod config;
pub mod dispatch;
pub mod driver;
pub mod error;
pub mod forecast;
pub mod horizon;
/// File output for run results.
pub mod io;
pub mod profile;
pub mod report;
