//! High-fidelity battery state tracking outside the optimizer.
//!
//! The optimizer plans against an idealized linear storage model; this
//! module re-simulates the committed plan with losses, rate clamping, and
//! thermal behavior, producing the realized state the next window starts
//! from.

pub mod lifecycle;
pub mod stateful;

pub use lifecycle::{approx_lifecycles, lifecycles_from_soc};
pub use stateful::{BatteryState, ControlMode, StatefulBattery, StatefulBatteryParams};
