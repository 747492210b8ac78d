//! Shared builders for integration tests.

use std::collections::BTreeMap;

use hybrid_dispatch::dispatch::{
    Commodity, GeneratorTech, GridTech, HybridDispatchModel, StorageDevice, Technology,
};
use hybrid_dispatch::driver::RollingHorizonDriver;
use hybrid_dispatch::forecast::{ForecastSeries, TailPolicy};
use hybrid_dispatch::horizon::TimeHorizon;

/// A 1 MWh battery with the common 10-90% operating band.
pub fn battery(efficiency: f64, max_rate_kw: f64) -> StorageDevice {
    StorageDevice {
        commodity: Commodity::Electricity,
        capacity: 1000.0,
        min_soc: 0.1,
        max_soc: 0.9,
        charge_efficiency: efficiency,
        discharge_efficiency: efficiency,
        max_charge_rate: max_rate_kw,
        max_discharge_rate: max_rate_kw,
        initial_soc: 0.5,
        cost_per_charge: 0.0,
        cost_per_discharge: 0.0,
        lifecycle_cost: 0.0,
    }
}

/// Wind, battery, grid; no operating costs, undiscounted.
pub fn plant(storage: StorageDevice, sell_limit_kw: f64) -> HybridDispatchModel {
    let mut m = HybridDispatchModel::new(1.0, 1.0).expect("valid gamma and dt");
    m.add_technology(
        "wind",
        Technology::Generator(GeneratorTech {
            commodity: Commodity::Electricity,
            capacity_kw: 2000.0,
            cost_per_kwh: 0.0,
        }),
    )
    .expect("valid generator");
    m.add_technology("battery", Technology::Storage(storage))
        .expect("valid storage");
    m.add_technology(
        "grid",
        Technology::Grid(GridTech {
            sell_limit_kw,
            buy_limit_kw: 0.0,
        }),
    )
    .expect("valid grid");
    m
}

/// Driver over the given series, committing `solution` of `horizon` periods.
pub fn driver(
    model: HybridDispatchModel,
    prices: Vec<f64>,
    wind: Vec<f64>,
    horizon: usize,
    solution: usize,
) -> RollingHorizonDriver {
    let total = prices.len();
    assert_eq!(wind.len(), total);
    let h = TimeHorizon::new(1.0, horizon, solution, total).expect("valid horizon");
    RollingHorizonDriver::new(
        model,
        h,
        ForecastSeries::new("price", prices).expect("non-empty"),
        BTreeMap::from([(
            "wind".to_string(),
            ForecastSeries::new("wind", wind).expect("non-empty"),
        )]),
        TailPolicy::Wrap,
    )
    .expect("valid driver")
}

/// Price series alternating low/high in `block` sized runs.
pub fn price_swings(total: usize, block: usize) -> Vec<f64> {
    (0..total)
        .map(|t| if (t / block) % 2 == 0 { 0.01 } else { 0.2 })
        .collect()
}
