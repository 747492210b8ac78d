//! Seeded synthetic annual profiles for demo scenarios.
//!
//! The core consumes forecasts from an external resource provider; these
//! builders stand in for it so a scenario can run end-to-end without data
//! files. All profiles are deterministic for a given seed.

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Gaussian noise via the Box-Muller transform.
///
/// Returns a sample from a zero-mean normal with the given standard
/// deviation, or `0.0` when `std_dev` is not positive.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

/// Diurnal solar generation profile in kW.
///
/// Half-sine bell between `sunrise_idx` and `sunset_idx` within each day,
/// zero at night, with multiplicative Gaussian noise. Values are clamped to
/// `[0, kw_peak]`.
pub fn solar_profile(
    total_steps: usize,
    steps_per_day: usize,
    kw_peak: f64,
    sunrise_idx: usize,
    sunset_idx: usize,
    noise_std: f64,
    seed: u64,
) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let daylight = (sunset_idx - sunrise_idx) as f64;
    let mut out = Vec::with_capacity(total_steps);
    for t in 0..total_steps {
        let hour = t % steps_per_day;
        let kw = if hour >= sunrise_idx && hour < sunset_idx {
            let x = (hour - sunrise_idx) as f64 / daylight;
            let bell = (std::f64::consts::PI * x).sin();
            let noisy = kw_peak * bell * (1.0 + gaussian_noise(&mut rng, noise_std));
            noisy.clamp(0.0, kw_peak)
        } else {
            0.0
        };
        out.push(kw);
    }
    out
}

/// Wind generation profile in kW with AR(1) persistence.
///
/// A mean-reverting process around `kw_mean`: each step keeps a fraction
/// `alpha` of the previous deviation and adds a Gaussian innovation. Values
/// are clamped to `[0, kw_max]`.
pub fn wind_profile(
    total_steps: usize,
    kw_mean: f64,
    kw_max: f64,
    alpha: f64,
    noise_std: f64,
    seed: u64,
) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut deviation = 0.0_f64;
    let mut out = Vec::with_capacity(total_steps);
    for _ in 0..total_steps {
        deviation = alpha * deviation + gaussian_noise(&mut rng, noise_std * kw_mean);
        out.push((kw_mean + deviation).clamp(0.0, kw_max));
    }
    out
}

/// Electricity price profile in $/kWh, constant over blocks of periods.
///
/// Draws one uniform value per `block_len`-period block and scales into
/// `[0, max_price]`, matching the block-structured random pricing used by
/// the original dispatch driver.
pub fn price_profile(total_steps: usize, block_len: usize, max_price: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let block_len = block_len.max(1);
    let mut out = Vec::with_capacity(total_steps);
    while out.len() < total_steps {
        let price = rng.random::<f64>() * max_price;
        for _ in 0..block_len {
            if out.len() == total_steps {
                break;
            }
            out.push(price);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{price_profile, solar_profile, wind_profile};

    #[test]
    fn solar_is_zero_at_night_and_positive_at_noon() {
        let p = solar_profile(48, 24, 10.0, 6, 18, 0.0, 1);
        assert_eq!(p[0], 0.0);
        assert_eq!(p[23], 0.0);
        assert!(p[12] > 9.0, "noon output should be near peak, got {}", p[12]);
        assert_eq!(p.len(), 48);
    }

    #[test]
    fn solar_stays_within_bounds_under_noise() {
        let p = solar_profile(8760, 24, 10.0, 6, 18, 0.3, 7);
        assert!(p.iter().all(|&kw| (0.0..=10.0).contains(&kw)));
    }

    #[test]
    fn wind_stays_within_bounds() {
        let p = wind_profile(8760, 5.0, 12.0, 0.9, 0.2, 3);
        assert_eq!(p.len(), 8760);
        assert!(p.iter().all(|&kw| (0.0..=12.0).contains(&kw)));
    }

    #[test]
    fn price_is_constant_within_blocks() {
        let p = price_profile(12, 3, 0.1, 5);
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
        assert_eq!(p[3], p[4]);
        assert!(p.iter().all(|&x| (0.0..=0.1).contains(&x)));
    }

    #[test]
    fn profiles_are_deterministic_per_seed() {
        let a = wind_profile(100, 5.0, 12.0, 0.9, 0.2, 42);
        let b = wind_profile(100, 5.0, 12.0, 0.9, 0.2, 42);
        assert_eq!(a, b);
        let c = wind_profile(100, 5.0, 12.0, 0.9, 0.2, 43);
        assert_ne!(a, c);
    }
}
