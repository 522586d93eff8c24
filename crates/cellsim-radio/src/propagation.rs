//! Distance-based propagation model.
//!
//! Path gain follows `g = s * k / max(d, d0)^n`, where `s` is the shadowing
//! coefficient of the link. Flooring the distance at `d0` keeps the gain finite
//! when a user sits on top of its access point.

use cellsim_common::{NOISE_DENSITY_W_PER_HZ, PATH_LOSS_EXPONENT, PATH_LOSS_SCALE, REFERENCE_DISTANCE_M};

/// Path gain for a link of `distance_m` metres with the given shadowing coefficient.
pub fn path_gain(distance_m: f64, shadow_coefficient: f64) -> f64 {
    let distance = distance_m.max(REFERENCE_DISTANCE_M);
    shadow_coefficient * PATH_LOSS_SCALE / distance.powi(PATH_LOSS_EXPONENT)
}

/// Thermal noise power in watts of one channel slice.
pub fn noise_power(bandwidth_hz: f64, number_channels: u32) -> f64 {
    NOISE_DENSITY_W_PER_HZ * (bandwidth_hz / number_channels as f64)
}

/// Shannon capacity in bit/s of a channel of `bandwidth_hz` at the given SINR.
pub fn shannon_capacity(bandwidth_hz: f64, sinr: f64) -> f64 {
    bandwidth_hz * (1.0 + sinr).log2()
}
