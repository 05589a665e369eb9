//! Scalar math for gating: softmax, softplus and the standard normal CDF.

use crate::error::{MoeError, MoeResult};

/// In-place softmax over one row.
///
/// Uses max subtraction for numerical stability.
///
/// # Errors
///
/// Returns `MoeError::RoutingError` if the row contains non-finite values.
pub fn softmax_in_place(values: &mut [f32]) -> MoeResult<()> {
    if values.is_empty() {
        return Ok(());
    }

    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return Err(MoeError::RoutingError {
            message: format!("Softmax input has non-finite maximum ({}). Check gate weights.", max),
        });
    }

    let mut sum = 0.0f32;
    for v in values.iter_mut() {
        *v = (*v - max).exp();
        sum += *v;
    }

    // max element contributes exp(0) = 1, so sum >= 1 unless a NaN slipped in
    if sum.is_nan() || sum < 1.0 {
        return Err(MoeError::RoutingError {
            message: format!("Softmax sum is invalid ({}). Check for NaN in scores.", sum),
        });
    }

    for v in values.iter_mut() {
        *v /= sum;
    }
    Ok(())
}

/// Softplus: `ln(1 + e^x)`, computed without overflow for large `x`.
#[inline]
pub fn softplus(x: f32) -> f32 {
    if x > 20.0 {
        x
    } else if x < -20.0 {
        x.exp()
    } else {
        x.exp().ln_1p()
    }
}

/// Standard normal cumulative distribution function.
///
/// `Φ(z) = 0.5 * (1 + erf(z / sqrt(2)))`
#[inline]
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Error function, Abramowitz & Stegun 7.1.26 (|error| < 1.5e-7).
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}
