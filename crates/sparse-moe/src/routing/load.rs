//! Per-expert load estimates.
//!
//! The hard load counts routed units. The expected load is the smooth
//! alternative used while training with noisy gating: for each unit and
//! expert, the probability that the expert lands in the top k if the noise
//! were resampled, holding every other score fixed.

use tracing::trace;

use super::math::normal_cdf;

/// Expected number of units per expert under resampled gating noise.
///
/// For unit `b` with noisy top values `t_0 >= t_1 >= ... >= t_k`:
/// - an expert currently inside the top k (`noisy > t_k`) stays in if its
///   fresh score beats `t_k`;
/// - an expert currently outside must beat `t_{k-1}` to get in.
///
/// `P = Φ((clean - threshold) / noise_std)`, summed over the batch.
///
/// # Arguments
///
/// * `clean` - Clean scores [batch_size * num_experts]
/// * `noisy` - Noisy scores [batch_size * num_experts]
/// * `noise_std` - Per-entry noise standard deviation (> 0) [batch_size * num_experts]
/// * `top_values` - Descending best `m` noisy scores per row [batch_size * m], `m >= k + 1`
/// * `m` - Columns per row in `top_values`
/// * `top_k` - Experts per unit
pub fn expected_load(
    clean: &[f32],
    noisy: &[f32],
    noise_std: &[f32],
    top_values: &[f32],
    m: usize,
    num_experts: usize,
    top_k: usize,
) -> Vec<f32> {
    debug_assert!(m > top_k, "expected load needs the (k+1)-th score");

    let mut load = vec![0.0f64; num_experts];

    for (unit, tops) in top_values.chunks_exact(m).enumerate() {
        let threshold_if_in = tops[top_k];
        let threshold_if_out = tops[top_k - 1];
        let offset = unit * num_experts;

        for (expert, acc) in load.iter_mut().enumerate() {
            let i = offset + expert;
            let is_in = noisy[i] > threshold_if_in;
            let threshold = if is_in {
                threshold_if_in
            } else {
                threshold_if_out
            };
            let z = (f64::from(clean[i]) - f64::from(threshold)) / f64::from(noise_std[i]);
            *acc += normal_cdf(z);
        }
    }

    trace!(?load, "expected load");
    load.into_iter().map(|x| x as f32).collect()
}
