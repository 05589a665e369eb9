//! Top-k expert selection over gate scores.

use crate::error::{MoeError, MoeResult};
use crate::types::RoutingWeights;

use super::math::softmax_in_place;

/// Result of ranking every row of a score matrix.
///
/// `top_values` keeps the `m = min(k + 1, E)` best scores per row, best
/// first; the extra column is the boundary the expected-load estimate needs.
#[derive(Debug, Clone)]
pub struct TopKSelection {
    /// Sparse gates: softmax over each row's top-k scores.
    pub weights: RoutingWeights,
    /// Best `m` scores per row, `[batch_size * m]`, descending.
    pub top_values: Vec<f32>,
    /// Columns kept per row in `top_values`.
    pub m: usize,
}

/// Rank one row, best first. Ties go to the lower expert index.
///
/// Uses IEEE total order, so NaN ranks above every number instead of
/// breaking the sort.
pub fn rank_row(scores: &[f32]) -> Vec<(usize, f32)> {
    let mut indexed: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    indexed
}

/// Select the top-k experts of every row and build the sparse gate matrix.
///
/// # Arguments
///
/// * `scores` - Gate scores [batch_size * num_experts]
/// * `batch_size` - Number of units
/// * `num_experts` - Number of experts (E)
/// * `top_k` - Experts per unit (k)
///
/// # Errors
///
/// - `MoeError::ConfigError` if top_k == 0 or top_k > num_experts
/// - `MoeError::DimensionMismatch` if scores has the wrong length
/// - `MoeError::RoutingError` if a selected score is non-finite
pub fn select_top_k(
    scores: &[f32],
    batch_size: usize,
    num_experts: usize,
    top_k: usize,
) -> MoeResult<TopKSelection> {
    if top_k == 0 || top_k > num_experts {
        return Err(MoeError::ConfigError {
            message: format!(
                "top_k ({}) must be in [1, num_experts ({})]",
                top_k, num_experts
            ),
        });
    }

    let expected_len = batch_size * num_experts;
    if scores.len() != expected_len {
        return Err(MoeError::DimensionMismatch {
            expected: expected_len,
            got: scores.len(),
        });
    }

    let m = (top_k + 1).min(num_experts);
    let mut weights = RoutingWeights::zeros(batch_size, num_experts);
    let mut top_values = Vec::with_capacity(batch_size * m);

    for (unit, row) in scores.chunks_exact(num_experts).enumerate() {
        let ranked = rank_row(row);
        top_values.extend(ranked.iter().take(m).map(|&(_, s)| s));

        let mut gates: Vec<f32> = ranked.iter().take(top_k).map(|&(_, s)| s).collect();
        softmax_in_place(&mut gates)?;

        for (&(expert, _), &gate) in ranked.iter().zip(&gates) {
            weights.set(unit, expert, gate);
        }
    }

    Ok(TopKSelection {
        weights,
        top_values,
        m,
    })
}
