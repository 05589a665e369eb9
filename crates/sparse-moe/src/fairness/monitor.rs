//! Squared coefficient of variation and the importance/load penalty.

use tracing::trace;

use crate::error::{MoeError, MoeResult};
use crate::types::RoutingWeights;

/// Added to the squared mean so an all-zero vector has CV² of 0.
pub const CV_EPSILON: f64 = 1e-10;

/// Squared coefficient of variation: `var(x) / (mean(x)^2 + 1e-10)`.
///
/// Uses the unbiased (n-1) sample variance. Returns 0 for fewer than two
/// values.
#[must_use]
pub fn cv_squared(values: &[f32]) -> f32 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let mean = values.iter().map(|&v| f64::from(v)).sum::<f64>() / n as f64;
    let variance = values
        .iter()
        .map(|&v| {
            let d = f64::from(v) - mean;
            d * d
        })
        .sum::<f64>()
        / (n - 1) as f64;

    (variance / (mean * mean + CV_EPSILON)) as f32
}

/// Breakdown of one fairness evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct FairnessReport {
    /// Column sums of the routing weights [num_experts]
    pub importance: Vec<f32>,
    /// Per-expert load as supplied [num_experts]
    pub load: Vec<f32>,
    pub importance_cv2: f32,
    pub load_cv2: f32,
    /// `importance_cv2 + load_cv2`, unscaled
    pub loss: f32,
}

impl FairnessReport {
    /// Loss scaled by a balance coefficient.
    #[inline]
    #[must_use]
    pub fn scaled_loss(&self, coef: f32) -> f32 {
        self.loss * coef
    }
}

/// Compute the fairness penalty for one routing decision.
///
/// # Errors
///
/// Returns `MoeError::DimensionMismatch` if `load.len()` differs from the
/// number of experts in `weights`.
pub fn imbalance(weights: &RoutingWeights, load: &[f32]) -> MoeResult<FairnessReport> {
    if load.len() != weights.num_experts() {
        return Err(MoeError::DimensionMismatch {
            expected: weights.num_experts(),
            got: load.len(),
        });
    }

    let importance = weights.importance();
    let importance_cv2 = cv_squared(&importance);
    let load_cv2 = cv_squared(load);
    let loss = importance_cv2 + load_cv2;

    trace!(importance_cv2, load_cv2, loss, "Fairness penalty");

    Ok(FairnessReport {
        importance,
        load: load.to_vec(),
        importance_cv2,
        load_cv2,
        loss,
    })
}
