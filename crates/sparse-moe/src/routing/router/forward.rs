//! Routing forward pass.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::{debug, warn};

use crate::error::{MoeError, MoeResult};
use crate::types::{Batch, RoutingWeights};

use super::super::load::expected_load;
use super::super::math::softplus;
use super::super::top_k::select_top_k;
use super::core::Router;

const ROW_SUM_TOLERANCE: f32 = 1e-4;

/// How a [`RoutingDecision`]'s load was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    /// Probability mass of landing in the top k under resampled noise.
    Expected,
    /// Number of units with a nonzero gate.
    Counted,
}

/// Output of one routing call.
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    /// Sparse gates [batch_size, num_experts], at most k nonzero per row.
    pub weights: RoutingWeights,
    /// Per-expert load [num_experts].
    pub load: Vec<f32>,
    pub load_kind: LoadKind,
}

/// Noisy scores together with the noise scale that produced them.
#[derive(Debug, Clone, Copy)]
pub struct NoiseSample<'a> {
    /// `clean + N(0,1) * stddev` [batch_size * num_experts]
    pub noisy: &'a [f32],
    /// Per-entry noise standard deviation, strictly positive [batch_size * num_experts]
    pub stddev: &'a [f32],
}

/// Gate a precomputed score matrix.
///
/// Selects the top k of the noisy scores when `noise` is given, otherwise
/// of `clean`. The load is the expected load when noise is given and
/// `top_k < num_experts`, the counted load otherwise.
///
/// # Errors
///
/// - `MoeError::ConfigError` if top_k is outside [1, num_experts]
/// - `MoeError::DimensionMismatch` if any buffer has the wrong length
/// - `MoeError::InvalidValue` if a noise stddev is not strictly positive
/// - `MoeError::RoutingError` if any clean or noisy score is NaN or infinite
pub fn gate_scores(
    clean: &[f32],
    noise: Option<NoiseSample<'_>>,
    batch_size: usize,
    num_experts: usize,
    top_k: usize,
) -> MoeResult<RoutingDecision> {
    if let Some(sample) = &noise {
        for buffer in [sample.noisy, sample.stddev] {
            if buffer.len() != clean.len() {
                return Err(MoeError::DimensionMismatch {
                    expected: clean.len(),
                    got: buffer.len(),
                });
            }
        }
        if let Some(index) = sample.stddev.iter().position(|&s| s.is_nan() || s <= 0.0) {
            return Err(MoeError::InvalidValue {
                index,
                value: sample.stddev[index],
            });
        }
    }

    ensure_finite_scores("clean", clean)?;
    if let Some(sample) = &noise {
        ensure_finite_scores("noisy", sample.noisy)?;
    }

    let ranked_scores = noise.map_or(clean, |sample| sample.noisy);
    let selection = select_top_k(ranked_scores, batch_size, num_experts, top_k)?;

    for unit in 0..batch_size {
        let sum: f32 = selection.weights.row(unit).iter().sum();
        if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
            warn!(unit, sum, "Routing weights do not sum to 1");
        }
    }

    let (load, load_kind) = match noise {
        Some(sample) if top_k < num_experts => (
            expected_load(
                clean,
                sample.noisy,
                sample.stddev,
                &selection.top_values,
                selection.m,
                num_experts,
                top_k,
            ),
            LoadKind::Expected,
        ),
        _ => (selection.weights.unit_counts(), LoadKind::Counted),
    };

    Ok(RoutingDecision {
        weights: selection.weights,
        load,
        load_kind,
    })
}

fn ensure_finite_scores(kind: &str, scores: &[f32]) -> MoeResult<()> {
    match scores.iter().position(|s| !s.is_finite()) {
        Some(index) => Err(MoeError::RoutingError {
            message: format!(
                "{} gate score at index {} is {}; check summaries and gate weights for overflow",
                kind, index, scores[index]
            ),
        }),
        None => Ok(()),
    }
}

impl Router {
    /// Route a batch of summaries.
    ///
    /// # Processing Steps
    ///
    /// 1. Clean scores: `summaries @ W_gate`
    /// 2. If `training` and noisy gating is on: add `N(0,1) * (softplus(summaries @ W_noise) + eps)`
    /// 3. Top-k per row, softmax over the selected scores
    /// 4. Load (expected or counted)
    ///
    /// # Arguments
    ///
    /// * `summaries` - Routing summaries [batch_size * summary_dim]
    /// * `batch_size` - Number of units
    /// * `training` - Enables gating noise
    /// * `rng` - Noise source; untouched unless noise is sampled
    ///
    /// # Errors
    ///
    /// - `MoeError::EmptyInput` if batch_size == 0
    /// - `MoeError::InvalidDimension` if summaries has the wrong length
    /// - `MoeError::InvalidValue` if summaries contain NaN
    /// - `MoeError::RoutingError` if scores overflow or become NaN
    pub fn route<R: Rng + ?Sized>(
        &self,
        summaries: &[f32],
        batch_size: usize,
        training: bool,
        rng: &mut R,
    ) -> MoeResult<RoutingDecision> {
        let clean = self.w_gate.forward(summaries, batch_size)?;

        let decision = if training && self.noisy_gating {
            let raw_stddev = self.w_noise.forward(summaries, batch_size)?;
            let stddev: Vec<f32> = raw_stddev
                .iter()
                .map(|&x| softplus(x) + self.noise_epsilon)
                .collect();
            let noisy: Vec<f32> = clean
                .iter()
                .zip(&stddev)
                .map(|(&c, &s)| {
                    let z: f32 = StandardNormal.sample(rng);
                    c + z * s
                })
                .collect();

            gate_scores(
                &clean,
                Some(NoiseSample {
                    noisy: &noisy,
                    stddev: &stddev,
                }),
                batch_size,
                self.num_experts,
                self.top_k,
            )?
        } else {
            gate_scores(&clean, None, batch_size, self.num_experts, self.top_k)?
        };

        debug!(
            batch_size,
            training,
            load_kind = ?decision.load_kind,
            routed_edges = decision.weights.nonzero_count(),
            "Router forward pass"
        );

        Ok(decision)
    }

    /// Route a [`Batch`] using its summaries.
    ///
    /// # Errors
    ///
    /// - `MoeError::InvalidDimension` if the batch's summary width differs from the router's
    /// - Same as [`Router::route`] otherwise
    pub fn route_batch<R: Rng + ?Sized>(
        &self,
        batch: &Batch,
        training: bool,
        rng: &mut R,
    ) -> MoeResult<RoutingDecision> {
        if batch.summary_dim() != self.summary_dim() {
            return Err(MoeError::InvalidDimension {
                expected: self.summary_dim(),
                actual: batch.summary_dim(),
            });
        }
        self.route(batch.summaries(), batch.batch_size(), training, rng)
    }
}
