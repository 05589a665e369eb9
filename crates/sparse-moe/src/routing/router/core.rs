//! Core router structure and constructors.

use rand::Rng;
use tracing::debug;

use crate::config::RoutingConfig;
use crate::error::{MoeError, MoeResult};

use super::super::Linear;

/// Noisy top-k gating network.
///
/// Owns the gate projection `W_gate` and the noise-scale projection
/// `W_noise`, both `summary_dim -> num_experts`. Holds no per-call state:
/// the same router can route any number of batches.
///
/// # Example
///
/// ```rust
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use sparse_moe::config::RoutingConfig;
/// use sparse_moe::routing::Router;
///
/// let config = RoutingConfig::new(4, 2);
/// let router = Router::new(8, &config).unwrap();
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
///
/// let decision = router.route(&[0.5f32; 8 * 3], 3, false, &mut rng).unwrap();
/// assert_eq!(decision.weights.nonzero_count(), 3 * 2);
/// ```
#[derive(Debug, Clone)]
pub struct Router {
    /// Gate projection: summaries -> clean scores
    pub(super) w_gate: Linear,
    /// Noise projection: summaries -> raw noise scale
    pub(super) w_noise: Linear,
    pub(super) num_experts: usize,
    pub(super) top_k: usize,
    pub(super) noisy_gating: bool,
    pub(super) noise_epsilon: f32,
}

impl Router {
    /// Create a router with zero-initialized gate and noise projections.
    ///
    /// # Errors
    ///
    /// - `MoeError::ConfigError` if the configuration is invalid
    /// - `MoeError::InvalidDimension` if summary_dim == 0
    pub fn new(summary_dim: usize, config: &RoutingConfig) -> MoeResult<Self> {
        config.validate()?;
        let w_gate = Linear::zeros(summary_dim, config.num_experts)?;
        let w_noise = Linear::zeros(summary_dim, config.num_experts)?;
        Self::assemble(w_gate, w_noise, config)
    }

    /// Create a router with Xavier-initialized projections.
    ///
    /// # Errors
    ///
    /// Same as [`Router::new`].
    pub fn with_random_init<R: Rng + ?Sized>(
        summary_dim: usize,
        config: &RoutingConfig,
        rng: &mut R,
    ) -> MoeResult<Self> {
        config.validate()?;
        let w_gate = Linear::xavier(summary_dim, config.num_experts, rng)?;
        let w_noise = Linear::xavier(summary_dim, config.num_experts, rng)?;
        Self::assemble(w_gate, w_noise, config)
    }

    /// Create a router from trained projections.
    ///
    /// # Errors
    ///
    /// - `MoeError::ConfigError` if the configuration is invalid
    /// - `MoeError::InvalidDimension` if either projection does not output
    ///   `num_experts` scores, or the two disagree on input width
    pub fn with_weights(w_gate: Linear, w_noise: Linear, config: &RoutingConfig) -> MoeResult<Self> {
        config.validate()?;
        for projection in [&w_gate, &w_noise] {
            if projection.out_features() != config.num_experts {
                return Err(MoeError::InvalidDimension {
                    expected: config.num_experts,
                    actual: projection.out_features(),
                });
            }
        }
        if w_noise.in_features() != w_gate.in_features() {
            return Err(MoeError::InvalidDimension {
                expected: w_gate.in_features(),
                actual: w_noise.in_features(),
            });
        }
        Self::assemble(w_gate, w_noise, config)
    }

    fn assemble(w_gate: Linear, w_noise: Linear, config: &RoutingConfig) -> MoeResult<Self> {
        debug!(
            summary_dim = w_gate.in_features(),
            num_experts = config.num_experts,
            top_k = config.top_k,
            noisy_gating = config.noisy_gating,
            "Created Router"
        );

        Ok(Self {
            w_gate,
            w_noise,
            num_experts: config.num_experts,
            top_k: config.top_k,
            noisy_gating: config.noisy_gating,
            noise_epsilon: config.noise_epsilon,
        })
    }

    /// Get the number of experts.
    #[inline]
    #[must_use]
    pub fn num_experts(&self) -> usize {
        self.num_experts
    }

    /// Get the number of experts selected per unit.
    #[inline]
    #[must_use]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Get the summary width the router expects.
    #[inline]
    #[must_use]
    pub fn summary_dim(&self) -> usize {
        self.w_gate.in_features()
    }

    #[inline]
    #[must_use]
    pub fn noisy_gating(&self) -> bool {
        self.noisy_gating
    }

    #[inline]
    #[must_use]
    pub fn noise_epsilon(&self) -> f32 {
        self.noise_epsilon
    }

    #[inline]
    #[must_use]
    pub fn gate_projection(&self) -> &Linear {
        &self.w_gate
    }

    #[inline]
    #[must_use]
    pub fn noise_projection(&self) -> &Linear {
        &self.w_noise
    }
}
