//! Router configuration.
//!
//! Controls expert count, top-k selection and the noisy gating used while
//! training.

use serde::{Deserialize, Serialize};

use crate::error::{MoeError, MoeResult};

// ============================================================================
// DEFAULT FUNCTIONS
// ============================================================================

fn default_num_experts() -> usize {
    16
}

fn default_top_k() -> usize {
    4
}

fn default_noisy_gating() -> bool {
    true
}

fn default_noise_epsilon() -> f32 {
    0.01
}

fn default_load_balance_coef() -> f32 {
    1.0
}

// ============================================================================
// ROUTING CONFIG
// ============================================================================

/// Configuration for the noisy top-k router.
///
/// # Architecture
/// ```text
/// Summaries [B, D]
///        |
///        +--> [W_gate]  --> clean scores [B, E]
///        |
///        +--> [W_noise] --> softplus + epsilon --> noise scale [B, E]  (training only)
///        |
///        v
///   [Top-(k+1) Selection] --> softmax over top k --> weights [B, E] (<= k nonzero per row)
///        |
///        v
///   [Load] --> expected (normal CDF) or counted [E]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Number of experts in the bank (E).
    /// Must be >= 1.
    /// Default: 16
    #[serde(default = "default_num_experts")]
    pub num_experts: usize,

    /// Number of experts each unit is routed to (k).
    /// Must satisfy 1 <= top_k <= num_experts.
    /// Default: 4
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Perturb gate scores with learned-scale Gaussian noise while training.
    /// Has no effect when `training == false`.
    /// Default: true
    #[serde(default = "default_noisy_gating")]
    pub noisy_gating: bool,

    /// Floor added to the softplus noise scale.
    /// Keeps the noise standard deviation strictly positive.
    /// Default: 0.01
    #[serde(default = "default_noise_epsilon")]
    pub noise_epsilon: f32,

    /// Multiplier applied to the importance + load penalty.
    /// Set to 0.0 to disable the auxiliary loss.
    /// Default: 1.0
    #[serde(default = "default_load_balance_coef")]
    pub load_balance_coef: f32,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            num_experts: default_num_experts(),
            top_k: default_top_k(),
            noisy_gating: default_noisy_gating(),
            noise_epsilon: default_noise_epsilon(),
            load_balance_coef: default_load_balance_coef(),
        }
    }
}

impl RoutingConfig {
    /// Create a config with the given expert count and top-k, other fields default.
    pub fn new(num_experts: usize, top_k: usize) -> Self {
        Self {
            num_experts,
            top_k,
            ..Default::default()
        }
    }

    /// Validate routing configuration values.
    ///
    /// # Errors
    /// Returns `MoeError::ConfigError` if:
    /// - num_experts == 0
    /// - top_k == 0 or top_k > num_experts
    /// - noise_epsilon <= 0 or is NaN
    /// - load_balance_coef < 0 or is NaN
    pub fn validate(&self) -> MoeResult<()> {
        if self.num_experts == 0 {
            return Err(MoeError::ConfigError {
                message: "num_experts must be > 0".to_string(),
            });
        }
        if self.top_k == 0 || self.top_k > self.num_experts {
            return Err(MoeError::ConfigError {
                message: format!(
                    "top_k must be in [1, {}], got {}",
                    self.num_experts, self.top_k
                ),
            });
        }
        if self.noise_epsilon <= 0.0 || self.noise_epsilon.is_nan() {
            return Err(MoeError::ConfigError {
                message: "noise_epsilon must be > 0 and not NaN".to_string(),
            });
        }
        if self.load_balance_coef < 0.0 || self.load_balance_coef.is_nan() {
            return Err(MoeError::ConfigError {
                message: "load_balance_coef must be >= 0 and not NaN".to_string(),
            });
        }
        Ok(())
    }

    /// Create inference configuration (deterministic, no noise).
    ///
    /// Returns config with:
    /// - noisy_gating = false
    /// - load_balance_coef = 0.0 (no auxiliary loss)
    pub fn for_inference() -> Self {
        Self {
            noisy_gating: false,
            load_balance_coef: 0.0,
            ..Default::default()
        }
    }

    /// Create training configuration (noisy gating, auxiliary loss on).
    pub fn for_training() -> Self {
        Self {
            noisy_gating: true,
            load_balance_coef: default_load_balance_coef(),
            ..Default::default()
        }
    }

    /// Check if this config routes deterministically.
    pub fn is_inference_mode(&self) -> bool {
        !self.noisy_gating
    }
}
