//! Root configuration for the sparse MoE layer.
//!
//! # Loading Configuration
//!
//! ```rust,ignore
//! use sparse_moe::MoeConfig;
//!
//! let config = MoeConfig::from_file("moe.toml")?.with_env_overrides();
//! config.validate()?;
//! ```
//!
//! # TOML Structure
//!
//! ```toml
//! [routing]
//! num_experts = 16
//! top_k = 4
//! noisy_gating = true
//! noise_epsilon = 0.01
//! load_balance_coef = 1.0
//!
//! [combine]
//! apply_weights = true
//! space = "linear"
//! ```
//!
//! # Design Principles
//!
//! - **FAIL FAST**: file not found or parse error returns immediately
//! - **VALIDATION**: all nested configs are validated together

mod combine;
mod routing;


pub use combine::{CombineConfig, CombineSpace};
pub use routing::RoutingConfig;

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MoeError, MoeResult};

// ============================================================================
// ROOT MOE CONFIG
// ============================================================================

/// Root configuration for a [`crate::SparseMoe`] layer.
///
/// All values are fixed at construction time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoeConfig {
    /// Router configuration (expert count, top-k, noise)
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Combiner configuration (weighting, output space)
    #[serde(default)]
    pub combine: CombineConfig,
}

impl MoeConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// - `MoeError::ConfigError` if the file cannot be read or parsed
    pub fn from_file(path: impl AsRef<Path>) -> MoeResult<Self> {
        let path = path.as_ref();

        let contents = std::fs::read_to_string(path).map_err(|e| MoeError::ConfigError {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        toml::from_str(&contents).map_err(|e| MoeError::ConfigError {
            message: format!("Failed to parse TOML in '{}': {}", path.display(), e),
        })
    }

    /// Validate all configuration values.
    ///
    /// # Errors
    /// - `MoeError::ConfigError` prefixed with the offending section
    pub fn validate(&self) -> MoeResult<()> {
        self.routing
            .validate()
            .map_err(|e| MoeError::ConfigError {
                message: format!("[routing] {}", e),
            })?;

        Ok(())
    }

    /// Apply environment variable overrides. Prefix: `MOE_`
    ///
    /// # Supported Variables
    ///
    /// | Variable | Config Path | Type |
    /// |----------|-------------|------|
    /// | `MOE_NUM_EXPERTS` | `routing.num_experts` | usize |
    /// | `MOE_TOP_K` | `routing.top_k` | usize |
    /// | `MOE_NOISY_GATING` | `routing.noisy_gating` | bool |
    /// | `MOE_NOISE_EPSILON` | `routing.noise_epsilon` | f32 |
    /// | `MOE_LOAD_BALANCE_COEF` | `routing.load_balance_coef` | f32 |
    /// | `MOE_APPLY_WEIGHTS` | `combine.apply_weights` | bool |
    /// | `MOE_COMBINE_SPACE` | `combine.space` | `linear` / `log` |
    ///
    /// Values that fail to parse are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = env::var("MOE_NUM_EXPERTS") {
            if let Ok(n) = val.parse::<usize>() {
                self.routing.num_experts = n;
            }
        }
        if let Ok(val) = env::var("MOE_TOP_K") {
            if let Ok(n) = val.parse::<usize>() {
                self.routing.top_k = n;
            }
        }
        if let Ok(val) = env::var("MOE_NOISY_GATING") {
            if let Ok(b) = val.parse::<bool>() {
                self.routing.noisy_gating = b;
            }
        }
        if let Ok(val) = env::var("MOE_NOISE_EPSILON") {
            if let Ok(x) = val.parse::<f32>() {
                self.routing.noise_epsilon = x;
            }
        }
        if let Ok(val) = env::var("MOE_LOAD_BALANCE_COEF") {
            if let Ok(x) = val.parse::<f32>() {
                self.routing.load_balance_coef = x;
            }
        }

        if let Ok(val) = env::var("MOE_APPLY_WEIGHTS") {
            if let Ok(b) = val.parse::<bool>() {
                self.combine.apply_weights = b;
            }
        }
        if let Ok(val) = env::var("MOE_COMBINE_SPACE") {
            if let Ok(space) = val.parse::<CombineSpace>() {
                self.combine.space = space;
            }
        }

        self
    }

    /// Create configuration from a TOML string.
    ///
    /// # Errors
    /// - `MoeError::ConfigError` if TOML parsing fails
    pub fn from_toml_str(toml: &str) -> MoeResult<Self> {
        toml::from_str(toml).map_err(|e| MoeError::ConfigError {
            message: format!("Failed to parse TOML: {}", e),
        })
    }

    /// Serialize configuration to a TOML string.
    ///
    /// # Errors
    /// - `MoeError::ConfigError` if serialization fails
    pub fn to_toml_string(&self) -> MoeResult<String> {
        toml::to_string_pretty(self).map_err(|e| MoeError::ConfigError {
            message: format!("Failed to serialize to TOML: {}", e),
        })
    }
}
