//! Combiner configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MoeError, MoeResult};

/// Numeric space expert outputs live in.
///
/// `Log` outputs are exponentiated before accumulation and the combined
/// result is returned as a natural log, with exact-zero slots replaced by
/// `f64::EPSILON` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombineSpace {
    /// Accumulate outputs directly. Unrouted units are 0.0.
    #[default]
    Linear,
    /// Outputs are log-values. Unrouted units are `ln(f64::EPSILON)`.
    Log,
}

impl CombineSpace {
    /// Value written for a unit that no expert processed.
    #[must_use]
    pub fn fill_value(self) -> f32 {
        match self {
            CombineSpace::Linear => 0.0,
            CombineSpace::Log => f64::EPSILON.ln() as f32,
        }
    }
}

impl fmt::Display for CombineSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombineSpace::Linear => write!(f, "linear"),
            CombineSpace::Log => write!(f, "log"),
        }
    }
}

impl FromStr for CombineSpace {
    type Err = MoeError;

    fn from_str(s: &str) -> MoeResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" => Ok(CombineSpace::Linear),
            "log" => Ok(CombineSpace::Log),
            other => Err(MoeError::ConfigError {
                message: format!("unknown combine space '{}', expected 'linear' or 'log'", other),
            }),
        }
    }
}

fn default_apply_weights() -> bool {
    true
}

/// Configuration for recombining expert outputs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CombineConfig {
    /// Multiply each expert output row by its routing weight before summing.
    /// Default: true
    #[serde(default = "default_apply_weights")]
    pub apply_weights: bool,

    /// Space the expert outputs are expressed in.
    /// Default: linear
    #[serde(default)]
    pub space: CombineSpace,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            apply_weights: default_apply_weights(),
            space: CombineSpace::default(),
        }
    }
}
