//! Activation functions for feed-forward expert hidden layers.

use serde::{Deserialize, Serialize};

/// Hidden-layer activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// Gaussian Error Linear Unit, tanh approximation
    #[default]
    Gelu,
    /// max(0, x)
    Relu,
    /// x * sigmoid(x)
    Silu,
}

impl Activation {
    /// Apply to one value.
    #[inline]
    pub fn apply(&self, x: f32) -> f32 {
        match self {
            Activation::Gelu => {
                const SQRT_2_OVER_PI: f32 = 0.797_884_6;
                const COEF: f32 = 0.044715;
                let inner = SQRT_2_OVER_PI * (x + COEF * x * x * x);
                x * 0.5 * (1.0 + inner.tanh())
            }
            Activation::Relu => x.max(0.0),
            Activation::Silu => x / (1.0 + (-x).exp()),
        }
    }

    /// Apply element-wise in place.
    pub fn apply_in_place(&self, values: &mut [f32]) {
        for v in values.iter_mut() {
            *v = self.apply(*v);
        }
    }
}
