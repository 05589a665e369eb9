//! The expert interface and the experts shipped with the crate.

use std::fmt;

use rand::Rng;
use tracing::trace;

use crate::error::{MoeError, MoeResult};
use crate::routing::Linear;

use super::Activation;

/// A worker that transforms a sub-batch of payload rows.
///
/// Implementations must be pure with respect to the call: `process` may read
/// the expert's parameters but must not depend on other experts or on
/// previous calls. The bank may call different experts concurrently.
pub trait Expert: Send + Sync + fmt::Debug {
    /// Width of each input row.
    fn input_dim(&self) -> usize;

    /// Width of each output row.
    fn output_dim(&self) -> usize;

    /// Transform `rows` payload rows into `rows` output rows, in order.
    ///
    /// `input.len() == rows * input_dim()`; the result must have
    /// `rows * output_dim()` values. Never called with `rows == 0`.
    fn process(&self, input: &[f32], rows: usize) -> MoeResult<Vec<f32>>;
}

fn check_input(input: &[f32], rows: usize, input_dim: usize) -> MoeResult<()> {
    if rows == 0 {
        return Err(MoeError::EmptyInput);
    }
    if input.len() != rows * input_dim {
        return Err(MoeError::DimensionMismatch {
            expected: rows * input_dim,
            got: input.len(),
        });
    }
    Ok(())
}

// ============================================================================
// FEED-FORWARD EXPERT
// ============================================================================

/// Two-layer feed-forward expert: `input -> hidden -> activation -> output`.
#[derive(Debug, Clone)]
pub struct FeedForwardExpert {
    input_to_hidden: Linear,
    hidden_to_output: Linear,
    activation: Activation,
}

impl FeedForwardExpert {
    /// Create an expert with Xavier-initialized layers.
    ///
    /// # Errors
    ///
    /// Returns `MoeError::InvalidDimension` if any dimension is 0.
    pub fn new<R: Rng + ?Sized>(
        input_dim: usize,
        hidden_dim: usize,
        output_dim: usize,
        activation: Activation,
        rng: &mut R,
    ) -> MoeResult<Self> {
        let input_to_hidden = Linear::xavier(input_dim, hidden_dim, rng)?;
        let hidden_to_output = Linear::xavier(hidden_dim, output_dim, rng)?;
        Self::with_layers(input_to_hidden, hidden_to_output, activation)
    }

    /// Create an expert from existing layers.
    ///
    /// # Errors
    ///
    /// Returns `MoeError::InvalidDimension` if the layers do not chain.
    pub fn with_layers(
        input_to_hidden: Linear,
        hidden_to_output: Linear,
        activation: Activation,
    ) -> MoeResult<Self> {
        if input_to_hidden.out_features() != hidden_to_output.in_features() {
            return Err(MoeError::InvalidDimension {
                expected: input_to_hidden.out_features(),
                actual: hidden_to_output.in_features(),
            });
        }
        Ok(Self {
            input_to_hidden,
            hidden_to_output,
            activation,
        })
    }

    #[inline]
    #[must_use]
    pub fn hidden_dim(&self) -> usize {
        self.input_to_hidden.out_features()
    }

    #[inline]
    #[must_use]
    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// Weights + no biases: `in * hidden + hidden * out`.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.input_to_hidden.weights().len() + self.hidden_to_output.weights().len()
    }
}

impl Expert for FeedForwardExpert {
    fn input_dim(&self) -> usize {
        self.input_to_hidden.in_features()
    }

    fn output_dim(&self) -> usize {
        self.hidden_to_output.out_features()
    }

    fn process(&self, input: &[f32], rows: usize) -> MoeResult<Vec<f32>> {
        check_input(input, rows, self.input_dim())?;
        trace!(rows, "FeedForwardExpert forward pass");

        let mut hidden = self.input_to_hidden.forward(input, rows)?;
        self.activation.apply_in_place(&mut hidden);
        self.hidden_to_output.forward(&hidden, rows)
    }
}

// ============================================================================
// IDENTITY / SCALED EXPERTS
// ============================================================================

/// Returns its input unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityExpert {
    dim: usize,
}

impl IdentityExpert {
    #[must_use]
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl Expert for IdentityExpert {
    fn input_dim(&self) -> usize {
        self.dim
    }

    fn output_dim(&self) -> usize {
        self.dim
    }

    fn process(&self, input: &[f32], rows: usize) -> MoeResult<Vec<f32>> {
        check_input(input, rows, self.dim)?;
        Ok(input.to_vec())
    }
}

/// Multiplies every value by a constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledExpert {
    dim: usize,
    scale: f32,
}

impl ScaledExpert {
    #[must_use]
    pub fn new(dim: usize, scale: f32) -> Self {
        Self { dim, scale }
    }

    #[inline]
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }
}

impl Expert for ScaledExpert {
    fn input_dim(&self) -> usize {
        self.dim
    }

    fn output_dim(&self) -> usize {
        self.dim
    }

    fn process(&self, input: &[f32], rows: usize) -> MoeResult<Vec<f32>> {
        check_input(input, rows, self.dim)?;
        Ok(input.iter().map(|x| x * self.scale).collect())
    }
}
