//! Bias-free linear projection used for the gate and noise maps.
//!
//! Transforms routing summaries from `in_features` to one score per expert.

use rand::Rng;

use crate::error::{MoeError, MoeResult};

/// Linear projection without bias.
///
/// # Formula
///
/// ```text
/// y = x @ W^T
/// ```
///
/// where:
/// - `x`: Input [batch_size, in_features]
/// - `W`: Weight matrix [out_features, in_features]
/// - `y`: Output [batch_size, out_features]
#[derive(Debug, Clone, PartialEq)]
pub struct Linear {
    /// Weight matrix (row-major): [out_features, in_features]
    weights: Vec<f32>,
    in_features: usize,
    out_features: usize,
}

impl Linear {
    /// All-zero projection.
    ///
    /// Gate and noise maps start here, so an untrained router scores every
    /// expert equally and breaks ties by expert index.
    ///
    /// # Errors
    ///
    /// Returns `MoeError::InvalidDimension` if either dimension is 0.
    pub fn zeros(in_features: usize, out_features: usize) -> MoeResult<Self> {
        Self::check_dims(in_features, out_features)?;
        Ok(Self {
            weights: vec![0.0; out_features * in_features],
            in_features,
            out_features,
        })
    }

    /// Xavier-uniform initialization: `U(-sqrt(6/(in+out)), sqrt(6/(in+out)))`.
    ///
    /// # Errors
    ///
    /// Returns `MoeError::InvalidDimension` if either dimension is 0.
    pub fn xavier<R: Rng + ?Sized>(
        in_features: usize,
        out_features: usize,
        rng: &mut R,
    ) -> MoeResult<Self> {
        Self::check_dims(in_features, out_features)?;

        let limit = (6.0 / (in_features + out_features) as f64).sqrt();
        let weights: Vec<f32> = (0..(out_features * in_features))
            .map(|_| rng.gen_range((-limit)..limit) as f32)
            .collect();

        Ok(Self {
            weights,
            in_features,
            out_features,
        })
    }

    /// Create a projection with provided weights, row-major `[out_features, in_features]`.
    ///
    /// # Errors
    ///
    /// - `MoeError::InvalidDimension` if either dimension is 0
    /// - `MoeError::DimensionMismatch` if `weights.len() != out_features * in_features`
    /// - `MoeError::InvalidValue` if a weight is NaN
    pub fn with_weights(
        in_features: usize,
        out_features: usize,
        weights: Vec<f32>,
    ) -> MoeResult<Self> {
        Self::check_dims(in_features, out_features)?;
        let expected = out_features * in_features;
        if weights.len() != expected {
            return Err(MoeError::DimensionMismatch {
                expected,
                got: weights.len(),
            });
        }
        crate::types::ensure_no_nan(&weights)?;

        Ok(Self {
            weights,
            in_features,
            out_features,
        })
    }

    fn check_dims(in_features: usize, out_features: usize) -> MoeResult<()> {
        if in_features == 0 || out_features == 0 {
            return Err(MoeError::InvalidDimension {
                expected: 1,
                actual: 0,
            });
        }
        Ok(())
    }

    /// Get input dimension.
    #[inline]
    #[must_use]
    pub fn in_features(&self) -> usize {
        self.in_features
    }

    /// Get output dimension.
    #[inline]
    #[must_use]
    pub fn out_features(&self) -> usize {
        self.out_features
    }

    /// Get the weight matrix.
    #[inline]
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Forward pass: `y = x @ W^T` for each row of the batch.
    ///
    /// # Errors
    ///
    /// - `MoeError::EmptyInput` if batch_size == 0
    /// - `MoeError::InvalidDimension` if input length != batch_size * in_features
    /// - `MoeError::InvalidValue` if input contains NaN
    pub fn forward(&self, input: &[f32], batch_size: usize) -> MoeResult<Vec<f32>> {
        if batch_size == 0 {
            return Err(MoeError::EmptyInput);
        }

        let expected_len = batch_size * self.in_features;
        if input.len() != expected_len {
            return Err(MoeError::InvalidDimension {
                expected: expected_len,
                actual: input.len(),
            });
        }
        crate::types::ensure_no_nan(input)?;

        let mut output = vec![0.0f32; batch_size * self.out_features];

        for (x, y) in input
            .chunks_exact(self.in_features)
            .zip(output.chunks_exact_mut(self.out_features))
        {
            for (o, out) in y.iter_mut().enumerate() {
                let w = &self.weights[o * self.in_features..(o + 1) * self.in_features];
                *out = x.iter().zip(w).map(|(a, b)| a * b).sum();
            }
        }

        Ok(output)
    }
}
