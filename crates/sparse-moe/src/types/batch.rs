//! Batch of work units: routing summaries plus expert payloads.

use crate::error::{MoeError, MoeResult};

use super::ensure_no_nan;

/// An ordered batch of units.
///
/// Unit `i` owns row `i` of `summaries` (width `summary_dim`, read by the
/// router) and row `i` of `payloads` (width `payload_dim`, read by experts).
/// A unit's identity is its row index.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    summaries: Vec<f32>,
    payloads: Vec<f32>,
    batch_size: usize,
    summary_dim: usize,
    payload_dim: usize,
}

impl Batch {
    /// Create a batch from flat summary and payload buffers.
    ///
    /// # Errors
    ///
    /// - `MoeError::EmptyInput` if batch_size == 0
    /// - `MoeError::InvalidDimension` if either width is 0
    /// - `MoeError::DimensionMismatch` if a buffer length disagrees with its shape
    /// - `MoeError::InvalidValue` if a summary contains NaN
    pub fn new(
        batch_size: usize,
        summaries: Vec<f32>,
        summary_dim: usize,
        payloads: Vec<f32>,
        payload_dim: usize,
    ) -> MoeResult<Self> {
        if batch_size == 0 {
            return Err(MoeError::EmptyInput);
        }
        if summary_dim == 0 {
            return Err(MoeError::InvalidDimension {
                expected: 1,
                actual: 0,
            });
        }
        if payload_dim == 0 {
            return Err(MoeError::InvalidDimension {
                expected: 1,
                actual: 0,
            });
        }
        if summaries.len() != batch_size * summary_dim {
            return Err(MoeError::DimensionMismatch {
                expected: batch_size * summary_dim,
                got: summaries.len(),
            });
        }
        if payloads.len() != batch_size * payload_dim {
            return Err(MoeError::DimensionMismatch {
                expected: batch_size * payload_dim,
                got: payloads.len(),
            });
        }
        ensure_no_nan(&summaries)?;

        Ok(Self {
            summaries,
            payloads,
            batch_size,
            summary_dim,
            payload_dim,
        })
    }

    /// Batch whose routing summary is the payload itself.
    ///
    /// The usual case for dense feature vectors.
    pub fn self_summarized(batch_size: usize, payloads: Vec<f32>, dim: usize) -> MoeResult<Self> {
        let summaries = payloads.clone();
        Self::new(batch_size, summaries, dim, payloads, dim)
    }

    /// Batch of `channels x spatial` feature maps.
    ///
    /// Each unit's summary is the global average pool of its payload: one
    /// mean per channel over the `spatial` positions.
    pub fn from_feature_maps(
        batch_size: usize,
        payloads: Vec<f32>,
        channels: usize,
        spatial: usize,
    ) -> MoeResult<Self> {
        if channels == 0 || spatial == 0 {
            return Err(MoeError::InvalidDimension {
                expected: 1,
                actual: 0,
            });
        }
        let payload_dim = channels * spatial;
        if payloads.len() != batch_size * payload_dim {
            return Err(MoeError::DimensionMismatch {
                expected: batch_size * payload_dim,
                got: payloads.len(),
            });
        }

        let summaries: Vec<f32> = payloads
            .chunks_exact(spatial)
            .map(|plane| plane.iter().sum::<f32>() / spatial as f32)
            .collect();

        Self::new(batch_size, summaries, channels, payloads, payload_dim)
    }

    /// Number of units.
    #[inline]
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Width of each routing summary (D).
    #[inline]
    #[must_use]
    pub fn summary_dim(&self) -> usize {
        self.summary_dim
    }

    /// Width of each payload.
    #[inline]
    #[must_use]
    pub fn payload_dim(&self) -> usize {
        self.payload_dim
    }

    /// All summaries, `[batch_size * summary_dim]`.
    #[inline]
    #[must_use]
    pub fn summaries(&self) -> &[f32] {
        &self.summaries
    }

    /// All payloads, `[batch_size * payload_dim]`.
    #[inline]
    #[must_use]
    pub fn payloads(&self) -> &[f32] {
        &self.payloads
    }

    /// Summary row of one unit.
    #[must_use]
    pub fn summary(&self, unit: usize) -> &[f32] {
        let start = unit * self.summary_dim;
        &self.summaries[start..start + self.summary_dim]
    }

    /// Payload row of one unit.
    #[must_use]
    pub fn payload(&self, unit: usize) -> &[f32] {
        let start = unit * self.payload_dim;
        &self.payloads[start..start + self.payload_dim]
    }
}
