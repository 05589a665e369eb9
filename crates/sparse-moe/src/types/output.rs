//! Expert output sub-batches and the combined batch-aligned output.

use crate::error::{MoeError, MoeResult};

/// Output of one expert over its partition, `[rows * width]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubBatch {
    data: Vec<f32>,
    rows: usize,
    width: usize,
}

impl SubBatch {
    /// Wrap an expert's flat output.
    ///
    /// # Errors
    ///
    /// - `MoeError::DimensionMismatch` if `data.len() != rows * width`
    pub fn new(data: Vec<f32>, rows: usize, width: usize) -> MoeResult<Self> {
        if data.len() != rows * width {
            return Err(MoeError::DimensionMismatch {
                expected: rows * width,
                got: data.len(),
            });
        }
        Ok(Self { data, rows, width })
    }

    /// Zero-row output, produced for experts that received no units.
    #[must_use]
    pub fn empty(width: usize) -> Self {
        Self {
            data: Vec::new(),
            rows: 0,
            width,
        }
    }

    #[inline]
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    #[must_use]
    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

/// Batch-aligned result of combining expert outputs, `[batch_size * width]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedOutput {
    pub(crate) data: Vec<f32>,
    pub(crate) batch_size: usize,
    pub(crate) width: usize,
}

impl CombinedOutput {
    #[inline]
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Output row of one original unit.
    #[must_use]
    pub fn row(&self, unit: usize) -> &[f32] {
        &self.data[unit * self.width..(unit + 1) * self.width]
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }
}
