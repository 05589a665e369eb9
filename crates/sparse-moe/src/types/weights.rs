//! Sparse routing-weight matrix.

use crate::error::{MoeError, MoeResult};

/// Routing weights, a dense `[batch_size, num_experts]` matrix.
///
/// Entry `(unit, expert)` is nonzero iff the unit is routed to that expert.
/// The router guarantees at most `top_k` nonzero entries per row and that a
/// row's nonzero entries sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingWeights {
    data: Vec<f32>,
    batch_size: usize,
    num_experts: usize,
}

impl RoutingWeights {
    /// All-zero weights (every unit dropped).
    #[must_use]
    pub fn zeros(batch_size: usize, num_experts: usize) -> Self {
        Self {
            data: vec![0.0; batch_size * num_experts],
            batch_size,
            num_experts,
        }
    }

    /// Wrap an externally produced weight matrix.
    ///
    /// # Errors
    ///
    /// - `MoeError::InvalidDimension` if num_experts == 0
    /// - `MoeError::DimensionMismatch` if `data.len() != batch_size * num_experts`
    /// - `MoeError::InvalidValue` if any weight is negative or NaN
    pub fn from_dense(data: Vec<f32>, batch_size: usize, num_experts: usize) -> MoeResult<Self> {
        if num_experts == 0 {
            return Err(MoeError::InvalidDimension {
                expected: 1,
                actual: 0,
            });
        }
        if data.len() != batch_size * num_experts {
            return Err(MoeError::DimensionMismatch {
                expected: batch_size * num_experts,
                got: data.len(),
            });
        }
        if let Some(index) = data.iter().position(|w| w.is_nan() || *w < 0.0) {
            return Err(MoeError::InvalidValue {
                index,
                value: data[index],
            });
        }
        Ok(Self {
            data,
            batch_size,
            num_experts,
        })
    }

    pub(crate) fn set(&mut self, unit: usize, expert: usize, weight: f32) {
        self.data[unit * self.num_experts + expert] = weight;
    }

    #[inline]
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[inline]
    #[must_use]
    pub fn num_experts(&self) -> usize {
        self.num_experts
    }

    /// Weight of `(unit, expert)`.
    #[inline]
    #[must_use]
    pub fn get(&self, unit: usize, expert: usize) -> f32 {
        self.data[unit * self.num_experts + expert]
    }

    /// One unit's row, `[num_experts]`.
    #[must_use]
    pub fn row(&self, unit: usize) -> &[f32] {
        let start = unit * self.num_experts;
        &self.data[start..start + self.num_experts]
    }

    /// Flat row-major view.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Total number of (unit, expert) routing edges.
    #[must_use]
    pub fn nonzero_count(&self) -> usize {
        self.data.iter().filter(|&&w| w > 0.0).count()
    }

    /// Experts selected for one unit, ascending.
    #[must_use]
    pub fn selected_experts(&self, unit: usize) -> Vec<usize> {
        self.row(unit)
            .iter()
            .enumerate()
            .filter(|(_, &w)| w > 0.0)
            .map(|(e, _)| e)
            .collect()
    }

    /// Units with no nonzero weight.
    #[must_use]
    pub fn dropped_units(&self) -> Vec<usize> {
        (0..self.batch_size)
            .filter(|&u| self.row(u).iter().all(|&w| w <= 0.0))
            .collect()
    }

    /// Per-expert sum of weights over the batch.
    #[must_use]
    pub fn importance(&self) -> Vec<f32> {
        let mut importance = vec![0.0f32; self.num_experts];
        for row in self.data.chunks_exact(self.num_experts) {
            for (acc, &w) in importance.iter_mut().zip(row) {
                *acc += w;
            }
        }
        importance
    }

    /// Per-expert count of units with a nonzero weight.
    #[must_use]
    pub fn unit_counts(&self) -> Vec<f32> {
        let mut counts = vec![0.0f32; self.num_experts];
        for row in self.data.chunks_exact(self.num_experts) {
            for (acc, &w) in counts.iter_mut().zip(row) {
                if w > 0.0 {
                    *acc += 1.0;
                }
            }
        }
        counts
    }
}
