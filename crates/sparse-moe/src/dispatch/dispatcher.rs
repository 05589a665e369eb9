//! Sparse dispatcher: groups routing edges by expert.

use tracing::{debug, warn};

use crate::error::{MoeError, MoeResult};
use crate::types::{Batch, Partition, RoutingWeights};

use super::RoutingStats;

/// One nonzero `(unit, expert)` entry of the routing weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutingEdge {
    pub expert: usize,
    pub unit: usize,
    pub weight: f32,
}

/// Arena of routing edges sorted by `(expert, unit)`.
///
/// Built once per routing decision, then used to dispatch payloads. The
/// dispatcher never mutates the weights it was built from.
///
/// # Example
///
/// ```rust
/// use sparse_moe::dispatch::SparseDispatcher;
/// use sparse_moe::types::{Batch, RoutingWeights};
///
/// let weights = RoutingWeights::from_dense(vec![0.6, 0.4, 0.0, 1.0], 2, 2).unwrap();
/// let batch = Batch::self_summarized(2, vec![1.0, 2.0], 1).unwrap();
///
/// let dispatcher = SparseDispatcher::new(&weights);
/// let partitions = dispatcher.dispatch(&batch).unwrap();
///
/// assert_eq!(partitions[0].indices(), &[0]);
/// assert_eq!(partitions[1].indices(), &[0, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct SparseDispatcher {
    edges: Vec<RoutingEdge>,
    part_sizes: Vec<usize>,
    batch_size: usize,
    dropped_units: usize,
}

impl SparseDispatcher {
    /// Collect and order the nonzero edges of `weights`.
    pub fn new(weights: &RoutingWeights) -> Self {
        let num_experts = weights.num_experts();
        let mut part_sizes = vec![0usize; num_experts];
        let mut edges = Vec::with_capacity(weights.nonzero_count());

        // column-major walk yields (expert, unit) order without a sort
        for expert in 0..num_experts {
            for unit in 0..weights.batch_size() {
                let weight = weights.get(unit, expert);
                if weight > 0.0 {
                    edges.push(RoutingEdge {
                        expert,
                        unit,
                        weight,
                    });
                    part_sizes[expert] += 1;
                }
            }
        }

        let dropped_units = weights.dropped_units().len();
        if dropped_units > 0 {
            warn!(
                dropped_units,
                batch_size = weights.batch_size(),
                "Units routed to no expert; they contribute the fill value"
            );
        }

        Self {
            edges,
            part_sizes,
            batch_size: weights.batch_size(),
            dropped_units,
        }
    }

    /// All edges in dispatch order.
    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[RoutingEdge] {
        &self.edges
    }

    /// Number of units each expert receives.
    #[inline]
    #[must_use]
    pub fn part_sizes(&self) -> &[usize] {
        &self.part_sizes
    }

    #[inline]
    #[must_use]
    pub fn num_experts(&self) -> usize {
        self.part_sizes.len()
    }

    #[inline]
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Routing weights regrouped per expert, in partition order.
    #[must_use]
    pub fn expert_to_gates(&self) -> Vec<Vec<f32>> {
        let mut gates: Vec<Vec<f32>> = self
            .part_sizes
            .iter()
            .map(|&n| Vec::with_capacity(n))
            .collect();
        for edge in &self.edges {
            gates[edge.expert].push(edge.weight);
        }
        gates
    }

    /// Dropped-unit and idle-expert counts for this decision.
    #[must_use]
    pub fn stats(&self) -> RoutingStats {
        RoutingStats {
            dropped_units: self.dropped_units,
            idle_experts: self.part_sizes.iter().filter(|&&n| n == 0).count(),
            part_sizes: self.part_sizes.clone(),
        }
    }

    /// Build one partition per expert, gathering payloads from `batch`.
    ///
    /// Always returns `num_experts` partitions; experts that received no
    /// units get an empty one.
    ///
    /// # Errors
    ///
    /// - `MoeError::DimensionMismatch` if the batch size differs from the weights'
    pub fn dispatch(&self, batch: &Batch) -> MoeResult<Vec<Partition>> {
        if batch.batch_size() != self.batch_size {
            return Err(MoeError::DimensionMismatch {
                expected: self.batch_size,
                got: batch.batch_size(),
            });
        }

        let payload_dim = batch.payload_dim();
        let mut partitions: Vec<Partition> = (0..self.num_experts())
            .map(|expert| Partition::empty(expert, payload_dim))
            .collect();

        for (partition, &size) in partitions.iter_mut().zip(&self.part_sizes) {
            partition.indices.reserve(size);
            partition.weights.reserve(size);
            partition.payloads.reserve(size * payload_dim);
        }

        for edge in &self.edges {
            partitions[edge.expert].push(edge.unit, batch.payload(edge.unit), edge.weight);
        }

        debug!(
            batch_size = self.batch_size,
            edges = self.edges.len(),
            part_sizes = ?self.part_sizes,
            "Dispatched batch"
        );

        Ok(partitions)
    }
}

/// Partition `batch` according to `weights` in one call.
///
/// # Errors
///
/// Same as [`SparseDispatcher::dispatch`].
pub fn dispatch(batch: &Batch, weights: &RoutingWeights) -> MoeResult<Vec<Partition>> {
    SparseDispatcher::new(weights).dispatch(batch)
}
