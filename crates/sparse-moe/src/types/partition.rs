//! Per-expert partition of a batch.

/// The units routed to one expert, in ascending original-index order.
///
/// Entry `i` holds the original unit index, that unit's payload row and its
/// routing weight for this expert.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub(crate) expert_id: usize,
    pub(crate) indices: Vec<usize>,
    pub(crate) payloads: Vec<f32>,
    pub(crate) weights: Vec<f32>,
    pub(crate) payload_dim: usize,
}

impl Partition {
    pub(crate) fn empty(expert_id: usize, payload_dim: usize) -> Self {
        Self {
            expert_id,
            indices: Vec::new(),
            payloads: Vec::new(),
            weights: Vec::new(),
            payload_dim,
        }
    }

    pub(crate) fn push(&mut self, unit: usize, payload: &[f32], weight: f32) {
        self.indices.push(unit);
        self.payloads.extend_from_slice(payload);
        self.weights.push(weight);
    }

    #[inline]
    #[must_use]
    pub fn expert_id(&self) -> usize {
        self.expert_id
    }

    /// Number of units in the partition.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Original batch index of each member.
    #[inline]
    #[must_use]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Gathered payloads, `[len * payload_dim]`.
    #[inline]
    #[must_use]
    pub fn payloads(&self) -> &[f32] {
        &self.payloads
    }

    /// Routing weight of each member for this expert.
    #[inline]
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    #[inline]
    #[must_use]
    pub fn payload_dim(&self) -> usize {
        self.payload_dim
    }
}
