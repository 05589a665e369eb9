//! Expert bank with parallel per-partition execution.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::{MoeError, MoeResult};
use crate::types::{Partition, SubBatch};

use super::Expert;

/// Ordered collection of experts; slot `e` serves partition `e`.
///
/// # Example
///
/// ```rust
/// use sparse_moe::experts::{ExpertBank, ScaledExpert};
///
/// let bank = ExpertBank::replicated(&ScaledExpert::new(4, 2.0), 3).unwrap();
/// assert_eq!(bank.num_experts(), 3);
/// assert_eq!(bank.output_dim(), 4);
/// ```
#[derive(Debug)]
pub struct ExpertBank {
    experts: Vec<Box<dyn Expert>>,
    input_dim: usize,
    output_dim: usize,
}

impl ExpertBank {
    /// Create a bank from heterogeneous experts.
    ///
    /// # Errors
    ///
    /// - `MoeError::EmptyInput` if `experts` is empty
    /// - `MoeError::ConfigError` if experts disagree on input or output width
    pub fn new(experts: Vec<Box<dyn Expert>>) -> MoeResult<Self> {
        let first = experts.first().ok_or(MoeError::EmptyInput)?;
        let input_dim = first.input_dim();
        let output_dim = first.output_dim();

        if let Some((id, e)) = experts
            .iter()
            .enumerate()
            .find(|(_, e)| e.input_dim() != input_dim || e.output_dim() != output_dim)
        {
            return Err(MoeError::ConfigError {
                message: format!(
                    "expert {} has shape {}->{}, expected {}->{}",
                    id,
                    e.input_dim(),
                    e.output_dim(),
                    input_dim,
                    output_dim
                ),
            });
        }

        debug!(
            num_experts = experts.len(),
            input_dim, output_dim, "Created ExpertBank"
        );

        Ok(Self {
            experts,
            input_dim,
            output_dim,
        })
    }

    /// Create a bank of `num_experts` copies of one prototype.
    ///
    /// Every slot starts with identical parameters.
    ///
    /// # Errors
    ///
    /// Returns `MoeError::EmptyInput` if `num_experts` is 0.
    pub fn replicated<E>(prototype: &E, num_experts: usize) -> MoeResult<Self>
    where
        E: Expert + Clone + 'static,
    {
        let experts = (0..num_experts)
            .map(|_| Box::new(prototype.clone()) as Box<dyn Expert>)
            .collect();
        Self::new(experts)
    }

    #[inline]
    #[must_use]
    pub fn num_experts(&self) -> usize {
        self.experts.len()
    }

    #[inline]
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    #[inline]
    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// Get the expert in slot `index`.
    ///
    /// # Errors
    ///
    /// Returns `MoeError::InvalidExpertIndex` if `index >= num_experts()`.
    pub fn expert(&self, index: usize) -> MoeResult<&dyn Expert> {
        self.experts
            .get(index)
            .map(|e| e.as_ref())
            .ok_or(MoeError::InvalidExpertIndex {
                index,
                max: self.experts.len(),
            })
    }

    /// Run every partition through its expert.
    ///
    /// Experts run in parallel. Empty partitions skip their expert and yield
    /// a zero-row [`SubBatch`]. Output `e` corresponds to partition `e`.
    ///
    /// # Errors
    ///
    /// - `MoeError::DimensionMismatch` if `partitions.len() != num_experts()`,
    ///   a partition's payload width differs from `input_dim()`, or an expert
    ///   returns the wrong number of values
    /// - `MoeError::ExpertError` if an expert fails
    pub fn run(&self, partitions: &[Partition]) -> MoeResult<Vec<SubBatch>> {
        if partitions.len() != self.experts.len() {
            return Err(MoeError::DimensionMismatch {
                expected: self.experts.len(),
                got: partitions.len(),
            });
        }
        if let Some(p) = partitions
            .iter()
            .find(|p| p.payload_dim() != self.input_dim)
        {
            return Err(MoeError::DimensionMismatch {
                expected: self.input_dim,
                got: p.payload_dim(),
            });
        }

        let output_dim = self.output_dim;
        partitions
            .par_iter()
            .zip(self.experts.par_iter())
            .enumerate()
            .map(|(expert_id, (partition, expert))| {
                if partition.is_empty() {
                    return Ok(SubBatch::empty(output_dim));
                }

                let rows = partition.len();
                let output = expert
                    .process(partition.payloads(), rows)
                    .map_err(|e| {
                        warn!(expert_id, rows, error = %e, "Expert failed");
                        match e {
                            MoeError::ExpertError { .. } => e,
                            other => MoeError::ExpertError {
                                expert_id,
                                message: other.to_string(),
                            },
                        }
                    })?;

                if output.len() != rows * output_dim {
                    warn!(
                        expert_id,
                        expected = rows * output_dim,
                        got = output.len(),
                        "Expert output length does not match its partition"
                    );
                    return Err(MoeError::DimensionMismatch {
                        expected: rows * output_dim,
                        got: output.len(),
                    });
                }

                SubBatch::new(output, rows, output_dim)
            })
            .collect()
    }
}
