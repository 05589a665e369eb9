//! Weighted recombination of expert outputs.

use tracing::debug;

use crate::config::{CombineConfig, CombineSpace};
use crate::error::{MoeError, MoeResult};
use crate::types::{CombinedOutput, Partition, SubBatch};

/// Stateless combiner parameterized by a [`CombineConfig`].
#[derive(Debug, Clone, Default)]
pub struct Combiner {
    config: CombineConfig,
}

impl Combiner {
    #[must_use]
    pub fn new(config: CombineConfig) -> Self {
        Self { config }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &CombineConfig {
        &self.config
    }

    /// Combine expert outputs into a `[batch_size, width]` result.
    ///
    /// # Arguments
    ///
    /// * `outputs` - One sub-batch per expert, `outputs[e].rows() == partitions[e].len()`
    /// * `partitions` - The partitions the outputs were computed from
    /// * `batch_size` - Original batch size
    ///
    /// # Errors
    ///
    /// See [`combine`].
    pub fn combine(
        &self,
        outputs: &[SubBatch],
        partitions: &[Partition],
        batch_size: usize,
    ) -> MoeResult<CombinedOutput> {
        combine(
            outputs,
            partitions,
            batch_size,
            self.config.apply_weights,
            self.config.space,
        )
    }
}

/// Sum weighted expert outputs into batch order.
///
/// # Formula
///
/// Linear space: `y[b] = sum_e w[b, e] * out_e[b]`, and `0.0` for units no
/// expert processed.
///
/// Log space: `y[b] = ln(sum_e w[b, e] * exp(out_e[b]))`, with exact-zero
/// sums replaced by `f64::EPSILON` before the log.
///
/// With `apply_weights == false` the `w[b, e]` factors are dropped.
///
/// # Errors
///
/// - `MoeError::EmptyInput` if batch_size == 0
/// - `MoeError::DimensionMismatch` if the output count differs from the
///   partition count, an output's row count differs from its partition's
///   size, output widths disagree, or a partition references a unit
///   outside the batch
pub fn combine(
    outputs: &[SubBatch],
    partitions: &[Partition],
    batch_size: usize,
    apply_weights: bool,
    space: CombineSpace,
) -> MoeResult<CombinedOutput> {
    if batch_size == 0 {
        return Err(MoeError::EmptyInput);
    }
    if outputs.len() != partitions.len() {
        return Err(MoeError::DimensionMismatch {
            expected: partitions.len(),
            got: outputs.len(),
        });
    }

    let width = output_width(outputs)?;

    for (output, partition) in outputs.iter().zip(partitions) {
        if output.rows() != partition.len() {
            return Err(MoeError::DimensionMismatch {
                expected: partition.len(),
                got: output.rows(),
            });
        }
    }

    let mut accumulator = vec![0.0f64; batch_size * width];

    for (output, partition) in outputs.iter().zip(partitions) {
        let members = partition.indices().iter().zip(partition.weights());
        for (row, (&unit, &weight)) in members.enumerate() {
            if unit >= batch_size {
                return Err(MoeError::DimensionMismatch {
                    expected: batch_size,
                    got: unit + 1,
                });
            }
            let scale = if apply_weights { f64::from(weight) } else { 1.0 };
            let slot = &mut accumulator[unit * width..(unit + 1) * width];

            for (acc, &value) in slot.iter_mut().zip(output.row(row)) {
                let value = match space {
                    CombineSpace::Linear => f64::from(value),
                    CombineSpace::Log => f64::from(value).exp(),
                };
                *acc += scale * value;
            }
        }
    }

    let data: Vec<f32> = match space {
        CombineSpace::Linear => accumulator.into_iter().map(|x| x as f32).collect(),
        CombineSpace::Log => accumulator
            .into_iter()
            .map(|x| if x == 0.0 { f64::EPSILON } else { x })
            .map(|x| x.ln() as f32)
            .collect(),
    };

    debug!(batch_size, width, apply_weights, %space, "Combined expert outputs");

    Ok(CombinedOutput {
        data,
        batch_size,
        width,
    })
}

/// Common width of all expert outputs.
///
/// Empty sub-batches still carry a width; every output must agree.
fn output_width(outputs: &[SubBatch]) -> MoeResult<usize> {
    let first = outputs.first().ok_or(MoeError::EmptyInput)?;
    let width = first.width();
    if let Some(other) = outputs.iter().find(|o| o.width() != width) {
        return Err(MoeError::DimensionMismatch {
            expected: width,
            got: other.width(),
        });
    }
    Ok(width)
}
