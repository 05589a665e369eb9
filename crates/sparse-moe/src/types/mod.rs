//! Data model shared by the router, dispatcher and combiner.
//!
//! All buffers are flat, row-major `f32` vectors paired with explicit row
//! counts and widths, matching the `&[f32]` + `batch_size` convention used by
//! the layers in [`crate::routing`] and [`crate::experts`].

mod batch;
mod output;
mod partition;
mod weights;


pub use batch::Batch;
pub use output::{CombinedOutput, SubBatch};
pub use partition::Partition;
pub use weights::RoutingWeights;

use crate::error::{MoeError, MoeResult};

/// Reject NaN anywhere in `values`, reporting the first offending index.
pub(crate) fn ensure_no_nan(values: &[f32]) -> MoeResult<()> {
    match values.iter().position(|v| v.is_nan()) {
        Some(index) => Err(MoeError::InvalidValue {
            index,
            value: values[index],
        }),
        None => Ok(()),
    }
}
