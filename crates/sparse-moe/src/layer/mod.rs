//! Complete sparse MoE layer.
//!
//! # Architecture
//!
//! ```text
//! Batch ──> Router ──> RoutingDecision (weights, load)
//!   │                      │            │
//!   │                      v            v
//!   └──────────────> Dispatcher     Fairness ──> aux_loss
//!                          │
//!                          v
//!                    [Partition; E]
//!                          │
//!                          v
//!                     ExpertBank (parallel)
//!                          │
//!                          v
//!                    [SubBatch; E] ──> Combiner ──> CombinedOutput [B, O]
//! ```

mod sparse_moe;

#[cfg(test)]
mod tests;

pub use sparse_moe::{MoeOutput, SparseMoe};
