//! Error types for the sparse MoE pipeline.
//!
//! Every fallible operation returns [`MoeResult`]. Degenerate routing (a unit
//! routed nowhere, an expert with no units) is a valid state and is reported
//! through `RoutingStats` and `tracing`, never through this enum.

mod types;

#[cfg(test)]
mod tests;

pub use types::{MoeError, MoeResult};
