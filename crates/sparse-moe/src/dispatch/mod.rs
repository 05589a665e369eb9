//! Scatter side of the MoE layer: partition a batch by routed expert.
//!
//! # Ordering Contract
//!
//! Partitions are built in expert order and, within an expert, in ascending
//! original unit index. [`crate::combine`] walks outputs in exactly this
//! order, so dispatch and combine agree without sharing state.
//!
//! A unit whose weight row is all zero is dropped: it lands in no partition
//! and is counted in [`RoutingStats::dropped_units`].

mod dispatcher;
mod stats;


pub use dispatcher::{dispatch, RoutingEdge, SparseDispatcher};
pub use stats::RoutingStats;
