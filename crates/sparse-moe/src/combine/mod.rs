//! Gather side of the MoE layer: sum expert outputs back into batch order.
//!
//! Expert outputs are walked in expert order and, within an expert, in
//! partition order (the order [`crate::dispatch`] produced). Each row is
//! optionally scaled by its routing weight and added into the accumulator
//! row of its original unit, so a unit routed to several experts receives
//! the sum of their weighted contributions.

mod combiner;

#[cfg(test)]
mod tests;

pub use combiner::{combine, Combiner};
