//! Expert bank: the workers units are routed to.
//!
//! Experts are opaque, length- and order-preserving transforms over a
//! sub-batch of payload rows. The bank runs every non-empty partition
//! through its expert in parallel and checks each output against the
//! partition it came from.
//!
//! # No Fallbacks Policy
//!
//! - Failure inside an expert -> `MoeError::ExpertError`
//! - Output length != partition rows * output_dim -> `MoeError::DimensionMismatch`
//! - Partition count != expert count -> `MoeError::DimensionMismatch`
//!
//! # Module Organization
//!
//! - [`activation`]: Activation functions (GELU, ReLU, SiLU)
//! - [`expert`]: The [`Expert`] trait and provided experts
//! - [`bank`]: Expert bank with parallel execution

mod activation;
mod bank;
mod expert;

pub use activation::Activation;
pub use bank::ExpertBank;
pub use expert::{Expert, FeedForwardExpert, IdentityExpert, ScaledExpert};
