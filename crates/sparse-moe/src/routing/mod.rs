//! Noisy top-k router (gating network).
//!
//! Scores every expert for every unit, perturbs the scores while training,
//! keeps the k best per unit and estimates per-expert load.
//!
//! # Architecture
//!
//! ```text
//! Summaries [B, D]
//!        |
//!        v
//!   [Linear W_gate (D -> E)] --> clean scores
//!        |
//!        v
//!   [+ N(0,1) * (softplus(x W_noise) + eps)]  (training && noisy_gating)
//!        |
//!        v
//!   [Top-(k+1)] --> softmax over top k --> RoutingWeights [B, E]
//!        |
//!        v
//!   [Load] --> Expected (normal CDF) | Counted
//! ```
//!
//! # No Fallbacks Policy
//!
//! - k outside [1, E] -> `MoeError::ConfigError`
//! - Wrong summary width -> `MoeError::InvalidDimension`
//! - NaN summaries -> `MoeError::InvalidValue`
//! - Empty batch -> `MoeError::EmptyInput`

mod linear;
mod load;
pub mod math;
mod router;
pub mod top_k;

pub use linear::Linear;
pub use load::expected_load;
pub use router::{gate_scores, LoadKind, NoiseSample, Router, RoutingDecision};
pub use top_k::{select_top_k, TopKSelection};
