//! Router structure and forward pass.
//!
//! # Module Structure
//!
//! - `core`: struct definition and constructors
//! - `forward`: routing forward pass and the score-level gating entry point

mod core;
mod forward;


pub use self::core::Router;
pub use self::forward::{gate_scores, LoadKind, NoiseSample, RoutingDecision};
