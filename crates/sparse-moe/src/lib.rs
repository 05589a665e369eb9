//! Sparse mixture-of-experts routing engine.
//!
//! Routes each unit of a batch to a few experts out of a fixed bank, runs
//! every expert only on the units routed to it, and recombines the results
//! in original batch order. The same routing decision yields a load-fairness
//! penalty for use as an auxiliary training signal.
//!
//! # Pipeline
//!
//! ```text
//! Batch -> Router -> Dispatcher -> ExpertBank -> Combiner -> CombinedOutput
//!            |
//!            +-> Fairness -> aux_loss
//! ```
//!
//! # Module Organization
//!
//! - [`config`]: Routing and combine configuration (TOML + env overrides)
//! - [`error`]: [`MoeError`] and [`MoeResult`]
//! - [`types`]: Batches, routing weights, partitions and outputs
//! - [`routing`]: Noisy top-k router
//! - [`dispatch`]: Partitioning units by expert
//! - [`experts`]: The [`experts::Expert`] trait and the expert bank
//! - [`combine`]: Weighted recombination into batch order
//! - [`fairness`]: Importance and load imbalance
//! - [`layer`]: [`SparseMoe`], the complete layer
//!
//! # Quick Start
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use sparse_moe::experts::{Activation, ExpertBank, FeedForwardExpert};
//! use sparse_moe::types::Batch;
//! use sparse_moe::{MoeConfig, SparseMoe};
//!
//! let mut config = MoeConfig::default();
//! config.routing.num_experts = 4;
//! config.routing.top_k = 2;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let expert = FeedForwardExpert::new(8, 16, 8, Activation::Gelu, &mut rng).unwrap();
//! let bank = ExpertBank::replicated(&expert, 4).unwrap();
//! let moe = SparseMoe::with_random_init(8, bank, &config, &mut rng).unwrap();
//!
//! let batch = Batch::self_summarized(2, vec![0.1; 16], 8).unwrap();
//! let out = moe.forward(&batch, true, &mut rng).unwrap();
//! assert_eq!(out.output.as_slice().len(), 16);
//! assert!(out.aux_loss >= 0.0);
//! ```

pub mod combine;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod experts;
pub mod fairness;
pub mod layer;
pub mod routing;
pub mod types;

pub use config::{CombineConfig, CombineSpace, MoeConfig, RoutingConfig};
pub use error::{MoeError, MoeResult};
pub use layer::{MoeOutput, SparseMoe};
pub use routing::{Router, RoutingDecision};
