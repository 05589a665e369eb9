//! Core error types for the routing pipeline.

use thiserror::Error;

/// Error type for all routing, dispatch, combine and expert failures.
///
/// # Error Categories
///
/// | Category | Variants | Recovery Strategy |
/// |----------|----------|-------------------|
/// | Configuration | ConfigError | Fix configuration |
/// | Shape | InvalidDimension, DimensionMismatch | Fix the collaborator |
/// | Validation | EmptyInput, InvalidValue, InvalidExpertIndex | Fix input data |
/// | Processing | RoutingError | Check gate parameters for overflow |
/// | Expert | ExpertError | Inspect the failing expert |
///
/// # Design Principles
///
/// - **FAIL FAST**: contract violations surface immediately
/// - **NO RETRIES**: routing is a pure computation, transient failure has no meaning
/// - **CONTEXTUAL**: every variant carries the values needed to debug it
#[derive(Debug, Error)]
pub enum MoeError {
    // === Configuration Errors ===
    /// Invalid construction parameters (k > E, E < 1, bad epsilon, bad TOML).
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    // === Shape Errors ===
    /// A declared dimension is wrong (zero width, summary width mismatch).
    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    /// A buffer length does not match the shape it claims to have.
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    // === Validation Errors ===
    /// Empty batch provided.
    #[error("Empty input not allowed")]
    EmptyInput,

    /// Input contains NaN at a specific flat index.
    #[error("Invalid value at index {index}: {value}")]
    InvalidValue { index: usize, value: f32 },

    /// Expert index outside the bank.
    #[error("Invalid expert index: {index} (max: {max})")]
    InvalidExpertIndex { index: usize, max: usize },

    // === Processing Errors ===
    /// Gating failed numerically (non-finite scores reaching the softmax).
    #[error("Routing error: {message}")]
    RoutingError { message: String },

    // === Expert Errors ===
    /// An expert failed while processing its partition.
    #[error("Expert {expert_id} failed: {message}")]
    ExpertError { expert_id: usize, message: String },
}

/// Result type alias for MoE operations.
pub type MoeResult<T> = Result<T, MoeError>;
