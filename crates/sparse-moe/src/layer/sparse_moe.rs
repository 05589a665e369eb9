//! The composed layer and its forward-pass output.

use rand::Rng;
use tracing::{debug, info};

use crate::combine::Combiner;
use crate::config::MoeConfig;
use crate::dispatch::{RoutingStats, SparseDispatcher};
use crate::error::{MoeError, MoeResult};
use crate::experts::ExpertBank;
use crate::fairness::{imbalance, FairnessReport};
use crate::routing::{Router, RoutingDecision};
use crate::types::{Batch, CombinedOutput};

/// Everything one forward pass produces.
#[derive(Debug, Clone)]
pub struct MoeOutput {
    /// Batch-aligned combined output [batch_size, output_dim]
    pub output: CombinedOutput,
    /// Fairness penalty scaled by `load_balance_coef`
    pub aux_loss: f32,
    pub fairness: FairnessReport,
    pub decision: RoutingDecision,
    pub stats: RoutingStats,
}

/// Router, expert bank and combiner wired into one layer.
///
/// # Example
///
/// ```rust
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use sparse_moe::config::MoeConfig;
/// use sparse_moe::experts::{ExpertBank, IdentityExpert};
/// use sparse_moe::types::Batch;
/// use sparse_moe::SparseMoe;
///
/// let mut config = MoeConfig::default();
/// config.routing.num_experts = 4;
/// config.routing.top_k = 2;
///
/// let bank = ExpertBank::replicated(&IdentityExpert::new(3), 4).unwrap();
/// let moe = SparseMoe::new(3, bank, &config).unwrap();
///
/// let batch = Batch::self_summarized(2, vec![0.5; 6], 3).unwrap();
/// let mut rng = ChaCha8Rng::seed_from_u64(0);
/// let out = moe.forward(&batch, false, &mut rng).unwrap();
/// assert_eq!(out.output.batch_size(), 2);
/// assert_eq!(out.output.width(), 3);
/// ```
#[derive(Debug)]
pub struct SparseMoe {
    router: Router,
    bank: ExpertBank,
    combiner: Combiner,
    load_balance_coef: f32,
}

impl SparseMoe {
    /// Create a layer with a zero-initialized router.
    ///
    /// # Errors
    ///
    /// - `MoeError::ConfigError` if the config is invalid or the bank size
    ///   differs from `num_experts`
    /// - `MoeError::InvalidDimension` if `summary_dim` is 0
    pub fn new(summary_dim: usize, bank: ExpertBank, config: &MoeConfig) -> MoeResult<Self> {
        config.validate()?;
        let router = Router::new(summary_dim, &config.routing)?;
        Self::with_router(router, bank, config)
    }

    /// Create a layer with Xavier-initialized gate and noise projections.
    ///
    /// # Errors
    ///
    /// Same as [`SparseMoe::new`].
    pub fn with_random_init<R: Rng + ?Sized>(
        summary_dim: usize,
        bank: ExpertBank,
        config: &MoeConfig,
        rng: &mut R,
    ) -> MoeResult<Self> {
        config.validate()?;
        let router = Router::with_random_init(summary_dim, &config.routing, rng)?;
        Self::with_router(router, bank, config)
    }

    /// Create a layer from an existing router.
    ///
    /// # Errors
    ///
    /// Returns `MoeError::ConfigError` if the router and bank disagree on the
    /// number of experts.
    pub fn with_router(router: Router, bank: ExpertBank, config: &MoeConfig) -> MoeResult<Self> {
        if router.num_experts() != bank.num_experts() {
            return Err(MoeError::ConfigError {
                message: format!(
                    "router has {} experts but bank has {}",
                    router.num_experts(),
                    bank.num_experts()
                ),
            });
        }

        info!(
            num_experts = bank.num_experts(),
            top_k = router.top_k(),
            summary_dim = router.summary_dim(),
            payload_dim = bank.input_dim(),
            output_dim = bank.output_dim(),
            "Created SparseMoe layer"
        );

        Ok(Self {
            router,
            bank,
            combiner: Combiner::new(config.combine.clone()),
            load_balance_coef: config.routing.load_balance_coef,
        })
    }

    /// Route, dispatch, run experts and combine.
    ///
    /// # Arguments
    ///
    /// * `batch` - Units to process; payload width must match the bank's input width
    /// * `training` - Enables gating noise and expected load
    /// * `rng` - Noise source
    ///
    /// # Errors
    ///
    /// - `MoeError::InvalidDimension` if the summary width differs from the router's
    /// - `MoeError::DimensionMismatch` if the payload width differs from the bank's
    /// - `MoeError::ExpertError` if an expert fails
    pub fn forward<R: Rng + ?Sized>(
        &self,
        batch: &Batch,
        training: bool,
        rng: &mut R,
    ) -> MoeResult<MoeOutput> {
        if batch.payload_dim() != self.bank.input_dim() {
            return Err(MoeError::DimensionMismatch {
                expected: self.bank.input_dim(),
                got: batch.payload_dim(),
            });
        }

        let decision = self.router.route_batch(batch, training, rng)?;

        let dispatcher = SparseDispatcher::new(&decision.weights);
        let stats = dispatcher.stats();
        let partitions = dispatcher.dispatch(batch)?;

        let outputs = self.bank.run(&partitions)?;
        let output = self
            .combiner
            .combine(&outputs, &partitions, batch.batch_size())?;

        let fairness = imbalance(&decision.weights, &decision.load)?;
        let aux_loss = fairness.scaled_loss(self.load_balance_coef);

        debug!(
            batch_size = batch.batch_size(),
            training,
            dropped_units = stats.dropped_units,
            idle_experts = stats.idle_experts,
            aux_loss,
            "SparseMoe forward pass"
        );

        Ok(MoeOutput {
            output,
            aux_loss,
            fairness,
            decision,
            stats,
        })
    }

    /// Get the router (for introspection).
    #[inline]
    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Get the expert bank (for introspection).
    #[inline]
    #[must_use]
    pub fn bank(&self) -> &ExpertBank {
        &self.bank
    }

    #[inline]
    #[must_use]
    pub fn load_balance_coef(&self) -> f32 {
        self.load_balance_coef
    }

    #[inline]
    #[must_use]
    pub fn output_dim(&self) -> usize {
        self.bank.output_dim()
    }
}
