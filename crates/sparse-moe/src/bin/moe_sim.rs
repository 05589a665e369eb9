//! moe-sim
//!
//! Runs one sparse MoE forward pass over a random batch and reports how the
//! batch was routed.
//!
//! # Commands
//!
//! - `run`: Build a layer from config, route a seeded random batch, print stats
//! - `show-config`: Print the effective configuration as TOML
//!
//! Exit code 1 on any error.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use sparse_moe::experts::{Activation, ExpertBank, FeedForwardExpert};
use sparse_moe::types::Batch;
use sparse_moe::{MoeConfig, MoeResult, SparseMoe};

/// Sparse MoE routing simulator
#[derive(Parser)]
#[command(name = "moe-sim")]
#[command(version)]
#[command(about = "Route a random batch through a sparse mixture-of-experts layer")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML config file; defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one forward pass
    Run(RunArgs),
    /// Print the effective configuration
    ShowConfig,
}

#[derive(Args)]
struct RunArgs {
    /// Seed for parameters, batch contents and gating noise
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Units per batch
    #[arg(short, long, default_value_t = 32)]
    batch_size: usize,

    /// Channels per unit (summary width)
    #[arg(short, long, default_value_t = 16)]
    dim: usize,

    /// Spatial positions per channel; summaries are channel means when > 1
    #[arg(long, default_value_t = 1)]
    spatial: usize,

    /// Expert hidden width
    #[arg(long, default_value_t = 64)]
    hidden: usize,

    /// Expert hidden activation
    #[arg(long, value_enum, default_value_t = Activation::Gelu)]
    activation: Activation,

    /// Training mode (gating noise, expected load)
    #[arg(long)]
    train: bool,
}

fn main() {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let result = load_config(cli.config.as_ref()).and_then(|config| match cli.command {
        Commands::Run(args) => run(&config, &args),
        Commands::ShowConfig => config.to_toml_string().map(|toml| print!("{toml}")),
    });

    if let Err(e) = result {
        error!(error = %e, "moe-sim failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&PathBuf>) -> MoeResult<MoeConfig> {
    let config = match path {
        Some(path) => MoeConfig::from_file(path)?,
        None => MoeConfig::default(),
    }
    .with_env_overrides();
    config.validate()?;
    Ok(config)
}

fn run(config: &MoeConfig, args: &RunArgs) -> MoeResult<()> {
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let payload_dim = args.dim * args.spatial;

    let prototype = FeedForwardExpert::new(
        payload_dim,
        args.hidden,
        payload_dim,
        args.activation,
        &mut rng,
    )?;
    let bank = ExpertBank::replicated(&prototype, config.routing.num_experts)?;
    let moe = SparseMoe::with_random_init(args.dim, bank, config, &mut rng)?;

    let payloads: Vec<f32> = (0..args.batch_size * payload_dim)
        .map(|_| {
            let z: f32 = StandardNormal.sample(&mut rng);
            z
        })
        .collect();
    let batch = if args.spatial > 1 {
        Batch::from_feature_maps(args.batch_size, payloads, args.dim, args.spatial)?
    } else {
        Batch::self_summarized(args.batch_size, payloads, args.dim)?
    };

    info!(
        seed = args.seed,
        batch_size = args.batch_size,
        train = args.train,
        "Running forward pass"
    );
    let out = moe.forward(&batch, args.train, &mut rng)?;

    println!(
        "experts={} top_k={} batch_size={} train={}",
        config.routing.num_experts, config.routing.top_k, args.batch_size, args.train
    );
    println!("part_sizes={:?}", out.stats.part_sizes);
    println!("load({:?})={:?}", out.decision.load_kind, out.decision.load);
    println!("importance={:?}", out.fairness.importance);
    println!(
        "routed_edges={} dropped_units={} idle_experts={}",
        out.stats.total_edges(),
        out.stats.dropped_units,
        out.stats.idle_experts
    );
    println!(
        "importance_cv2={:.6} load_cv2={:.6} aux_loss={:.6}",
        out.fairness.importance_cv2, out.fairness.load_cv2, out.aux_loss
    );

    Ok(())
}
