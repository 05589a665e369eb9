//! Routing and full-layer benchmarks.
//!
//! - Router: clean vs noisy gating over growing batches
//! - Dispatch + combine round trip with identity experts
//! - Full forward pass with feed-forward experts

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sparse_moe::combine::combine;
use sparse_moe::config::{CombineSpace, MoeConfig, RoutingConfig};
use sparse_moe::dispatch::SparseDispatcher;
use sparse_moe::experts::{Activation, ExpertBank, FeedForwardExpert, IdentityExpert};
use sparse_moe::routing::Router;
use sparse_moe::types::Batch;
use sparse_moe::SparseMoe;

const DIM: usize = 64;
const NUM_EXPERTS: usize = 16;
const TOP_K: usize = 4;

fn random_batch(rng: &mut StdRng, batch_size: usize) -> Batch {
    let payloads: Vec<f32> = (0..batch_size * DIM).map(|_| rng.gen::<f32>() - 0.5).collect();
    Batch::self_summarized(batch_size, payloads, DIM).unwrap()
}

// ============================================================================
// BENCHMARKS
// ============================================================================

fn bench_router(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let config = RoutingConfig::new(NUM_EXPERTS, TOP_K);
    let router = Router::with_random_init(DIM, &config, &mut rng).unwrap();

    let mut group = c.benchmark_group("router");
    for batch_size in [32, 128, 512] {
        let batch = random_batch(&mut rng, batch_size);

        group.bench_with_input(BenchmarkId::new("clean", batch_size), &batch, |bench, b| {
            bench.iter(|| router.route_batch(black_box(b), false, &mut rng).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("noisy", batch_size), &batch, |bench, b| {
            bench.iter(|| router.route_batch(black_box(b), true, &mut rng).unwrap())
        });
    }
    group.finish();
}

fn bench_dispatch_combine(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let config = RoutingConfig::new(NUM_EXPERTS, TOP_K);
    let router = Router::with_random_init(DIM, &config, &mut rng).unwrap();
    let bank = ExpertBank::replicated(&IdentityExpert::new(DIM), NUM_EXPERTS).unwrap();

    let batch = random_batch(&mut rng, 256);
    let decision = router.route_batch(&batch, false, &mut rng).unwrap();

    c.bench_function("dispatch_combine_256", |bench| {
        bench.iter(|| {
            let dispatcher = SparseDispatcher::new(black_box(&decision.weights));
            let partitions = dispatcher.dispatch(&batch).unwrap();
            let outputs = bank.run(&partitions).unwrap();
            combine(&outputs, &partitions, 256, true, CombineSpace::Linear).unwrap()
        })
    });
}

fn bench_forward(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(42);
    let mut config = MoeConfig::default();
    config.routing = RoutingConfig::new(NUM_EXPERTS, TOP_K);

    let expert = FeedForwardExpert::new(DIM, 4 * DIM, DIM, Activation::Gelu, &mut rng).unwrap();
    let bank = ExpertBank::replicated(&expert, NUM_EXPERTS).unwrap();
    let moe = SparseMoe::with_random_init(DIM, bank, &config, &mut rng).unwrap();

    let mut group = c.benchmark_group("forward");
    for batch_size in [32, 128] {
        let batch = random_batch(&mut rng, batch_size);
        group.bench_with_input(BenchmarkId::new("train", batch_size), &batch, |bench, b| {
            bench.iter(|| moe.forward(black_box(b), true, &mut rng).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_router, bench_dispatch_combine, bench_forward);
criterion_main!(benches);
