//! Tests for the composed layer.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::*;
use crate::config::{MoeConfig, RoutingConfig};
use crate::error::MoeError;
use crate::experts::{Activation, Expert, ExpertBank, FeedForwardExpert, IdentityExpert, ScaledExpert};
use crate::routing::{LoadKind, Linear, Router};
use crate::types::Batch;

fn config(num_experts: usize, top_k: usize) -> MoeConfig {
    let mut config = MoeConfig::default();
    config.routing = RoutingConfig {
        noisy_gating: false,
        ..RoutingConfig::new(num_experts, top_k)
    };
    config
}

/// Router whose clean scores equal the summaries (D == E).
fn pass_through_router(config: &MoeConfig) -> Router {
    let e = config.routing.num_experts;
    let mut eye = vec![0.0; e * e];
    for i in 0..e {
        eye[i * e + i] = 1.0;
    }
    Router::with_weights(
        Linear::with_weights(e, e, eye).unwrap(),
        Linear::zeros(e, e).unwrap(),
        &config.routing,
    )
    .unwrap()
}

fn scaled_bank(scales: &[f32], dim: usize) -> ExpertBank {
    ExpertBank::new(
        scales
            .iter()
            .map(|&s| Box::new(ScaledExpert::new(dim, s)) as Box<dyn Expert>)
            .collect(),
    )
    .unwrap()
}

#[test]
fn test_four_unit_scenario_end_to_end() {
    let mut config = config(3, 2);
    config.combine.apply_weights = false;
    let router = pass_through_router(&config);
    let bank = ExpertBank::replicated(&IdentityExpert::new(1), 3).unwrap();
    let moe = SparseMoe::with_router(router, bank, &config).unwrap();

    let summaries = vec![
        5.0, 1.0, 3.0, //
        2.0, 6.0, 4.0, //
        0.0, 0.0, 9.0, //
        7.0, 7.0, 1.0,
    ];
    let batch = Batch::new(4, summaries, 3, vec![1.0, 2.0, 3.0, 4.0], 1).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let out = moe.forward(&batch, false, &mut rng).unwrap();

    assert_eq!(out.decision.weights.selected_experts(0), vec![0, 2]);
    assert_eq!(out.decision.weights.selected_experts(1), vec![1, 2]);
    assert_eq!(out.decision.weights.selected_experts(2), vec![0, 2]);
    assert_eq!(out.decision.weights.selected_experts(3), vec![0, 1]);
    assert_eq!(out.stats.total_edges(), 8);
    assert_eq!(out.stats.part_sizes, vec![3, 2, 3]);
    assert_eq!(out.stats.dropped_units, 0);

    // two identity experts per unit, unweighted
    assert_eq!(out.output.as_slice(), &[2.0, 4.0, 6.0, 8.0]);
}

#[test]
fn test_top1_dominant_expert_returns_its_raw_output() {
    let config = config(3, 1);
    let router = Router::with_weights(
        Linear::with_weights(1, 3, vec![0.0, 5.0, 0.0]).unwrap(),
        Linear::zeros(1, 3).unwrap(),
        &config.routing,
    )
    .unwrap();
    let bank = scaled_bank(&[1.0, 2.0, 3.0], 2);
    let moe = SparseMoe::with_router(router, bank, &config).unwrap();

    let payloads = vec![1.0, -1.0, 0.5, 4.0, 3.0, 3.0];
    let batch = Batch::new(3, vec![1.0; 3], 1, payloads.clone(), 2).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let out = moe.forward(&batch, false, &mut rng).unwrap();

    let expected: Vec<f32> = payloads.iter().map(|x| x * 2.0).collect();
    assert_eq!(out.output.as_slice(), expected.as_slice());
    assert_eq!(out.stats.idle_experts, 2);
}

#[test]
fn test_aux_loss_is_scaled_penalty() {
    let mut config = config(3, 1);
    config.routing.load_balance_coef = 0.5;
    let router = Router::with_weights(
        Linear::with_weights(1, 3, vec![0.0, 5.0, 0.0]).unwrap(),
        Linear::zeros(1, 3).unwrap(),
        &config.routing,
    )
    .unwrap();
    let moe = SparseMoe::with_router(router, scaled_bank(&[1.0, 1.0, 1.0], 1), &config).unwrap();

    let batch = Batch::self_summarized(4, vec![1.0; 4], 1).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let out = moe.forward(&batch, false, &mut rng).unwrap();

    // importance and load are both [0, 4, 0]: cv2 = 3 each
    assert!((out.fairness.loss - 6.0).abs() < 1e-4, "loss {}", out.fairness.loss);
    assert!((out.aux_loss - 3.0).abs() < 1e-4);
    assert_eq!(out.decision.load_kind, LoadKind::Counted);
}

#[test]
fn test_single_expert_layer_has_zero_aux_loss() {
    let config = config(1, 1);
    let bank = ExpertBank::replicated(&IdentityExpert::new(2), 1).unwrap();
    let moe = SparseMoe::new(2, bank, &config).unwrap();

    let batch = Batch::self_summarized(3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let out = moe.forward(&batch, false, &mut rng).unwrap();

    assert_eq!(out.aux_loss, 0.0);
    assert_eq!(out.output.as_slice(), batch.payloads());
}

#[test]
fn test_noisy_training_is_reproducible_for_a_seed() {
    let mut config = MoeConfig::default();
    config.routing = RoutingConfig::new(4, 2);
    assert!(config.routing.noisy_gating);

    let mut init_rng = ChaCha8Rng::seed_from_u64(3);
    let prototype = FeedForwardExpert::new(3, 6, 3, Activation::Gelu, &mut init_rng).unwrap();
    let bank = ExpertBank::replicated(&prototype, 4).unwrap();
    let moe = SparseMoe::with_random_init(3, bank, &config, &mut init_rng).unwrap();

    let payloads: Vec<f32> = (0..24).map(|i| (i as f32 * 0.37).sin()).collect();
    let batch = Batch::self_summarized(8, payloads, 3).unwrap();

    let first = moe
        .forward(&batch, true, &mut ChaCha8Rng::seed_from_u64(99))
        .unwrap();
    let second = moe
        .forward(&batch, true, &mut ChaCha8Rng::seed_from_u64(99))
        .unwrap();

    assert_eq!(first.output, second.output);
    assert_eq!(first.decision.load, second.decision.load);
    assert_eq!(first.decision.load_kind, LoadKind::Expected);
    assert!(first.decision.load.iter().all(|&l| (0.0..=8.0).contains(&l)));
}

#[test]
fn test_bank_size_must_match_num_experts() {
    let config = config(4, 2);
    let bank = ExpertBank::replicated(&IdentityExpert::new(2), 3).unwrap();
    let result = SparseMoe::new(2, bank, &config);
    assert!(matches!(result, Err(MoeError::ConfigError { .. })));
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = config(2, 3);
    let bank = ExpertBank::replicated(&IdentityExpert::new(2), 2).unwrap();
    let result = SparseMoe::new(2, bank, &config);
    assert!(matches!(result, Err(MoeError::ConfigError { .. })));
}

#[test]
fn test_payload_width_mismatch_fails() {
    let config = config(2, 1);
    let bank = ExpertBank::replicated(&IdentityExpert::new(3), 2).unwrap();
    let moe = SparseMoe::new(2, bank, &config).unwrap();

    let batch = Batch::self_summarized(2, vec![1.0; 4], 2).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let result = moe.forward(&batch, false, &mut rng);
    assert!(matches!(
        result,
        Err(MoeError::DimensionMismatch {
            expected: 3,
            got: 2
        })
    ));
}
