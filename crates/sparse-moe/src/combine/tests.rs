//! Tests for the combiner.

use super::*;
use crate::config::{CombineConfig, CombineSpace};
use crate::dispatch::SparseDispatcher;
use crate::error::MoeError;
use crate::types::{Batch, Partition, RoutingWeights, SubBatch};

/// Expert outputs equal to their inputs.
fn identity_outputs(partitions: &[Partition]) -> Vec<SubBatch> {
    partitions
        .iter()
        .map(|p| SubBatch::new(p.payloads().to_vec(), p.len(), p.payload_dim()).unwrap())
        .collect()
}

fn fixture() -> (Batch, RoutingWeights) {
    let batch = Batch::self_summarized(3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2).unwrap();
    let weights = RoutingWeights::from_dense(
        vec![
            0.25, 0.75, // unit 0 -> both
            0.00, 0.00, // unit 1 -> dropped
            1.00, 0.00, // unit 2 -> expert 0
        ],
        3,
        2,
    )
    .unwrap();
    (batch, weights)
}

#[test]
fn test_identity_round_trip_without_weights_sums_contributions() {
    let (batch, weights) = fixture();
    let partitions = SparseDispatcher::new(&weights).dispatch(&batch).unwrap();
    let outputs = identity_outputs(&partitions);

    let combined = combine(&outputs, &partitions, 3, false, CombineSpace::Linear).unwrap();

    // unit 0 went to two experts: payload counted twice
    assert_eq!(combined.row(0), &[2.0, 4.0]);
    assert_eq!(combined.row(1), &[0.0, 0.0]);
    assert_eq!(combined.row(2), &[5.0, 6.0]);
}

#[test]
fn test_identity_round_trip_with_weights_recovers_payload() {
    let (batch, weights) = fixture();
    let partitions = SparseDispatcher::new(&weights).dispatch(&batch).unwrap();
    let outputs = identity_outputs(&partitions);

    let combined = combine(&outputs, &partitions, 3, true, CombineSpace::Linear).unwrap();

    for (got, want) in combined.row(0).iter().zip(batch.payload(0)) {
        assert!((got - want).abs() < 1e-6);
    }
    assert_eq!(combined.row(1), &[0.0, 0.0]);
    assert_eq!(combined.batch_size(), 3);
    assert_eq!(combined.width(), 2);
}

#[test]
fn test_weighted_sum_of_distinct_expert_outputs() {
    let (batch, weights) = fixture();
    let partitions = SparseDispatcher::new(&weights).dispatch(&batch).unwrap();
    // expert 0 emits 10 per unit, expert 1 emits 20
    let outputs = vec![
        SubBatch::new(vec![10.0; partitions[0].len()], partitions[0].len(), 1).unwrap(),
        SubBatch::new(vec![20.0; partitions[1].len()], partitions[1].len(), 1).unwrap(),
    ];

    let combined = Combiner::new(CombineConfig::default())
        .combine(&outputs, &partitions, 3)
        .unwrap();

    assert!((combined.row(0)[0] - (0.25 * 10.0 + 0.75 * 20.0)).abs() < 1e-5);
    assert_eq!(combined.row(1)[0], 0.0);
    assert!((combined.row(2)[0] - 10.0).abs() < 1e-6);
}

#[test]
fn test_log_space_combination() {
    let (batch, weights) = fixture();
    let partitions = SparseDispatcher::new(&weights).dispatch(&batch).unwrap();
    let ln_half = 0.5f32.ln();
    let outputs = vec![
        SubBatch::new(vec![ln_half; partitions[0].len()], partitions[0].len(), 1).unwrap(),
        SubBatch::new(vec![ln_half; partitions[1].len()], partitions[1].len(), 1).unwrap(),
    ];

    let combined = combine(&outputs, &partitions, 3, true, CombineSpace::Log).unwrap();

    // convex mix of equal probabilities stays at 0.5
    assert!((combined.row(0)[0] - ln_half).abs() < 1e-5);
    assert!((combined.row(2)[0] - ln_half).abs() < 1e-5);
    // dropped unit gets ln(eps), not -inf
    assert!((combined.row(1)[0] - CombineSpace::Log.fill_value()).abs() < 1e-3);
    assert!(combined.row(1)[0].is_finite());
}

#[test]
fn test_empty_partition_output_is_accepted() {
    let weights = RoutingWeights::from_dense(vec![1.0, 0.0, 1.0, 0.0], 2, 2).unwrap();
    let batch = Batch::self_summarized(2, vec![3.0, 4.0], 1).unwrap();
    let partitions = SparseDispatcher::new(&weights).dispatch(&batch).unwrap();
    let outputs = vec![
        SubBatch::new(vec![3.0, 4.0], 2, 1).unwrap(),
        SubBatch::empty(1),
    ];

    let combined = combine(&outputs, &partitions, 2, true, CombineSpace::Linear).unwrap();
    assert_eq!(combined.into_vec(), vec![3.0, 4.0]);
}

#[test]
fn test_row_count_mismatch_fails() {
    let (batch, weights) = fixture();
    let partitions = SparseDispatcher::new(&weights).dispatch(&batch).unwrap();
    let outputs = vec![
        SubBatch::new(vec![1.0], 1, 1).unwrap(), // partition 0 has 2 units
        SubBatch::new(vec![1.0], 1, 1).unwrap(),
    ];

    let result = combine(&outputs, &partitions, 3, true, CombineSpace::Linear);
    assert!(matches!(
        result,
        Err(MoeError::DimensionMismatch {
            expected: 2,
            got: 1
        })
    ));
}

#[test]
fn test_width_mismatch_fails() {
    let (batch, weights) = fixture();
    let partitions = SparseDispatcher::new(&weights).dispatch(&batch).unwrap();
    let outputs = vec![
        SubBatch::new(vec![1.0; 2], 2, 1).unwrap(),
        SubBatch::new(vec![1.0; 2], 1, 2).unwrap(),
    ];

    let result = combine(&outputs, &partitions, 3, true, CombineSpace::Linear);
    assert!(matches!(result, Err(MoeError::DimensionMismatch { .. })));
}

#[test]
fn test_output_count_mismatch_fails() {
    let (batch, weights) = fixture();
    let partitions = SparseDispatcher::new(&weights).dispatch(&batch).unwrap();
    let result = combine(
        &[SubBatch::empty(1)],
        &partitions,
        3,
        true,
        CombineSpace::Linear,
    );
    assert!(matches!(result, Err(MoeError::DimensionMismatch { .. })));
}
