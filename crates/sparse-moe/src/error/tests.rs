//! Tests for MoE error types.

use super::*;

// ============================================================
// MESSAGE TESTS
// ============================================================

#[test]
fn test_config_error_shows_message() {
    let err = MoeError::ConfigError {
        message: "top_k must be in [1, 4], got 5".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("Configuration error"));
    assert!(msg.contains("top_k"));
}

#[test]
fn test_invalid_dimension_shows_both_values() {
    let err = MoeError::InvalidDimension {
        expected: 16,
        actual: 12,
    };
    let msg = err.to_string();
    assert!(msg.contains("16"));
    assert!(msg.contains("12"));
}

#[test]
fn test_dimension_mismatch_shows_both_values() {
    let err = MoeError::DimensionMismatch {
        expected: 3,
        got: 2,
    };
    let msg = err.to_string();
    assert!(msg.contains("expected 3"));
    assert!(msg.contains("got 2"));
}

#[test]
fn test_invalid_value_shows_index_and_value() {
    let err = MoeError::InvalidValue {
        index: 7,
        value: f32::NAN,
    };
    let msg = err.to_string();
    assert!(msg.contains('7'));
    assert!(msg.contains("NaN"));
}

#[test]
fn test_expert_error_names_expert() {
    let err = MoeError::ExpertError {
        expert_id: 2,
        message: "weights not loaded".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("Expert 2"));
    assert!(msg.contains("weights not loaded"));
}

#[test]
fn test_empty_input_error_message() {
    assert!(MoeError::EmptyInput.to_string().contains("Empty"));
}

#[test]
fn test_result_alias_propagates() {
    fn inner() -> MoeResult<usize> {
        Err(MoeError::InvalidExpertIndex { index: 9, max: 4 })
    }
    fn outer() -> MoeResult<usize> {
        let n = inner()?;
        Ok(n + 1)
    }
    assert!(matches!(
        outer(),
        Err(MoeError::InvalidExpertIndex { index: 9, max: 4 })
    ));
}
