//! End-to-end tests for checkpoint normalization.
//!
//! Covers:
//! - save → load round trip through safetensors (strict strategy)
//! - key set and order preservation through normalization
//! - element-for-element numeric fidelity
//! - opaque pass-through (the `{"layer1.weight": tensor, "epoch": 12}`
//!   scenario)
//! - the same-path guard and the all-strategies-failed error
//! - the sidecar stamp

use candle_core::{Device, Tensor};
use edgefix_checkpoint::{
    load_checkpoint, normalize_checkpoint, save_checkpoint, Checkpoint, CheckpointError, Value,
};
use std::fs;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A small state dict: two f32 tensors plus an opaque epoch counter.
fn sample_checkpoint() -> Checkpoint {
    let mut ckpt = Checkpoint::new();
    ckpt.push_tensor(
        "layer1.weight",
        Tensor::from_vec(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], (2, 3), &Device::Cpu).unwrap(),
    );
    ckpt.push_tensor(
        "layer1.bias",
        Tensor::from_vec(vec![-0.25f32, 0.75], (2,), &Device::Cpu).unwrap(),
    );
    ckpt.push_opaque("epoch", "12");
    ckpt
}

// ---------------------------------------------------------------------------
// Round trip
// ---------------------------------------------------------------------------

#[test]
fn safetensors_round_trip_uses_strict_strategy() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.safetensors");
    save_checkpoint(&sample_checkpoint(), &path).unwrap();

    let (loaded, strategy) = load_checkpoint(&path).unwrap();
    assert_eq!(strategy, "safetensors");
    assert_eq!(loaded.tensor_count(), 2);
    assert_eq!(loaded.opaque_count(), 1);
}

#[test]
fn round_trip_preserves_tensor_order_and_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.safetensors");
    let original = sample_checkpoint();
    save_checkpoint(&original, &path).unwrap();

    let (loaded, _) = load_checkpoint(&path).unwrap();
    // The format canonicalizes physical tensor order, so compare as sets;
    // opaque entries always follow the tensor table.
    let mut keys: Vec<&str> = loaded.keys().collect();
    assert_eq!(keys.pop(), Some("epoch"));
    keys.sort_unstable();
    assert_eq!(keys, vec!["layer1.bias", "layer1.weight"]);

    let weight = loaded.get("layer1.weight").unwrap().as_tensor().unwrap();
    assert_eq!(weight.dims(), &[2, 3]);
    assert_eq!(
        weight.to_vec2::<f32>().unwrap(),
        vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]
    );

    let bias = loaded.get("layer1.bias").unwrap().as_tensor().unwrap();
    assert_eq!(bias.to_vec1::<f32>().unwrap(), vec![-0.25, 0.75]);
}

#[test]
fn round_trip_preserves_opaque_entries() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("model.safetensors");
    save_checkpoint(&sample_checkpoint(), &path).unwrap();

    let (loaded, _) = load_checkpoint(&path).unwrap();
    assert_eq!(loaded.get("epoch").unwrap().as_opaque(), Some("12"));
}

// ---------------------------------------------------------------------------
// Normalization pipeline
// ---------------------------------------------------------------------------

#[test]
fn normalize_produces_equivalent_host_checkpoint() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("model.safetensors");
    let dest = dir.path().join("model-fixed.safetensors");
    save_checkpoint(&sample_checkpoint(), &src).unwrap();

    let report = normalize_checkpoint(&src, &dest).unwrap();
    assert_eq!(report.strategy, "safetensors");
    assert_eq!(report.tensors, 2);
    assert_eq!(report.opaque, 1);
    assert!(!report.sha256.is_empty());

    let (normalized, _) = load_checkpoint(&dest).unwrap();
    let original = sample_checkpoint();
    let mut expected: Vec<&str> = original.keys().collect();
    let mut actual: Vec<&str> = normalized.keys().collect();
    expected.sort_unstable();
    actual.sort_unstable();
    assert_eq!(actual, expected);

    for (name, value) in original.entries() {
        match value {
            Value::Tensor(t) => {
                let n = normalized.get(name).unwrap().as_tensor().unwrap();
                assert!(matches!(n.device(), Device::Cpu));
                assert_eq!(
                    t.flatten_all().unwrap().to_vec1::<f32>().unwrap(),
                    n.flatten_all().unwrap().to_vec1::<f32>().unwrap(),
                    "numeric drift in {name}"
                );
            }
            Value::Opaque(s) => {
                assert_eq!(normalized.get(name).unwrap().as_opaque(), Some(s.as_str()));
            }
        }
    }
}

#[test]
fn normalize_twice_is_stable() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("model.safetensors");
    let once = dir.path().join("once.safetensors");
    let twice = dir.path().join("twice.safetensors");
    save_checkpoint(&sample_checkpoint(), &src).unwrap();

    let first = normalize_checkpoint(&src, &once).unwrap();
    let second = normalize_checkpoint(&once, &twice).unwrap();
    assert_eq!(first.tensors, second.tensors);
    assert_eq!(first.opaque, second.opaque);
    assert_eq!(
        fs::read(&once).unwrap(),
        fs::read(&twice).unwrap(),
        "re-normalizing a normalized checkpoint must be byte-stable"
    );
}

#[test]
fn normalize_writes_sidecar_stamp() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("model.safetensors");
    let dest = dir.path().join("model-fixed.safetensors");
    save_checkpoint(&sample_checkpoint(), &src).unwrap();

    let report = normalize_checkpoint(&src, &dest).unwrap();

    let stamp_path = dir.path().join("model-fixed.safetensors.meta.json");
    let stamp: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(stamp_path).unwrap()).unwrap();
    assert_eq!(stamp["strategy"], "safetensors");
    assert_eq!(stamp["tensors"], 2);
    assert_eq!(stamp["sha256"], serde_json::Value::String(report.sha256));
    assert!(stamp["timestamp"].is_string());
}

// ---------------------------------------------------------------------------
// Failure paths
// ---------------------------------------------------------------------------

#[test]
fn normalize_refuses_in_place_overwrite() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("model.safetensors");
    save_checkpoint(&sample_checkpoint(), &src).unwrap();

    let err = normalize_checkpoint(&src, &src).unwrap_err();
    assert!(matches!(err, CheckpointError::SamePath { .. }));
}

#[test]
fn normalize_missing_source_fails_cleanly() {
    let dir = TempDir::new().unwrap();
    let err = normalize_checkpoint(
        &dir.path().join("absent.pth"),
        &dir.path().join("out.safetensors"),
    )
    .unwrap_err();
    assert!(matches!(err, CheckpointError::NotFound { .. }));
    assert!(!dir.path().join("out.safetensors").exists());
}

#[test]
fn normalize_unreadable_source_surfaces_all_attempts() {
    let dir = TempDir::new().unwrap();
    let src = dir.path().join("corrupt.pth");
    fs::write(&src, b"\x00\x01\x02 not a real archive").unwrap();

    let err = normalize_checkpoint(&src, &dir.path().join("out.safetensors")).unwrap_err();
    match &err {
        CheckpointError::LoadFailed { attempts, .. } => {
            assert!(attempts.contains("safetensors"));
            assert!(attempts.contains("pytorch-pickle"));
            assert!(attempts.contains("npz"));
        }
        other => panic!("expected LoadFailed, got {other:?}"),
    }
    // No partial output on a failed run.
    assert!(!dir.path().join("out.safetensors").exists());
}
