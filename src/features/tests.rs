//! Feature module suite: normalization properties over larger inputs and the
//! layout/vector interplay.

use super::*;

fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_normalization_bound_property() {
    init_logs();
    // pseudo-varied lengths, none above 997
    let lengths: Vec<f64> = (0..200).map(|i| ((i * 37) % 997) as f64).collect();
    let out = normalize_lengths(&lengths).unwrap();

    assert_eq!(out.features.len(), lengths.len());
    for feature in &out.features {
        let v = feature.length_normalized();
        assert!((0.0..=1.0).contains(&v), "out of bounds: {}", v);
    }

    // the sample carrying the max length lands exactly on 1.0
    let max = out.max_length;
    let argmax = lengths.iter().position(|&l| l == max).unwrap();
    assert_eq!(out.features[argmax].length_normalized(), 1.0);
}

#[test]
fn test_order_correspondence_is_preserved() {
    let lengths = vec![5.0, 50.0, 25.0, 100.0];
    let out = normalize_lengths(&lengths).unwrap();
    for (i, feature) in out.features.iter().enumerate() {
        assert_eq!(feature.length_normalized(), lengths[i] / 100.0);
    }
}

#[test]
fn test_imputed_records_keep_their_slot() {
    init_logs();
    let raw = vec![Some(100.0), None, Some(200.0), None, Some(300.0)];
    let out = normalize(&raw).unwrap();

    // both gaps filled with the median (200), nothing dropped
    assert_eq!(out.features.len(), raw.len());
    assert_eq!(out.imputed, 2);
    assert_eq!(out.features[1].length_normalized(), 200.0 / 300.0);
    assert_eq!(out.features[3].length_normalized(), 200.0 / 300.0);
}

#[test]
fn test_even_valid_count_averages_middle_pair() {
    let raw = vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0), None];
    let out = normalize(&raw).unwrap();
    assert_eq!(out.features[4].length_normalized(), 25.0 / 40.0);
}

#[test]
fn test_vectors_carry_current_layout() {
    let out = normalize_lengths(&[1.0, 2.0]).unwrap();
    for feature in &out.features {
        assert_eq!(feature.version, FEATURE_VERSION);
        assert_eq!(feature.layout_hash, layout_hash());
        assert!(feature.validate().is_ok());
    }
}

#[test]
fn test_single_sample_normalizes_to_one() {
    let out = normalize_lengths(&[640.0]).unwrap();
    assert_eq!(out.features[0].length_normalized(), 1.0);
    assert_eq!(out.max_length, 640.0);
}
