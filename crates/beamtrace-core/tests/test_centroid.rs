mod common;

use ndarray::Array2;

use beamtrace_core::centroid::{
    edge_exclusion_mask, locate_spot, weighted_centroid, CentroidConfig, ThresholdPolicy,
};
use beamtrace_core::frame::{Roi, RoiPoint};

use common::gaussian_blob;

fn distance(p: RoiPoint, x: f64, y: f64) -> f64 {
    ((p.x - x).powi(2) + (p.y - y).powi(2)).sqrt()
}

/// Ring of bright pixels around the region center, modeling the edge
/// artifact that saturated optics leave at the aperture boundary.
fn add_edge_ring(data: &mut Array2<f32>, inner: f64, outer: f64, level: f32) {
    let (h, w) = data.dim();
    let cx = (w / 2) as f64;
    let cy = (h / 2) as f64;
    for row in 0..h {
        for col in 0..w {
            let d = ((col as f64 - cx).powi(2) + (row as f64 - cy).powi(2)).sqrt();
            if d >= inner && d < outer {
                // Slight variation so percentile thresholds are not a tie
                data[[row, col]] = level + ((row + col) % 7) as f32;
            }
        }
    }
}

#[test]
fn test_global_percentile_recovers_gaussian_center() {
    let region = gaussian_blob(64, 64, 30.0, 25.0, 3.0, 200.0);
    let config = CentroidConfig::default();

    let spot = locate_spot(&region, &config);
    assert!(!spot.is_fallback());
    let p = spot.position();
    assert!(
        distance(p, 30.0, 25.0) < 0.5,
        "Recovered ({}, {}), expected near (30, 25)",
        p.x,
        p.y
    );
}

#[test]
fn test_local_adaptive_recovers_gaussian_center() {
    let region = gaussian_blob(64, 64, 30.0, 25.0, 3.0, 200.0);
    let config = CentroidConfig {
        threshold: ThresholdPolicy::local_adaptive(),
        ..CentroidConfig::default()
    };

    let spot = locate_spot(&region, &config);
    assert!(!spot.is_fallback());
    let p = spot.position();
    assert!(
        distance(p, 30.0, 25.0) < 0.5,
        "Recovered ({}, {}), expected near (30, 25)",
        p.x,
        p.y
    );
}

#[test]
fn test_edge_exclusion_ignores_bright_ring() {
    // Dim spot at (20, 22) plus a much brighter edge ring
    let mut region = gaussian_blob(64, 64, 20.0, 22.0, 2.0, 150.0);
    add_edge_ring(&mut region, 26.0, 30.0, 240.0);

    let config = CentroidConfig::default(); // exclusion enabled
    let p = locate_spot(&region, &config).position();
    assert!(
        distance(p, 20.0, 22.0) < 1.0,
        "Exclusion failed to suppress the ring: got ({}, {})",
        p.x,
        p.y
    );
}

#[test]
fn test_bright_ring_dominates_without_exclusion() {
    let mut region = gaussian_blob(64, 64, 20.0, 22.0, 2.0, 150.0);
    add_edge_ring(&mut region, 26.0, 30.0, 240.0);

    let config = CentroidConfig {
        exclude_edges: false,
        ..CentroidConfig::default()
    };
    let p = locate_spot(&region, &config).position();
    assert!(
        distance(p, 20.0, 22.0) > 5.0,
        "Without exclusion the ring should pull the estimate off the spot; got ({}, {})",
        p.x,
        p.y
    );
}

#[test]
fn test_empty_region_falls_back_to_center() {
    let region = Array2::<f32>::zeros((40, 60));
    let spot = locate_spot(&region, &CentroidConfig::default());
    assert!(spot.is_fallback());
    let p = spot.position();
    assert_eq!(p.x, 30.0);
    assert_eq!(p.y, 20.0);
}

#[test]
fn test_explicit_edge_margin_and_center() {
    let region = gaussian_blob(64, 64, 14.0, 14.0, 2.0, 200.0);
    let config = CentroidConfig {
        edge_margin: Some(4),
        exclusion_center: Some((14, 14)),
        ..CentroidConfig::default()
    };
    let p = locate_spot(&region, &config).position();
    assert!(distance(p, 14.0, 14.0) < 0.5);
}

#[test]
fn test_exclusion_mask_geometry() {
    // 64x64, center (32, 32), max radius 32, margin 9 -> keep dist < 23
    let mask = edge_exclusion_mask(64, 64, (32, 32), Some(9));
    assert!(mask[[32, 32]]);
    assert!(mask[[32, 32 + 22]]);
    assert!(!mask[[32, 32 + 23]]);
    assert!(!mask[[0, 0]]);
}

#[test]
fn test_exclusion_mask_default_margin() {
    // Default margin is 15% of the smaller dimension: 9 px for 64x64
    let derived = edge_exclusion_mask(64, 64, (32, 32), None);
    let explicit = edge_exclusion_mask(64, 64, (32, 32), Some(9));
    assert_eq!(derived, explicit);
}

#[test]
fn test_weighted_centroid_single_pixel() {
    let mut data = Array2::<f32>::zeros((4, 4));
    data[[1, 2]] = 10.0;
    let mut mask = Array2::from_elem((4, 4), false);
    mask[[1, 2]] = true;

    let p = weighted_centroid(&data, &mask).unwrap();
    assert_eq!(p.x, 2.0);
    assert_eq!(p.y, 1.0);
}

#[test]
fn test_weighted_centroid_empty_mask_is_none() {
    let data = Array2::<f32>::from_elem((4, 4), 1.0);
    let mask = Array2::from_elem((4, 4), false);
    assert!(weighted_centroid(&data, &mask).is_none());
}

#[test]
fn test_roi_reprojection_to_frame_coordinates() {
    let roi = Roi {
        x: 40,
        y: 10,
        width: 40,
        height: 40,
    };
    let frame = beamtrace_core::frame::Frame::new(
        gaussian_blob(80, 100, 55.0, 25.0, 2.0, 200.0),
        8,
    );
    let region = roi.extract(&frame);
    assert_eq!(region.dim(), (40, 40));

    let spot = locate_spot(&region, &CentroidConfig::default());
    let p = roi.to_frame(spot.position());
    assert!(
        ((p.x - 55.0).powi(2) + (p.y - 25.0).powi(2)).sqrt() < 0.5,
        "Full-frame position ({}, {}) should land on the blob at (55, 25)",
        p.x,
        p.y
    );
}

#[test]
fn test_roi_extract_clips_to_frame() {
    let frame = beamtrace_core::frame::Frame::new(Array2::<f32>::zeros((20, 30)), 8);
    let roi = Roi {
        x: 25,
        y: 10,
        width: 20,
        height: 20,
    };
    let region = roi.extract(&frame);
    assert_eq!(region.dim(), (10, 5));
}

#[test]
fn test_neighborhood_mean_blur_is_normalized_and_symmetric() {
    use beamtrace_core::filters::gaussian_blur_with_radius;

    // Constant input must pass through unchanged (kernel sums to 1)
    let flat = Array2::<f32>::from_elem((32, 32), 7.0);
    let blurred = gaussian_blur_with_radius(&flat, 8.0, 25);
    for &v in blurred.iter() {
        assert!((v - 7.0).abs() < 1e-4, "Normalization drift: {v}");
    }

    // An impulse spreads symmetrically
    let mut impulse = Array2::<f32>::zeros((33, 33));
    impulse[[16, 16]] = 100.0;
    let blurred = gaussian_blur_with_radius(&impulse, 4.0, 10);
    assert!((blurred[[16, 12]] - blurred[[16, 20]]).abs() < 1e-6);
    assert!((blurred[[12, 16]] - blurred[[20, 16]]).abs() < 1e-6);
    assert!(blurred[[16, 16]] > blurred[[16, 12]]);
}

#[test]
fn test_config_rejects_even_adaptive_block() {
    let config = CentroidConfig {
        threshold: ThresholdPolicy::LocalAdaptive {
            block_size: 4,
            bias: -10.0,
        },
        ..CentroidConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_adaptive_policy_defaults_match_consts() {
    use beamtrace_core::consts::{DEFAULT_ADAPTIVE_BIAS, DEFAULT_ADAPTIVE_BLOCK_SIZE};

    match ThresholdPolicy::local_adaptive() {
        ThresholdPolicy::LocalAdaptive { block_size, bias } => {
            assert_eq!(block_size, DEFAULT_ADAPTIVE_BLOCK_SIZE);
            assert_eq!(bias, DEFAULT_ADAPTIVE_BIAS);
        }
        other => panic!("local_adaptive() returned {other:?}"),
    }
}

#[test]
fn test_config_rejects_out_of_range_percentile() {
    let config = CentroidConfig {
        threshold: ThresholdPolicy::GlobalPercentile { percentile: 120.0 },
        ..CentroidConfig::default()
    };
    assert!(config.validate().is_err());
}
