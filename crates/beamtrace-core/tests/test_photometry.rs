mod common;

use approx::assert_relative_eq;
use ndarray::Array2;

use beamtrace_core::photometry::{measure_apertures, ApertureConfig};
use beamtrace_core::trajectory::{CentroidSample, Trajectory};

use common::{gaussian_blob, VecSource};

fn trajectory_at(centers: &[(f64, f64)]) -> Trajectory {
    Trajectory {
        samples: centers
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| CentroidSample {
                frame_index: i,
                frame_number: i,
                x,
                y,
            })
            .collect(),
        fallback_count: 0,
    }
}

/// Identical spot profile wandering over the frame in whole-pixel steps.
fn wandering_spot() -> (VecSource, Trajectory) {
    let centers = [
        (32.0, 32.0),
        (35.0, 32.0),
        (29.0, 30.0),
        (32.0, 36.0),
        (30.0, 28.0),
    ];
    let frames = centers
        .iter()
        .map(|&(cx, cy)| gaussian_blob(64, 64, cx, cy, 3.0, 1000.0))
        .collect();
    (VecSource::new(frames), trajectory_at(&centers))
}

#[test]
fn test_wander_of_stationary_profile_is_pure_geometric() {
    let (source, trajectory) = wandering_spot();
    let config = ApertureConfig {
        radius: 8.0,
        edge_exclusion_percent: 0.0,
    };

    let result = measure_apertures(&source, &trajectory, &config, None).unwrap();
    let si = &result.summary;

    // The tracking aperture sees the same pixel values every frame, so all
    // variability in the fixed aperture is beam wander
    assert!(si.si_tracking_aperture.abs() < 1e-12);
    assert!(si.si_raw_centroid_region.abs() < 1e-12);
    assert!(si.si_fixed_aperture > 1e-4);
    assert_relative_eq!(
        si.si_geometric_wander_component,
        si.si_fixed_aperture,
        epsilon = 1e-12
    );
    assert_eq!(si.frames_analyzed, 5);
    assert_eq!(result.traces.invalid_frames, 0);
}

#[test]
fn test_fixed_aperture_sees_the_wander() {
    let (source, trajectory) = wandering_spot();
    let config = ApertureConfig {
        radius: 8.0,
        edge_exclusion_percent: 0.0,
    };

    let result = measure_apertures(&source, &trajectory, &config, None).unwrap();
    // The tracking trace is flat while the fixed trace varies with position
    let fixed = &result.traces.fixed;
    let spread = fixed.iter().cloned().fold(f64::NEG_INFINITY, f64::max)
        - fixed.iter().cloned().fold(f64::INFINITY, f64::min);
    assert!(
        spread > 1.0,
        "Fixed-aperture trace should vary as the spot wanders, spread {spread}"
    );
}

#[test]
fn test_uniform_frames_have_zero_si_everywhere() {
    let frames = vec![Array2::<f32>::from_elem((64, 64), 10.0); 4];
    let source = VecSource::new(frames);
    let trajectory = trajectory_at(&[(32.0, 32.0), (32.0, 32.0), (32.0, 32.0), (32.0, 32.0)]);
    let config = ApertureConfig {
        radius: 8.0,
        edge_exclusion_percent: 15.0,
    };

    let result = measure_apertures(&source, &trajectory, &config, None).unwrap();
    let si = &result.summary;
    assert_eq!(si.si_fixed_aperture, 0.0);
    assert_eq!(si.si_tracking_aperture, 0.0);
    assert_eq!(si.si_geometric_wander_component, 0.0);
    assert_relative_eq!(si.fixed_stats.mean, 10.0);
}

#[test]
fn test_empty_mask_frame_dropped_from_all_traces() {
    let blob = gaussian_blob(64, 64, 32.0, 32.0, 3.0, 1000.0);
    let source = VecSource::new(vec![blob.clone(), blob.clone(), blob]);
    // Middle sample points far outside the frame: its tracking masks cover
    // no pixels, so that frame must vanish from every trace
    let trajectory = trajectory_at(&[(32.0, 32.0), (1000.0, 1000.0), (32.0, 32.0)]);
    let config = ApertureConfig {
        radius: 8.0,
        edge_exclusion_percent: 0.0,
    };

    let result = measure_apertures(&source, &trajectory, &config, None).unwrap();
    assert_eq!(result.traces.invalid_frames, 1);
    assert_eq!(result.traces.fixed.len(), 2);
    assert_eq!(result.traces.tracking.len(), 2);
    assert_eq!(result.traces.raw.len(), 2);
    assert_eq!(result.summary.frames_analyzed, 2);
}

#[test]
fn test_all_masks_empty_is_an_error() {
    let source = VecSource::new(vec![Array2::<f32>::zeros((16, 16))]);
    let trajectory = trajectory_at(&[(500.0, 500.0)]);
    let config = ApertureConfig {
        radius: 8.0,
        edge_exclusion_percent: 0.0,
    };

    assert!(measure_apertures(&source, &trajectory, &config, None).is_err());
}

#[test]
fn test_empty_trajectory_is_an_error() {
    let source = VecSource::new(vec![Array2::<f32>::zeros((16, 16))]);
    let trajectory = trajectory_at(&[]);

    assert!(measure_apertures(&source, &trajectory, &ApertureConfig::default(), None).is_err());
}

#[test]
fn test_tracking_inner_radius() {
    let config = ApertureConfig {
        radius: 30.0,
        edge_exclusion_percent: 15.0,
    };
    assert_relative_eq!(config.tracking_inner_radius(), 25.0);
}

#[test]
fn test_si_summary_serializes_export_field_names() {
    let (source, trajectory) = wandering_spot();
    let config = ApertureConfig {
        radius: 8.0,
        edge_exclusion_percent: 0.0,
    };

    let result = measure_apertures(&source, &trajectory, &config, None).unwrap();
    let record = serde_json::to_value(&result.summary).unwrap();

    // Downstream consumers key on these names; renames break them
    for field in [
        "aperture_radius",
        "edge_exclusion_percent",
        "frames_analyzed",
        "si_fixed_aperture",
        "si_tracking_aperture",
        "si_raw_centroid_region",
        "si_geometric_wander_component",
        "si_ratio_fixed_to_tracking",
        "wander_percent_of_fixed",
        "fixed_stats",
        "tracking_stats",
        "raw_stats",
    ] {
        assert!(record.get(field).is_some(), "missing field {field}");
    }
    for field in ["mean", "std", "min", "max"] {
        assert!(
            record["fixed_stats"].get(field).is_some(),
            "missing trace-stats field {field}"
        );
    }
}

#[test]
fn test_config_validation() {
    assert!(ApertureConfig {
        radius: 0.0,
        edge_exclusion_percent: 15.0,
    }
    .validate()
    .is_err());
    assert!(ApertureConfig {
        radius: 30.0,
        edge_exclusion_percent: 150.0,
    }
    .validate()
    .is_err());
    assert!(ApertureConfig::default().validate().is_ok());
}
