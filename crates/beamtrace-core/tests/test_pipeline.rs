mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ndarray::Array2;

use beamtrace_core::bootstrap::BootstrapConfig;
use beamtrace_core::centroid::{CentroidConfig, ThresholdPolicy};
use beamtrace_core::dark::ValidFrame;
use beamtrace_core::error::BeamtraceError;
use beamtrace_core::photometry::ApertureConfig;
use beamtrace_core::pipeline::config::PipelineConfig;
use beamtrace_core::pipeline::{run_pipeline, run_pipeline_reported, PipelineStage, ProgressReporter};
use beamtrace_core::trajectory::build_trajectory;

use common::{gaussian_blob, VecSource};

/// 20 dark frames, then 60 frames with the spot wandering in a small
/// pattern around the frame center.
fn synthetic_run() -> (VecSource, Vec<(f64, f64)>) {
    let mut frames = vec![Array2::<f32>::zeros((48, 48)); 20];
    let mut centers = Vec::new();
    for i in 0..60usize {
        let cx = 24.0 + (i % 5) as f64 - 2.0;
        let cy = 24.0 + (i % 3) as f64 - 1.0;
        centers.push((cx, cy));
        frames.push(gaussian_blob(48, 48, cx, cy, 2.0, 3000.0));
    }
    (VecSource::new(frames), centers)
}

fn test_config() -> PipelineConfig {
    PipelineConfig {
        aperture: ApertureConfig {
            radius: 10.0,
            edge_exclusion_percent: 15.0,
        },
        bootstrap: BootstrapConfig {
            count: 200,
            block_size: 5,
            seed: Some(3),
        },
        ..PipelineConfig::default()
    }
}

#[test]
fn test_full_run_on_synthetic_video() {
    let (source, centers) = synthetic_run();
    let output = run_pipeline(&source, &test_config()).unwrap();

    // Dark scan drops the 20 black frames
    assert_eq!(output.valid_frames.len(), 60);
    assert_eq!(output.valid_frames[0].frame_number, 20);

    // One centroid per valid frame, all from detections
    assert_eq!(output.trajectory.len(), 60);
    assert_eq!(output.trajectory.fallback_count, 0);
    for (sample, &(cx, cy)) in output.trajectory.samples.iter().zip(&centers) {
        let err = ((sample.x - cx).powi(2) + (sample.y - cy).powi(2)).sqrt();
        assert!(
            err < 0.6,
            "Frame {}: centroid ({}, {}) off true center ({cx}, {cy})",
            sample.frame_number,
            sample.x,
            sample.y
        );
    }

    let si = &output.photometry.summary;
    assert_eq!(si.frames_analyzed, 60);
    assert!(si.si_fixed_aperture.is_finite());
    assert!(si.si_tracking_aperture >= 0.0);

    let boot = output.bootstrap.expect("bootstrap enabled by default");
    assert!(boot.ci_low <= boot.mean && boot.mean <= boot.ci_high);
}

#[test]
fn test_run_without_bootstrap() {
    let (source, _) = synthetic_run();
    let config = PipelineConfig {
        run_bootstrap: false,
        ..test_config()
    };

    let output = run_pipeline(&source, &config).unwrap();
    assert!(output.bootstrap.is_none());
}

#[test]
fn test_all_dark_video_fails_with_no_valid_frames() {
    let source = VecSource::new(vec![Array2::<f32>::zeros((48, 48)); 10]);
    let err = run_pipeline(&source, &test_config()).unwrap_err();
    assert!(matches!(err, BeamtraceError::NoValidFrames { .. }));
}

#[test]
fn test_invalid_config_rejected_before_any_decode() {
    let (source, _) = synthetic_run();
    let mut config = test_config();
    config.centroid.threshold = ThresholdPolicy::LocalAdaptive {
        block_size: 4,
        bias: -10.0,
    };

    let err = run_pipeline(&source, &config).unwrap_err();
    assert!(matches!(err, BeamtraceError::InvalidConfig(_)));
}

struct CountingReporter {
    stages: AtomicUsize,
    finishes: AtomicUsize,
}

impl ProgressReporter for CountingReporter {
    fn begin_stage(&self, _stage: PipelineStage, _total: Option<usize>) {
        self.stages.fetch_add(1, Ordering::SeqCst);
    }

    fn advance(&self, _done: usize) {}

    fn finish_stage(&self) {
        self.finishes.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_reporter_sees_every_stage() {
    let (source, _) = synthetic_run();
    let reporter = Arc::new(CountingReporter {
        stages: AtomicUsize::new(0),
        finishes: AtomicUsize::new(0),
    });

    run_pipeline_reported(&source, &test_config(), reporter.clone()).unwrap();
    assert_eq!(reporter.stages.load(Ordering::SeqCst), 5);
    assert_eq!(reporter.finishes.load(Ordering::SeqCst), 5);
}

#[test]
fn test_trajectory_with_roi_reports_frame_coordinates() {
    let (source, centers) = synthetic_run();
    let valid: Vec<ValidFrame> = (20..80)
        .map(|frame_number| ValidFrame {
            frame_number,
            brightness_score: 0.0,
        })
        .collect();
    let roi = beamtrace_core::frame::Roi {
        x: 8,
        y: 8,
        width: 32,
        height: 32,
    };

    let trajectory =
        build_trajectory(&source, &valid, Some(roi), &CentroidConfig::default(), None).unwrap();
    assert_eq!(trajectory.len(), 60);
    for (sample, &(cx, cy)) in trajectory.samples.iter().zip(&centers) {
        let err = ((sample.x - cx).powi(2) + (sample.y - cy).powi(2)).sqrt();
        assert!(err < 0.6, "ROI tracking drifted: {err}");
    }
}

#[test]
fn test_trajectory_rows_and_stats() {
    let (source, _) = synthetic_run();
    let valid: Vec<ValidFrame> = (20..80)
        .map(|frame_number| ValidFrame {
            frame_number,
            brightness_score: 0.0,
        })
        .collect();

    let trajectory =
        build_trajectory(&source, &valid, None, &CentroidConfig::default(), None).unwrap();
    let rows = trajectory.rows();
    assert_eq!(rows.len(), 60);
    assert_eq!(rows[0].displacement_magnitude, 0.0);
    assert_eq!(rows[5].frame_number, 25);

    let stats = trajectory.stats();
    assert!(stats.max_displacement >= stats.mean_displacement);
    assert!(stats.std_x > 0.0);
}

#[test]
fn test_config_toml_round_trip() {
    let config = test_config();
    let text = toml::to_string(&config).unwrap();
    let parsed: PipelineConfig = toml::from_str(&text).unwrap();

    parsed.validate().unwrap();
    assert_eq!(parsed.aperture.radius, 10.0);
    assert_eq!(parsed.bootstrap.seed, Some(3));
    assert_eq!(parsed.scan.dark_threshold, config.scan.dark_threshold);
}

#[test]
fn test_config_defaults_fill_missing_sections() {
    let parsed: PipelineConfig =
        toml::from_str("input = \"video.ser\"\noutput_dir = \"out\"\n").unwrap();
    assert!(parsed.run_bootstrap);
    assert_eq!(parsed.scan.dark_threshold, 5000.0);
    assert!(parsed.centroid.exclude_edges);
    assert!(parsed.roi.is_none());
}
