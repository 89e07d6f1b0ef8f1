//! Fixed-vs-tracking aperture photometry.
//!
//! Three per-frame mean-intensity traces: a fixed aperture frozen at the
//! first centroid (what a stationary sensor would record), a tracking
//! aperture recentered every frame with outer-ring exclusion, and a raw
//! tracking disk as a diagnostic. The difference between the fixed and
//! tracking scintillation indices is the geometric wander component.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::consts::{
    APERTURE_INNER_RADIUS, DEFAULT_APERTURE_RADIUS, DEFAULT_EDGE_EXCLUSION_PERCENT,
    SCAN_BATCH_SIZE, SI_EPSILON,
};
use crate::error::{BeamtraceError, Result};
use crate::frame::Frame;
use crate::io::FrameSource;
use crate::stats::{scintillation_index, TraceStats};
use crate::trajectory::Trajectory;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApertureConfig {
    /// Outer radius of the sampling disk, pixels.
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// Percentage of the radius excluded as an outer ring in the tracking
    /// aperture, suppressing the bright edge-ring artifact.
    #[serde(default = "default_edge_exclusion")]
    pub edge_exclusion_percent: f64,
}

fn default_radius() -> f64 {
    DEFAULT_APERTURE_RADIUS
}
fn default_edge_exclusion() -> f64 {
    DEFAULT_EDGE_EXCLUSION_PERCENT
}

impl Default for ApertureConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_APERTURE_RADIUS,
            edge_exclusion_percent: DEFAULT_EDGE_EXCLUSION_PERCENT,
        }
    }
}

impl ApertureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.radius <= 0.0 {
            return Err(BeamtraceError::InvalidConfig(format!(
                "aperture radius {} must be positive",
                self.radius
            )));
        }
        if !(0.0..=100.0).contains(&self.edge_exclusion_percent) {
            return Err(BeamtraceError::InvalidConfig(format!(
                "edge exclusion percent {} outside 0..=100",
                self.edge_exclusion_percent
            )));
        }
        Ok(())
    }

    /// Inner radius of the edge-excluded tracking aperture.
    pub fn tracking_inner_radius(&self) -> f64 {
        (self.radius * (1.0 - self.edge_exclusion_percent / 100.0)).floor()
    }
}

/// The three frame-aligned traces after invalid-frame removal.
#[derive(Clone, Debug, Default)]
pub struct IntensityTraces {
    pub fixed: Vec<f64>,
    pub tracking: Vec<f64>,
    pub raw: Vec<f64>,
    /// Frames dropped because at least one aperture mask came up empty.
    pub invalid_frames: usize,
}

/// Scintillation-index decomposition of a photometry run.
#[derive(Clone, Debug, Serialize)]
pub struct SiSummary {
    pub aperture_radius: f64,
    pub edge_exclusion_percent: f64,
    pub frames_analyzed: usize,
    pub si_fixed_aperture: f64,
    pub si_tracking_aperture: f64,
    pub si_raw_centroid_region: f64,
    /// SI(fixed) - SI(tracking). Deliberately unclamped: estimator noise can
    /// push it slightly negative.
    pub si_geometric_wander_component: f64,
    pub si_ratio_fixed_to_tracking: f64,
    /// Wander's percentage share of the fixed-aperture SI.
    pub wander_percent_of_fixed: f64,
    pub fixed_stats: TraceStats,
    pub tracking_stats: TraceStats,
    pub raw_stats: TraceStats,
}

#[derive(Clone, Debug)]
pub struct PhotometryResult {
    pub traces: IntensityTraces,
    pub summary: SiSummary,
}

/// Mean intensities of the three apertures for one frame, `None` where the
/// mask is empty. Never zero-filled or interpolated.
fn measure_frame(
    frame: &Frame,
    fixed_center: (f64, f64),
    tracking_center: (f64, f64),
    config: &ApertureConfig,
) -> (Option<f64>, Option<f64>, Option<f64>) {
    let (h, w) = frame.data.dim();
    let radius = config.radius;
    let inner = config.tracking_inner_radius();
    let exclude_ring = config.edge_exclusion_percent > 0.0;

    let mut sums = [0.0f64; 3];
    let mut counts = [0usize; 3];

    for row in 0..h {
        for col in 0..w {
            let v = frame.data[[row, col]] as f64;

            let dxf = col as f64 - fixed_center.0;
            let dyf = row as f64 - fixed_center.1;
            let dist_fixed = (dxf * dxf + dyf * dyf).sqrt();

            let dxt = col as f64 - tracking_center.0;
            let dyt = row as f64 - tracking_center.1;
            let dist_tracking = (dxt * dxt + dyt * dyt).sqrt();

            if dist_fixed <= radius && dist_fixed >= APERTURE_INNER_RADIUS {
                sums[0] += v;
                counts[0] += 1;
            }
            if dist_tracking <= radius
                && dist_tracking >= APERTURE_INNER_RADIUS
                && (!exclude_ring || dist_tracking <= inner)
            {
                sums[1] += v;
                counts[1] += 1;
            }
            if dist_tracking <= radius {
                sums[2] += v;
                counts[2] += 1;
            }
        }
    }

    let mean_of = |i: usize| {
        if counts[i] > 0 {
            Some(sums[i] / counts[i] as f64)
        } else {
            None
        }
    };
    (mean_of(0), mean_of(1), mean_of(2))
}

/// Measure all three traces across the trajectory and derive the SI
/// decomposition.
///
/// Frames whose mask is empty in any trace are excluded from all three, so
/// the traces stay frame-aligned. `on_progress` receives frames measured so
/// far.
pub fn measure_apertures(
    source: &dyn FrameSource,
    trajectory: &Trajectory,
    config: &ApertureConfig,
    on_progress: Option<&dyn Fn(usize)>,
) -> Result<PhotometryResult> {
    config.validate()?;

    let first = trajectory.samples.first().ok_or_else(|| {
        BeamtraceError::InvalidConfig("photometry requires a non-empty trajectory".into())
    })?;
    let fixed_center = (first.x, first.y);

    info!(
        frames = trajectory.len(),
        radius = config.radius,
        inner_radius = config.tracking_inner_radius(),
        "Measuring aperture photometry"
    );

    let mut per_frame: Vec<(Option<f64>, Option<f64>, Option<f64>)> =
        Vec::with_capacity(trajectory.len());

    for batch_start in (0..trajectory.len()).step_by(SCAN_BATCH_SIZE) {
        let batch_end = (batch_start + SCAN_BATCH_SIZE).min(trajectory.len());
        let batch: Vec<(Frame, (f64, f64))> = trajectory.samples[batch_start..batch_end]
            .iter()
            .map(|s| Ok((source.get_frame(s.frame_number)?, (s.x, s.y))))
            .collect::<Result<_>>()?;

        let measured: Vec<_> = batch
            .par_iter()
            .map(|(frame, center)| measure_frame(frame, fixed_center, *center, config))
            .collect();

        per_frame.extend(measured);
        if let Some(progress) = on_progress {
            progress(per_frame.len());
        }
    }

    let mut traces = IntensityTraces::default();
    for (f, t, r) in &per_frame {
        match (f, t, r) {
            (Some(f), Some(t), Some(r)) => {
                traces.fixed.push(*f);
                traces.tracking.push(*t);
                traces.raw.push(*r);
            }
            _ => traces.invalid_frames += 1,
        }
    }

    if traces.fixed.is_empty() {
        return Err(BeamtraceError::InvalidConfig(
            "every frame had an empty aperture mask; check radius against frame size".into(),
        ));
    }

    let si_fixed = scintillation_index(&traces.fixed);
    let si_tracking = scintillation_index(&traces.tracking);
    let si_raw = scintillation_index(&traces.raw);
    let wander = si_fixed - si_tracking;

    if wander < 0.0 {
        warn!(
            wander,
            "Geometric wander component is negative (estimator noise); reporting unclamped"
        );
    }

    let summary = SiSummary {
        aperture_radius: config.radius,
        edge_exclusion_percent: config.edge_exclusion_percent,
        frames_analyzed: traces.fixed.len(),
        si_fixed_aperture: si_fixed,
        si_tracking_aperture: si_tracking,
        si_raw_centroid_region: si_raw,
        si_geometric_wander_component: wander,
        si_ratio_fixed_to_tracking: si_fixed / (si_tracking + SI_EPSILON),
        wander_percent_of_fixed: 100.0 * wander / (si_fixed + SI_EPSILON),
        fixed_stats: TraceStats::from_values(&traces.fixed),
        tracking_stats: TraceStats::from_values(&traces.tracking),
        raw_stats: TraceStats::from_values(&traces.raw),
    };

    info!(
        frames_analyzed = summary.frames_analyzed,
        invalid = traces.invalid_frames,
        si_fixed,
        si_tracking,
        "Photometry complete"
    );

    Ok(PhotometryResult { traces, summary })
}
