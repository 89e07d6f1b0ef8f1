//! Centroid trajectory construction.
//!
//! Drives the centroid estimator across the valid-frame list, reprojecting
//! ROI-local positions to full-frame coordinates, and derives displacement
//! statistics from the first sample.

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::centroid::{locate_spot, CentroidConfig};
use crate::consts::SCAN_BATCH_SIZE;
use crate::dark::ValidFrame;
use crate::error::Result;
use crate::frame::{Frame, Roi};
use crate::io::FrameSource;
use crate::stats::{mean, std_dev};

/// Sub-pixel centroid of one processed frame, in full-frame coordinates.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct CentroidSample {
    /// Position in the valid-frame list (zero-based, contiguous).
    pub frame_index: usize,
    /// Frame number in the source's index space.
    pub frame_number: usize,
    pub x: f64,
    pub y: f64,
}

/// Ordered centroid positions, one per valid frame. Append-only during
/// construction, read-only afterward.
#[derive(Clone, Debug)]
pub struct Trajectory {
    pub samples: Vec<CentroidSample>,
    /// How many samples came from the empty-mask fallback rather than a
    /// detected spot.
    pub fallback_count: usize,
}

/// One row of the exported trajectory table.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct TrajectoryRow {
    pub frame_index: usize,
    pub frame_number: usize,
    pub centroid_x: f64,
    pub centroid_y: f64,
    pub displacement_x: f64,
    pub displacement_y: f64,
    pub displacement_magnitude: f64,
}

/// Displacement statistics relative to the first sample.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct TrajectoryStats {
    pub mean_x: f64,
    pub mean_y: f64,
    pub std_x: f64,
    pub std_y: f64,
    pub mean_displacement: f64,
    pub max_displacement: f64,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Export rows: displacement of each sample from the first.
    pub fn rows(&self) -> Vec<TrajectoryRow> {
        let (x0, y0) = match self.samples.first() {
            Some(s) => (s.x, s.y),
            None => return Vec::new(),
        };
        self.samples
            .iter()
            .map(|s| {
                let dx = s.x - x0;
                let dy = s.y - y0;
                TrajectoryRow {
                    frame_index: s.frame_index,
                    frame_number: s.frame_number,
                    centroid_x: s.x,
                    centroid_y: s.y,
                    displacement_x: dx,
                    displacement_y: dy,
                    displacement_magnitude: (dx * dx + dy * dy).sqrt(),
                }
            })
            .collect()
    }

    pub fn stats(&self) -> TrajectoryStats {
        let xs: Vec<f64> = self.samples.iter().map(|s| s.x).collect();
        let ys: Vec<f64> = self.samples.iter().map(|s| s.y).collect();
        let mags: Vec<f64> = self
            .rows()
            .iter()
            .map(|r| r.displacement_magnitude)
            .collect();
        TrajectoryStats {
            mean_x: mean(&xs),
            mean_y: mean(&ys),
            std_x: std_dev(&xs),
            std_y: std_dev(&ys),
            mean_displacement: mean(&mags),
            max_displacement: mags.iter().cloned().fold(0.0, f64::max),
        }
    }
}

/// Build the trajectory for a valid-frame list.
///
/// When `roi` is given, localization runs on the sub-region and positions
/// are reprojected to full-frame coordinates; the exclusion circle then
/// centers on the ROI midpoint. Frames are decoded in batches and localized
/// in parallel, collected back in list order. `on_progress` receives the
/// number of frames processed so far.
pub fn build_trajectory(
    source: &dyn FrameSource,
    valid: &[ValidFrame],
    roi: Option<Roi>,
    config: &CentroidConfig,
    on_progress: Option<&dyn Fn(usize)>,
) -> Result<Trajectory> {
    config.validate()?;

    info!(frames = valid.len(), roi = ?roi, "Tracking centroid");

    let mut samples = Vec::with_capacity(valid.len());
    let mut fallback_count = 0usize;

    for batch_start in (0..valid.len()).step_by(SCAN_BATCH_SIZE) {
        let batch_end = (batch_start + SCAN_BATCH_SIZE).min(valid.len());
        let batch: Vec<(usize, Frame)> = valid[batch_start..batch_end]
            .iter()
            .map(|v| Ok((v.frame_number, source.get_frame(v.frame_number)?)))
            .collect::<Result<_>>()?;

        let located: Vec<(usize, f64, f64, bool)> = batch
            .par_iter()
            .map(|(frame_number, frame)| {
                let region_roi =
                    roi.unwrap_or_else(|| Roi::full_frame(frame.width(), frame.height()));
                let region = region_roi.extract(frame);
                let spot = locate_spot(&region, config);
                let p = region_roi.to_frame(spot.position());
                (*frame_number, p.x, p.y, spot.is_fallback())
            })
            .collect();

        for (i, (frame_number, x, y, fallback)) in located.into_iter().enumerate() {
            if fallback {
                fallback_count += 1;
            }
            samples.push(CentroidSample {
                frame_index: batch_start + i,
                frame_number,
                x,
                y,
            });
        }

        if let Some(progress) = on_progress {
            progress(samples.len());
        }
    }

    info!(
        samples = samples.len(),
        fallback_count, "Centroid tracking complete"
    );

    Ok(Trajectory {
        samples,
        fallback_count,
    })
}
