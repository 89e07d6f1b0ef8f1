//! Dark-frame filtering.
//!
//! Every frame gets a scalar brightness score: the summed intensity of a
//! fixed window centered on the brightest region. Frames scoring below the
//! dark threshold are discarded before any centroid work happens.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::centroid::weighted_centroid;
use crate::consts::{
    DEFAULT_DARK_THRESHOLD, SCAN_BATCH_SIZE, SCORE_THRESHOLD_PERCENTILE, SCORE_WINDOW_HALF_WIDTH,
};
use crate::error::{BeamtraceError, Result};
use crate::filters::median_filter_3x3;
use crate::frame::Frame;
use crate::io::FrameSource;
use crate::stats::percentile;

/// One surviving frame of the dark scan.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ValidFrame {
    pub frame_number: usize,
    pub brightness_score: f64,
}

/// Configuration for the dark-frame scan.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Frames dropped from the start of the recorded range before scanning.
    #[serde(default)]
    pub skip_initial_frames: usize,
    /// Brightness-score cutoff; frames strictly below it are discarded.
    #[serde(default = "default_dark_threshold")]
    pub dark_threshold: f64,
}

fn default_dark_threshold() -> f64 {
    DEFAULT_DARK_THRESHOLD
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_initial_frames: 0,
            dark_threshold: DEFAULT_DARK_THRESHOLD,
        }
    }
}

/// Brightness score of a single frame.
///
/// Median-denoise, threshold at the 90th percentile of the denoised frame,
/// take the intensity-weighted centroid of the surviving pixels (geometric
/// center when none survive), and sum the original intensities in a window
/// of half-width [`SCORE_WINDOW_HALF_WIDTH`] around it, clipped to the
/// frame. No frame data is retained past scoring.
pub fn brightness_score(frame: &Frame) -> f64 {
    let denoised = median_filter_3x3(&frame.data);

    let pixels: Vec<f64> = denoised.iter().map(|&v| v as f64).collect();
    let threshold = percentile(&pixels, SCORE_THRESHOLD_PERCENTILE) as f32;
    let bright = denoised.mapv(|v| v > threshold);

    let (h, w) = frame.data.dim();
    let (cx, cy) = match weighted_centroid(&frame.data, &bright) {
        Some(p) => (p.x, p.y),
        None => ((w / 2) as f64, (h / 2) as f64),
    };

    let half = SCORE_WINDOW_HALF_WIDTH as f64;
    let y1 = ((cy - half).floor() as isize).max(0) as usize;
    let x1 = ((cx - half).floor() as isize).max(0) as usize;
    let y2 = (((cy + half).floor() as isize).max(0) as usize).min(h);
    let x2 = (((cx + half).floor() as isize).max(0) as usize).min(w);

    frame
        .data
        .slice(ndarray::s![y1..y2, x1..x2])
        .iter()
        .map(|&v| v as f64)
        .sum()
}

/// Scan the source's recorded range and return the ordered list of frames
/// above the dark threshold, with their scores.
///
/// Frames are decoded in batches and scored in parallel; results keep
/// frame-number order. `on_progress` receives the total frames scanned so
/// far after each batch.
pub fn scan_valid_frames(
    source: &dyn FrameSource,
    config: &ScanConfig,
    on_progress: Option<&dyn Fn(usize)>,
) -> Result<Vec<ValidFrame>> {
    let (range_first, last) = source.frame_range();
    let first = range_first + config.skip_initial_frames;
    if first > last {
        return Err(BeamtraceError::InvalidConfig(format!(
            "skip_initial_frames {} leaves no frames in range {}..={}",
            config.skip_initial_frames, range_first, last
        )));
    }

    info!(first, last, "Scanning for dark frames");

    let mut valid = Vec::new();
    let mut scanned = 0usize;

    for batch_start in (first..=last).step_by(SCAN_BATCH_SIZE) {
        let batch_end = (batch_start + SCAN_BATCH_SIZE - 1).min(last);
        let batch: Vec<(usize, Frame)> = (batch_start..=batch_end)
            .map(|n| Ok((n, source.get_frame(n)?)))
            .collect::<Result<_>>()?;

        let scores: Vec<(usize, f64)> = batch
            .par_iter()
            .map(|(n, frame)| (*n, brightness_score(frame)))
            .collect();

        scanned += scores.len();
        for (frame_number, score) in scores {
            if score < config.dark_threshold {
                continue;
            }
            valid.push(ValidFrame {
                frame_number,
                brightness_score: score,
            });
        }

        if let Some(progress) = on_progress {
            progress(scanned);
        }
    }

    if valid.is_empty() {
        return Err(BeamtraceError::NoValidFrames {
            threshold: config.dark_threshold,
            first,
            last,
        });
    }

    info!(
        valid = valid.len(),
        scanned, "Dark-frame scan complete"
    );
    Ok(valid)
}
