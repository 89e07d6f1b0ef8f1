//! Laser ramp-up detection.
//!
//! Block-averages the brightness-score sequence and looks for the step
//! where the laser turns on, so only steady-state frames feed the
//! downstream statistics.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::consts::{
    DEFAULT_RAMP_BLOCK_SIZE, RAMP_MEDIAN_RATIO, RAMP_MIN_STEP, RAMP_SETTLE_FRACTION,
    RAMP_SETTLE_LOOKBACK,
};
use crate::dark::ValidFrame;
use crate::error::{BeamtraceError, Result};
use crate::stats::median;

/// Where the illumination step sits, in block indices.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct RampLocation {
    /// First block at the raised level.
    pub start: usize,
    /// First block where the step has settled. Informational only: trimming
    /// uses `start` alone, and trailing frames are never cut.
    pub end: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RampConfig {
    /// Whether to run ramp detection at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Frames per block when averaging the score sequence.
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Minimum absolute block-mean jump that can start a ramp.
    #[serde(default = "default_min_step")]
    pub min_step: f64,
    /// The post-step block mean must exceed this multiple of the median of
    /// the block means seen so far. Guards against small jumps in an
    /// already-bright signal.
    #[serde(default = "default_median_ratio")]
    pub median_ratio: f64,
}

fn default_enabled() -> bool {
    true
}
fn default_block_size() -> usize {
    DEFAULT_RAMP_BLOCK_SIZE
}
fn default_min_step() -> f64 {
    RAMP_MIN_STEP
}
fn default_median_ratio() -> f64 {
    RAMP_MEDIAN_RATIO
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            block_size: DEFAULT_RAMP_BLOCK_SIZE,
            min_step: RAMP_MIN_STEP,
            median_ratio: RAMP_MEDIAN_RATIO,
        }
    }
}

impl RampConfig {
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(BeamtraceError::InvalidConfig(
                "ramp block size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Per-block means of contiguous, non-overlapping blocks of `block_size`
/// samples. A trailing partial block is discarded.
pub fn block_means(scores: &[f64], block_size: usize) -> Vec<f64> {
    if block_size == 0 || scores.len() < block_size {
        return Vec::new();
    }
    let mut means = Vec::with_capacity(scores.len() / block_size);
    let mut i = 0;
    while i + block_size <= scores.len() {
        let block = &scores[i..i + block_size];
        means.push(block.iter().sum::<f64>() / block_size as f64);
        i += block_size;
    }
    means
}

/// Scan consecutive block-mean differences for the turn-on step.
///
/// `start` is the first block index `i+1` whose incoming difference exceeds
/// `min_step` while the block mean exceeds `median_ratio` times the median
/// of the means seen so far. `end` is the first later block whose absolute
/// difference drops below [`RAMP_SETTLE_FRACTION`] of the median absolute
/// difference over the [`RAMP_SETTLE_LOOKBACK`] blocks up to and including
/// the step.
pub fn find_ramp(means: &[f64], min_step: f64, median_ratio: f64) -> Option<RampLocation> {
    if means.len() < 2 {
        return None;
    }
    let diffs: Vec<f64> = means.windows(2).map(|w| w[1] - w[0]).collect();

    let mut start = None;
    for (i, &d) in diffs.iter().enumerate() {
        if d > min_step && means[i + 1] > median_ratio * median(&means[..=i]) {
            start = Some(i + 1);
            break;
        }
    }
    let start = start?;

    let lookback_from = start.saturating_sub(RAMP_SETTLE_LOOKBACK);
    let settle_scale: Vec<f64> = diffs[lookback_from..=start.min(diffs.len() - 1)]
        .iter()
        .map(|d| d.abs())
        .collect();
    let settle_cutoff = RAMP_SETTLE_FRACTION * median(&settle_scale);

    let mut end = None;
    for (j, d) in diffs.iter().enumerate().skip(start + 1) {
        if d.abs() < settle_cutoff {
            end = Some(j + 1);
            break;
        }
    }

    Some(RampLocation { start, end })
}

/// Detect the ramp in a valid-frame list and drop everything before it.
///
/// Returns the (possibly trimmed) list and the ramp location, if any.
/// Detection only runs when the list is longer than two blocks; a missing
/// ramp is not an error and leaves the list untouched.
pub fn detect_and_trim(
    valid: Vec<ValidFrame>,
    config: &RampConfig,
) -> (Vec<ValidFrame>, Option<RampLocation>) {
    if !config.enabled || valid.len() <= config.block_size * 2 {
        return (valid, None);
    }

    let scores: Vec<f64> = valid.iter().map(|v| v.brightness_score).collect();
    let means = block_means(&scores, config.block_size);
    let ramp = match find_ramp(&means, config.min_step, config.median_ratio) {
        Some(r) => r,
        None => {
            info!("No illumination ramp found; keeping full valid-frame list");
            return (valid, None);
        }
    };

    let cut_index = ramp.start * config.block_size;
    let cut_frame = match valid.get(cut_index) {
        Some(v) => v.frame_number,
        None => {
            warn!(
                cut_index,
                valid = valid.len(),
                "Ramp start block maps past the valid-frame list; not trimming"
            );
            return (valid, Some(ramp));
        }
    };

    info!(
        ramp_start_block = ramp.start,
        ramp_end_block = ?ramp.end,
        cut_frame,
        "Detected laser ramp"
    );

    let trimmed: Vec<ValidFrame> = valid
        .into_iter()
        .filter(|v| v.frame_number >= cut_frame)
        .collect();
    (trimmed, Some(ramp))
}
