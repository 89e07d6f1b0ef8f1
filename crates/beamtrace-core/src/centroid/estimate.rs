//! Per-frame spot localization.
//!
//! Denoise, optionally zero the edge annulus, threshold, then take the
//! intensity-weighted center of mass of the surviving pixels over the
//! original (not denoised) frame. An empty mask falls back to the geometric
//! center of the region, never an error.

use ndarray::Array2;
use rayon::prelude::*;

use crate::consts::PARALLEL_PIXEL_THRESHOLD;
use crate::filters::gaussian_blur::gaussian_blur_with_radius;
use crate::filters::median_filter_3x3;
use crate::frame::{RoiPoint, SpotLocation};
use crate::stats::percentile;

use super::config::{CentroidConfig, ThresholdPolicy};
use super::mask::{edge_exclusion_mask, region_midpoint};

/// Locate the bright spot within a region.
///
/// Returns the position in the coordinate space of `region`; callers working
/// on a sub-region reproject via [`crate::frame::Roi::to_frame`].
pub fn locate_spot(region: &Array2<f32>, config: &CentroidConfig) -> SpotLocation {
    let (h, w) = region.dim();
    let fallback = SpotLocation::FallbackCenter(RoiPoint {
        x: w as f64 / 2.0,
        y: h as f64 / 2.0,
    });
    if h == 0 || w == 0 {
        return fallback;
    }

    let denoised = median_filter_3x3(region);

    let exclusion = if config.exclude_edges {
        let center = config
            .exclusion_center
            .unwrap_or_else(|| region_midpoint(h, w));
        Some(edge_exclusion_mask(h, w, center, config.edge_margin))
    } else {
        None
    };

    let mut masked = denoised;
    if let Some(ref keep) = exclusion {
        for ((r, c), v) in masked.indexed_iter_mut() {
            if !keep[[r, c]] {
                *v = 0.0;
            }
        }
    }

    let bright = match config.threshold {
        ThresholdPolicy::GlobalPercentile { percentile: p } => {
            global_percentile_mask(&masked, p)
        }
        ThresholdPolicy::LocalAdaptive { block_size, bias } => {
            adaptive_mask(&masked, block_size, bias)
        }
    };

    let mut bright = match bright {
        Some(b) => b,
        None => return fallback,
    };

    if let Some(ref keep) = exclusion {
        for ((r, c), v) in bright.indexed_iter_mut() {
            *v = *v && keep[[r, c]];
        }
    }

    // Center of mass over the original frame's intensities, so denoising
    // cannot shift the recovered position.
    match weighted_centroid(region, &bright) {
        Some(p) => SpotLocation::Detected(p),
        None => fallback,
    }
}

/// Global-percentile segmentation over the strictly-positive pixels of the
/// masked frame. Returns `None` when no pixel is positive.
fn global_percentile_mask(masked: &Array2<f32>, pct: f64) -> Option<Array2<bool>> {
    let positives: Vec<f64> = masked
        .iter()
        .filter(|&&v| v > 0.0)
        .map(|&v| v as f64)
        .collect();
    if positives.is_empty() {
        return None;
    }
    let threshold = percentile(&positives, pct) as f32;
    Some(masked.mapv(|v| v > threshold))
}

/// Local-adaptive segmentation: rescale the masked frame to 8-bit range and
/// keep pixels exceeding the Gaussian-weighted neighborhood mean minus
/// `bias` (a negative bias raises the effective threshold).
fn adaptive_mask(masked: &Array2<f32>, block_size: usize, bias: f64) -> Option<Array2<bool>> {
    let min = masked.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = masked.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    if !(max > min) {
        return None;
    }

    let rescaled = masked.mapv(|v| (v - min) / (max - min) * 255.0);

    // Sigma convention matching the standard Gaussian adaptive threshold
    // for a given odd block size.
    let sigma = 0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let radius = block_size / 2;
    let local_mean = gaussian_blur_with_radius(&rescaled, sigma, radius);

    let cutoff = -bias as f32;
    let mut mask = Array2::from_elem(masked.dim(), false);
    for ((r, c), v) in rescaled.indexed_iter() {
        mask[[r, c]] = *v > local_mean[[r, c]] + cutoff;
    }
    Some(mask)
}

/// Intensity-weighted centroid of the pixels selected by `mask`.
///
/// Returns `None` when no pixel is selected or the total selected intensity
/// is not positive.
pub fn weighted_centroid(data: &Array2<f32>, mask: &Array2<bool>) -> Option<RoiPoint> {
    let (h, w) = data.dim();

    let (sum_x, sum_y, sum_w) = if h * w >= PARALLEL_PIXEL_THRESHOLD {
        (0..h)
            .into_par_iter()
            .map(|row| {
                let mut sx = 0.0f64;
                let mut sy = 0.0f64;
                let mut sw = 0.0f64;
                for col in 0..w {
                    if mask[[row, col]] {
                        let weight = data[[row, col]] as f64;
                        sx += col as f64 * weight;
                        sy += row as f64 * weight;
                        sw += weight;
                    }
                }
                (sx, sy, sw)
            })
            .reduce(
                || (0.0, 0.0, 0.0),
                |(ax, ay, aw), (x, y, wt)| (ax + x, ay + y, aw + wt),
            )
    } else {
        let mut sx = 0.0f64;
        let mut sy = 0.0f64;
        let mut sw = 0.0f64;
        for row in 0..h {
            for col in 0..w {
                if mask[[row, col]] {
                    let weight = data[[row, col]] as f64;
                    sx += col as f64 * weight;
                    sy += row as f64 * weight;
                    sw += weight;
                }
            }
        }
        (sx, sy, sw)
    };

    if sum_w > 0.0 {
        Some(RoiPoint {
            x: sum_x / sum_w,
            y: sum_y / sum_w,
        })
    } else {
        None
    }
}
