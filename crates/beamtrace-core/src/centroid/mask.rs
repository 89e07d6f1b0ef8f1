use ndarray::Array2;

use crate::consts::EDGE_EXCLUSION_FRACTION;

/// Circular edge-exclusion mask for a region.
///
/// `true` marks pixels kept for thresholding. The kept disk is the largest
/// circle inscribed around `center` shrunk by `margin` pixels; everything at
/// or beyond that inner radius is excluded. Must be applied before
/// thresholding: the outer ring can be brighter than the spot itself, and
/// percentile thresholds shift with the pixel population.
pub fn edge_exclusion_mask(
    height: usize,
    width: usize,
    center: (usize, usize),
    margin: Option<usize>,
) -> Array2<bool> {
    let (cx, cy) = center;
    let margin = margin
        .unwrap_or_else(|| (width.min(height) as f64 * EDGE_EXCLUSION_FRACTION) as usize);

    // Largest radius that fits inside the region around the center.
    let max_radius = cx
        .min(cy)
        .min(width.saturating_sub(cx))
        .min(height.saturating_sub(cy));
    let inner_radius = max_radius.saturating_sub(margin) as f64;

    let mut mask = Array2::from_elem((height, width), false);
    for row in 0..height {
        for col in 0..width {
            let dx = col as f64 - cx as f64;
            let dy = row as f64 - cy as f64;
            mask[[row, col]] = (dx * dx + dy * dy).sqrt() < inner_radius;
        }
    }
    mask
}

/// Geometric center of a region in its own coordinate space, used for the
/// exclusion circle when no explicit center is supplied.
pub fn region_midpoint(height: usize, width: usize) -> (usize, usize) {
    (width / 2, height / 2)
}
