/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Number of frames decoded simultaneously while scanning a source.
/// Balances memory usage vs. parallelism.
pub const SCAN_BATCH_SIZE: usize = 32;

/// Default brightness-score threshold below which a frame counts as dark.
pub const DEFAULT_DARK_THRESHOLD: f64 = 5_000.0;

/// Half-width (pixels) of the window summed for the per-frame brightness score.
pub const SCORE_WINDOW_HALF_WIDTH: usize = 20;

/// Percentile used to pick bright pixels when scoring a frame.
pub const SCORE_THRESHOLD_PERCENTILE: f64 = 90.0;

/// Default block size (frames per block) for ramp detection.
pub const DEFAULT_RAMP_BLOCK_SIZE: usize = 30;

/// Minimum absolute block-mean jump that can start a ramp.
pub const RAMP_MIN_STEP: f64 = 30_000.0;

/// Post-step block mean must exceed this multiple of the running median.
pub const RAMP_MEDIAN_RATIO: f64 = 1.5;

/// A ramp has settled when the block-mean difference falls below this
/// fraction of the median difference around the step.
pub const RAMP_SETTLE_FRACTION: f64 = 0.1;

/// Number of blocks preceding the step included in the settle median.
pub const RAMP_SETTLE_LOOKBACK: usize = 5;

/// Default percentile for the global-percentile centroid threshold.
pub const DEFAULT_THRESHOLD_PERCENTILE: f64 = 90.0;

/// Default block size for local-adaptive thresholding (must be odd).
pub const DEFAULT_ADAPTIVE_BLOCK_SIZE: usize = 51;

/// Bias subtracted from the local Gaussian-weighted mean when classifying
/// a pixel. Negative raises the effective threshold above the local mean.
pub const DEFAULT_ADAPTIVE_BIAS: f64 = -10.0;

/// Fraction of the smaller frame dimension excluded from the frame edge
/// when no explicit edge-exclusion margin is given.
pub const EDGE_EXCLUSION_FRACTION: f64 = 0.15;

/// Default outer radius (pixels) of the photometry aperture.
pub const DEFAULT_APERTURE_RADIUS: f64 = 30.0;

/// Fixed inner exclusion radius (pixels) keeping a hot center pixel out of
/// the fixed and tracking aperture means.
pub const APERTURE_INNER_RADIUS: f64 = 5.0;

/// Default percentage of the aperture radius excluded as an outer ring.
pub const DEFAULT_EDGE_EXCLUSION_PERCENT: f64 = 15.0;

/// Epsilon guarding the scintillation-index denominator against a
/// degenerate all-zero trace.
pub const SI_EPSILON: f64 = 1e-6;

/// Default number of bootstrap resamples.
pub const DEFAULT_BOOTSTRAP_COUNT: usize = 10_000;

/// Default block length (samples) for the block bootstrap.
pub const DEFAULT_BOOTSTRAP_BLOCK_SIZE: usize = 100;
