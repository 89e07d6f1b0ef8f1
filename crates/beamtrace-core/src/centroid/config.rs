use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ADAPTIVE_BIAS, DEFAULT_ADAPTIVE_BLOCK_SIZE, DEFAULT_THRESHOLD_PERCENTILE,
};
use crate::error::{BeamtraceError, Result};

/// Method used to separate the bright spot from the background.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ThresholdPolicy {
    /// Keep pixels above the given percentile of the strictly-positive
    /// pixels of the masked frame.
    GlobalPercentile { percentile: f64 },
    /// Classify each pixel against a Gaussian-weighted neighborhood mean
    /// offset by `bias`, after rescaling the masked frame to 8-bit range.
    /// Better for non-uniform illumination; `block_size` must be odd.
    LocalAdaptive { block_size: usize, bias: f64 },
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::GlobalPercentile {
            percentile: DEFAULT_THRESHOLD_PERCENTILE,
        }
    }
}

impl ThresholdPolicy {
    pub fn local_adaptive() -> Self {
        Self::LocalAdaptive {
            block_size: DEFAULT_ADAPTIVE_BLOCK_SIZE,
            bias: DEFAULT_ADAPTIVE_BIAS,
        }
    }
}

/// Configuration for locating the spot centroid in a single region.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CentroidConfig {
    /// Thresholding policy.
    #[serde(default)]
    pub threshold: ThresholdPolicy,
    /// Zero out an outer annulus before thresholding. Removes a bright
    /// edge ring that would otherwise dominate percentile thresholds.
    #[serde(default = "default_exclude_edges")]
    pub exclude_edges: bool,
    /// Pixels from the largest inscribed radius to exclude. `None` derives
    /// the margin from the region size.
    #[serde(default)]
    pub edge_margin: Option<usize>,
    /// Center of the exclusion circle, in region coordinates. `None` uses
    /// the integer midpoint of the region.
    #[serde(default)]
    pub exclusion_center: Option<(usize, usize)>,
}

fn default_exclude_edges() -> bool {
    true
}

impl Default for CentroidConfig {
    fn default() -> Self {
        Self {
            threshold: ThresholdPolicy::default(),
            exclude_edges: true,
            edge_margin: None,
            exclusion_center: None,
        }
    }
}

impl CentroidConfig {
    pub fn validate(&self) -> Result<()> {
        match self.threshold {
            ThresholdPolicy::GlobalPercentile { percentile } => {
                if !(0.0..=100.0).contains(&percentile) {
                    return Err(BeamtraceError::InvalidConfig(format!(
                        "threshold percentile {percentile} outside 0..=100"
                    )));
                }
            }
            ThresholdPolicy::LocalAdaptive { block_size, .. } => {
                if block_size < 3 || block_size % 2 == 0 {
                    return Err(BeamtraceError::InvalidConfig(format!(
                        "adaptive block size {block_size} must be odd and >= 3"
                    )));
                }
            }
        }
        Ok(())
    }
}
