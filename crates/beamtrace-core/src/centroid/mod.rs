pub mod config;
pub mod estimate;
pub mod mask;

pub use config::{CentroidConfig, ThresholdPolicy};
pub use estimate::{locate_spot, weighted_centroid};
pub use mask::edge_exclusion_mask;
