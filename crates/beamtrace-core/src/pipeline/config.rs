use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::bootstrap::BootstrapConfig;
use crate::centroid::CentroidConfig;
use crate::dark::ScanConfig;
use crate::error::Result;
use crate::frame::Roi;
use crate::photometry::ApertureConfig;
use crate::ramp::RampConfig;

/// Immutable per-run configuration.
///
/// Every stage reads its parameters from here; nothing consults ambient
/// global settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Input SER recording.
    pub input: PathBuf,
    /// Directory receiving the run's artifacts.
    pub output_dir: PathBuf,
    /// Frame number carried by the first frame of the recording.
    #[serde(default)]
    pub first_frame_number: usize,
    /// Restrict centroid tracking to this region, in full-frame pixels.
    #[serde(default)]
    pub roi: Option<Roi>,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub ramp: RampConfig,
    #[serde(default)]
    pub centroid: CentroidConfig,
    #[serde(default)]
    pub aperture: ApertureConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    /// Whether to bootstrap the tracking-aperture trace at the end of the
    /// run.
    #[serde(default = "default_run_bootstrap")]
    pub run_bootstrap: bool,
}

fn default_run_bootstrap() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("input.ser"),
            output_dir: PathBuf::from("."),
            first_frame_number: 0,
            roi: None,
            scan: ScanConfig::default(),
            ramp: RampConfig::default(),
            centroid: CentroidConfig::default(),
            aperture: ApertureConfig::default(),
            bootstrap: BootstrapConfig::default(),
            run_bootstrap: true,
        }
    }
}

impl PipelineConfig {
    /// Check every stage's preconditions before touching any frame.
    pub fn validate(&self) -> Result<()> {
        self.ramp.validate()?;
        self.centroid.validate()?;
        self.aperture.validate()?;
        if self.run_bootstrap {
            self.bootstrap.validate()?;
        }
        Ok(())
    }
}
