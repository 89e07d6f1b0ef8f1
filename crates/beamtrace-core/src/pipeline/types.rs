use crate::bootstrap::BootstrapSummary;
use crate::dark::ValidFrame;
use crate::photometry::PhotometryResult;
use crate::ramp::RampLocation;
use crate::trajectory::Trajectory;

/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug)]
pub enum PipelineStage {
    DarkFrameScan,
    RampDetection,
    CentroidTracking,
    Photometry,
    Bootstrap,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DarkFrameScan => write!(f, "Filtering dark frames"),
            Self::RampDetection => write!(f, "Detecting illumination ramp"),
            Self::CentroidTracking => write!(f, "Tracking centroid"),
            Self::Photometry => write!(f, "Measuring apertures"),
            Self::Bootstrap => write!(f, "Bootstrapping SI distribution"),
        }
    }
}

/// Everything a finished run produces.
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    /// Valid-frame list after ramp trimming.
    pub valid_frames: Vec<ValidFrame>,
    pub ramp: Option<RampLocation>,
    pub trajectory: Trajectory,
    pub photometry: PhotometryResult,
    /// Bootstrap over the tracking-aperture trace, when enabled.
    pub bootstrap: Option<BootstrapSummary>,
}

/// Thread-safe progress reporting for the pipeline.
///
/// Implementors can drive progress bars or logging; all methods have
/// default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new pipeline stage has started. `total_items` is the number of
    /// work items in this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// Work items completed so far within the current stage.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}
}

/// No-op progress reporter, used when `run_pipeline` delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}
