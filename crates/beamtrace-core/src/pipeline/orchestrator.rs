use std::sync::Arc;

use tracing::info;

use crate::bootstrap::{bootstrap_si, summarize};
use crate::dark::scan_valid_frames;
use crate::error::Result;
use crate::io::FrameSource;
use crate::photometry::measure_apertures;
use crate::ramp::detect_and_trim;
use crate::trajectory::build_trajectory;

use super::config::PipelineConfig;
use super::types::{NoOpReporter, PipelineOutput, PipelineStage, ProgressReporter};

/// Run the full analysis pipeline with a thread-safe progress reporter.
///
/// Stages run strictly in sequence: dark-frame scan, ramp trimming,
/// centroid tracking, aperture photometry, and optionally the SI bootstrap
/// over the tracking trace. Each stage consumes the complete output of its
/// predecessor.
pub fn run_pipeline_reported(
    source: &dyn FrameSource,
    config: &PipelineConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PipelineOutput> {
    config.validate()?;

    let (first, last) = source.frame_range();
    info!(first, last, "Starting analysis run");

    reporter.begin_stage(
        PipelineStage::DarkFrameScan,
        Some(source.frame_count().saturating_sub(config.scan.skip_initial_frames)),
    );
    let progress = |done: usize| reporter.advance(done);
    let valid = scan_valid_frames(source, &config.scan, Some(&progress))?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::RampDetection, None);
    let (valid, ramp) = detect_and_trim(valid, &config.ramp);
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::CentroidTracking, Some(valid.len()));
    let trajectory =
        build_trajectory(source, &valid, config.roi, &config.centroid, Some(&progress))?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Photometry, Some(trajectory.len()));
    let photometry = measure_apertures(source, &trajectory, &config.aperture, Some(&progress))?;
    reporter.finish_stage();

    let bootstrap = if config.run_bootstrap {
        reporter.begin_stage(PipelineStage::Bootstrap, Some(config.bootstrap.count));
        let distribution = bootstrap_si(&photometry.traces.tracking, &config.bootstrap)?;
        reporter.finish_stage();
        Some(summarize(&distribution))
    } else {
        None
    };

    info!("Analysis run complete");

    Ok(PipelineOutput {
        valid_frames: valid,
        ramp,
        trajectory,
        photometry,
        bootstrap,
    })
}

/// Run the full analysis pipeline without progress reporting.
pub fn run_pipeline(source: &dyn FrameSource, config: &PipelineConfig) -> Result<PipelineOutput> {
    run_pipeline_reported(source, config, Arc::new(NoOpReporter))
}
