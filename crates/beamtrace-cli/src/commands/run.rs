use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use beamtrace_core::io::ser::SerSource;
use beamtrace_core::pipeline::config::PipelineConfig;
use beamtrace_core::pipeline::run_pipeline_reported;

use super::csv;
use super::progress::BarReporter;
use crate::summary;

#[derive(Args)]
pub struct RunArgs {
    /// Pipeline config file (TOML)
    pub config: PathBuf,

    /// Override the input SER file from the config
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Override the output directory from the config
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let contents = std::fs::read_to_string(&args.config)
        .with_context(|| format!("Failed to read config {}", args.config.display()))?;
    let mut config: PipelineConfig = toml::from_str(&contents).context("Invalid pipeline config")?;

    if let Some(ref input) = args.input {
        config.input = input.clone();
    }
    if let Some(ref output) = args.output {
        config.output_dir = output.clone();
    }

    summary::print_run_summary(&config);

    let source = SerSource::open_with_offset(&config.input, config.first_frame_number)?;
    std::fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("Failed to create {}", config.output_dir.display()))?;

    let output = run_pipeline_reported(&source, &config, Arc::new(BarReporter::new()))?;

    // Trajectory table + tracking summary
    let rows = output.trajectory.rows();
    let trajectory_path = config.output_dir.join("centroid_trajectory.csv");
    csv::write_trajectory(&trajectory_path, &rows)?;

    let stats = output.trajectory.stats();
    let first = output.trajectory.samples.first().expect("non-empty trajectory");
    let last = output.trajectory.samples.last().expect("non-empty trajectory");
    let tracking_record = json!({
        "total_frames": output.trajectory.len(),
        "fallback_frames": output.trajectory.fallback_count,
        "ramp_start_block": output.ramp.map(|r| r.start),
        "ramp_end_block": output.ramp.and_then(|r| r.end),
        "statistics": stats,
        "initial_position": { "x": first.x, "y": first.y },
        "final_position": { "x": last.x, "y": last.y },
        "roi": config.roi,
    });
    let tracking_path = config.output_dir.join("centroid_tracking_results.json");
    std::fs::write(&tracking_path, serde_json::to_string_pretty(&tracking_record)?)
        .with_context(|| format!("Failed to write {}", tracking_path.display()))?;

    // Intensity traces + SI decomposition
    let traces_path = config.output_dir.join("intensity_traces.csv");
    csv::write_traces(&traces_path, &output.photometry.traces)?;

    let s = &output.photometry.summary;
    let si_record = json!({
        "aperture_radius": s.aperture_radius,
        "edge_exclusion_percent": s.edge_exclusion_percent,
        "frames_analyzed": s.frames_analyzed,
        "SI": {
            "fixed_aperture": s.si_fixed_aperture,
            "tracking_aperture": s.si_tracking_aperture,
            "raw_centroid_region": s.si_raw_centroid_region,
            "geometric_wander_component": s.si_geometric_wander_component,
            "ratio_fixed_to_tracking": s.si_ratio_fixed_to_tracking,
        },
        "intensity_stats": {
            "fixed_aperture": s.fixed_stats,
            "tracking_aperture": s.tracking_stats,
            "raw_centroid_region": s.raw_stats,
        },
        "bootstrap": output.bootstrap,
    });
    let si_path = config.output_dir.join("aperture_si_results.json");
    std::fs::write(&si_path, serde_json::to_string_pretty(&si_record)?)
        .with_context(|| format!("Failed to write {}", si_path.display()))?;

    summary::print_results(&output);
    println!("\nArtifacts written to {}", config.output_dir.display());

    Ok(())
}
