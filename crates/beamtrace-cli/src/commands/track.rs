use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use indicatif::ProgressBar;
use serde_json::json;

use beamtrace_core::centroid::{CentroidConfig, ThresholdPolicy};
use beamtrace_core::consts::DEFAULT_ADAPTIVE_BIAS;
use beamtrace_core::dark::{scan_valid_frames, ScanConfig};
use beamtrace_core::frame::Roi;
use beamtrace_core::io::ser::SerSource;
use beamtrace_core::io::FrameSource;
use beamtrace_core::ramp::{detect_and_trim, RampConfig};
use beamtrace_core::trajectory::build_trajectory;

use super::csv;
use super::progress::BarReporter;

#[derive(Args)]
pub struct TrackArgs {
    /// Input SER file
    pub file: PathBuf,

    /// Output directory for trajectory CSV and summary JSON
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Brightness-score threshold below which a frame is dark
    #[arg(long, default_value = "5000")]
    pub dark_threshold: f64,

    /// Frames to skip at the start of the recording
    #[arg(long, default_value = "0")]
    pub skip: usize,

    /// Disable ramp detection
    #[arg(long)]
    pub no_ramp: bool,

    /// Restrict tracking to a region: x,y,width,height
    #[arg(long)]
    pub roi: Option<String>,

    /// Percentile for the global threshold
    #[arg(long, default_value = "90")]
    pub percentile: f64,

    /// Use local-adaptive thresholding instead of the global percentile
    #[arg(long)]
    pub adaptive: bool,

    /// Block size for adaptive thresholding (odd)
    #[arg(long, default_value = "51")]
    pub adaptive_block: usize,

    /// Disable the edge-exclusion annulus
    #[arg(long)]
    pub no_edge_exclusion: bool,

    /// Explicit edge-exclusion margin in pixels
    #[arg(long)]
    pub edge_margin: Option<usize>,
}

pub fn run(args: &TrackArgs) -> Result<()> {
    let source = SerSource::open(&args.file)?;
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let roi = args.roi.as_deref().map(parse_roi).transpose()?;

    let centroid = CentroidConfig {
        threshold: if args.adaptive {
            ThresholdPolicy::LocalAdaptive {
                block_size: args.adaptive_block,
                bias: DEFAULT_ADAPTIVE_BIAS,
            }
        } else {
            ThresholdPolicy::GlobalPercentile {
                percentile: args.percentile,
            }
        },
        exclude_edges: !args.no_edge_exclusion,
        edge_margin: args.edge_margin,
        exclusion_center: None,
    };
    centroid.validate()?;

    // Dark-frame scan + ramp trim
    let total = source.frame_count().saturating_sub(args.skip);
    let pb = ProgressBar::new(total as u64);
    pb.set_style(BarReporter::style());
    pb.set_message("Scanning frames");
    let progress = |done: usize| pb.set_position(done as u64);
    let valid = scan_valid_frames(
        &source,
        &ScanConfig {
            skip_initial_frames: args.skip,
            dark_threshold: args.dark_threshold,
        },
        Some(&progress),
    )?;
    pb.finish_and_clear();

    let (valid, ramp) = detect_and_trim(
        valid,
        &RampConfig {
            enabled: !args.no_ramp,
            ..Default::default()
        },
    );
    if let Some(r) = ramp {
        println!("Ramp detected at block {}", r.start);
    }

    // Centroid tracking
    let pb = ProgressBar::new(valid.len() as u64);
    pb.set_style(BarReporter::style());
    pb.set_message("Tracking centroid");
    let progress = |done: usize| pb.set_position(done as u64);
    let trajectory = build_trajectory(&source, &valid, roi, &centroid, Some(&progress))?;
    pb.finish_and_clear();

    let stats = trajectory.stats();
    let rows = trajectory.rows();

    println!("Frames tracked:    {}", trajectory.len());
    println!(
        "Mean position:     ({:.2}, {:.2})",
        stats.mean_x, stats.mean_y
    );
    println!(
        "Std deviation:     ({:.2}, {:.2}) px",
        stats.std_x, stats.std_y
    );
    println!("Max displacement:  {:.2} px", stats.max_displacement);
    println!("Mean displacement: {:.2} px", stats.mean_displacement);
    if trajectory.fallback_count > 0 {
        println!(
            "Fallback frames:   {} (no spot detected)",
            trajectory.fallback_count
        );
    }

    let csv_path = args.output.join("centroid_trajectory.csv");
    csv::write_trajectory(&csv_path, &rows)?;

    let first = trajectory.samples.first().expect("non-empty trajectory");
    let last = trajectory.samples.last().expect("non-empty trajectory");
    let summary = json!({
        "total_frames": trajectory.len(),
        "fallback_frames": trajectory.fallback_count,
        "ramp_start_block": ramp.map(|r| r.start),
        "statistics": {
            "mean_x": stats.mean_x,
            "mean_y": stats.mean_y,
            "std_x": stats.std_x,
            "std_y": stats.std_y,
            "max_displacement": stats.max_displacement,
            "mean_displacement": stats.mean_displacement,
        },
        "initial_position": { "x": first.x, "y": first.y },
        "final_position": { "x": last.x, "y": last.y },
        "roi": roi,
    });
    let json_path = args.output.join("centroid_tracking_results.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    println!("\nTrajectory saved to {}", csv_path.display());
    println!("Summary saved to {}", json_path.display());

    Ok(())
}

fn parse_roi(s: &str) -> Result<Roi> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 4 {
        bail!("ROI must be x,y,width,height");
    }
    Ok(Roi {
        x: parts[0].parse()?,
        y: parts[1].parse()?,
        width: parts[2].parse()?,
        height: parts[3].parse()?,
    })
}
