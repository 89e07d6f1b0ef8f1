use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::ProgressBar;
use serde_json::json;

use beamtrace_core::io::ser::SerSource;
use beamtrace_core::photometry::{measure_apertures, ApertureConfig};

use super::csv;
use super::progress::BarReporter;

#[derive(Args)]
pub struct PhotometryArgs {
    /// Input SER file
    pub file: PathBuf,

    /// Centroid trajectory CSV from `beamtrace track`
    pub trajectory: PathBuf,

    /// Output directory for the trace CSV and SI summary JSON
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// Aperture radius in pixels
    #[arg(long, default_value = "30")]
    pub radius: f64,

    /// Outer ring of the tracking aperture to exclude, percent of radius
    #[arg(long, default_value = "15")]
    pub edge_exclusion: f64,
}

pub fn run(args: &PhotometryArgs) -> Result<()> {
    let source = SerSource::open(&args.file)?;
    let trajectory = csv::read_trajectory(&args.trajectory)?;
    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let config = ApertureConfig {
        radius: args.radius,
        edge_exclusion_percent: args.edge_exclusion,
    };

    let pb = ProgressBar::new(trajectory.len() as u64);
    pb.set_style(BarReporter::style());
    pb.set_message("Measuring apertures");
    let progress = |done: usize| pb.set_position(done as u64);
    let result = measure_apertures(&source, &trajectory, &config, Some(&progress))?;
    pb.finish_and_clear();

    let s = &result.summary;
    println!("Scintillation index, {} frames analyzed:", s.frames_analyzed);
    println!("  Fixed aperture (wander included):  {:.6}", s.si_fixed_aperture);
    println!("  Tracking aperture (wander removed): {:.6}", s.si_tracking_aperture);
    println!("  Raw centroid region:                {:.6}", s.si_raw_centroid_region);
    println!();
    println!(
        "  Geometric wander component: {:.6}",
        s.si_geometric_wander_component
    );
    if s.si_geometric_wander_component < 0.0 {
        println!("  (negative wander: estimator noise, reported unclamped)");
    }
    println!(
        "  Ratio fixed/tracking:       {:.3}x",
        s.si_ratio_fixed_to_tracking
    );
    println!(
        "  Wander share of fixed SI:   {:.1}%",
        s.wander_percent_of_fixed
    );
    if result.traces.invalid_frames > 0 {
        println!(
            "  Frames dropped (empty aperture mask): {}",
            result.traces.invalid_frames
        );
    }

    let traces_path = args.output.join("intensity_traces.csv");
    csv::write_traces(&traces_path, &result.traces)?;

    let record = json!({
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
    });
    let json_path = args.output.join("aperture_si_results.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&record)?)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    println!("\nTraces saved to {}", traces_path.display());
    println!("SI summary saved to {}", json_path.display());

    Ok(())
}
