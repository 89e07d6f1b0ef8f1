use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use indicatif::ProgressBar;

use beamtrace_core::dark::{scan_valid_frames, ScanConfig};
use beamtrace_core::io::ser::SerSource;
use beamtrace_core::io::FrameSource;
use beamtrace_core::ramp::{detect_and_trim, RampConfig};

use super::progress::BarReporter;

#[derive(Args)]
pub struct ScanArgs {
    /// Input SER file
    pub file: PathBuf,

    /// Brightness-score threshold below which a frame is dark
    #[arg(long, default_value = "5000")]
    pub dark_threshold: f64,

    /// Frames to skip at the start of the recording
    #[arg(long, default_value = "0")]
    pub skip: usize,

    /// Disable ramp detection
    #[arg(long)]
    pub no_ramp: bool,

    /// Block size (frames) for ramp detection
    #[arg(long, default_value = "30")]
    pub block_size: usize,
}

pub fn run(args: &ScanArgs) -> Result<()> {
    let source = SerSource::open(&args.file)?;
    let total = source.frame_count().saturating_sub(args.skip);

    let pb = ProgressBar::new(total as u64);
    pb.set_style(BarReporter::style());
    pb.set_message("Scanning frames");

    let scan_config = ScanConfig {
        skip_initial_frames: args.skip,
        dark_threshold: args.dark_threshold,
    };
    let progress = |done: usize| pb.set_position(done as u64);
    let valid = scan_valid_frames(&source, &scan_config, Some(&progress))?;
    pb.finish_and_clear();

    println!("Frames scanned:       {}", total);
    println!("Valid (above {:.0}): {}", args.dark_threshold, valid.len());

    let ramp_config = RampConfig {
        enabled: !args.no_ramp,
        block_size: args.block_size,
        ..Default::default()
    };
    let (trimmed, ramp) = detect_and_trim(valid, &ramp_config);

    match ramp {
        Some(r) => {
            println!("Ramp start block:     {}", r.start);
            match r.end {
                Some(end) => println!("Ramp settled block:   {}", end),
                None => println!("Ramp settled block:   not found"),
            }
            println!(
                "Frames after trim:    {} (first frame {})",
                trimmed.len(),
                trimmed.first().map(|v| v.frame_number).unwrap_or(0)
            );
        }
        None => println!("Ramp:                 not detected"),
    }

    Ok(())
}
