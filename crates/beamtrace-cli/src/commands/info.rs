use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use beamtrace_core::io::ser::SerSource;
use beamtrace_core::io::FrameSource;

#[derive(Args)]
pub struct InfoArgs {
    /// Input SER file
    pub file: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let source = SerSource::open(&args.file)?;
    let (first, last) = source.frame_range();

    println!("File:        {}", args.file.display());
    println!("Frames:      {}", source.frame_count());
    println!("Range:       {} to {}", first, last);
    println!(
        "Dimensions:  {}x{}",
        source.header.width, source.header.height
    );
    println!("Bit depth:   {}", source.header.pixel_depth);

    if !source.header.observer.is_empty() {
        println!("Observer:    {}", source.header.observer);
    }
    if !source.header.telescope.is_empty() {
        println!("Telescope:   {}", source.header.telescope);
    }
    if !source.header.instrument.is_empty() {
        println!("Instrument:  {}", source.header.instrument);
    }

    let frame_bytes = source.header.frame_byte_size();
    let total_mb = (frame_bytes * source.frame_count()) as f64 / (1024.0 * 1024.0);
    println!("Data size:   {:.1} MB", total_mb);

    Ok(())
}
