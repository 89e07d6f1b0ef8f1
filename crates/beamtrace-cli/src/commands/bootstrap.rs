use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use beamtrace_core::bootstrap::{bootstrap_si, summarize, BootstrapConfig};
use beamtrace_core::stats::scintillation_index;

use super::csv;

#[derive(Clone, ValueEnum)]
pub enum TraceArg {
    Fixed,
    Tracking,
    Raw,
}

#[derive(Args)]
pub struct BootstrapArgs {
    /// Intensity-trace CSV from `beamtrace photometry`
    pub traces: PathBuf,

    /// Which trace column to bootstrap
    #[arg(long, value_enum, default_value = "tracking")]
    pub trace: TraceArg,

    /// Number of bootstrap resamples
    #[arg(long, default_value = "10000")]
    pub count: usize,

    /// Samples per resampled block
    #[arg(long, default_value = "100")]
    pub block_size: usize,

    /// RNG seed for a reproducible distribution
    #[arg(long)]
    pub seed: Option<u64>,

    /// Write the distribution summary as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: &BootstrapArgs) -> Result<()> {
    let (column, name) = match args.trace {
        TraceArg::Fixed => (0, "fixed aperture"),
        TraceArg::Tracking => (1, "tracking aperture"),
        TraceArg::Raw => (2, "raw centroid region"),
    };
    let trace = csv::read_trace_column(&args.traces, column)?;

    let config = BootstrapConfig {
        count: args.count,
        block_size: args.block_size,
        seed: args.seed,
    };
    let distribution = bootstrap_si(&trace, &config)?;
    let summary = summarize(&distribution);
    let point_si = scintillation_index(&trace);

    println!("Bootstrap SI distribution ({name}, {} samples):", trace.len());
    println!("{:>12}  {:>12}", "Statistic", "Value");
    println!("{}", "-".repeat(26));
    println!("{:>12}  {:>12.6}", "Point SI", point_si);
    println!("{:>12}  {:>12.6}", "Mean", summary.mean);
    println!("{:>12}  {:>12.6}", "Std", summary.std);
    println!("{:>12}  {:>12.6}", "Min", summary.min);
    println!("{:>12}  {:>12.6}", "Max", summary.max);
    println!(
        "{:>12}  [{:.6}, {:.6}]",
        "95% CI", summary.ci_low, summary.ci_high
    );

    if let Some(ref path) = args.output {
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\nSummary saved to {}", path.display());
    }

    Ok(())
}
