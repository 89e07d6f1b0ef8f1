mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "beamtrace", about = "Laser-spot centroid and scintillation analysis tool")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show SER file metadata
    Info(commands::info::InfoArgs),
    /// Filter dark frames and report the illumination ramp
    Scan(commands::scan::ScanArgs),
    /// Track the spot centroid and export the trajectory
    Track(commands::track::TrackArgs),
    /// Fixed-vs-tracking aperture photometry on a saved trajectory
    Photometry(commands::photometry::PhotometryArgs),
    /// Bootstrap the SI distribution of a saved intensity trace
    Bootstrap(commands::bootstrap::BootstrapArgs),
    /// Run the full analysis pipeline from a TOML config
    Run(commands::run::RunArgs),
    /// Print or save a default pipeline config
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Info(args) => commands::info::run(args),
        Commands::Scan(args) => commands::scan::run(args),
        Commands::Track(args) => commands::track::run(args),
        Commands::Photometry(args) => commands::photometry::run(args),
        Commands::Bootstrap(args) => commands::bootstrap::run(args),
        Commands::Run(args) => commands::run::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
