//! Flat-file helpers for the trajectory and intensity-trace tables.
//!
//! Deliberately plain line formatting; the tables are small and versionless.

use std::path::Path;

use anyhow::{bail, Context, Result};
use beamtrace_core::photometry::IntensityTraces;
use beamtrace_core::trajectory::{CentroidSample, Trajectory, TrajectoryRow};

pub const TRAJECTORY_HEADER: &str =
    "frame_index,frame_number,centroid_x,centroid_y,displacement_x,displacement_y,displacement_magnitude";

pub const TRACES_HEADER: &str =
    "frame_index,fixed_aperture_intensity,tracking_aperture_intensity,raw_centroid_intensity";

pub fn write_trajectory(path: &Path, rows: &[TrajectoryRow]) -> Result<()> {
    let mut out = String::with_capacity(rows.len() * 64);
    out.push_str(TRAJECTORY_HEADER);
    out.push('\n');
    for r in rows {
        out.push_str(&format!(
            "{},{},{:.6},{:.6},{:.6},{:.6},{:.6}\n",
            r.frame_index,
            r.frame_number,
            r.centroid_x,
            r.centroid_y,
            r.displacement_x,
            r.displacement_y,
            r.displacement_magnitude
        ));
    }
    std::fs::write(path, out)
        .with_context(|| format!("Failed to write trajectory to {}", path.display()))
}

/// Read a trajectory table back; only the first four columns are needed to
/// rebuild the centroid samples.
pub fn read_trajectory(path: &Path) -> Result<Trajectory> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trajectory from {}", path.display()))?;

    let mut samples = Vec::new();
    for (lineno, line) in contents.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 4 {
            bail!(
                "{}:{}: expected at least 4 columns, got {}",
                path.display(),
                lineno + 1,
                fields.len()
            );
        }
        samples.push(CentroidSample {
            frame_index: fields[0].trim().parse()?,
            frame_number: fields[1].trim().parse()?,
            x: fields[2].trim().parse()?,
            y: fields[3].trim().parse()?,
        });
    }

    if samples.is_empty() {
        bail!("{}: no trajectory rows", path.display());
    }

    Ok(Trajectory {
        samples,
        fallback_count: 0,
    })
}

pub fn write_traces(path: &Path, traces: &IntensityTraces) -> Result<()> {
    let mut out = String::with_capacity(traces.fixed.len() * 48);
    out.push_str(TRACES_HEADER);
    out.push('\n');
    for i in 0..traces.fixed.len() {
        out.push_str(&format!(
            "{},{:.6},{:.6},{:.6}\n",
            i, traces.fixed[i], traces.tracking[i], traces.raw[i]
        ));
    }
    std::fs::write(path, out)
        .with_context(|| format!("Failed to write intensity traces to {}", path.display()))
}

/// Read one column of an intensity-trace table (0-based, counting from the
/// first intensity column).
pub fn read_trace_column(path: &Path, column: usize) -> Result<Vec<f64>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace from {}", path.display()))?;

    let mut values = Vec::new();
    for (lineno, line) in contents.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        let field = fields.get(column + 1).with_context(|| {
            format!(
                "{}:{}: missing column {}",
                path.display(),
                lineno + 1,
                column + 1
            )
        })?;
        values.push(field.trim().parse()?);
    }

    if values.is_empty() {
        bail!("{}: no trace rows", path.display());
    }
    Ok(values)
}
