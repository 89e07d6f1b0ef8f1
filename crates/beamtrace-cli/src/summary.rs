use console::Style;

use beamtrace_core::centroid::ThresholdPolicy;
use beamtrace_core::pipeline::config::PipelineConfig;
use beamtrace_core::pipeline::PipelineOutput;

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    method: Style,
    warn: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            warn: Style::new().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_run_summary(config: &PipelineConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Beamtrace Pipeline"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(18)));
    println!();

    println!(
        "  {:<16}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input.display())
    );
    println!(
        "  {:<16}{}",
        s.label.apply_to("Output dir"),
        s.path.apply_to(config.output_dir.display())
    );
    println!(
        "  {:<16}{}",
        s.label.apply_to("Dark threshold"),
        s.value.apply_to(config.scan.dark_threshold)
    );

    let ramp = if config.ramp.enabled {
        format!("block size {}", config.ramp.block_size)
    } else {
        "disabled".to_string()
    };
    println!("  {:<16}{}", s.label.apply_to("Ramp detect"), s.method.apply_to(ramp));

    let threshold = match config.centroid.threshold {
        ThresholdPolicy::GlobalPercentile { percentile } => {
            format!("global percentile {percentile}")
        }
        ThresholdPolicy::LocalAdaptive { block_size, bias } => {
            format!("local adaptive, block {block_size}, bias {bias}")
        }
    };
    println!(
        "  {:<16}{}",
        s.label.apply_to("Threshold"),
        s.method.apply_to(threshold)
    );

    if let Some(roi) = config.roi {
        println!(
            "  {:<16}{}",
            s.label.apply_to("ROI"),
            s.value
                .apply_to(format!("{}x{} at ({}, {})", roi.width, roi.height, roi.x, roi.y))
        );
    }

    println!(
        "  {:<16}{}",
        s.label.apply_to("Aperture"),
        s.value.apply_to(format!(
            "radius {}, edge exclusion {}%",
            config.aperture.radius, config.aperture.edge_exclusion_percent
        ))
    );

    if config.run_bootstrap {
        println!(
            "  {:<16}{}",
            s.label.apply_to("Bootstrap"),
            s.value.apply_to(format!(
                "{} resamples, block {}",
                config.bootstrap.count, config.bootstrap.block_size
            ))
        );
    }
    println!();
}

pub fn print_results(output: &PipelineOutput) {
    let s = Styles::new();
    let summary = &output.photometry.summary;

    println!();
    println!("  {}", s.title.apply_to("Results"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(18)));
    println!();

    println!(
        "  {:<28}{}",
        s.label.apply_to("Frames analyzed"),
        s.value.apply_to(summary.frames_analyzed)
    );
    println!(
        "  {:<28}{}",
        s.label.apply_to("SI fixed aperture"),
        s.value.apply_to(format!("{:.6}", summary.si_fixed_aperture))
    );
    println!(
        "  {:<28}{}",
        s.label.apply_to("SI tracking aperture"),
        s.value.apply_to(format!("{:.6}", summary.si_tracking_aperture))
    );
    println!(
        "  {:<28}{}",
        s.label.apply_to("SI raw centroid region"),
        s.value.apply_to(format!("{:.6}", summary.si_raw_centroid_region))
    );

    let wander = format!("{:.6}", summary.si_geometric_wander_component);
    if summary.si_geometric_wander_component < 0.0 {
        println!(
            "  {:<28}{} {}",
            s.label.apply_to("Geometric wander"),
            s.warn.apply_to(wander),
            s.warn.apply_to("(negative: estimator noise)")
        );
    } else {
        println!(
            "  {:<28}{}",
            s.label.apply_to("Geometric wander"),
            s.value.apply_to(wander)
        );
    }
    println!(
        "  {:<28}{}",
        s.label.apply_to("Wander share of fixed SI"),
        s.value
            .apply_to(format!("{:.1}%", summary.wander_percent_of_fixed))
    );

    if let Some(bootstrap) = output.bootstrap {
        println!(
            "  {:<28}{}",
            s.label.apply_to("Bootstrap SI (tracking)"),
            s.value.apply_to(format!(
                "{:.6} \u{00b1} {:.6}  [{:.6}, {:.6}]",
                bootstrap.mean, bootstrap.std, bootstrap.ci_low, bootstrap.ci_high
            ))
        );
    }
}
