use anyhow::{anyhow, Context, Result};
use clap::Parser;
use serde::Serialize;

use levpad::cli::CliOptions;
use levpad::config::{self, JumpConfig};
use levpad::field::G;
use levpad::jump::{self, JumpRun, JumpSummary};
use levpad::output::{ensure_directory, resolve_path, write_jump_csv, write_json};
use levpad::patterns::PulsePattern;
use levpad::plotting::{render_chart, ChartSpec, Series};

#[derive(Debug, Serialize)]
struct PatternReport {
    pattern: PulsePattern,
    description: &'static str,
    summary: JumpSummary,
}

#[derive(Debug, Serialize)]
struct SummaryReport {
    mass: f64,
    duration: f64,
    dt: f64,
    start_height: f64,
    best_pattern: PulsePattern,
    patterns: Vec<PatternReport>,
}

fn main() -> Result<()> {
    let options = CliOptions::parse();

    let mut params = config::load_jump(&options.config)
        .with_context(|| format!("Failed to load config from {}", options.config.display()))?;

    if let Some(override_pattern) = options.pattern {
        params.run = vec![override_pattern.into()];
    }

    print_configuration(&params);
    if options.dry_run {
        return Ok(());
    }

    let runs: Vec<JumpRun> = params
        .run
        .iter()
        .map(|&pattern| jump::simulate(&params.simulation, &params.model, pattern, &params.patterns))
        .collect();

    let best = runs
        .iter()
        .max_by(|a, b| a.summary.max_height.total_cmp(&b.summary.max_height))
        .ok_or_else(|| anyhow!("No pulse pattern produced a trajectory"))?;

    for run in &runs {
        let summary = &run.summary;
        println!(
            "{:<20} peak {:.3} m at t={:.3} s, energy height {:.3} m, settled {:.4} m",
            run.pattern.label(),
            summary.max_height,
            summary.time_of_max,
            summary.energy_height,
            summary.final_height
        );
    }
    println!("Best pattern: {}", best.pattern);

    write_artifacts(&params, &runs, best)?;

    Ok(())
}

fn print_configuration(params: &JumpConfig) {
    let sim = &params.simulation;
    println!(
        "Pulse-jump simulation: {:.1} kg over {:.2} s (dt {:.4} s), start height {:.3} m",
        sim.mass, sim.duration, sim.dt, sim.start_height
    );
    println!(
        "Array: {} coils, peak current {:.1} A, weight {:.1} N",
        params.model.array.coil_count,
        params.model.coil.peak_current,
        sim.mass * G
    );
    let labels: Vec<&str> = params.run.iter().map(|p| p.label()).collect();
    println!("Patterns: {}", labels.join(", "));
}

fn write_artifacts(params: &JumpConfig, runs: &[JumpRun], best: &JumpRun) -> Result<()> {
    let output = &params.output;
    ensure_directory(&output.directory)?;

    if output.toggles.csv {
        for run in runs {
            let filename = format!("jump_{}.csv", run.pattern.label());
            let path = resolve_path(&output.directory, filename.as_ref());
            write_jump_csv(&path, &run.samples, &output.csv_fields)?;
        }
    }

    if output.toggles.json {
        let report = SummaryReport {
            mass: params.simulation.mass,
            duration: params.simulation.duration,
            dt: params.simulation.dt,
            start_height: params.simulation.start_height,
            best_pattern: best.pattern,
            patterns: runs
                .iter()
                .map(|run| PatternReport {
                    pattern: run.pattern,
                    description: run.pattern.description(),
                    summary: run.summary,
                })
                .collect(),
        };
        let path = resolve_path(&output.directory, &output.summary_json);
        write_json(&path, &report)?;
    }

    let png = output.toggles.png;
    let svg = output.toggles.svg;
    if !(png || svg) {
        return Ok(());
    }

    let heights: Vec<Series> = runs
        .iter()
        .map(|run| {
            Series::new(
                run.pattern.label(),
                run.samples.iter().map(|s| (s.time, s.height)).collect(),
            )
        })
        .collect();
    render_chart(
        png.then_some(resolve_path(&output.directory, &output.heights_png)).as_deref(),
        svg.then_some(resolve_path(&output.directory, &output.heights_svg)).as_deref(),
        ChartSpec {
            title: "Jump height versus time",
            x_label: "time (s)",
            y_label: "height (m)",
        },
        &heights,
    )?;

    let multipliers: Vec<Series> = runs
        .iter()
        .map(|run| {
            Series::new(
                run.pattern.label(),
                run.samples.iter().map(|s| (s.time, s.multiplier)).collect(),
            )
        })
        .collect();
    render_chart(
        png.then_some(resolve_path(&output.directory, &output.multipliers_png)).as_deref(),
        svg.then_some(resolve_path(&output.directory, &output.multipliers_svg)).as_deref(),
        ChartSpec {
            title: "Current multiplier versus time",
            x_label: "time (s)",
            y_label: "multiplier",
        },
        &multipliers,
    )?;

    let force = vec![Series::new(
        best.pattern.label(),
        best.samples.iter().map(|s| (s.time, s.net_force)).collect(),
    )];
    render_chart(
        png.then_some(resolve_path(&output.directory, &output.force_png)).as_deref(),
        svg.then_some(resolve_path(&output.directory, &output.force_svg)).as_deref(),
        ChartSpec {
            title: "Net force of the best pattern",
            x_label: "time (s)",
            y_label: "net force (N)",
        },
        &force,
    )?;

    Ok(())
}
