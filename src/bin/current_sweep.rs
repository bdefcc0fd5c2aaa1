use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use levpad::config::{self, SweepConfig};
use levpad::output::{ensure_directory, format_value, resolve_path, write_json, write_table_csv};
use levpad::plotting::{render_chart, ChartSpec, Series};
use levpad::sweep::{self, SweepResult};

#[derive(Debug, Serialize)]
struct SweepReport {
    hover_height: f64,
    total_mass: f64,
    weight: f64,
    min_lifting_current: Option<f64>,
    peak_lift: f64,
    peak_efficiency_current: f64,
}

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/current_sweep.toml"));

    let params = config::load_sweep(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    println!(
        "Current sweep {:.1}-{:.1} A at {:.3} m, load {:.1} kg",
        params.sweep.start_current,
        params.sweep.end_current,
        params.sweep.hover_height,
        params.sweep.total_mass
    );

    let result = sweep::run(&params.model, &params.sweep);
    match result.min_lifting_current {
        Some(current) => println!("Minimum lifting current: {:.2} A", current),
        None => println!("Insufficient current range: no sample lifts {:.1} N", result.weight),
    }

    let peak_lift = result
        .points
        .iter()
        .map(|p| p.lift)
        .fold(f64::NEG_INFINITY, f64::max);
    let peak_efficiency = result
        .points
        .iter()
        .max_by(|a, b| a.efficiency.total_cmp(&b.efficiency))
        .map(|p| p.current)
        .unwrap_or(0.0);
    println!(
        "Peak lift {:.1} N; most efficient drive at {:.2} A",
        peak_lift, peak_efficiency
    );

    write_artifacts(&params, &result, peak_lift, peak_efficiency)
}

fn write_artifacts(
    params: &SweepConfig,
    result: &SweepResult,
    peak_lift: f64,
    peak_efficiency_current: f64,
) -> Result<()> {
    let output = &params.output;
    ensure_directory(&output.directory)?;

    if output.toggles.csv {
        let rows: Vec<Vec<String>> = result
            .points
            .iter()
            .map(|p| {
                vec![
                    format_value(p.current),
                    format_value(p.multiplier),
                    format_value(p.field),
                    format_value(p.lift),
                    format_value(p.power),
                    format_value(p.efficiency),
                ]
            })
            .collect();
        write_table_csv(
            &resolve_path(&output.directory, &output.data_csv),
            &["current", "multiplier", "field", "lift", "power", "efficiency"],
            &rows,
        )?;
    }

    if output.toggles.json {
        let report = SweepReport {
            hover_height: params.sweep.hover_height,
            total_mass: params.sweep.total_mass,
            weight: result.weight,
            min_lifting_current: result.min_lifting_current,
            peak_lift,
            peak_efficiency_current,
        };
        write_json(&resolve_path(&output.directory, &output.report_json), &report)?;
    }

    if output.toggles.png || output.toggles.svg {
        let current_range = (params.sweep.start_current, params.sweep.end_current);
        let series = vec![
            Series::new(
                "lift",
                result.points.iter().map(|p| (p.current, p.lift)).collect(),
            ),
            Series::horizontal_marker("weight", current_range, result.weight),
        ];
        render_chart(
            output
                .toggles
                .png
                .then_some(resolve_path(&output.directory, &output.chart_png))
                .as_deref(),
            output
                .toggles
                .svg
                .then_some(resolve_path(&output.directory, &output.chart_svg))
                .as_deref(),
            ChartSpec {
                title: "Lift versus coil current",
                x_label: "current (A)",
                y_label: "lift (N)",
            },
            &series,
        )?;
    }

    Ok(())
}
