use std::f64::consts::{PI, TAU};
use std::path::PathBuf;

use anyhow::{Context, Result};
use nalgebra::Point2;
use serde::Serialize;

use levpad::array;
use levpad::config::{self, RotatingConfig};
use levpad::output::{ensure_directory, format_value, resolve_path, write_json, write_table_csv};
use levpad::plotting::{render_chart, ChartSpec, Series};
use levpad::waveform::MILLER_SEQUENCE;

#[derive(Debug, Clone)]
struct DriveStep {
    step: usize,
    time: f64,
    currents: Vec<f64>,
    field_magnitude: f64,
    /// Unwrapped field direction (rad).
    angle: f64,
}

#[derive(Debug, Serialize)]
struct DriveReport {
    coil_count: usize,
    active_coils: usize,
    configured_rate: f64,
    effective_rate: f64,
    measured_rate: f64,
    mean_field: f64,
    mean_uniformity: f64,
    activation_order: [usize; 9],
}

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/rotating.toml"));

    let params = config::load_rotating(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let rate = params.drive.rate_with_yaw(params.inputs.yaw);
    println!(
        "Rotating drive: {} of {} coils at {:.1} steps/s (yaw-adjusted from {:.1})",
        params.drive.active_coils, params.drive.coil_count, rate, params.drive.rotation_rate
    );
    println!(
        "Inputs: throttle {:.2}, yaw {:.2}, pitch {:.2}, roll {:.2}",
        params.inputs.throttle, params.inputs.yaw, params.inputs.pitch, params.inputs.roll
    );

    let steps = schedule(&params, rate);
    let positions = array::ring_positions(params.drive.coil_count);

    let mean_field =
        steps.iter().map(|s| s.field_magnitude).sum::<f64>() / steps.len() as f64;
    let measured_rate = match (steps.first(), steps.last()) {
        (Some(first), Some(last)) if last.time > first.time => {
            (last.angle - first.angle).abs() / TAU / (last.time - first.time)
        }
        _ => 0.0,
    };
    let mean_uniformity = steps
        .iter()
        .map(|s| array::uniformity(&positions, &s.currents, params.coil_turns, params.unit_scale, 0.5, 9))
        .sum::<f64>()
        / steps.len() as f64;

    println!(
        "Measured field rotation {:.1} rev/s, mean field {:.4} T, uniformity {:.3}",
        measured_rate, mean_field, mean_uniformity
    );

    let report = DriveReport {
        coil_count: params.drive.coil_count,
        active_coils: params.drive.active_coils,
        configured_rate: params.drive.rotation_rate,
        effective_rate: rate,
        measured_rate,
        mean_field,
        mean_uniformity,
        activation_order: MILLER_SEQUENCE,
    };
    write_artifacts(&params, &steps, &report)
}

fn schedule(params: &RotatingConfig, rate: f64) -> Vec<DriveStep> {
    // The rotating controller drives a radial ring, not the flower layout;
    // the ring angles are the same ones the pitch/roll bias uses.
    let positions = array::ring_positions(params.drive.coil_count);
    let count = (params.duration * rate).round() as usize;
    let mut steps = Vec::with_capacity(count.max(1));
    let mut previous_wrapped = 0.0;
    let mut unwrapped = 0.0;
    for step in 0..count.max(1) {
        let time = step as f64 / rate;
        let currents = params.drive.coil_currents(step, 1, params.inputs);
        let field = array::field_at_point(
            &positions,
            &currents,
            params.coil_turns,
            params.unit_scale,
            Point2::new(0.0, 0.0),
        );
        let wrapped = field.y.atan2(field.x);
        if step > 0 {
            let mut delta = wrapped - previous_wrapped;
            if delta > PI {
                delta -= TAU;
            } else if delta < -PI {
                delta += TAU;
            }
            unwrapped += delta;
        }
        previous_wrapped = wrapped;
        steps.push(DriveStep {
            step,
            time,
            currents,
            field_magnitude: field.norm(),
            angle: unwrapped,
        });
    }
    steps
}

fn write_artifacts(params: &RotatingConfig, steps: &[DriveStep], report: &DriveReport) -> Result<()> {
    let output = &params.output;
    ensure_directory(&output.directory)?;

    if output.toggles.csv {
        let mut headers = vec!["step".to_string(), "time".to_string()];
        headers.push("field".to_string());
        headers.push("angle".to_string());
        for coil in 0..params.drive.coil_count {
            headers.push(format!("coil_{coil}"));
        }
        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();

        let rows: Vec<Vec<String>> = steps
            .iter()
            .map(|s| {
                let mut row = vec![
                    s.step.to_string(),
                    format_value(s.time),
                    format_value(s.field_magnitude),
                    format_value(s.angle),
                ];
                row.extend(s.currents.iter().map(|&c| format_value(c)));
                row
            })
            .collect();
        write_table_csv(
            &resolve_path(&output.directory, &output.data_csv),
            &header_refs,
            &rows,
        )?;
    }

    if output.toggles.json {
        write_json(&resolve_path(&output.directory, &output.report_json), report)?;
    }

    if output.toggles.png || output.toggles.svg {
        let series = vec![Series::new(
            "rotation",
            steps.iter().map(|s| (s.time, s.angle / TAU)).collect(),
        )];
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
                title: "Unwrapped field rotation",
                x_label: "time (s)",
                y_label: "rotation (rev)",
            },
            &series,
        )?;
    }

    Ok(())
}
