use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use levpad::config::{self, ControllerConfig};
use levpad::control::{GainController, SensorFrame, LAYER_SIZES};
use levpad::output::{ensure_directory, format_value, resolve_path, write_json, write_table_csv};
use levpad::plotting::{render_chart, ChartSpec, Series};

#[derive(Debug, Clone, Copy, Serialize)]
struct CoilCommandStats {
    coil: usize,
    mean: f64,
    min: f64,
    max: f64,
}

#[derive(Debug, Serialize)]
struct ControllerReport {
    seed: u64,
    layer_sizes: [usize; 4],
    frame_count: usize,
    height_range: [f64; 2],
    commands: Vec<CoilCommandStats>,
}

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/controller.toml"));

    let params = config::load_controller(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    println!(
        "Gain controller: layers {:?}, seed {}, {} hover frames over {:.3}-{:.3} m",
        LAYER_SIZES, params.seed, params.frame_count, params.min_height, params.max_height
    );

    let controller = GainController::new(params.seed);
    let (heights, commands) = evaluate_batch(&controller, &params);

    let coil_count = LAYER_SIZES[3];
    let stats: Vec<CoilCommandStats> = (0..coil_count)
        .map(|coil| {
            let values: Vec<f64> = commands.iter().map(|row| row[coil]).collect();
            CoilCommandStats {
                coil,
                mean: values.iter().sum::<f64>() / values.len() as f64,
                min: values.iter().copied().fold(f64::INFINITY, f64::min),
                max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            }
        })
        .collect();

    for stat in &stats {
        println!(
            "Coil {}: mean {:.3}, range [{:.3}, {:.3}]",
            stat.coil, stat.mean, stat.min, stat.max
        );
    }

    let report = ControllerReport {
        seed: controller.seed(),
        layer_sizes: LAYER_SIZES,
        frame_count: params.frame_count,
        height_range: [params.min_height, params.max_height],
        commands: stats,
    };
    write_artifacts(&params, &heights, &commands, &report)
}

fn evaluate_batch(
    controller: &GainController,
    params: &ControllerConfig,
) -> (Vec<f64>, Vec<Vec<f64>>) {
    let span = params.max_height - params.min_height;
    let denominator = (params.frame_count - 1).max(1) as f64;
    let mut heights = Vec::with_capacity(params.frame_count);
    let mut commands = Vec::with_capacity(params.frame_count);
    for i in 0..params.frame_count {
        let height = params.min_height + span * i as f64 / denominator;
        let frame = SensorFrame::level_hover(height, params.frame_power);
        heights.push(height);
        commands.push(controller.command(&frame));
    }
    (heights, commands)
}

fn write_artifacts(
    params: &ControllerConfig,
    heights: &[f64],
    commands: &[Vec<f64>],
    report: &ControllerReport,
) -> Result<()> {
    let output = &params.output;
    ensure_directory(&output.directory)?;
    let coil_count = LAYER_SIZES[3];

    if output.toggles.csv {
        let mut headers = vec!["height".to_string()];
        for coil in 0..coil_count {
            headers.push(format!("coil_{coil}"));
        }
        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        let rows: Vec<Vec<String>> = heights
            .iter()
            .zip(commands)
            .map(|(&height, row)| {
                let mut record = vec![format_value(height)];
                record.extend(row.iter().map(|&c| format_value(c)));
                record
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
        let series: Vec<Series> = (0..coil_count)
            .map(|coil| {
                Series::new(
                    format!("coil {coil}"),
                    heights
                        .iter()
                        .zip(commands)
                        .map(|(&height, row)| (height, row[coil]))
                        .collect(),
                )
            })
            .collect();
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
                title: "Gain commands versus ride height",
                x_label: "height (m)",
                y_label: "command",
            },
            &series,
        )?;
    }

    Ok(())
}
