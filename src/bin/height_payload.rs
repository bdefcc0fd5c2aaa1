use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use levpad::config::{self, EnvelopeConfig};
use levpad::envelope::{self, HeightPoint, PayloadPoint, ScenarioReport};
use levpad::field::G;
use levpad::output::{ensure_directory, format_value, resolve_path, write_json, write_table_csv};
use levpad::plotting::{render_chart, ChartSpec, Series};

#[derive(Debug, Serialize)]
struct EnvelopeReport {
    board_mass: f64,
    drive_multiplier: f64,
    payloads: Vec<PayloadPoint>,
    heights: Vec<HeightPoint>,
    scenarios: Vec<ScenarioReport>,
}

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/height_payload.toml"));

    let params = config::load_envelope(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    println!(
        "Operating envelope: {:.1} kg board at drive {:.2}, heights {:.3}-{:.3} m",
        params.envelope.board_mass,
        params.envelope.drive_multiplier,
        params.envelope.min_height,
        params.envelope.max_height
    );

    let payloads = envelope::payload_table(&params.model, &params.envelope, &params.payloads);
    for point in &payloads {
        match point.max_height {
            Some(height) => println!(
                "Payload {:6.1} kg (total {:6.1} kg): max height {:.3} m",
                point.payload, point.total_mass, height
            ),
            None => println!(
                "Payload {:6.1} kg (total {:6.1} kg): cannot be carried",
                point.payload, point.total_mass
            ),
        }
    }

    let heights = envelope::height_table(&params.model, &params.envelope);

    let scenarios: Vec<ScenarioReport> = params
        .scenarios
        .iter()
        .map(|spec| {
            envelope::evaluate_scenario(
                &params.model,
                &spec.name,
                spec.drive_multiplier,
                spec.height,
                spec.total_mass,
            )
        })
        .collect();
    for report in &scenarios {
        if report.feasible {
            println!(
                "Scenario '{}': feasible at drive {:.2} ({:.1} N lift, {:.1} W)",
                report.name, report.drive_multiplier, report.lift, report.power
            );
        } else {
            match report.required_multiplier {
                Some(required) => println!(
                    "Scenario '{}': needs drive {:.2} (configured {:.2})",
                    report.name, required, report.drive_multiplier
                ),
                None => println!(
                    "Scenario '{}': infeasible even at full drive",
                    report.name
                ),
            }
        }
    }

    write_artifacts(&params, &payloads, &heights, &scenarios)
}

fn write_artifacts(
    params: &EnvelopeConfig,
    payloads: &[PayloadPoint],
    heights: &[HeightPoint],
    scenarios: &[ScenarioReport],
) -> Result<()> {
    let output = &params.output;
    ensure_directory(&output.directory)?;

    if output.toggles.csv {
        let rows: Vec<Vec<String>> = heights
            .iter()
            .map(|point| {
                vec![
                    format_value(point.height),
                    format_value(point.lift),
                    format_value(point.max_payload),
                ]
            })
            .collect();
        write_table_csv(
            &resolve_path(&output.directory, &output.data_csv),
            &["height", "lift", "max_payload"],
            &rows,
        )?;
    }

    if output.toggles.json {
        let report = EnvelopeReport {
            board_mass: params.envelope.board_mass,
            drive_multiplier: params.envelope.drive_multiplier,
            payloads: payloads.to_vec(),
            heights: heights.to_vec(),
            scenarios: scenarios.to_vec(),
        };
        write_json(&resolve_path(&output.directory, &output.report_json), &report)?;
    }

    if output.toggles.png || output.toggles.svg {
        let height_range = (
            heights.first().map_or(0.0, |p| p.height),
            heights.last().map_or(1.0, |p| p.height),
        );
        let board_weight = params.envelope.board_mass * G;
        let series = vec![
            Series::new(
                "lift",
                heights.iter().map(|p| (p.height, p.lift)).collect(),
            ),
            Series::horizontal_marker("board weight", height_range, board_weight),
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
                title: "Lift versus hover height",
                x_label: "height (m)",
                y_label: "lift (N)",
            },
            &series,
        )?;
    }

    Ok(())
}
