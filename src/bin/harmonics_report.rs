use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use levpad::config::{self, HarmonicsConfig};
use levpad::harmonics::{self, DistortionReport};
use levpad::output::{ensure_directory, format_value, resolve_path, write_json, write_table_csv};
use levpad::plotting::{render_chart, ChartSpec, Series};

#[derive(Debug, Serialize)]
struct ComplianceReport {
    tone_freqs: [f64; 3],
    sample_rate: f64,
    duration: f64,
    thd_limit_pct: f64,
    harmonic_limit_pct: f64,
    compliant: bool,
    analysis: DistortionReport,
}

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/harmonics.toml"));

    let params = config::load_harmonics(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    println!(
        "Harmonic analysis: tones {:?} Hz at {:.0} S/s for {:.1} s",
        params.waveform.tone_freqs, params.sample_rate, params.duration
    );

    let count = (params.duration * params.sample_rate).round() as usize;
    let signal: Vec<f64> = (0..count)
        .map(|i| params.waveform.normalized_waveform(i as f64 / params.sample_rate))
        .collect();
    let analysis = harmonics::analyze(&signal, &params.analysis)?;

    println!(
        "Fundamental {:.2} Hz, THD {:.2}% (limit {:.1}%)",
        analysis.fundamental_hz, analysis.thd_pct, params.analysis.thd_limit_pct
    );
    if let Some(worst) = analysis.worst_harmonic {
        println!(
            "Worst harmonic: order {} at {:.2} Hz, {:.2}% of fundamental",
            worst.order, worst.frequency, worst.magnitude_pct
        );
    }
    println!(
        "Distortion limits {}",
        if analysis.compliant() { "met" } else { "exceeded" }
    );

    write_artifacts(&params, &analysis)
}

fn write_artifacts(params: &HarmonicsConfig, analysis: &DistortionReport) -> Result<()> {
    let output = &params.output;
    ensure_directory(&output.directory)?;

    if output.toggles.csv {
        let rows: Vec<Vec<String>> = analysis
            .harmonics
            .iter()
            .map(|line| {
                vec![
                    line.order.to_string(),
                    format_value(line.frequency),
                    format_value(line.magnitude_pct),
                ]
            })
            .collect();
        write_table_csv(
            &resolve_path(&output.directory, &output.data_csv),
            &["order", "frequency", "magnitude_pct"],
            &rows,
        )?;
    }

    if output.toggles.json {
        let report = ComplianceReport {
            tone_freqs: params.waveform.tone_freqs,
            sample_rate: params.sample_rate,
            duration: params.duration,
            thd_limit_pct: params.analysis.thd_limit_pct,
            harmonic_limit_pct: params.analysis.harmonic_limit_pct,
            compliant: analysis.compliant(),
            analysis: analysis.clone(),
        };
        write_json(&resolve_path(&output.directory, &output.report_json), &report)?;
    }

    if output.toggles.png || output.toggles.svg {
        let spectrum: Vec<(f64, f64)> = analysis
            .harmonics
            .iter()
            .map(|line| (line.frequency, line.magnitude_pct))
            .collect();
        let limit_range = (
            spectrum.first().map_or(0.0, |p| p.0),
            spectrum.last().map_or(1.0, |p| p.0),
        );
        let series = vec![
            Series::new("harmonics", spectrum),
            Series::horizontal_marker("limit", limit_range, params.analysis.harmonic_limit_pct),
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
                title: "Harmonic magnitudes",
                x_label: "frequency (Hz)",
                y_label: "magnitude (% of fundamental)",
            },
            &series,
        )?;
    }

    Ok(())
}
