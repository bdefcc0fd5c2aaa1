use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use levpad::array;
use levpad::config::{self, TripulseConfig};
use levpad::field::{FieldModel, G};
use levpad::output::{ensure_directory, format_value, resolve_path, write_json, write_table_csv};
use levpad::plotting::{render_chart, ChartSpec, Series};
use levpad::waveform::TripulseParams;

#[derive(Debug, Clone, Copy, Serialize)]
struct HoverSample {
    time: f64,
    multiplier: f64,
    field: f64,
    lift: f64,
    power: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct HoverStats {
    hover_fraction: f64,
    mean_lift: f64,
    mean_power: f64,
    peak_power: f64,
    min_power: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct DriveCandidate {
    peak_current: f64,
    hover_fraction: f64,
    mean_lift: f64,
    mean_power: f64,
    efficiency: f64,
}

#[derive(Debug, Serialize)]
struct HoverReport {
    tone_freqs: [f64; 3],
    peak_current: f64,
    hover_height: f64,
    mass: f64,
    weight: f64,
    stats: HoverStats,
    layout_center_field: f64,
    layout_uniformity: f64,
    candidates: Vec<DriveCandidate>,
    best_peak_current: Option<f64>,
}

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config/tripulse.toml"));

    let params = config::load_tripulse(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let weight = params.mass * G;
    println!(
        "Tripulse hover: tones {:?} Hz, peak {:.1} A, {:.1} kg at {:.3} m",
        params.waveform.tone_freqs, params.waveform.peak_current, params.mass, params.hover_height
    );

    let positions = array::flower_of_life_positions();
    let peak_currents = vec![params.waveform.peak_current; params.model.array.coil_count];
    let layout_center_field = array::center_field(
        &positions,
        &peak_currents,
        params.model.coil.turns,
        params.model.coil.radius,
    );
    let layout_uniformity = array::uniformity(
        &positions,
        &peak_currents,
        params.model.coil.turns,
        params.model.coil.radius,
        0.5,
        9,
    );
    println!(
        "Flower-of-life layout at peak drive: center field {:.4} T, uniformity {:.3}",
        layout_center_field, layout_uniformity
    );

    let samples = simulate(&params.waveform, &params.model, &params);
    let stats = statistics(&samples, weight);
    println!(
        "Hover fraction {:.1}%, mean lift {:.1} N against {:.1} N weight",
        stats.hover_fraction * 100.0,
        stats.mean_lift,
        weight
    );
    println!(
        "Power: mean {:.1} W, peak {:.1} W, min {:.1} W",
        stats.mean_power, stats.peak_power, stats.min_power
    );

    let candidates: Vec<DriveCandidate> = params
        .optimize_currents
        .iter()
        .map(|&peak| {
            let waveform = TripulseParams {
                peak_current: peak,
                ..params.waveform
            };
            let samples = simulate(&waveform, &params.model, &params);
            let stats = statistics(&samples, weight);
            DriveCandidate {
                peak_current: peak,
                hover_fraction: stats.hover_fraction,
                mean_lift: stats.mean_lift,
                mean_power: stats.mean_power,
                efficiency: stats.mean_lift / (stats.mean_power + 1.0),
            }
        })
        .collect();

    let best = candidates
        .iter()
        .filter(|c| c.mean_lift >= weight)
        .max_by(|a, b| a.efficiency.total_cmp(&b.efficiency));
    match best {
        Some(candidate) => println!(
            "Most efficient sustaining drive: {:.1} A ({:.3} N/W)",
            candidate.peak_current, candidate.efficiency
        ),
        None => println!("No candidate drive sustains hover at this load"),
    }

    write_artifacts(
        &params,
        &samples,
        &stats,
        (layout_center_field, layout_uniformity),
        &candidates,
        best,
        weight,
    )
}

/// Signed drive level from the superposed phase-shifted coil currents,
/// expressed as a multiplier of the model's full-drive coil current. The
/// per-coil phase shifts cancel across the ring, so this is well below the
/// rectified single-coil envelope.
fn drive_multiplier(waveform: &TripulseParams, model: &FieldModel, time: f64) -> f64 {
    let summed: f64 = (0..model.array.coil_count)
        .map(|coil| waveform.coil_current(time, coil))
        .sum();
    summed / (model.coil.peak_current * f64::from(model.coil.tones))
}

fn simulate(waveform: &TripulseParams, model: &FieldModel, params: &TripulseConfig) -> Vec<HoverSample> {
    let steps = (params.duration / params.dt).round() as usize;
    let mut samples = Vec::with_capacity(steps + 1);
    for i in 0..=steps {
        let time = i as f64 * params.dt;
        let multiplier = drive_multiplier(waveform, model, time);
        let field = model.field_at(params.hover_height, multiplier);
        samples.push(HoverSample {
            time,
            multiplier,
            field: field.total,
            lift: model.lift_force(field.total),
            power: instantaneous_power(waveform, model, time),
        });
    }
    samples
}

fn instantaneous_power(waveform: &TripulseParams, model: &FieldModel, time: f64) -> f64 {
    let array = &model.array;
    if array.superconducting {
        return array.cooling_power * array.coil_count as f64;
    }
    (0..array.coil_count)
        .map(|coil| {
            let current = waveform.coil_current(time, coil);
            current * current * array.coil_resistance
        })
        .sum()
}

fn statistics(samples: &[HoverSample], weight: f64) -> HoverStats {
    let count = samples.len() as f64;
    let hovering = samples.iter().filter(|s| s.lift >= weight).count() as f64;
    let mean_lift = samples.iter().map(|s| s.lift).sum::<f64>() / count;
    let mean_power = samples.iter().map(|s| s.power).sum::<f64>() / count;
    let peak_power = samples.iter().map(|s| s.power).fold(f64::NEG_INFINITY, f64::max);
    let min_power = samples.iter().map(|s| s.power).fold(f64::INFINITY, f64::min);
    HoverStats {
        hover_fraction: hovering / count,
        mean_lift,
        mean_power,
        peak_power,
        min_power,
    }
}

fn write_artifacts(
    params: &TripulseConfig,
    samples: &[HoverSample],
    stats: &HoverStats,
    layout: (f64, f64),
    candidates: &[DriveCandidate],
    best: Option<&DriveCandidate>,
    weight: f64,
) -> Result<()> {
    let output = &params.output;
    ensure_directory(&output.directory)?;

    if output.toggles.csv {
        let rows: Vec<Vec<String>> = samples
            .iter()
            .map(|s| {
                vec![
                    format_value(s.time),
                    format_value(s.multiplier),
                    format_value(s.field),
                    format_value(s.lift),
                    format_value(s.power),
                ]
            })
            .collect();
        write_table_csv(
            &resolve_path(&output.directory, &output.data_csv),
            &["time", "multiplier", "field", "lift", "power"],
            &rows,
        )?;
    }

    if output.toggles.json {
        let report = HoverReport {
            tone_freqs: params.waveform.tone_freqs,
            peak_current: params.waveform.peak_current,
            hover_height: params.hover_height,
            mass: params.mass,
            weight,
            stats: *stats,
            layout_center_field: layout.0,
            layout_uniformity: layout.1,
            candidates: candidates.to_vec(),
            best_peak_current: best.map(|c| c.peak_current),
        };
        write_json(&resolve_path(&output.directory, &output.report_json), &report)?;
    }

    if output.toggles.png || output.toggles.svg {
        let time_range = (
            samples.first().map_or(0.0, |s| s.time),
            samples.last().map_or(1.0, |s| s.time),
        );
        let series = vec![
            Series::new("lift", samples.iter().map(|s| (s.time, s.lift)).collect()),
            Series::horizontal_marker("weight", time_range, weight),
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
                title: "Tripulse lift versus time",
                x_label: "time (s)",
                y_label: "lift (N)",
            },
            &series,
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use levpad::field::{ArrayParams, CoilParams, MagnetParams};

    fn hover_model() -> FieldModel {
        FieldModel {
            magnet: MagnetParams {
                surface_field: 1.3,
                thickness: 0.02,
                falloff_exponent: 2.0,
            },
            coil: CoilParams {
                turns: 108,
                radius: 0.125,
                peak_current: 15.0,
                tones: 3,
                falloff_exponent: 1.2,
                efficiency: 0.95,
            },
            array: ArrayParams {
                coil_count: 9,
                array_factor: 6.5,
                pad_area: 0.25,
                pressure_efficiency: 0.7,
                coil_resistance: 0.1,
                superconducting: false,
                cooling_power: 0.0,
            },
        }
    }

    fn hover_waveform() -> TripulseParams {
        TripulseParams {
            tone_freqs: [5.0, 3.0, 6.0],
            peak_current: 15.0,
            coil_count: 9,
        }
    }

    #[test]
    fn primary_tone_cancels_across_the_nine_coil_ring() {
        // The primary tone's phase shifts span the full circle, so its nine
        // contributions sum to zero and the drive level cannot depend on the
        // primary frequency.
        let model = hover_model();
        let base = hover_waveform();
        let shifted = TripulseParams {
            tone_freqs: [7.0, 3.0, 6.0],
            ..base
        };
        let mut residual: f64 = 0.0;
        for i in 0..4000 {
            let time = i as f64 * 5e-4;
            let a = drive_multiplier(&base, &model, time);
            let b = drive_multiplier(&shifted, &model, time);
            assert!((a - b).abs() < 1e-9, "drive diverged at t = {time}");
            residual = residual.max(a.abs());
        }
        assert!(residual > 0.01);
    }

    #[test]
    fn superposed_drive_is_signed_not_rectified() {
        let model = hover_model();
        let waveform = hover_waveform();
        let minimum = (0..4000)
            .map(|i| drive_multiplier(&waveform, &model, i as f64 * 5e-4))
            .fold(f64::INFINITY, f64::min);
        assert!(minimum < 0.0);
    }

    #[test]
    fn drive_multiplier_matches_the_power_path_currents() {
        // Lift and power must be driven by the same phase-shifted currents.
        let model = hover_model();
        let waveform = hover_waveform();
        for i in 0..200 {
            let time = i as f64 * 1e-3;
            let summed: f64 = (0..9).map(|coil| waveform.coil_current(time, coil)).sum();
            let expected = summed / (15.0 * 3.0);
            assert!((drive_multiplier(&waveform, &model, time) - expected).abs() < 1e-12);
        }
    }
}
