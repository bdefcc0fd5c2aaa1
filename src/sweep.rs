use serde::Serialize;

use crate::field::{FieldModel, G};

/// Current-sweep range for the lift validation analysis.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SweepParams {
    pub start_current: f64,
    pub end_current: f64,
    pub sample_count: usize,
    /// Hover height the sweep is evaluated at (m).
    pub hover_height: f64,
    /// Board plus rider mass (kg).
    pub total_mass: f64,
}

/// One point of the current sweep.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SweepPoint {
    pub current: f64,
    pub multiplier: f64,
    pub field: f64,
    pub lift: f64,
    pub power: f64,
    /// Lift per watt with a one-watt guard in the denominator, so the
    /// zero-drive point stays finite. A reporting convention, not physics.
    pub efficiency: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub points: Vec<SweepPoint>,
    /// First swept current whose lift meets the weight; `None` means the
    /// configured range never lifts the load, which the caller reports as a
    /// result rather than an error.
    pub min_lifting_current: Option<f64>,
    pub weight: f64,
}

/// Evaluate lift, field, power, and efficiency over a dense current range.
pub fn run(model: &FieldModel, params: &SweepParams) -> SweepResult {
    let weight = params.total_mass * G;
    let count = params.sample_count.max(2);
    let step = (params.end_current - params.start_current) / (count - 1) as f64;
    let mut points = Vec::with_capacity(count);
    let mut min_lifting_current = None;
    for i in 0..count {
        let current = params.start_current + step * i as f64;
        let multiplier = current / model.coil.peak_current;
        let sample = model.field_at(params.hover_height, multiplier);
        let lift = model.lift_force(sample.total);
        let power = model.drive_power(multiplier);
        if min_lifting_current.is_none() && lift >= weight {
            min_lifting_current = Some(current);
        }
        points.push(SweepPoint {
            current,
            multiplier,
            field: sample.total,
            lift,
            power,
            efficiency: lift / (power + 1.0),
        });
    }
    SweepResult {
        points,
        min_lifting_current,
        weight,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{ArrayParams, CoilParams, MagnetParams};

    fn model() -> FieldModel {
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

    fn params() -> SweepParams {
        SweepParams {
            start_current: 0.0,
            end_current: 30.0,
            sample_count: 301,
            hover_height: 0.05,
            total_mass: 92.0,
        }
    }

    #[test]
    fn lift_grows_monotonically_with_current() {
        let result = run(&model(), &params());
        for window in result.points.windows(2) {
            assert!(window[1].lift >= window[0].lift);
            assert!(window[1].field >= window[0].field);
        }
    }

    #[test]
    fn sweep_covers_the_configured_range() {
        let params = params();
        let result = run(&model(), &params);
        assert_eq!(result.points.len(), params.sample_count);
        assert_eq!(result.points[0].current, params.start_current);
        let last = result.points.last().unwrap();
        assert!((last.current - params.end_current).abs() < 1e-9);
    }

    #[test]
    fn minimum_lifting_current_actually_lifts() {
        let result = run(&model(), &params());
        let threshold = result
            .min_lifting_current
            .expect("range should contain a lifting current");
        let point = result
            .points
            .iter()
            .find(|p| p.current >= threshold)
            .unwrap();
        assert!(point.lift >= result.weight);
    }

    #[test]
    fn impossible_load_reports_no_threshold() {
        let mut params = params();
        params.total_mass = 1e7;
        let result = run(&model(), &params);
        assert!(result.min_lifting_current.is_none());
    }

    #[test]
    fn zero_current_point_has_finite_efficiency() {
        let result = run(&model(), &params());
        let first = result.points[0];
        assert_eq!(first.power, 0.0);
        assert!(first.efficiency.is_finite());
        assert!(first.efficiency >= 0.0);
    }
}
