use serde::Serialize;

use crate::field::{FieldModel, G};

/// Scan limits for the operating-envelope analysis.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EnvelopeParams {
    /// Steady drive level the envelope is evaluated at.
    pub drive_multiplier: f64,
    /// Empty-board mass (kg); payloads add on top of it.
    pub board_mass: f64,
    pub min_height: f64,
    pub max_height: f64,
    pub height_step: f64,
}

/// One row of the payload table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PayloadPoint {
    pub payload: f64,
    pub total_mass: f64,
    /// Highest height the array still carries the load at, if any.
    pub max_height: Option<f64>,
}

/// One row of the height table.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HeightPoint {
    pub height: f64,
    pub lift: f64,
    /// Payload the array carries at this height beyond the board itself.
    pub max_payload: f64,
}

/// Feasibility of one drive scenario at a fixed operating point.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub drive_multiplier: f64,
    pub height: f64,
    pub total_mass: f64,
    pub lift: f64,
    pub power: f64,
    pub feasible: bool,
    /// Drive level that would close the lift deficit, when one exists
    /// within the pulse limit.
    pub required_multiplier: Option<f64>,
}

/// Highest height at which lift still meets the combined weight, marching
/// upward from `min_height` in `height_step` increments. `None` when the
/// load cannot be carried even at the minimum height.
pub fn max_height_for_payload(
    model: &FieldModel,
    params: &EnvelopeParams,
    payload: f64,
) -> Option<f64> {
    let weight = (params.board_mass + payload) * G;
    let mut best = None;
    let mut height = params.min_height;
    while height <= params.max_height {
        let sample = model.field_at(height, params.drive_multiplier);
        if model.lift_force(sample.total) >= weight {
            best = Some(height);
        } else {
            break;
        }
        height += params.height_step;
    }
    best
}

/// Payload capacity beyond the board mass at a fixed height, floored at zero.
pub fn max_payload_at_height(model: &FieldModel, params: &EnvelopeParams, height: f64) -> f64 {
    let sample = model.field_at(height, params.drive_multiplier);
    let lift = model.lift_force(sample.total);
    (lift / G - params.board_mass).max(0.0)
}

/// Payload table over an inclusive list of payload masses.
pub fn payload_table(
    model: &FieldModel,
    params: &EnvelopeParams,
    payloads: &[f64],
) -> Vec<PayloadPoint> {
    payloads
        .iter()
        .map(|&payload| PayloadPoint {
            payload,
            total_mass: params.board_mass + payload,
            max_height: max_height_for_payload(model, params, payload),
        })
        .collect()
}

/// Height table marching the configured scan range.
pub fn height_table(model: &FieldModel, params: &EnvelopeParams) -> Vec<HeightPoint> {
    let mut points = Vec::new();
    let mut height = params.min_height;
    while height <= params.max_height {
        let sample = model.field_at(height, params.drive_multiplier);
        points.push(HeightPoint {
            height,
            lift: model.lift_force(sample.total),
            max_payload: max_payload_at_height(model, params, height),
        });
        height += params.height_step;
    }
    points
}

/// Evaluate one named drive scenario at a fixed height and load.
///
/// Lift scales with the square of the coil drive, so the deficit closes at
/// roughly `multiplier * sqrt(weight / lift)`; the estimate is reported only
/// when it stays within the pulse limit.
pub fn evaluate_scenario(
    model: &FieldModel,
    name: &str,
    drive_multiplier: f64,
    height: f64,
    total_mass: f64,
) -> ScenarioReport {
    let weight = total_mass * G;
    let sample = model.field_at(height, drive_multiplier);
    let lift = model.lift_force(sample.total);
    let feasible = lift >= weight;
    let required_multiplier = if feasible {
        Some(drive_multiplier)
    } else if lift > 0.0 {
        let scaled = drive_multiplier * (weight / lift).sqrt();
        (scaled <= 1.0).then_some(scaled)
    } else {
        None
    };
    ScenarioReport {
        name: name.to_string(),
        drive_multiplier,
        height,
        total_mass,
        lift,
        power: model.drive_power(drive_multiplier),
        feasible,
        required_multiplier,
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

    fn params() -> EnvelopeParams {
        EnvelopeParams {
            drive_multiplier: 1.0,
            board_mass: 12.0,
            min_height: 0.005,
            max_height: 0.5,
            height_step: 0.005,
        }
    }

    #[test]
    fn heavier_payloads_never_reach_higher() {
        let model = model();
        let params = params();
        let mut previous = f64::INFINITY;
        for payload in [0.0, 40.0, 80.0, 160.0, 320.0] {
            let height = max_height_for_payload(&model, &params, payload).unwrap_or(0.0);
            assert!(height <= previous, "payload {payload} kg reached higher");
            previous = height;
        }
    }

    #[test]
    fn impossible_payload_reports_none() {
        let model = model();
        let params = params();
        assert!(max_height_for_payload(&model, &params, 1e9).is_none());
    }

    #[test]
    fn payload_capacity_shrinks_with_height() {
        let model = model();
        let params = params();
        let low = max_payload_at_height(&model, &params, 0.01);
        let high = max_payload_at_height(&model, &params, 0.30);
        assert!(low > high);
        assert!(high >= 0.0);
    }

    #[test]
    fn feasible_scenario_keeps_its_drive_level() {
        let model = model();
        let report = evaluate_scenario(&model, "hover", 1.0, 0.01, 80.0);
        assert!(report.feasible);
        assert_eq!(report.required_multiplier, Some(1.0));
    }

    #[test]
    fn deficit_scenario_reports_a_higher_required_drive() {
        // No magnet contribution, so lift scales exactly with drive squared.
        let mut model = model();
        model.magnet.surface_field = 0.0;
        let report = evaluate_scenario(&model, "cruise", 0.5, 0.05, 5.0);
        assert!(!report.feasible);
        let required = report.required_multiplier.expect("deficit should be closable");
        assert!(required > 0.5);
        assert!(required <= 1.0);
        let boosted = model.lift_force(model.field_at(0.05, required).total);
        assert!((boosted - 5.0 * G).abs() < 1e-6);
    }

    #[test]
    fn hopeless_deficit_reports_no_required_drive() {
        let model = model();
        let report = evaluate_scenario(&model, "freight", 0.05, 0.4, 500.0);
        assert!(!report.feasible);
        assert!(report.required_multiplier.is_none());
    }

    #[test]
    fn height_table_spans_the_scan_range() {
        let model = model();
        let params = params();
        let table = height_table(&model, &params);
        assert!(!table.is_empty());
        assert!((table[0].height - params.min_height).abs() < 1e-12);
        assert!(table.last().unwrap().height <= params.max_height + 1e-12);
    }
}
