use serde::Serialize;

use crate::field::{FieldModel, G};
use crate::patterns::{self, PatternParams, PulsePattern};

/// Timing and mass parameters of the pulse-jump simulation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct JumpParams {
    pub duration: f64,
    pub dt: f64,
    pub mass: f64,
    pub start_height: f64,
    /// Ground clamp: heights below this reset to it with velocity zeroed.
    pub floor_height: f64,
}

/// One recorded integration step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JumpSample {
    pub time: f64,
    pub height: f64,
    pub velocity: f64,
    pub net_force: f64,
    pub multiplier: f64,
}

/// Derived trajectory statistics.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct JumpSummary {
    pub max_height: f64,
    pub time_of_max: f64,
    pub final_height: f64,
    /// Peak of `h + v²/2g`, the height the instantaneous kinetic plus
    /// potential energy corresponds to. Never below `max_height`.
    pub energy_height: f64,
}

/// Full result of one pattern run.
#[derive(Debug, Clone, Serialize)]
pub struct JumpRun {
    pub pattern: PulsePattern,
    pub samples: Vec<JumpSample>,
    pub summary: JumpSummary,
}

/// Semi-implicit Euler propagation of the vertical equation of motion.
///
/// `drive` maps (time, height) to the applied current multiplier and the
/// resulting lift force. Per step the state at time `t` is recorded first,
/// then velocity advances with the current acceleration and position with the
/// pre-update velocity. The ground clamp is the only nonlinearity.
pub fn propagate<F>(params: &JumpParams, mut drive: F) -> Vec<JumpSample>
where
    F: FnMut(f64, f64) -> (f64, f64),
{
    let steps = (params.duration / params.dt).round() as usize;
    let weight = params.mass * G;
    let mut samples = Vec::with_capacity(steps + 1);
    let mut height = params.start_height;
    let mut velocity = 0.0;
    for i in 0..=steps {
        let time = i as f64 * params.dt;
        let (multiplier, lift) = drive(time, height);
        let net_force = lift - weight;
        samples.push(JumpSample {
            time,
            height,
            velocity,
            net_force,
            multiplier,
        });
        if i == steps {
            break;
        }
        let previous_velocity = velocity;
        velocity += net_force / params.mass * params.dt;
        height += previous_velocity * params.dt;
        if height < params.floor_height {
            height = params.floor_height;
            velocity = 0.0;
        }
    }
    samples
}

/// Summary statistics over a recorded trajectory.
pub fn summarize(samples: &[JumpSample]) -> JumpSummary {
    let mut max_height = f64::NEG_INFINITY;
    let mut time_of_max = 0.0;
    let mut energy_height = f64::NEG_INFINITY;
    for sample in samples {
        if sample.height > max_height {
            max_height = sample.height;
            time_of_max = sample.time;
        }
        let equivalent = sample.height + sample.velocity * sample.velocity / (2.0 * G);
        energy_height = energy_height.max(equivalent);
    }
    JumpSummary {
        max_height,
        time_of_max,
        final_height: samples.last().map_or(0.0, |s| s.height),
        energy_height,
    }
}

/// Run one pulse pattern against the field model.
pub fn simulate(
    params: &JumpParams,
    model: &FieldModel,
    pattern: PulsePattern,
    pattern_params: &PatternParams,
) -> JumpRun {
    let samples = propagate(params, |time, height| {
        let multiplier = patterns::multiplier(pattern, pattern_params, time, height);
        let sample = model.field_at(height, multiplier);
        (multiplier, model.lift_force(sample.total))
    });
    let summary = summarize(&samples);
    JumpRun {
        pattern,
        samples,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{ArrayParams, CoilParams, MagnetParams};

    fn jump_params() -> JumpParams {
        JumpParams {
            duration: 3.0,
            dt: 1e-3,
            mass: 79.4,
            start_height: 0.05,
            floor_height: 1e-3,
        }
    }

    // Weak hold drive, strong 200 A pulse capability: the board free-falls to
    // the floor on hold current and launches hard under a full boost.
    fn jump_model() -> FieldModel {
        FieldModel {
            magnet: MagnetParams {
                surface_field: 0.05,
                thickness: 0.02,
                falloff_exponent: 2.0,
            },
            coil: CoilParams {
                turns: 108,
                radius: 0.125,
                peak_current: 200.0,
                tones: 3,
                falloff_exponent: 1.2,
                efficiency: 0.95,
            },
            array: ArrayParams {
                coil_count: 9,
                array_factor: 6.5,
                pad_area: 0.0491,
                pressure_efficiency: 0.7,
                coil_resistance: 0.05,
                superconducting: false,
                cooling_power: 0.0,
            },
        }
    }

    #[test]
    fn exact_force_balance_holds_the_initial_state() {
        let params = jump_params();
        let weight = params.mass * G;
        let samples = propagate(&params, |_, _| (0.5, weight));
        for sample in &samples {
            assert_eq!(sample.height, params.start_height);
            assert_eq!(sample.velocity, 0.0);
            assert_eq!(sample.net_force, 0.0);
        }
    }

    #[test]
    fn ground_clamp_is_exact_and_zeroes_velocity() {
        let params = JumpParams {
            duration: 0.5,
            dt: 1e-3,
            mass: 79.4,
            start_height: 0.01,
            floor_height: 1e-3,
        };
        let samples = propagate(&params, |_, _| (0.0, 0.0));
        let grounded = samples
            .iter()
            .find(|s| s.height <= params.floor_height)
            .expect("free fall never reached the floor");
        assert_eq!(grounded.height, params.floor_height);
        assert_eq!(grounded.velocity, 0.0);
        let last = samples.last().unwrap();
        assert_eq!(last.height, params.floor_height);
    }

    #[test]
    fn energy_height_dominates_kinematic_height() {
        let params = jump_params();
        let model = jump_model();
        for pattern in PulsePattern::ALL {
            let run = simulate(&params, &model, pattern, &PatternParams::default());
            assert!(
                run.summary.energy_height >= run.summary.max_height,
                "{pattern}: energy height below kinematic maximum"
            );
        }
    }

    #[test]
    fn repeated_runs_are_bit_identical() {
        let params = jump_params();
        let model = jump_model();
        let pattern_params = PatternParams::default();
        let first = simulate(&params, &model, PulsePattern::StaircaseClimbing, &pattern_params);
        let second = simulate(&params, &model, PulsePattern::StaircaseClimbing, &pattern_params);
        assert_eq!(first.samples, second.samples);
    }

    #[test]
    fn single_boost_jump_peaks_after_the_boost_and_settles_low() {
        let params = jump_params();
        let model = jump_model();
        let pattern_params = PatternParams::default();
        let run = simulate(&params, &model, PulsePattern::SingleBoost, &pattern_params);
        let summary = run.summary;
        assert!(summary.max_height > params.start_height);
        assert!(summary.time_of_max >= pattern_params.boost_start);
        assert!(summary.time_of_max < pattern_params.boost_end + 1.5);
        assert!(summary.final_height < summary.max_height);
        assert!(summary.final_height < 0.01);
    }

    #[test]
    fn sample_count_matches_duration_over_dt() {
        let params = jump_params();
        let samples = propagate(&params, |_, _| (0.0, 0.0));
        assert_eq!(samples.len(), 3001);
        assert!((samples.last().unwrap().time - params.duration).abs() < 1e-9);
    }
}
