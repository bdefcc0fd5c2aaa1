use std::f64::consts::TAU;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::field::G;

/// Named current-drive policy for the pulse-jump simulator. Each pattern maps
/// elapsed time (and, for resonant pumping, the height from the previous
/// step) to a current multiplier in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PulsePattern {
    SingleBoost,
    ResonantPumping,
    StaircaseClimbing,
    TeslaResonance,
}

impl PulsePattern {
    pub const ALL: [PulsePattern; 4] = [
        PulsePattern::SingleBoost,
        PulsePattern::ResonantPumping,
        PulsePattern::StaircaseClimbing,
        PulsePattern::TeslaResonance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PulsePattern::SingleBoost => "single_boost",
            PulsePattern::ResonantPumping => "resonant_pumping",
            PulsePattern::StaircaseClimbing => "staircase_climbing",
            PulsePattern::TeslaResonance => "tesla_resonance",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            PulsePattern::SingleBoost => "one full-power pulse inside a fixed window",
            PulsePattern::ResonantPumping => "sinusoidal pumping at the local natural frequency",
            PulsePattern::StaircaseClimbing => "sequential short pulses stepping the altitude",
            PulsePattern::TeslaResonance => "3-6-9 Hz harmonic pumping",
        }
    }
}

impl fmt::Display for PulsePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Timing and level parameters shared by the pulse patterns.
#[derive(Debug, Clone, Serialize)]
pub struct PatternParams {
    /// Multiplier holding the hover between pulses.
    pub hold_multiplier: f64,
    /// Boost window for the single-boost pattern (s).
    pub boost_start: f64,
    pub boost_end: f64,
    /// Start times of the staircase pulses (s).
    pub staircase_starts: Vec<f64>,
    pub staircase_width: f64,
    pub staircase_level: f64,
    /// Lower floor applied to the harmonic-resonance multiplier.
    pub resonance_floor: f64,
}

impl Default for PatternParams {
    fn default() -> Self {
        PatternParams {
            hold_multiplier: 0.15,
            boost_start: 0.5,
            boost_end: 0.6,
            staircase_starts: vec![0.2, 0.6, 1.0, 1.4],
            staircase_width: 0.1,
            staircase_level: 0.8,
            resonance_floor: 0.05,
        }
    }
}

/// Evaluate the multiplier for a pattern at elapsed time `time`, given the
/// height from the previous integration step. The result is always clamped
/// to [0, 1].
pub fn multiplier(
    pattern: PulsePattern,
    params: &PatternParams,
    time: f64,
    previous_height: f64,
) -> f64 {
    let raw = match pattern {
        PulsePattern::SingleBoost => {
            if time >= params.boost_start && time <= params.boost_end {
                1.0
            } else {
                params.hold_multiplier
            }
        }
        PulsePattern::ResonantPumping => {
            // Fixed 0.85 swing on top of the hold level; the clamp below
            // caps the constructive peak.
            let natural_freq = (G / previous_height.max(1e-3)).sqrt();
            params.hold_multiplier + 0.85 * (1.0 + (TAU * natural_freq * time).sin()) / 2.0
        }
        PulsePattern::StaircaseClimbing => {
            let in_pulse = params
                .staircase_starts
                .iter()
                .any(|&start| time >= start && time <= start + params.staircase_width);
            if in_pulse {
                params.staircase_level
            } else {
                params.hold_multiplier
            }
        }
        PulsePattern::TeslaResonance => {
            let harmonic = ((TAU * 3.0 * time).sin()
                + (TAU * 6.0 * time).sin()
                + (TAU * 9.0 * time).sin())
                / 3.0;
            (params.hold_multiplier + 0.3 * harmonic).max(params.resonance_floor)
        }
    };
    raw.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_boost_is_full_inside_window_only() {
        let params = PatternParams::default();
        let inside = multiplier(PulsePattern::SingleBoost, &params, 0.55, 0.05);
        let before = multiplier(PulsePattern::SingleBoost, &params, 0.49, 0.05);
        let after = multiplier(PulsePattern::SingleBoost, &params, 0.61, 0.05);
        assert_eq!(inside, 1.0);
        assert_eq!(before, params.hold_multiplier);
        assert_eq!(after, params.hold_multiplier);
    }

    #[test]
    fn staircase_pulses_fire_at_each_start() {
        let params = PatternParams::default();
        for &start in &params.staircase_starts {
            let level = multiplier(PulsePattern::StaircaseClimbing, &params, start + 0.05, 0.05);
            assert_eq!(level, params.staircase_level);
        }
        let between = multiplier(PulsePattern::StaircaseClimbing, &params, 0.45, 0.05);
        assert_eq!(between, params.hold_multiplier);
    }

    #[test]
    fn all_patterns_stay_in_unit_interval() {
        let params = PatternParams::default();
        for pattern in PulsePattern::ALL {
            for i in 0..2000 {
                let time = i as f64 * 1e-3;
                let value = multiplier(pattern, &params, time, 0.05);
                assert!((0.0..=1.0).contains(&value), "{pattern} produced {value}");
            }
        }
    }

    #[test]
    fn resonance_floor_holds_in_destructive_phase() {
        let params = PatternParams::default();
        let mut minimum: f64 = 1.0;
        for i in 0..5000 {
            let time = i as f64 * 1e-3;
            minimum = minimum.min(multiplier(PulsePattern::TeslaResonance, &params, time, 0.05));
        }
        assert!(minimum >= params.resonance_floor);
    }

    #[test]
    fn resonant_pump_swing_is_independent_of_the_hold_level() {
        let params = PatternParams {
            hold_multiplier: 0.1,
            ..PatternParams::default()
        };
        let height = 0.05;
        let natural_freq = (G / height).sqrt();
        let peak = multiplier(PulsePattern::ResonantPumping, &params, 0.25 / natural_freq, height);
        let trough =
            multiplier(PulsePattern::ResonantPumping, &params, 0.75 / natural_freq, height);
        assert!((peak - 0.95).abs() < 1e-9);
        assert!((trough - 0.1).abs() < 1e-9);
    }

    #[test]
    fn resonant_pumping_guards_against_zero_height() {
        let params = PatternParams::default();
        let value = multiplier(PulsePattern::ResonantPumping, &params, 0.3, 0.0);
        assert!(value.is_finite());
        assert!((0.0..=1.0).contains(&value));
    }
}
