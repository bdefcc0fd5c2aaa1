use std::f64::consts::TAU;

use serde::Serialize;

/// Fixed coil-activation order used by the rotating drive.
///
/// A lookup table only; the ordering carries no algorithmic meaning.
pub const MILLER_SEQUENCE: [usize; 9] = [5, 3, 7, 6, 8, 4, 9, 2, 1];

/// Three-tone harmonic drive waveform.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TripulseParams {
    /// Tone frequencies in Hz (defaults 5, 3, 6).
    pub tone_freqs: [f64; 3],
    /// Peak current per tone (A).
    pub peak_current: f64,
    pub coil_count: usize,
}

impl TripulseParams {
    /// Phase-shifted tripulse current for one coil.
    ///
    /// The primary tone receives the full per-coil phase shift; the second
    /// and third tones receive 0.6× and 1.2× of it.
    pub fn coil_current(&self, time: f64, coil_index: usize) -> f64 {
        let shift = coil_index as f64 / self.coil_count as f64 * TAU;
        self.peak_current
            * ((TAU * self.tone_freqs[0] * time + shift).sin()
                + (TAU * self.tone_freqs[1] * time + shift * 0.6).sin()
                + (TAU * self.tone_freqs[2] * time + shift * 1.2).sin())
    }

    /// Unshifted three-tone sum normalized to [-1, 1].
    pub fn normalized_waveform(&self, time: f64) -> f64 {
        ((TAU * self.tone_freqs[0] * time).sin()
            + (TAU * self.tone_freqs[1] * time).sin()
            + (TAU * self.tone_freqs[2] * time).sin())
            / 3.0
    }
}

/// Flight-control inputs for the rotating drive, all in [-1, 1] except
/// throttle in [0, 1]. Passed by value into each evaluation; the drive holds
/// no mutable control state.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FlightInputs {
    pub throttle: f64,
    pub yaw: f64,
    pub pitch: f64,
    pub roll: f64,
}

impl FlightInputs {
    pub fn hover() -> Self {
        FlightInputs {
            throttle: 0.5,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
        }
    }

    pub fn clamped(self) -> Self {
        FlightInputs {
            throttle: self.throttle.clamp(0.0, 1.0),
            yaw: self.yaw.clamp(-1.0, 1.0),
            pitch: self.pitch.clamp(-1.0, 1.0),
            roll: self.roll.clamp(-1.0, 1.0),
        }
    }
}

/// Rotating-triangle drive: a triangle of active coils stepped around the
/// ring, producing a rotating field with per-coil bias from the flight
/// inputs.
#[derive(Debug, Clone, Serialize)]
pub struct RotatingDriveParams {
    pub coil_count: usize,
    pub active_coils: usize,
    /// Base pattern rotation rate (steps per second).
    pub rotation_rate: f64,
    /// Hover current per active coil (A).
    pub hover_current: f64,
    /// Fraction of hover current swung by full pitch/roll deflection.
    pub attitude_gain: f64,
}

impl RotatingDriveParams {
    /// Indices of the coils forming the active triangle at a pattern step.
    pub fn active_indices(&self, step: usize, direction: i64) -> Vec<usize> {
        let n = self.coil_count as i64;
        let stride = n / self.active_coils as i64;
        let mut indices: Vec<usize> = (0..self.active_coils as i64)
            .map(|i| (step as i64 * direction + i * stride).rem_euclid(n) as usize)
            .collect();
        indices.sort_unstable();
        indices
    }

    /// Effective rotation rate after yaw modulation.
    pub fn rate_with_yaw(&self, yaw: f64) -> f64 {
        self.rotation_rate * (1.0 + yaw.clamp(-1.0, 1.0) * 0.5)
    }

    /// Per-coil currents at a pattern step. Inactive coils carry zero; active
    /// coils carry the throttle-scaled hover current biased by pitch and roll
    /// according to their angular position. Currents never go negative.
    pub fn coil_currents(&self, step: usize, direction: i64, inputs: FlightInputs) -> Vec<f64> {
        let inputs = inputs.clamped();
        let mut currents = vec![0.0; self.coil_count];
        let base = self.hover_current * inputs.throttle;
        for index in self.active_indices(step, direction) {
            let angle = index as f64 / self.coil_count as f64 * TAU;
            let pitch_bias = inputs.pitch * angle.cos() * self.attitude_gain;
            let roll_bias = inputs.roll * angle.sin() * self.attitude_gain;
            currents[index] = (base * (1.0 + pitch_bias + roll_bias)).max(0.0);
        }
        currents
    }
}
