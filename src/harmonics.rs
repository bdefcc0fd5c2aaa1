use anyhow::{ensure, Result};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::Serialize;

/// Spectral-analysis settings for the drive-distortion report.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HarmonicsParams {
    pub sample_rate: f64,
    /// Highest harmonic order of the fundamental to inspect.
    pub max_order: usize,
    /// Total-harmonic-distortion ceiling (%).
    pub thd_limit_pct: f64,
    /// Ceiling for any individual harmonic (% of the fundamental).
    pub harmonic_limit_pct: f64,
}

/// One harmonic line relative to the fundamental.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HarmonicLine {
    pub order: usize,
    pub frequency: f64,
    pub magnitude_pct: f64,
}

/// Distortion report for one drive waveform.
#[derive(Debug, Clone, Serialize)]
pub struct DistortionReport {
    pub fundamental_hz: f64,
    pub fundamental_magnitude: f64,
    pub thd_pct: f64,
    pub harmonics: Vec<HarmonicLine>,
    pub worst_harmonic: Option<HarmonicLine>,
    pub thd_within_limit: bool,
    pub harmonics_within_limit: bool,
}

impl DistortionReport {
    pub fn compliant(&self) -> bool {
        self.thd_within_limit && self.harmonics_within_limit
    }
}

/// FFT the signal, locate the dominant spectral line, and measure its
/// harmonics up to the configured order.
pub fn analyze(signal: &[f64], params: &HarmonicsParams) -> Result<DistortionReport> {
    ensure!(signal.len() >= 16, "signal too short for spectral analysis");
    ensure!(params.sample_rate > 0.0, "sample rate must be positive");
    ensure!(params.max_order >= 2, "harmonic order must be at least 2");

    let n = signal.len();
    let mut buffer: Vec<Complex<f64>> =
        signal.iter().map(|&v| Complex::new(v, 0.0)).collect();
    FftPlanner::<f64>::new().plan_fft_forward(n).process(&mut buffer);

    let resolution = params.sample_rate / n as f64;
    let half = n / 2;
    let magnitude = |bin: usize| buffer[bin].norm() / n as f64;

    // Dominant line, DC excluded.
    let mut fundamental_bin = 1;
    let mut fundamental_magnitude = 0.0;
    for bin in 1..half {
        let m = magnitude(bin);
        if m > fundamental_magnitude {
            fundamental_magnitude = m;
            fundamental_bin = bin;
        }
    }
    ensure!(
        fundamental_magnitude > 0.0,
        "signal has no spectral content above DC"
    );

    let mut harmonics = Vec::new();
    let mut distortion_power = 0.0;
    let mut worst_harmonic: Option<HarmonicLine> = None;
    for order in 2..=params.max_order {
        let bin = fundamental_bin * order;
        if bin >= half {
            break;
        }
        let m = magnitude(bin);
        distortion_power += m * m;
        let line = HarmonicLine {
            order,
            frequency: bin as f64 * resolution,
            magnitude_pct: m / fundamental_magnitude * 100.0,
        };
        if worst_harmonic.map_or(true, |w| line.magnitude_pct > w.magnitude_pct) {
            worst_harmonic = Some(line);
        }
        harmonics.push(line);
    }

    let thd_pct = distortion_power.sqrt() / fundamental_magnitude * 100.0;
    let harmonics_within_limit = harmonics
        .iter()
        .all(|line| line.magnitude_pct <= params.harmonic_limit_pct);

    Ok(DistortionReport {
        fundamental_hz: fundamental_bin as f64 * resolution,
        fundamental_magnitude,
        thd_pct,
        harmonics,
        worst_harmonic,
        thd_within_limit: thd_pct <= params.thd_limit_pct,
        harmonics_within_limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::TAU;

    fn params() -> HarmonicsParams {
        HarmonicsParams {
            sample_rate: 1024.0,
            max_order: 50,
            thd_limit_pct: 8.0,
            harmonic_limit_pct: 5.0,
        }
    }

    fn sine(freq: f64, n: usize, rate: f64) -> Vec<f64> {
        (0..n).map(|i| (TAU * freq * i as f64 / rate).sin()).collect()
    }

    #[test]
    fn pure_sine_is_compliant() {
        let signal = sine(8.0, 4096, 1024.0);
        let report = analyze(&signal, &params()).unwrap();
        assert!((report.fundamental_hz - 8.0).abs() < 0.3);
        assert!(report.thd_pct < 0.1);
        assert!(report.compliant());
    }

    #[test]
    fn clipped_sine_shows_odd_harmonics() {
        let signal: Vec<f64> = sine(8.0, 4096, 1024.0)
            .into_iter()
            .map(|v| v.clamp(-0.4, 0.4))
            .collect();
        let report = analyze(&signal, &params()).unwrap();
        assert!(report.thd_pct > 5.0);
        let third = report.harmonics.iter().find(|h| h.order == 3).unwrap();
        let second = report.harmonics.iter().find(|h| h.order == 2).unwrap();
        assert!(third.magnitude_pct > second.magnitude_pct);
        assert!(!report.compliant());
    }

    #[test]
    fn worst_harmonic_is_the_largest_line() {
        let signal: Vec<f64> = sine(8.0, 4096, 1024.0)
            .iter()
            .zip(sine(24.0, 4096, 1024.0).iter())
            .map(|(a, b)| a + 0.2 * b)
            .collect();
        let report = analyze(&signal, &params()).unwrap();
        let worst = report.worst_harmonic.unwrap();
        assert_eq!(worst.order, 3);
        assert!((worst.magnitude_pct - 20.0).abs() < 1.0);
    }

    #[test]
    fn short_signal_is_rejected() {
        assert!(analyze(&[0.0; 8], &params()).is_err());
    }
}
