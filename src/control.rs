use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::field::G;

/// Input, hidden, and output widths of the gain network.
pub const LAYER_SIZES: [usize; 4] = [18, 32, 16, 9];

/// One 18-channel sensor frame: IMU, magnetometer, ranging, and electrical
/// telemetry. Raw physical units; normalization happens inside the
/// controller.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SensorFrame {
    /// Linear acceleration (m/s²), x/y/z.
    pub accel: [f64; 3],
    /// Angular rate (deg/s), x/y/z.
    pub gyro: [f64; 3],
    /// Magnetic field (µT), x/y/z.
    pub mag: [f64; 3],
    /// Corner ride-height ranging (m), four sensors.
    pub distance: [f64; 4],
    /// Battery cell voltages (V), three cells.
    pub voltage: [f64; 3],
    /// Total electrical draw (W).
    pub power: f64,
    /// Fused ride height estimate (m).
    pub height: f64,
}

impl SensorFrame {
    /// Level hover frame: gravity on the z accelerometer, all four corners
    /// at the same ride height.
    pub fn level_hover(height: f64, power: f64) -> Self {
        SensorFrame {
            accel: [0.0, 0.0, G],
            gyro: [0.0; 3],
            mag: [0.0, 0.0, 45.0],
            distance: [height; 4],
            voltage: [11.1; 3],
            power,
            height,
        }
    }

    /// Full-scale normalization into the network's input vector.
    fn normalized(&self) -> DVector<f64> {
        let mut channels = Vec::with_capacity(LAYER_SIZES[0]);
        channels.extend(self.accel.iter().map(|a| a / (4.0 * G)));
        channels.extend(self.gyro.iter().map(|w| w / 250.0));
        channels.extend(self.mag.iter().map(|b| b / 100.0));
        channels.extend(self.distance.iter().map(|d| d / 0.5));
        channels.extend(self.voltage.iter().map(|v| v / 12.0));
        channels.push(self.power / 1000.0);
        channels.push(self.height / 0.5);
        DVector::from_vec(channels)
    }
}

struct Layer {
    weights: DMatrix<f64>,
    biases: DVector<f64>,
}

/// Feed-forward gain controller mapping a sensor frame to nine per-coil
/// drive commands in [0, 1]. Weights come from a seeded Xavier-uniform
/// draw and are never trained; the forward pass is the whole controller.
pub struct GainController {
    layers: Vec<Layer>,
    seed: u64,
}

impl GainController {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut layers = Vec::with_capacity(LAYER_SIZES.len() - 1);
        for pair in LAYER_SIZES.windows(2) {
            let (fan_in, fan_out) = (pair[0], pair[1]);
            let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
            let weights = DMatrix::from_fn(fan_out, fan_in, |_, _| {
                rng.gen_range(-limit..=limit)
            });
            layers.push(Layer {
                weights,
                biases: DVector::zeros(fan_out),
            });
        }
        GainController { layers, seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// One forward pass: ReLU hidden layers, sigmoid output.
    pub fn command(&self, frame: &SensorFrame) -> Vec<f64> {
        let mut activation = frame.normalized();
        let last = self.layers.len() - 1;
        for (index, layer) in self.layers.iter().enumerate() {
            let mut pre = &layer.weights * activation + &layer.biases;
            if index < last {
                pre.apply(|v| *v = v.max(0.0));
            } else {
                pre.apply(|v| *v = 1.0 / (1.0 + (-*v).exp()));
            }
            activation = pre;
        }
        activation.iter().copied().collect()
    }
}
