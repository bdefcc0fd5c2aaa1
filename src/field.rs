use serde::Serialize;

/// Vacuum permeability (N/A²).
pub const MU0: f64 = 4.0e-7 * std::f64::consts::PI;

/// Standard gravity (m/s²).
pub const G: f64 = 9.81;

/// Permanent-magnet layer beneath the pad.
///
/// The surface field decays with distance as `(t / (t + d))^p` where `t` is
/// the magnet thickness; `p = 2` gives the inverse-square approximation used
/// for thin NdFeB slabs.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MagnetParams {
    pub surface_field: f64,
    pub thickness: f64,
    pub falloff_exponent: f64,
}

impl MagnetParams {
    pub fn field_at(&self, distance: f64) -> f64 {
        let ratio = self.thickness / (self.thickness + distance);
        self.surface_field * ratio.powf(self.falloff_exponent)
    }
}

/// Drive-coil electrical and geometric parameters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CoilParams {
    pub turns: u32,
    pub radius: f64,
    /// Peak current per tone at multiplier 1.0 (A).
    pub peak_current: f64,
    /// Number of superposed drive tones contributing on-axis field.
    pub tones: u32,
    pub falloff_exponent: f64,
    pub efficiency: f64,
}

impl CoilParams {
    /// On-axis field of a single coil at the coil plane.
    pub fn base_field(&self, current_multiplier: f64) -> f64 {
        let current = self.peak_current * current_multiplier;
        MU0 * f64::from(self.turns) * current * f64::from(self.tones) / (2.0 * self.radius)
    }

    pub fn field_at(&self, distance: f64, current_multiplier: f64) -> f64 {
        let distance_factor = (self.radius / (self.radius + distance)).powf(self.falloff_exponent);
        self.base_field(current_multiplier) * distance_factor * self.efficiency
    }
}

/// Whole-array parameters: coil count, superposition factor, and the
/// effective pad area entering the magnetic-pressure relation.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ArrayParams {
    pub coil_count: usize,
    /// Empirical field-superposition factor; a modeling assumption, not a
    /// physical constant, hence configurable.
    pub array_factor: f64,
    /// Effective area per coil (m²).
    pub pad_area: f64,
    pub pressure_efficiency: f64,
    /// Winding resistance per coil (Ω); ignored for superconducting arrays.
    pub coil_resistance: f64,
    pub superconducting: bool,
    /// Cryocooler draw per coil when superconducting (W).
    pub cooling_power: f64,
}

impl ArrayParams {
    pub fn total_area(&self) -> f64 {
        self.pad_area * self.coil_count as f64
    }
}

/// Field decomposition at a given height.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSample {
    pub total: f64,
    pub magnet: f64,
    pub coil: f64,
}

/// The shared field/force/power model every analysis evaluates.
///
/// Magnet and coil contributions superpose linearly; the coil term is scaled
/// by `array_factor / coil_count` so the configured array factor expresses
/// the whole-array enhancement rather than a per-coil one.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldModel {
    pub magnet: MagnetParams,
    pub coil: CoilParams,
    pub array: ArrayParams,
}

impl FieldModel {
    pub fn field_at(&self, distance: f64, current_multiplier: f64) -> FieldSample {
        let magnet = self.magnet.field_at(distance);
        let per_coil = self.coil.field_at(distance, current_multiplier);
        let coil = per_coil * self.array.array_factor / self.array.coil_count as f64;
        FieldSample {
            total: magnet + coil,
            magnet,
            coil,
        }
    }

    /// Magnetic-pressure lift: F = B² · A · η / (2 μ₀).
    pub fn lift_force(&self, b_total: f64) -> f64 {
        b_total * b_total * self.array.total_area() * self.array.pressure_efficiency / (2.0 * MU0)
    }

    /// Electrical draw of the array at the given drive level.
    ///
    /// Resistive arrays dissipate I²R per coil with the tone currents summed;
    /// superconducting arrays draw only constant cooling power.
    pub fn drive_power(&self, current_multiplier: f64) -> f64 {
        let coils = self.array.coil_count as f64;
        if self.array.superconducting {
            return self.array.cooling_power * coils;
        }
        let current = self.coil.peak_current * current_multiplier * f64::from(self.coil.tones);
        current * current * self.array.coil_resistance * coils
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_model() -> FieldModel {
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

    #[test]
    fn lift_is_zero_at_zero_field() {
        let model = test_model();
        assert_eq!(model.lift_force(0.0), 0.0);
    }

    #[test]
    fn lift_is_monotone_in_field_magnitude() {
        let model = test_model();
        let mut previous = 0.0;
        for i in 1..100 {
            let b = 0.05 * i as f64;
            let force = model.lift_force(b);
            assert!(force >= previous, "lift decreased at B = {b}");
            previous = force;
        }
        // Even in magnitude: F(-B) = F(B).
        assert!((model.lift_force(-1.3) - model.lift_force(1.3)).abs() < 1e-9);
    }

    #[test]
    fn magnet_field_decays_with_distance() {
        let magnet = test_model().magnet;
        assert!((magnet.field_at(0.0) - 1.3).abs() < 1e-12);
        let near = magnet.field_at(0.01);
        let far = magnet.field_at(0.10);
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn coil_field_scales_linearly_with_multiplier() {
        let coil = test_model().coil;
        let half = coil.field_at(0.05, 0.5);
        let full = coil.field_at(0.05, 1.0);
        assert!((full - 2.0 * half).abs() < 1e-12);
    }

    #[test]
    fn superconducting_power_is_drive_independent() {
        let mut model = test_model();
        model.array.superconducting = true;
        model.array.cooling_power = 50.0;
        let idle = model.drive_power(0.0);
        let full = model.drive_power(1.0);
        assert_eq!(idle, full);
        assert!((idle - 450.0).abs() < 1e-9);
    }

    #[test]
    fn resistive_power_is_quadratic_in_drive() {
        let model = test_model();
        let half = model.drive_power(0.5);
        let full = model.drive_power(1.0);
        assert!((full - 4.0 * half).abs() < 1e-9);
    }
}
