use nalgebra::{Point2, Vector2};

use crate::field::MU0;

/// Minimum separation used when superposing coil contributions, replacing
/// the ad-hoc `+ small constant` denominators of naive falloff sums.
const MIN_SEPARATION: f64 = 0.01;

/// Nine-coil flower-of-life layout in normalized units: a center coil, an
/// inner hexagon at 60° spacing, and two vertical extensions at ±√3.
pub fn flower_of_life_positions() -> Vec<Point2<f64>> {
    let mut positions = Vec::with_capacity(9);
    positions.push(Point2::new(0.0, 0.0));
    for i in 0..6 {
        let angle = i as f64 * std::f64::consts::FRAC_PI_3;
        positions.push(Point2::new(angle.cos(), angle.sin()));
    }
    let sqrt3 = 3.0_f64.sqrt();
    positions.push(Point2::new(0.0, sqrt3));
    positions.push(Point2::new(0.0, -sqrt3));
    positions
}

/// Radial ring layout used by the rotating drive: `count` coils evenly
/// spaced on the unit circle, coil `i` at angle `i / count · 2π`. These
/// angles match the per-coil pitch/roll bias angles of the drive.
pub fn ring_positions(count: usize) -> Vec<Point2<f64>> {
    (0..count)
        .map(|i| {
            let angle = i as f64 / count as f64 * std::f64::consts::TAU;
            Point2::new(angle.cos(), angle.sin())
        })
        .collect()
}

/// Planar field vector at a probe point from per-coil currents, treating each
/// coil as a filamentary source with 1/r falloff. `unit_scale` converts the
/// normalized layout coordinates to meters.
pub fn field_at_point(
    positions: &[Point2<f64>],
    currents: &[f64],
    turns: u32,
    unit_scale: f64,
    probe: Point2<f64>,
) -> Vector2<f64> {
    let mut field = Vector2::zeros();
    for (position, &current) in positions.iter().zip(currents) {
        if current == 0.0 {
            continue;
        }
        let offset = probe - position;
        let distance = (offset.norm() * unit_scale).max(MIN_SEPARATION);
        let magnitude = MU0 * f64::from(turns) * current / (2.0 * distance);
        let direction = if offset.norm() > f64::EPSILON {
            offset / offset.norm()
        } else {
            Vector2::zeros()
        };
        field += direction * magnitude;
    }
    field
}

/// Scalar field magnitude at the array center from all coils.
pub fn center_field(
    positions: &[Point2<f64>],
    currents: &[f64],
    turns: u32,
    unit_scale: f64,
) -> f64 {
    let mut total = 0.0;
    for (position, &current) in positions.iter().zip(currents) {
        if current == 0.0 {
            continue;
        }
        let distance = (position.coords.norm() * unit_scale).max(MIN_SEPARATION);
        total += MU0 * f64::from(turns) * current / (2.0 * distance);
    }
    total
}

/// Field-uniformity metric 1 − σ/μ over a sampled square patch; 1.0 means a
/// perfectly flat field.
pub fn uniformity(
    positions: &[Point2<f64>],
    currents: &[f64],
    turns: u32,
    unit_scale: f64,
    half_extent: f64,
    samples_per_axis: usize,
) -> f64 {
    let mut magnitudes = Vec::with_capacity(samples_per_axis * samples_per_axis);
    for i in 0..samples_per_axis {
        for j in 0..samples_per_axis {
            let frac_x = i as f64 / (samples_per_axis - 1).max(1) as f64;
            let frac_y = j as f64 / (samples_per_axis - 1).max(1) as f64;
            let probe = Point2::new(
                -half_extent + 2.0 * half_extent * frac_x,
                -half_extent + 2.0 * half_extent * frac_y,
            );
            magnitudes.push(field_at_point(positions, currents, turns, unit_scale, probe).norm());
        }
    }
    let mean = magnitudes.iter().sum::<f64>() / magnitudes.len() as f64;
    if mean <= f64::EPSILON {
        return 0.0;
    }
    let variance =
        magnitudes.iter().map(|m| (m - mean) * (m - mean)).sum::<f64>() / magnitudes.len() as f64;
    1.0 - variance.sqrt() / mean
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_has_nine_coils_with_center_first() {
        let positions = flower_of_life_positions();
        assert_eq!(positions.len(), 9);
        assert_eq!(positions[0], Point2::new(0.0, 0.0));
    }

    #[test]
    fn hexagon_ring_is_unit_radius() {
        let positions = flower_of_life_positions();
        for position in &positions[1..7] {
            assert!((position.coords.norm() - 1.0).abs() < 1e-12);
        }
        assert!((positions[7].coords.norm() - 3.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn ring_layout_is_evenly_spaced_on_the_unit_circle() {
        let positions = ring_positions(9);
        assert_eq!(positions.len(), 9);
        for position in &positions {
            assert!((position.coords.norm() - 1.0).abs() < 1e-12);
        }
        let step = std::f64::consts::TAU / 9.0;
        for (i, position) in positions.iter().enumerate() {
            let angle = position.y.atan2(position.x).rem_euclid(std::f64::consts::TAU);
            assert!((angle - i as f64 * step).abs() < 1e-9);
        }
    }

    #[test]
    fn every_ring_coil_contributes_at_the_center() {
        // Each coil sits off-center, so driving any single coil must move
        // the planar field at the probe point.
        let positions = ring_positions(9);
        for coil in 0..9 {
            let mut currents = vec![0.0; 9];
            currents[coil] = 15.0;
            let field = field_at_point(&positions, &currents, 108, 0.125, Point2::new(0.0, 0.0));
            assert!(field.norm() > 0.0, "coil {coil} left the center field unchanged");
        }
    }

    #[test]
    fn symmetric_currents_cancel_at_center() {
        let positions = flower_of_life_positions();
        // Equal currents in the hexagon ring only; opposing pairs cancel.
        let mut currents = vec![0.0; 9];
        for current in currents.iter_mut().take(7).skip(1) {
            *current = 10.0;
        }
        let field = field_at_point(&positions, &currents, 108, 0.125, Point2::new(0.0, 0.0));
        assert!(field.norm() < 1e-9);
    }

    #[test]
    fn center_field_grows_with_current() {
        let positions = flower_of_life_positions();
        let low = center_field(&positions, &vec![1.0; 9], 108, 0.125);
        let high = center_field(&positions, &vec![10.0; 9], 108, 0.125);
        assert!((high - 10.0 * low).abs() < 1e-12);
        assert!(low > 0.0);
    }

    #[test]
    fn uniformity_is_bounded_above_by_one() {
        let positions = flower_of_life_positions();
        let currents = vec![10.0; 9];
        let value = uniformity(&positions, &currents, 108, 0.125, 0.5, 15);
        assert!(value <= 1.0);
    }
}
