// Small vector helpers shared by the simulation systems.

use glam::Vec3;

/// Drops the vertical component.
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Unit vector along `v`, or zero when `v` is degenerate (zero length or non-finite).
pub fn direction_or_zero(v: Vec3) -> Vec3 {
    if !v.is_finite() {
        return Vec3::ZERO;
    }
    v.normalize_or_zero()
}

/// Unit horizontal direction from `from` towards `to`, or zero if they share a column.
pub fn flat_direction(from: Vec3, to: Vec3) -> Vec3 {
    direction_or_zero(horizontal(to - from))
}

/// Horizontal distance between two points.
pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal(b - a).length()
}

/// Rotates a horizontal vector around +Y by `angle` radians.
pub fn rotate_y(v: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3::new(v.x * cos + v.z * sin, v.y, -v.x * sin + v.z * cos)
}

/// Replaces non-finite scalars with zero.
pub fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

/// Inclusive AABB test between two boxes given as center + full size.
pub fn aabb_overlap(center_a: Vec3, size_a: Vec3, center_b: Vec3, size_b: Vec3) -> bool {
    let half_a = size_a * 0.5;
    let half_b = size_b * 0.5;
    let min_a = center_a - half_a;
    let max_a = center_a + half_a;
    let min_b = center_b - half_b;
    let max_b = center_b + half_b;

    !(max_b.x < min_a.x
        || min_b.x > max_a.x
        || max_b.y < min_a.y
        || min_b.y > max_a.y
        || max_b.z < min_a.z
        || min_b.z > max_a.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_vector_is_zero_then_direction_is_zero() {
        assert_eq!(direction_or_zero(Vec3::ZERO), Vec3::ZERO);
        assert_eq!(direction_or_zero(Vec3::new(f32::NAN, 1.0, 0.0)), Vec3::ZERO);
    }

    #[test]
    fn when_boxes_touch_faces_then_they_overlap() {
        let size = Vec3::ONE;
        assert!(aabb_overlap(Vec3::ZERO, size, Vec3::new(1.0, 0.0, 0.0), size));
        assert!(!aabb_overlap(Vec3::ZERO, size, Vec3::new(1.01, 0.0, 0.0), size));
    }

    #[test]
    fn when_rotating_forward_by_quarter_turn_then_vector_points_sideways() {
        let rotated = rotate_y(Vec3::new(0.0, 0.0, -1.0), std::f32::consts::FRAC_PI_2);
        assert!((rotated - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-5);
    }
}
