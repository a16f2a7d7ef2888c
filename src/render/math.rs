//! GLSL-style scalar helpers the shading code is written in, plus the
//! analytic ray/sphere test both renderers share.

use glam::Vec3;

/// GLSL `smoothstep`.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// GLSL `step`.
#[inline]
pub fn step(edge: f32, x: f32) -> f32 {
    if x < edge {
        0.0
    } else {
        1.0
    }
}

/// Nearest intersection distances of a ray with a sphere centred at the origin.
///
/// Returns `(t_near, t_far)`; `t_near` may be negative when the origin is inside.
#[inline]
pub fn ray_sphere(origin: Vec3, dir: Vec3, radius: f32) -> Option<(f32, f32)> {
    let b = origin.dot(dir);
    let c = origin.dot(origin) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let s = disc.sqrt();
    Some((-b - s, -b + s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothstep_edges() {
        assert_eq!(smoothstep(0.3, 0.45, 0.2), 0.0);
        assert_eq!(smoothstep(0.3, 0.45, 0.5), 1.0);
        assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn step_is_inclusive_at_edge() {
        assert_eq!(step(0.02, 0.02), 1.0);
        assert_eq!(step(0.02, 0.019), 0.0);
    }

    #[test]
    fn ray_hits_sphere_from_outside() {
        let (t0, t1) = ray_sphere(Vec3::new(0.0, 0.0, 8.0), Vec3::new(0.0, 0.0, -1.0), 2.0).unwrap();
        assert!((t0 - 6.0).abs() < 1e-5);
        assert!((t1 - 10.0).abs() < 1e-5);
        assert!(ray_sphere(Vec3::new(0.0, 5.0, 8.0), Vec3::new(0.0, 0.0, -1.0), 2.0).is_none());
    }

    #[test]
    fn ray_from_inside_has_negative_near_hit() {
        let (t0, t1) = ray_sphere(Vec3::ZERO, Vec3::X, 2.0).unwrap();
        assert!((t0 + 2.0).abs() < 1e-5);
        assert!((t1 - 2.0).abs() < 1e-5);
    }
}
