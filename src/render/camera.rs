//! Orbit camera around the planet.
//!
//! Drag rotates the camera on a sphere around the origin. There is no zoom
//! or pan; the distance only changes with the viewport width.

use std::f32::consts::PI;

use crate::dashboard::is_narrow;
use glam::Vec3;

/// Vertical field of view.
pub const FOV_Y_DEG: f32 = 45.0;
/// Camera distance on wide viewports.
pub const WIDE_DISTANCE: f32 = 8.0;
/// Camera distance on narrow viewports, so the globe still fits.
pub const NARROW_DISTANCE: f32 = 12.0;
/// Polar angle limits, measured from +Y.
pub const MIN_POLAR: f32 = PI / 3.0;
pub const MAX_POLAR: f32 = PI / 1.5;

/// Spherical camera position: polar angle from +Y,
/// azimuth around Y starting at +Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub azimuth: f32,
    pub polar: f32,
    pub distance: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            azimuth: 0.0,
            polar: PI / 2.0,
            distance: WIDE_DISTANCE,
        }
    }
}

impl OrbitCamera {
    pub fn distance_for_width(width: f32) -> f32 {
        if is_narrow(width) {
            NARROW_DISTANCE
        } else {
            WIDE_DISTANCE
        }
    }

    /// Re-pick the distance for a viewport `width` logical px wide.
    pub fn fit_viewport(&mut self, width: f32) {
        self.distance = Self::distance_for_width(width);
    }

    /// Apply a pointer drag of `(dx, dy)` px over a viewport `height` px tall.
    ///
    /// A drag across the full height turns the camera one full revolution.
    pub fn drag(&mut self, dx: f32, dy: f32, height: f32) {
        if height <= 0.0 {
            return;
        }
        let per_px = 2.0 * PI / height;
        self.azimuth = (self.azimuth - dx * per_px).rem_euclid(2.0 * PI);
        self.polar = (self.polar - dy * per_px).clamp(MIN_POLAR, MAX_POLAR);
    }

    pub fn eye(&self) -> Vec3 {
        let (sp, cp) = self.polar.sin_cos();
        let (sa, ca) = self.azimuth.sin_cos();
        Vec3::new(
            self.distance * sp * sa,
            self.distance * cp,
            self.distance * sp * ca,
        )
    }

    /// Look-at frame aimed at the origin.
    pub fn basis(&self) -> CameraBasis {
        let origin = self.eye();
        let forward = (-origin).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        CameraBasis {
            origin,
            forward,
            right,
            up,
            fov_factor: (FOV_Y_DEG.to_radians() * 0.5).tan(),
        }
    }
}

/// World-space camera frame handed to the renderers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    pub origin: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub fov_factor: f32,
}

impl CameraBasis {
    /// Ray through NDC `(u, v)`, both in `[-1, 1]` with `v` up.
    #[inline]
    pub fn ray(&self, u: f32, v: f32, aspect: f32) -> Vec3 {
        (self.forward
            + self.right * (u * self.fov_factor * aspect)
            + self.up * (v * self.fov_factor))
            .normalize()
    }

    /// World direction expressed in view space (camera looks down -Z).
    #[inline]
    pub fn to_view(&self, dir: Vec3) -> Vec3 {
        Vec3::new(dir.dot(self.right), dir.dot(self.up), -dir.dot(self.forward))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_follows_breakpoint() {
        let mut cam = OrbitCamera::default();
        cam.fit_viewport(500.0);
        assert_eq!(cam.distance, NARROW_DISTANCE);
        cam.fit_viewport(1280.0);
        assert_eq!(cam.distance, WIDE_DISTANCE);
    }

    #[test]
    fn default_eye_on_positive_z() {
        let eye = OrbitCamera::default().eye();
        assert!(eye.x.abs() < 1e-5 && eye.y.abs() < 1e-5);
        assert!((eye.z - WIDE_DISTANCE).abs() < 1e-5);
    }

    #[test]
    fn drag_clamps_polar() {
        let mut cam = OrbitCamera::default();
        cam.drag(0.0, 10_000.0, 600.0);
        assert!((cam.polar - MIN_POLAR).abs() < 1e-6);
        cam.drag(0.0, -10_000.0, 600.0);
        assert!((cam.polar - MAX_POLAR).abs() < 1e-6);
    }

    #[test]
    fn drag_never_changes_distance() {
        let mut cam = OrbitCamera::default();
        cam.drag(120.0, -40.0, 600.0);
        assert_eq!(cam.distance, WIDE_DISTANCE);
        assert!((cam.eye().length() - WIDE_DISTANCE).abs() < 1e-4);
    }

    #[test]
    fn centre_ray_hits_origin() {
        let basis = OrbitCamera::default().basis();
        let dir = basis.ray(0.0, 0.0, 1.5);
        assert!((dir - basis.forward).length() < 1e-6);
        let toward_camera = basis.to_view(-basis.forward);
        assert!((toward_camera.z - 1.0).abs() < 1e-6);
    }
}
