//! CPU planet renderer: analytic ray casting with rayon-parallel rows.
//!
//! Output is premultiplied RGBA. The surface is opaque; clouds and the
//! atmosphere add light with zero alpha, so they brighten whatever the UI
//! draws behind the globe (the star field) instead of covering it.

use std::f32::consts::PI;

use glam::{Mat3, Vec3};
use rayon::prelude::*;

use crate::render::camera::CameraBasis;
use crate::render::math::ray_sphere;
use crate::render::params::{atmosphere_color, fresnel_intensity, shade_surface, surface_diffuse};
use crate::render::planet::{Frame, ATMOSPHERE_RADIUS, CLOUD_RADIUS, SURFACE_RADIUS};

/// Equirectangular UV of a unit direction in the sphere's local frame.
///
/// Matches the vertex layout of a standard UV sphere: −X maps to `u = 0`,
/// +X to `u = 0.5`, and `v = 1` is the north pole.
#[inline]
pub fn sphere_uv(local: Vec3) -> [f32; 2] {
    let phi = local.z.atan2(-local.x);
    let theta = local.y.clamp(-1.0, 1.0).acos();
    [(phi / (2.0 * PI)).rem_euclid(1.0), 1.0 - theta / PI]
}

/// Shade one ray. Returns premultiplied `[r, g, b, a]`, unclamped.
pub fn shade_ray(frame: &Frame<'_>, dir: Vec3) -> [f32; 4] {
    let cam = &frame.camera;
    let state = frame.state;
    let score = state.surface.score;

    let mut color = Vec3::ZERO;
    let mut alpha = 0.0;

    match ray_sphere(cam.origin, dir, SURFACE_RADIUS).filter(|&(t, _)| t > 0.0) {
        Some((t, _)) => {
            let n = (cam.origin + dir * t).normalize();
            let uv = sphere_uv(Mat3::from_rotation_y(-state.surface_spin) * n);
            let day = frame.textures.day.sample(uv[0], uv[1]);
            let night = frame.textures.night.sample(uv[0], uv[1]);
            let unlit = shade_surface(score, state.surface.time, uv, day, night);
            color = unlit * surface_diffuse(cam.to_view(n));
            alpha = 1.0;
        }
        None => {
            // Only the far side of the shell is drawn, and the surface hides
            // it wherever the two overlap.
            if let Some((_, t_far)) = ray_sphere(cam.origin, dir, ATMOSPHERE_RADIUS) {
                if t_far > 0.0 {
                    let p = cam.origin + dir * t_far;
                    let n = p.normalize();
                    let v = (cam.origin - p).normalize();
                    let intensity = fresnel_intensity(n.dot(v)).min(1.0);
                    color += atmosphere_color(state.atmosphere.score) * intensity;
                }
            }
        }
    }

    if let Some((t, _)) = ray_sphere(cam.origin, dir, CLOUD_RADIUS).filter(|&(t, _)| t > 0.0) {
        let n = (cam.origin + dir * t).normalize();
        let local =
            Mat3::from_rotation_z(-state.cloud_spin_z) * (Mat3::from_rotation_y(-state.cloud_spin_y) * n);
        let uv = sphere_uv(local);
        let [r, g, b, a] = frame.textures.clouds.sample_rgba(uv[0], uv[1]);
        let weight = a * state.cloud_opacity * surface_diffuse(cam.to_view(n));
        color += Vec3::new(r, g, b) * weight;
    }

    [color.x, color.y, color.z, alpha]
}

#[inline]
fn to_u8(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0) as u8
}

/// Render a frame to premultiplied RGBA8.
pub fn render(frame: &Frame<'_>) -> Vec<u8> {
    let (width, height) = (frame.width, frame.height);
    let aspect = width as f32 / height as f32;
    let camera: &CameraBasis = &frame.camera;

    let mut pixels = vec![0u8; width * height * 4];
    pixels
        .par_chunks_exact_mut(width * 4)
        .enumerate()
        .for_each(|(py, row)| {
            let v = -((py as f32 + 0.5) / height as f32 * 2.0 - 1.0);
            for px in 0..width {
                let u = (px as f32 + 0.5) / width as f32 * 2.0 - 1.0;
                let [r, g, b, a] = shade_ray(frame, camera.ray(u, v, aspect));
                let idx = px * 4;
                row[idx] = to_u8(r);
                row[idx + 1] = to_u8(g);
                row[idx + 2] = to_u8(b);
                row[idx + 3] = to_u8(a);
            }
        });
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::camera::OrbitCamera;
    use crate::render::planet::PlanetState;
    use crate::render::texture::PlanetTextures;

    const SIZE: usize = 64;

    fn render_at(score: f32) -> Vec<u8> {
        let mut state = PlanetState::default();
        state.step(0.0, score);
        let textures = PlanetTextures::fallback();
        let frame = Frame {
            width: SIZE,
            height: SIZE,
            camera: OrbitCamera::default().basis(),
            state: &state,
            textures: &textures,
        };
        render(&frame)
    }

    fn pixel(img: &[u8], x: usize, y: usize) -> [u8; 4] {
        let off = (y * SIZE + x) * 4;
        [img[off], img[off + 1], img[off + 2], img[off + 3]]
    }

    #[test]
    fn uv_landmarks() {
        let [u, v] = sphere_uv(Vec3::new(-1.0, 0.0, 0.0));
        assert!(u.abs() < 1e-6 || (u - 1.0).abs() < 1e-6);
        assert!((v - 0.5).abs() < 1e-6);
        let [u, _] = sphere_uv(Vec3::new(1.0, 0.0, 0.0));
        assert!((u - 0.5).abs() < 1e-6);
        let [_, v] = sphere_uv(Vec3::Y);
        assert!((v - 1.0).abs() < 1e-6);
    }

    #[test]
    fn output_size() {
        assert_eq!(render_at(0.1).len(), SIZE * SIZE * 4);
    }

    #[test]
    fn surface_is_opaque_and_space_is_clear() {
        let img = render_at(0.1);
        assert_eq!(pixel(&img, SIZE / 2, SIZE / 2)[3], 255);
        assert_eq!(pixel(&img, 0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn atmosphere_glows_past_the_rim() {
        // Row 10 of 64 sits between the surface and atmosphere silhouettes.
        let calm = pixel(&render_at(0.0), SIZE / 2, 10);
        assert_eq!(calm[3], 0, "glow must be additive");
        assert!(calm[2] > 0);

        let grim = pixel(&render_at(-1.0), SIZE / 2, 10);
        assert!(grim[0] > grim[2]);
        let bright = pixel(&render_at(1.0), SIZE / 2, 10);
        assert!(bright[1] > bright[0]);
    }

    #[test]
    fn lava_only_when_collapsing() {
        let hot = |img: &[u8]| {
            img.chunks_exact(4)
                .any(|px| px[3] == 255 && px[0] as i32 > px[1] as i32 + 50)
        };
        assert!(hot(&render_at(-1.0)));
        assert!(!hot(&render_at(1.0)));
    }
}
