//! Background star field.
//!
//! Stars sit on a thick shell far outside the planet. They are generated
//! once from a fixed seed so every launch shows the same sky, then projected
//! each frame for the UI to paint as small dots behind the globe.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::render::camera::CameraBasis;
use glam::{Mat3, Vec3};

pub const STAR_COUNT: usize = 5000;
/// Inner radius of the shell.
pub const STAR_RADIUS: f32 = 150.0;
/// Shell thickness.
pub const STAR_DEPTH: f32 = 50.0;
const STAR_SEED: u64 = 0x5EED_0F_57A125;
/// Radians per second.
const SKY_SPIN: f32 = 0.004;
const TWINKLE_SPEED: f32 = 2.0;
const SATURATION: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub position: Vec3,
    /// Base dot radius in px.
    pub size: f32,
    pub color: [u8; 3],
    phase: f32,
}

/// A star after projection, in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedStar {
    /// `[-1, 1]` on both axes, `y` up.
    pub ndc: [f32; 2],
    pub radius: f32,
    pub color: [u8; 3],
    pub alpha: f32,
}

pub struct StarField {
    stars: Vec<Star>,
}

impl Default for StarField {
    fn default() -> Self {
        Self::generate(STAR_SEED, STAR_COUNT)
    }
}

impl StarField {
    pub fn generate(seed: u64, count: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let stars = (0..count)
            .map(|i| {
                // Radius walks inward across the shell depth with the index.
                let r = STAR_RADIUS + STAR_DEPTH * (1.0 - i as f32 / count.max(1) as f32)
                    - STAR_DEPTH * rng.gen::<f32>() * 0.1;
                let y: f32 = rng.gen_range(-1.0..=1.0);
                let theta: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
                let ring = (1.0 - y * y).sqrt();
                Star {
                    position: Vec3::new(ring * theta.cos(), y, ring * theta.sin()) * r,
                    size: rng.gen_range(0.5..1.8),
                    color: hsl_to_rgb(rng.gen::<f32>(), SATURATION, 0.9),
                    phase: rng.gen_range(0.0..std::f32::consts::TAU),
                }
            })
            .collect();
        Self { stars }
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Stars visible from `camera` at clock `time`.
    pub fn project<'a>(
        &'a self,
        camera: &'a CameraBasis,
        aspect: f32,
        time: f32,
    ) -> impl Iterator<Item = ProjectedStar> + 'a {
        let sky = Mat3::from_rotation_y(time * SKY_SPIN);
        self.stars.iter().filter_map(move |star| {
            let p = sky * star.position;
            let rel = p - camera.origin;
            let depth = rel.dot(camera.forward);
            if depth <= 0.0 {
                return None;
            }
            let x = rel.dot(camera.right) / (depth * camera.fov_factor * aspect);
            let y = rel.dot(camera.up) / (depth * camera.fov_factor);
            if x.abs() > 1.0 || y.abs() > 1.0 {
                return None;
            }
            let twinkle = 0.5 + 0.5 * (time * TWINKLE_SPEED + star.phase).sin();
            // Fade the far side of the shell.
            let fade = (1.0 - (depth - STAR_RADIUS) / (STAR_DEPTH * 2.0)).clamp(0.3, 1.0);
            Some(ProjectedStar {
                ndc: [x, y],
                radius: star.size * (0.75 + 0.5 * twinkle),
                color: star.color,
                alpha: fade * (0.5 + 0.5 * twinkle),
            })
        })
    }
}

fn hsl_to_rgb(h: f32, s: f32, l: f32) -> [u8; 3] {
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let hp = h.rem_euclid(1.0) * 6.0;
    let x = c * (1.0 - (hp % 2.0 - 1.0).abs());
    let (r, g, b) = match hp as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = l - c / 2.0;
    let to = |v: f32| ((v + m).clamp(0.0, 1.0) * 255.0).round() as u8;
    [to(r), to(g), to(b)]
}
