//! Shader parameter model: how a sentiment score becomes planet visuals.
//!
//! Everything here is a pure function of the score (plus time and texel
//! inputs for the per-pixel parts). Both renderers shade through these
//! functions and constants; the GPU path receives the constants through
//! [`wgsl_constants`].

use std::fmt::Write;

use glam::Vec3;

use crate::render::math::{smoothstep, step};
use crate::render::noise::snoise;

// ── Motion ──

/// Spin multiplier at score 0.
pub const ROTATION_BASE: f32 = 0.15;
/// Extra spin per unit of `|score|`.
pub const ROTATION_VOLATILITY_GAIN: f32 = 0.7;
/// Surface Y rotation per frame, scaled by the spin multiplier.
pub const SURFACE_SPIN_PER_FRAME: f32 = 0.0015;
/// Cloud Y rotation per frame, scaled by the spin multiplier.
pub const CLOUD_SPIN_Y_PER_FRAME: f32 = 0.002;
/// Cloud Z rotation per frame, scaled by the spin multiplier.
pub const CLOUD_SPIN_Z_PER_FRAME: f32 = 0.0004;

// ── Surface, score >= 0 ──

pub const BARREN_COLOR: Vec3 = Vec3::new(0.35, 0.3, 0.25);
pub const NIGHT_LIGHTS_START: f32 = 0.5;
pub const NIGHT_LIGHTS_GAIN: f32 = 2.0;

// ── Surface, score < 0 ──

pub const ASH_COLOR: Vec3 = Vec3::splat(0.15);
pub const SLUDGE_COLOR: Vec3 = Vec3::new(0.05, 0.03, 0.01);
/// `(r + g) / 2 - b` above this marks a day texel as land.
pub const LAND_THRESHOLD: f32 = 0.02;
pub const CRACK_UV_SCALE: f32 = 15.0;
pub const CRACK_TIME_SCALE: f32 = 0.05;
pub const CRACK_EDGE_LOW: f32 = 0.3;
pub const CRACK_EDGE_HIGH: f32 = 0.45;
pub const LAVA_COLOR: Vec3 = Vec3::new(1.0, 0.25, 0.0);
pub const LAVA_GAIN: f32 = 3.5;
/// Decay level where lava starts to show.
pub const LAVA_ONSET: f32 = 0.4;

// ── Surface lighting ──

/// Un-normalised view-space light position.
pub const SURFACE_LIGHT: Vec3 = Vec3::new(5.0, 5.0, 5.0);
pub const MIN_DIFFUSE: f32 = 0.15;

// ── Atmosphere ──

pub const ATMOSPHERE_BASE: Vec3 = Vec3::new(0.4, 0.5, 1.0);
pub const ATMOSPHERE_POSITIVE: Vec3 = Vec3::new(0.0, 0.95, 1.0);
pub const ATMOSPHERE_NEGATIVE: Vec3 = Vec3::new(1.0, 0.35, 0.0);
pub const FRESNEL_BIAS: f32 = 0.75;
pub const FRESNEL_POWER: f32 = 5.0;

// ── Clouds ──

pub const CLOUD_OPACITY_BASE: f32 = 0.45;
pub const CLOUD_OPACITY_GAIN: f32 = 0.35;
pub const CLOUD_OPACITY_MIN: f32 = 0.05;

/// Spin multiplier: either extreme spins the planet faster.
#[inline]
pub fn rotation_speed(score: f32) -> f32 {
    ROTATION_BASE + score.abs() * ROTATION_VOLATILITY_GAIN
}

/// Cloud layer opacity, never below [`CLOUD_OPACITY_MIN`].
#[inline]
pub fn cloud_opacity(score: f32) -> f32 {
    (CLOUD_OPACITY_BASE + score * CLOUD_OPACITY_GAIN).max(CLOUD_OPACITY_MIN)
}

/// Weight of the night-lights overlay (0 for negative scores).
#[inline]
pub fn night_lights(score: f32) -> f32 {
    if score >= 0.0 {
        smoothstep(NIGHT_LIGHTS_START, 1.0, score) * NIGHT_LIGHTS_GAIN
    } else {
        0.0
    }
}

/// How strongly lava shows through the cracks (0 for non-negative scores).
#[inline]
pub fn lava_intensity(score: f32) -> f32 {
    if score < 0.0 {
        smoothstep(LAVA_ONSET, 1.0, -score)
    } else {
        0.0
    }
}

/// Whether the crack/lava overlay is visible at all.
#[inline]
pub fn lava_active(score: f32) -> bool {
    score < 0.0 && -score > LAVA_ONSET
}

/// Atmosphere rim hue.
#[inline]
pub fn atmosphere_color(score: f32) -> Vec3 {
    let color = ATMOSPHERE_BASE.lerp(ATMOSPHERE_POSITIVE, score.clamp(0.0, 1.0));
    color.lerp(ATMOSPHERE_NEGATIVE, (-score).clamp(0.0, 1.0))
}

/// Rim intensity for a surface normal `n` and direction-to-viewer `v`.
///
/// The base is clamped at zero so front-facing normals cannot produce a
/// negative power.
#[inline]
pub fn fresnel_intensity(n_dot_v: f32) -> f32 {
    (FRESNEL_BIAS - n_dot_v).max(0.0).powf(FRESNEL_POWER)
}

/// 1 when a day texel reads as land, 0 for ocean.
#[inline]
pub fn land_mask(day: Vec3) -> f32 {
    step(LAND_THRESHOLD, (day.x + day.y) * 0.5 - day.z)
}

/// Crack visibility at `uv` and time `time` before lava weighting.
#[inline]
pub fn crack_mask(uv: [f32; 2], time: f32) -> f32 {
    let drift = time * CRACK_TIME_SCALE;
    let n = snoise(uv[0] * CRACK_UV_SCALE + drift, uv[1] * CRACK_UV_SCALE + drift);
    smoothstep(CRACK_EDGE_LOW, CRACK_EDGE_HIGH, n)
}

/// Unlit surface color for one texel.
pub fn shade_surface(score: f32, time: f32, uv: [f32; 2], day: Vec3, night: Vec3) -> Vec3 {
    if score >= 0.0 {
        let t = score;
        BARREN_COLOR.lerp(day, t) + night * night_lights(score)
    } else {
        let t = -score;
        let death = SLUDGE_COLOR.lerp(ASH_COLOR, land_mask(day));
        let decayed = day.lerp(death, t);
        let lava = lava_intensity(score);
        if lava <= 0.0 {
            return decayed;
        }
        decayed.lerp(LAVA_COLOR * LAVA_GAIN, crack_mask(uv, time) * lava)
    }
}

/// Diffuse term for a view-space normal.
#[inline]
pub fn surface_diffuse(view_normal: Vec3) -> f32 {
    view_normal.dot(SURFACE_LIGHT.normalize()).max(MIN_DIFFUSE)
}

/// Everything score-derived the renderer needs once per frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualParams {
    pub score: f32,
    pub rotation_speed: f32,
    pub cloud_opacity: f32,
    pub atmosphere_color: Vec3,
    pub night_lights: f32,
    pub lava_intensity: f32,
}

impl VisualParams {
    pub fn from_score(score: f32) -> Self {
        Self {
            score,
            rotation_speed: rotation_speed(score),
            cloud_opacity: cloud_opacity(score),
            atmosphere_color: atmosphere_color(score),
            night_lights: night_lights(score),
            lava_intensity: lava_intensity(score),
        }
    }

    pub fn lava_active(&self) -> bool {
        lava_active(self.score)
    }
}

fn wgsl_vec3(v: Vec3) -> String {
    format!("vec3<f32>({:.6}, {:.6}, {:.6})", v.x, v.y, v.z)
}

/// WGSL `const` declarations mirroring this module.
pub fn wgsl_constants() -> String {
    let mut out = String::new();
    let scalars = [
        ("NIGHT_LIGHTS_START", NIGHT_LIGHTS_START),
        ("NIGHT_LIGHTS_GAIN", NIGHT_LIGHTS_GAIN),
        ("LAND_THRESHOLD", LAND_THRESHOLD),
        ("CRACK_UV_SCALE", CRACK_UV_SCALE),
        ("CRACK_TIME_SCALE", CRACK_TIME_SCALE),
        ("CRACK_EDGE_LOW", CRACK_EDGE_LOW),
        ("CRACK_EDGE_HIGH", CRACK_EDGE_HIGH),
        ("LAVA_GAIN", LAVA_GAIN),
        ("LAVA_ONSET", LAVA_ONSET),
        ("MIN_DIFFUSE", MIN_DIFFUSE),
        ("FRESNEL_BIAS", FRESNEL_BIAS),
        ("FRESNEL_POWER", FRESNEL_POWER),
    ];
    let vectors = [
        ("BARREN_COLOR", BARREN_COLOR),
        ("ASH_COLOR", ASH_COLOR),
        ("SLUDGE_COLOR", SLUDGE_COLOR),
        ("LAVA_COLOR", LAVA_COLOR),
        ("SURFACE_LIGHT", SURFACE_LIGHT),
        ("ATMOSPHERE_BASE", ATMOSPHERE_BASE),
        ("ATMOSPHERE_POSITIVE", ATMOSPHERE_POSITIVE),
        ("ATMOSPHERE_NEGATIVE", ATMOSPHERE_NEGATIVE),
    ];
    for (name, value) in scalars {
        let _ = writeln!(out, "const {}: f32 = {:.6};", name, value);
    }
    for (name, value) in vectors {
        let _ = writeln!(out, "const {} = {};", name, wgsl_vec3(value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn rotation_speed_at_rest() {
        assert!(close(rotation_speed(0.0), 0.15));
        assert!(close(rotation_speed(1.0), 0.85));
        assert!(close(rotation_speed(-1.0), 0.85));
    }

    #[test]
    fn rotation_speed_monotone_in_magnitude() {
        let mut prev = rotation_speed(0.0);
        for i in 1..=100 {
            let s = i as f32 / 100.0;
            let pos = rotation_speed(s);
            let neg = rotation_speed(-s);
            assert!(pos >= prev);
            assert!(close(pos, neg), "sign must not change speed");
            prev = pos;
        }
    }

    #[test]
    fn cloud_opacity_floor() {
        assert!(close(cloud_opacity(-1.0), 0.10));
        assert!(close(cloud_opacity(0.0), 0.45));
        assert!(close(cloud_opacity(1.0), 0.8));
        for i in -100..=100 {
            assert!(cloud_opacity(i as f32 / 100.0) >= CLOUD_OPACITY_MIN);
        }
        // The floor only binds past the end of the score range.
        assert!(close(cloud_opacity(-2.0), CLOUD_OPACITY_MIN));
    }

    #[test]
    fn lava_threshold() {
        assert!(lava_active(-0.9));
        assert!(!lava_active(-0.4));
        assert!(!lava_active(0.9));
        assert_eq!(lava_intensity(-0.4), 0.0);
        assert!(lava_intensity(-0.9) > 0.5);
        assert_eq!(lava_intensity(0.5), 0.0);
    }

    #[test]
    fn night_lights_only_when_thriving() {
        assert_eq!(night_lights(0.4), 0.0);
        assert_eq!(night_lights(-0.8), 0.0);
        assert!(close(night_lights(1.0), 2.0));
    }

    #[test]
    fn atmosphere_endpoints() {
        assert_eq!(atmosphere_color(0.0), ATMOSPHERE_BASE);
        assert_eq!(atmosphere_color(1.0), ATMOSPHERE_POSITIVE);
        assert_eq!(atmosphere_color(-1.0), ATMOSPHERE_NEGATIVE);
    }

    #[test]
    fn fresnel_peaks_at_grazing_back_faces() {
        assert!(close(fresnel_intensity(0.0), 0.75f32.powf(5.0)));
        assert!(fresnel_intensity(-0.5) > fresnel_intensity(0.0));
        assert_eq!(fresnel_intensity(0.9), 0.0);
    }

    #[test]
    fn surface_blends_from_barren() {
        let day = Vec3::new(0.2, 0.4, 0.8);
        let night = Vec3::new(1.0, 0.9, 0.5);
        assert_eq!(shade_surface(0.0, 0.0, [0.5, 0.5], day, night), BARREN_COLOR);
        let full = shade_surface(1.0, 0.0, [0.5, 0.5], day, night);
        assert!(close(full.x, day.x + night.x * 2.0));
    }

    #[test]
    fn decay_uses_land_mask() {
        let land = Vec3::new(0.5, 0.4, 0.1);
        let ocean = Vec3::new(0.05, 0.1, 0.4);
        assert_eq!(land_mask(land), 1.0);
        assert_eq!(land_mask(ocean), 0.0);
        // Below the lava onset the result is a plain blend to the death color.
        let ash = shade_surface(-0.3, 0.0, [0.1, 0.1], land, Vec3::ZERO);
        let expected = land.lerp(ASH_COLOR, 0.3);
        assert!(close(ash.x, expected.x) && close(ash.z, expected.z));
        let sludge = shade_surface(-0.3, 0.0, [0.1, 0.1], ocean, Vec3::ZERO);
        let expected = ocean.lerp(SLUDGE_COLOR, 0.3);
        assert!(close(sludge.y, expected.y));
    }

    #[test]
    fn deep_decay_shows_lava_somewhere() {
        let day = Vec3::new(0.5, 0.4, 0.1);
        let hot = (0..64)
            .flat_map(|i| (0..64).map(move |j| [i as f32 / 64.0, j as f32 / 64.0]))
            .any(|uv| shade_surface(-1.0, 0.0, uv, day, Vec3::ZERO).x > 1.0);
        assert!(hot, "lava should exceed unit brightness in some cracks");
    }

    #[test]
    fn diffuse_floor() {
        assert!(close(surface_diffuse(Vec3::new(0.0, 0.0, -1.0)), MIN_DIFFUSE));
        assert!(close(surface_diffuse(SURFACE_LIGHT.normalize()), 1.0));
    }

    #[test]
    fn visual_params_bundle() {
        let p = VisualParams::from_score(-0.9);
        assert!(p.lava_active());
        assert!(close(p.rotation_speed, 0.15 + 0.9 * 0.7));
        assert!(close(p.cloud_opacity, CLOUD_OPACITY_MIN.max(0.45 - 0.9 * 0.35)));
    }

    #[test]
    fn wgsl_constants_cover_shader_inputs() {
        let src = wgsl_constants();
        for name in [
            "BARREN_COLOR",
            "LAVA_COLOR",
            "LAVA_ONSET",
            "FRESNEL_POWER",
            "SURFACE_LIGHT",
            "ATMOSPHERE_NEGATIVE",
        ] {
            assert!(src.contains(name), "missing {}", name);
        }
    }
}
