//! Planet renderer: layer geometry, per-frame state and lifecycle.
//!
//! The planet is three nested spheres centred on the origin. Each frame the
//! renderer advances its clock and rotations, rewrites the uniform blocks
//! from the current score and hands the result to a backend.

use std::time::Instant;

use crate::render::camera::{CameraBasis, OrbitCamera};
#[cfg(feature = "gpu-render")]
use crate::render::gpu_renderer::GpuRenderer;
use crate::render::params::{
    cloud_opacity, rotation_speed, CLOUD_SPIN_Y_PER_FRAME, CLOUD_SPIN_Z_PER_FRAME,
    SURFACE_SPIN_PER_FRAME,
};
use crate::render::texture::{MapKind, PlanetTextures, TextureMap};
use crate::render::{cpu_renderer, RenderBackend};

pub const SURFACE_RADIUS: f32 = 2.0;
pub const CLOUD_RADIUS: f32 = 2.04;
/// Drawn from the inside (back faces) and blended additively.
pub const ATMOSPHERE_RADIUS: f32 = 2.22;

/// Uniform block owned by the surface program.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "gpu-render", derive(bytemuck::Pod, bytemuck::Zeroable))]
pub struct SurfaceUniforms {
    /// Seconds since mount.
    pub time: f32,
    pub score: f32,
    pub _pad: [f32; 2],
}

/// Uniform block owned by the atmosphere program.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "gpu-render", derive(bytemuck::Pod, bytemuck::Zeroable))]
pub struct AtmosphereUniforms {
    pub score: f32,
    pub _pad: [f32; 3],
}

/// Everything that changes frame to frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlanetState {
    /// Surface rotation about Y, radians.
    pub surface_spin: f32,
    pub cloud_spin_y: f32,
    pub cloud_spin_z: f32,
    pub cloud_opacity: f32,
    pub surface: SurfaceUniforms,
    pub atmosphere: AtmosphereUniforms,
}

impl PlanetState {
    /// Advance one frame at clock `time` for `score`.
    pub fn step(&mut self, time: f32, score: f32) {
        let speed = rotation_speed(score);
        self.surface_spin += SURFACE_SPIN_PER_FRAME * speed;
        self.cloud_spin_y += CLOUD_SPIN_Y_PER_FRAME * speed;
        self.cloud_spin_z += CLOUD_SPIN_Z_PER_FRAME * speed;

        self.surface.time = time;
        self.surface.score = score;
        self.atmosphere.score = score;
        self.cloud_opacity = cloud_opacity(score);
    }
}

/// Inputs for drawing one frame.
pub struct Frame<'a> {
    pub width: usize,
    pub height: usize,
    pub camera: CameraBasis,
    pub state: &'a PlanetState,
    pub textures: &'a PlanetTextures,
}

/// Owns the planet's state, maps and GPU resources.
pub struct PlanetRenderer {
    pub camera: OrbitCamera,
    state: PlanetState,
    textures: Option<PlanetTextures>,
    backend: RenderBackend,
    prefer_gpu: bool,
    #[cfg(feature = "gpu-render")]
    gpu: Option<GpuRenderer>,
    clock: Option<Instant>,
}

impl PlanetRenderer {
    pub fn new(prefer_gpu: bool) -> Self {
        Self {
            camera: OrbitCamera::default(),
            state: PlanetState::default(),
            textures: None,
            backend: RenderBackend::Cpu,
            prefer_gpu,
            #[cfg(feature = "gpu-render")]
            gpu: None,
            clock: None,
        }
    }

    /// Acquire maps and GPU resources. Does nothing when already mounted.
    pub fn mount(&mut self) {
        if self.is_mounted() {
            return;
        }
        self.textures = Some(PlanetTextures::fallback());
        self.clock = Some(Instant::now());
        self.backend = self.acquire_backend();
        log::info!("Planet renderer mounted ({} backend)", self.backend.label());
    }

    #[cfg(feature = "gpu-render")]
    fn acquire_backend(&mut self) -> RenderBackend {
        if !self.prefer_gpu {
            return RenderBackend::Cpu;
        }
        self.gpu = GpuRenderer::new();
        if self.gpu.is_some() {
            RenderBackend::Gpu
        } else {
            log::warn!("No usable GPU adapter, rendering on the CPU");
            RenderBackend::Cpu
        }
    }

    #[cfg(not(feature = "gpu-render"))]
    fn acquire_backend(&mut self) -> RenderBackend {
        if self.prefer_gpu {
            log::debug!("Built without gpu-render, rendering on the CPU");
        }
        RenderBackend::Cpu
    }

    /// Drop maps and GPU resources (window minimized or view torn down).
    pub fn release(&mut self) {
        if !self.is_mounted() {
            return;
        }
        self.textures = None;
        self.clock = None;
        #[cfg(feature = "gpu-render")]
        {
            self.gpu = None;
        }
        self.backend = RenderBackend::Cpu;
        log::info!("Planet renderer released");
    }

    pub fn is_mounted(&self) -> bool {
        self.textures.is_some()
    }

    pub fn backend(&self) -> RenderBackend {
        self.backend
    }

    pub fn state(&self) -> &PlanetState {
        &self.state
    }

    /// Swap in a freshly decoded map. Ignored while unmounted.
    pub fn set_texture(&mut self, kind: MapKind, map: TextureMap) {
        match self.textures.as_mut() {
            Some(textures) => textures.set(kind, map),
            None => log::debug!("{:?} map arrived while unmounted, dropping", kind),
        }
    }

    /// Advance one frame using the mount clock.
    pub fn advance(&mut self, score: f32) {
        let time = self
            .clock
            .map(|start| start.elapsed().as_secs_f32())
            .unwrap_or(0.0);
        self.state.step(time, score);
    }

    /// Render to premultiplied RGBA. `None` while unmounted or for an empty
    /// viewport.
    pub fn render(&mut self, width: usize, height: usize) -> Option<Vec<u8>> {
        if width == 0 || height == 0 {
            return None;
        }
        let textures = self.textures.as_ref()?;
        let frame = Frame {
            width,
            height,
            camera: self.camera.basis(),
            state: &self.state,
            textures,
        };

        #[cfg(feature = "gpu-render")]
        {
            if let Some(gpu) = self.gpu.as_mut() {
                if gpu.is_lost() {
                    log::warn!("GPU device lost, continuing on the CPU renderer");
                    self.gpu = None;
                    self.backend = RenderBackend::Cpu;
                } else if let Some(pixels) = gpu.render(&frame) {
                    return Some(pixels);
                }
            }
        }

        Some(cpu_renderer::render(&frame))
    }
}

impl Drop for PlanetRenderer {
    fn drop(&mut self) {
        self.release();
    }
}
