pub mod camera;
pub mod cpu_renderer;
pub mod math;
pub mod noise;
pub mod params;
pub mod planet;
pub mod starfield;
pub mod texture;

#[cfg(feature = "gpu-render")]
pub mod gpu_renderer;

/// Which backend shades the planet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderBackend {
    /// rayon ray caster
    #[default]
    Cpu,
    /// wgpu compute shader
    Gpu,
}

impl RenderBackend {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cpu => "CPU",
            Self::Gpu => "GPU",
        }
    }
}
