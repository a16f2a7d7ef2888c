//! GPU planet renderer.
//!
//! One compute dispatch shades every pixel with the same ray casting as the
//! CPU path. Planet maps live in storage buffers as packed RGBA8 and are only
//! re-uploaded when a map changes. The image is read back into RGBA8 for egui.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use wgpu::util::DeviceExt;

use crate::render::noise::SNOISE_WGSL;
use crate::render::params::wgsl_constants;
use crate::render::planet::{
    AtmosphereUniforms, Frame, SurfaceUniforms, ATMOSPHERE_RADIUS, CLOUD_RADIUS, SURFACE_RADIUS,
};
use crate::render::texture::{PlanetTextures, TextureMap};

// ── Uniform structs (must match WGSL layout exactly) ──

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct FrameUniforms {
    cam_origin: [f32; 3],
    fov_factor: f32,
    cam_forward: [f32; 3],
    aspect: f32,
    cam_right: [f32; 3],
    surface_spin: f32,
    cam_up: [f32; 3],
    cloud_opacity: f32,
    cloud_spin_y: f32,
    cloud_spin_z: f32,
    width: u32,
    height: u32,
    day_size: [u32; 2],
    night_size: [u32; 2],
    cloud_size: [u32; 2],
    _pad: [u32; 2],
}

/// Persistent GPU renderer: device, pipeline and cached buffers.
pub struct GpuRenderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    lost: Arc<AtomicBool>,
    maps: Option<MapBuffers>,
    target: Option<TargetBuffers>,
}

struct MapBuffers {
    generation: u64,
    day: wgpu::Buffer,
    night: wgpu::Buffer,
    clouds: wgpu::Buffer,
}

struct TargetBuffers {
    width: usize,
    height: usize,
    output: wgpu::Buffer,
    staging: wgpu::Buffer,
}

impl GpuRenderer {
    /// Try to initialise the GPU renderer. Returns None if no GPU is available.
    pub fn new() -> Option<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))?;

        let (device, queue) = match pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("VibeCheck GPU"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        )) {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("GPU device request failed: {}", e);
                return None;
            }
        };

        let lost = Arc::new(AtomicBool::new(false));
        {
            let lost = Arc::clone(&lost);
            device.set_device_lost_callback(move |reason, message| {
                log::warn!("GPU device lost ({:?}): {}", reason, message);
                lost.store(true, Ordering::Release);
            });
        }
        {
            let lost = Arc::clone(&lost);
            device.on_uncaptured_error(Box::new(move |err| {
                log::error!("GPU error, abandoning the GPU renderer: {}", err);
                lost.store(true, Ordering::Release);
            }));
        }

        let (pipeline, bind_group_layout) = build_pipeline(&device);

        log::info!("GPU renderer initialised: {:?}", adapter.get_info().name);

        Some(Self {
            device,
            queue,
            pipeline,
            bind_group_layout,
            lost,
            maps: None,
            target: None,
        })
    }

    /// Whether the device has gone away. There is no recovery.
    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::Acquire)
    }

    /// Render a frame to premultiplied RGBA8.
    pub fn render(&mut self, frame: &Frame<'_>) -> Option<Vec<u8>> {
        if self.is_lost() {
            return None;
        }
        self.sync_maps(frame.textures);
        self.ensure_target(frame.width, frame.height);
        let maps = self.maps.as_ref()?;
        let target = self.target.as_ref()?;

        let cam = &frame.camera;
        let state = frame.state;
        let size = |m: &TextureMap| [m.width, m.height];
        let uniforms = FrameUniforms {
            cam_origin: cam.origin.to_array(),
            fov_factor: cam.fov_factor,
            cam_forward: cam.forward.to_array(),
            aspect: frame.width as f32 / frame.height as f32,
            cam_right: cam.right.to_array(),
            surface_spin: state.surface_spin,
            cam_up: cam.up.to_array(),
            cloud_opacity: state.cloud_opacity,
            cloud_spin_y: state.cloud_spin_y,
            cloud_spin_z: state.cloud_spin_z,
            width: frame.width as u32,
            height: frame.height as u32,
            day_size: size(&frame.textures.day),
            night_size: size(&frame.textures.night),
            cloud_size: size(&frame.textures.clouds),
            _pad: [0; 2],
        };

        let frame_buf = self.uniform_buffer("Frame Uniforms", bytemuck::bytes_of(&uniforms));
        let surface_buf = self.uniform_buffer("Surface Uniforms", bytemuck::bytes_of(&state.surface));
        let atmosphere_buf =
            self.uniform_buffer("Atmosphere Uniforms", bytemuck::bytes_of(&state.atmosphere));

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Planet Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: frame_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: surface_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: atmosphere_buf.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: maps.day.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: maps.night.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: maps.clouds.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 6,
                    resource: target.output.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Planet Encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Planet Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            let wg_x = (frame.width as u32).div_ceil(16);
            let wg_y = (frame.height as u32).div_ceil(16);
            pass.dispatch_workgroups(wg_x, wg_y, 1);
        }

        let output_size = (frame.width * frame.height * 4) as u64;
        encoder.copy_buffer_to_buffer(&target.output, 0, &target.staging, 0, output_size);
        self.queue.submit(std::iter::once(encoder.finish()));

        // Read back
        let buffer_slice = target.staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);

        if rx.recv().ok()?.is_err() {
            log::warn!("GPU readback failed, falling back to the CPU for this frame");
            return None;
        }

        let data = buffer_slice.get_mapped_range();
        let packed: &[u32] = bytemuck::cast_slice(&data);
        let mut pixels = Vec::with_capacity(packed.len() * 4);
        for px in packed {
            pixels.extend_from_slice(&px.to_le_bytes());
        }
        drop(data);
        target.staging.unmap();

        Some(pixels)
    }

    fn uniform_buffer(&self, label: &str, contents: &[u8]) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::UNIFORM,
            })
    }

    fn map_buffer(&self, label: &str, map: &TextureMap) -> wgpu::Buffer {
        self.device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&map.packed()),
                usage: wgpu::BufferUsages::STORAGE,
            })
    }

    /// Re-upload the maps when any of them changed since the last frame.
    fn sync_maps(&mut self, textures: &PlanetTextures) {
        if self
            .maps
            .as_ref()
            .is_some_and(|m| m.generation == textures.generation)
        {
            return;
        }
        self.maps = Some(MapBuffers {
            generation: textures.generation,
            day: self.map_buffer("Day Map", &textures.day),
            night: self.map_buffer("Night Map", &textures.night),
            clouds: self.map_buffer("Cloud Map", &textures.clouds),
        });
        log::debug!("Uploaded planet maps (generation {})", textures.generation);
    }

    fn ensure_target(&mut self, width: usize, height: usize) {
        if self
            .target
            .as_ref()
            .is_some_and(|t| t.width == width && t.height == height)
        {
            return;
        }
        let size = (width * height * 4) as u64;
        let output = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Output Pixels"),
            size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Staging"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.target = Some(TargetBuffers {
            width,
            height,
            output,
            staging,
        });
    }
}

// ── Pipeline construction ──

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn build_pipeline(device: &wgpu::Device) -> (wgpu::ComputePipeline, wgpu::BindGroupLayout) {
    let shader_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Planet Shader"),
        source: wgpu::ShaderSource::Wgsl(generate_shader().into()),
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Planet BGL"),
        entries: &[
            uniform_entry(0),
            uniform_entry(1),
            uniform_entry(2),
            storage_entry(3, true),
            storage_entry(4, true),
            storage_entry(5, true),
            storage_entry(6, false),
        ],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Planet PL"),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Planet Pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader_module,
        entry_point: Some("main"),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        cache: None,
    });

    (pipeline, bind_group_layout)
}

// ── WGSL Shader Generation ──

/// Bilinear sampler over one packed map buffer.
fn sampler_wgsl(name: &str, buffer: &str, size: &str) -> String {
    format!(
        r#"
fn texel_{name}(x: i32, y: i32) -> vec4<f32> {{
    let w = i32(u.{size}.x);
    let h = i32(u.{size}.y);
    let xi = ((x % w) + w) % w;
    let yi = clamp(y, 0, h - 1);
    return unpack4x8unorm({buffer}[u32(yi * w + xi)]);
}}

fn sample_{name}(uv: vec2<f32>) -> vec4<f32> {{
    let fx = fract(uv.x) * f32(u.{size}.x) - 0.5;
    let fy = (1.0 - clamp(uv.y, 0.0, 1.0)) * f32(u.{size}.y) - 0.5;
    let x0 = floor(fx);
    let y0 = floor(fy);
    let tx = fx - x0;
    let ty = fy - y0;
    let xi = i32(x0);
    let yi = i32(y0);
    let top = mix(texel_{name}(xi, yi), texel_{name}(xi + 1, yi), tx);
    let bottom = mix(texel_{name}(xi, yi + 1), texel_{name}(xi + 1, yi + 1), tx);
    return mix(top, bottom, ty);
}}
"#
    )
}

/// The complete WGSL compute shader.
fn generate_shader() -> String {
    let constants = wgsl_constants();
    let day = sampler_wgsl("day", "day_map", "day_size");
    let night = sampler_wgsl("night", "night_map", "night_size");
    let clouds = sampler_wgsl("clouds", "cloud_map", "cloud_size");

    format!(
        r#"// VibeCheck planet (generated)

struct FrameUniforms {{
    cam_origin: vec3<f32>,
    fov_factor: f32,
    cam_forward: vec3<f32>,
    aspect: f32,
    cam_right: vec3<f32>,
    surface_spin: f32,
    cam_up: vec3<f32>,
    cloud_opacity: f32,
    cloud_spin_y: f32,
    cloud_spin_z: f32,
    width: u32,
    height: u32,
    day_size: vec2<u32>,
    night_size: vec2<u32>,
    cloud_size: vec2<u32>,
    _pad: vec2<u32>,
}}

struct SurfaceUniforms {{
    time: f32,
    score: f32,
    _pad0: f32,
    _pad1: f32,
}}

struct AtmosphereUniforms {{
    score: f32,
    _pad0: f32,
    _pad1: f32,
    _pad2: f32,
}}

@group(0) @binding(0) var<uniform> u: FrameUniforms;
@group(0) @binding(1) var<uniform> surface: SurfaceUniforms;
@group(0) @binding(2) var<uniform> atmosphere: AtmosphereUniforms;
@group(0) @binding(3) var<storage, read> day_map: array<u32>;
@group(0) @binding(4) var<storage, read> night_map: array<u32>;
@group(0) @binding(5) var<storage, read> cloud_map: array<u32>;
@group(0) @binding(6) var<storage, read_write> output_pixels: array<u32>;

const PI: f32 = 3.14159265358979;
const SURFACE_RADIUS: f32 = {surface_radius:.6};
const CLOUD_RADIUS: f32 = {cloud_radius:.6};
const ATMOSPHERE_RADIUS: f32 = {atmosphere_radius:.6};
{constants}
{SNOISE_WGSL}
{day}
{night}
{clouds}

// xy = (t_near, t_far), z = 1 on hit
fn ray_sphere(o: vec3<f32>, d: vec3<f32>, r: f32) -> vec3<f32> {{
    let b = dot(o, d);
    let c = dot(o, o) - r * r;
    let disc = b * b - c;
    if (disc < 0.0) {{
        return vec3<f32>(0.0);
    }}
    let s = sqrt(disc);
    return vec3<f32>(-b - s, -b + s, 1.0);
}}

fn rotate_y(v: vec3<f32>, a: f32) -> vec3<f32> {{
    let s = sin(a);
    let c = cos(a);
    return vec3<f32>(c * v.x + s * v.z, v.y, -s * v.x + c * v.z);
}}

fn rotate_z(v: vec3<f32>, a: f32) -> vec3<f32> {{
    let s = sin(a);
    let c = cos(a);
    return vec3<f32>(c * v.x - s * v.y, s * v.x + c * v.y, v.z);
}}

fn sphere_uv(l: vec3<f32>) -> vec2<f32> {{
    let phi = atan2(l.z, -l.x);
    let theta = acos(clamp(l.y, -1.0, 1.0));
    return vec2<f32>(fract(phi / (2.0 * PI)), 1.0 - theta / PI);
}}

fn to_view(n: vec3<f32>) -> vec3<f32> {{
    return vec3<f32>(dot(n, u.cam_right), dot(n, u.cam_up), -dot(n, u.cam_forward));
}}

fn surface_diffuse(view_normal: vec3<f32>) -> f32 {{
    return max(dot(view_normal, normalize(SURFACE_LIGHT)), MIN_DIFFUSE);
}}

fn shade_surface(score: f32, time: f32, uv: vec2<f32>, day: vec3<f32>, night: vec3<f32>) -> vec3<f32> {{
    if (score >= 0.0) {{
        let lights = smoothstep(NIGHT_LIGHTS_START, 1.0, score) * NIGHT_LIGHTS_GAIN;
        return mix(BARREN_COLOR, day, score) + night * lights;
    }}
    let t = -score;
    let land = step(LAND_THRESHOLD, (day.r + day.g) * 0.5 - day.b);
    let death = mix(SLUDGE_COLOR, ASH_COLOR, land);
    let decayed = mix(day, death, t);
    let lava = smoothstep(LAVA_ONSET, 1.0, t);
    let drift = time * CRACK_TIME_SCALE;
    let cracks = smoothstep(CRACK_EDGE_LOW, CRACK_EDGE_HIGH, snoise(uv * CRACK_UV_SCALE + drift));
    return mix(decayed, LAVA_COLOR * LAVA_GAIN, cracks * lava);
}}

fn atmosphere_color(score: f32) -> vec3<f32> {{
    let base = mix(ATMOSPHERE_BASE, ATMOSPHERE_POSITIVE, clamp(score, 0.0, 1.0));
    return mix(base, ATMOSPHERE_NEGATIVE, clamp(-score, 0.0, 1.0));
}}

fn pack(c: vec4<f32>) -> u32 {{
    let q = clamp(c, vec4<f32>(0.0), vec4<f32>(1.0)) * 255.0;
    return u32(q.x) | (u32(q.y) << 8u) | (u32(q.z) << 16u) | (u32(q.w) << 24u);
}}

// ── Main compute kernel: one thread per pixel ──
@compute @workgroup_size(16, 16)
fn main(@builtin(global_invocation_id) gid: vec3<u32>) {{
    let px = gid.x;
    let py = gid.y;
    if (px >= u.width || py >= u.height) {{
        return;
    }}

    let uf = (f32(px) + 0.5) / f32(u.width) * 2.0 - 1.0;
    let vf = -((f32(py) + 0.5) / f32(u.height) * 2.0 - 1.0);
    let dir = normalize(
        u.cam_forward
        + u.cam_right * (uf * u.fov_factor * u.aspect)
        + u.cam_up * (vf * u.fov_factor)
    );
    let o = u.cam_origin;

    var color = vec3<f32>(0.0);
    var alpha = 0.0;

    let earth = ray_sphere(o, dir, SURFACE_RADIUS);
    if (earth.z > 0.5 && earth.x > 0.0) {{
        let n = normalize(o + dir * earth.x);
        let uv = sphere_uv(rotate_y(n, -u.surface_spin));
        let day = sample_day(uv).rgb;
        let night = sample_night(uv).rgb;
        color = shade_surface(surface.score, surface.time, uv, day, night) * surface_diffuse(to_view(n));
        alpha = 1.0;
    }} else {{
        let shell = ray_sphere(o, dir, ATMOSPHERE_RADIUS);
        if (shell.z > 0.5 && shell.y > 0.0) {{
            let p = o + dir * shell.y;
            let n = normalize(p);
            let v = normalize(o - p);
            let intensity = min(pow(max(FRESNEL_BIAS - dot(n, v), 0.0), FRESNEL_POWER), 1.0);
            color += atmosphere_color(atmosphere.score) * intensity;
        }}
    }}

    let cloud = ray_sphere(o, dir, CLOUD_RADIUS);
    if (cloud.z > 0.5 && cloud.x > 0.0) {{
        let n = normalize(o + dir * cloud.x);
        let lp = rotate_z(rotate_y(n, -u.cloud_spin_y), -u.cloud_spin_z);
        let tex = sample_clouds(sphere_uv(lp));
        color += tex.rgb * (tex.a * u.cloud_opacity * surface_diffuse(to_view(n)));
    }}

    output_pixels[py * u.width + px] = pack(vec4<f32>(color, alpha));
}}
"#,
        surface_radius = SURFACE_RADIUS,
        cloud_radius = CLOUD_RADIUS,
        atmosphere_radius = ATMOSPHERE_RADIUS,
    )
}
