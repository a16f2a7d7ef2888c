//! CPU-side planet maps: decoded RGBA images with equirectangular sampling.

use glam::Vec3;

/// Widest map we keep in memory; larger downloads are resized on decode.
pub const MAX_TEXTURE_WIDTH: u32 = 2048;

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("download failed: {0}")]
    Fetch(#[from] crate::net::http::FetchError),
    #[error("decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error("image is empty")]
    Empty,
}

/// Decoded RGBA image.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureMap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureMap {
    /// A 1×1 map of a single color.
    pub fn solid(rgb: [u8; 3]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: vec![rgb[0], rgb[1], rgb[2], 255],
        }
    }

    /// Decode PNG/JPEG bytes, capping the width at [`MAX_TEXTURE_WIDTH`].
    pub fn decode(bytes: &[u8]) -> Result<Self, TextureError> {
        let img = image::load_from_memory(bytes)?;
        let rgba = img.to_rgba8();
        let (w, h) = rgba.dimensions();
        if w == 0 || h == 0 {
            return Err(TextureError::Empty);
        }

        let (w, h, pixels) = if w > MAX_TEXTURE_WIDTH {
            let ratio = MAX_TEXTURE_WIDTH as f32 / w as f32;
            let new_h = ((h as f32 * ratio) as u32).max(1);
            let resized = image::imageops::resize(
                &rgba,
                MAX_TEXTURE_WIDTH,
                new_h,
                image::imageops::FilterType::Triangle,
            );
            let (rw, rh) = resized.dimensions();
            (rw, rh, resized.into_raw())
        } else {
            (w, h, rgba.into_raw())
        };

        Ok(Self {
            width: w,
            height: h,
            rgba: pixels,
        })
    }

    #[inline]
    fn texel(&self, x: u32, y: u32) -> [f32; 4] {
        const INV_255: f32 = 1.0 / 255.0;
        let off = ((y * self.width + x) * 4) as usize;
        let px = &self.rgba[off..off + 4];
        [
            px[0] as f32 * INV_255,
            px[1] as f32 * INV_255,
            px[2] as f32 * INV_255,
            px[3] as f32 * INV_255,
        ]
    }

    /// Bilinear RGBA sample. `u` wraps around the globe; `v = 1` is the top row.
    pub fn sample_rgba(&self, u: f32, v: f32) -> [f32; 4] {
        let fx = u.rem_euclid(1.0) * self.width as f32 - 0.5;
        let fy = (1.0 - v.clamp(0.0, 1.0)) * self.height as f32 - 0.5;

        let x0f = fx.floor();
        let y0f = fy.floor();
        let tx = fx - x0f;
        let ty = fy - y0f;

        let w = self.width as i64;
        let h = self.height as i64;
        let wrap_x = |x: i64| x.rem_euclid(w) as u32;
        let clamp_y = |y: i64| y.clamp(0, h - 1) as u32;

        let x0 = wrap_x(x0f as i64);
        let x1 = wrap_x(x0f as i64 + 1);
        let y0 = clamp_y(y0f as i64);
        let y1 = clamp_y(y0f as i64 + 1);

        let (a, b, c, d) = (
            self.texel(x0, y0),
            self.texel(x1, y0),
            self.texel(x0, y1),
            self.texel(x1, y1),
        );
        let mut out = [0.0; 4];
        for i in 0..4 {
            let top = a[i] + (b[i] - a[i]) * tx;
            let bottom = c[i] + (d[i] - c[i]) * tx;
            out[i] = top + (bottom - top) * ty;
        }
        out
    }

    /// Bilinear RGB sample.
    #[inline]
    pub fn sample(&self, u: f32, v: f32) -> Vec3 {
        let [r, g, b, _] = self.sample_rgba(u, v);
        Vec3::new(r, g, b)
    }

    /// Pack as little-endian RGBA `u32`s for GPU storage buffers.
    pub fn packed(&self) -> Vec<u32> {
        self.rgba
            .chunks_exact(4)
            .map(|px| u32::from_le_bytes([px[0], px[1], px[2], px[3]]))
            .collect()
    }
}

/// Which map a texture is used as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapKind {
    Day,
    Night,
    Clouds,
}

impl MapKind {
    /// Flat stand-in used until (or instead of) the real download.
    pub fn fallback(self) -> TextureMap {
        match self {
            MapKind::Day => TextureMap::solid([38, 72, 128]),
            MapKind::Night => TextureMap::solid([0, 0, 0]),
            MapKind::Clouds => TextureMap::solid([0, 0, 0]),
        }
    }
}

/// The three maps the planet shades with.
#[derive(Debug, Clone)]
pub struct PlanetTextures {
    pub day: TextureMap,
    pub night: TextureMap,
    pub clouds: TextureMap,
    /// Bumped whenever a map is replaced, so GPU uploads can be skipped.
    pub generation: u64,
}

impl PlanetTextures {
    pub fn fallback() -> Self {
        Self {
            day: MapKind::Day.fallback(),
            night: MapKind::Night.fallback(),
            clouds: MapKind::Clouds.fallback(),
            generation: 0,
        }
    }

    pub fn set(&mut self, kind: MapKind, map: TextureMap) {
        match kind {
            MapKind::Day => self.day = map,
            MapKind::Night => self.night = map,
            MapKind::Clouds => self.clouds = map,
        }
        self.generation += 1;
    }
}
