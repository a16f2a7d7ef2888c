//! 2-D simplex noise (Ashima Arts / Ian McEwan formulation).
//!
//! The CPU renderer calls [`snoise`] directly; the GPU renderer embeds
//! [`SNOISE_WGSL`], which is a line-for-line transcription. Keep the two in
//! step: the surface crack pattern must look the same on both backends.

const C: [f32; 4] = [
    0.211_324_87,  // (3 - sqrt(3)) / 6
    0.366_025_4,   // (sqrt(3) - 1) / 2
    -0.577_350_26, // -1 + 2 * C[0]
    0.024_390_243, // 1 / 41
];

#[inline]
fn mod289(x: f32) -> f32 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

#[inline]
fn permute(x: f32) -> f32 {
    mod289((x * 34.0 + 1.0) * x)
}

#[inline]
fn fract(x: f32) -> f32 {
    x - x.floor()
}

/// Coherent noise in roughly `[-1, 1]`.
pub fn snoise(vx: f32, vy: f32) -> f32 {
    let skew = (vx + vy) * C[1];
    let ix = (vx + skew).floor();
    let iy = (vy + skew).floor();

    let unskew = (ix + iy) * C[0];
    let x0 = [vx - ix + unskew, vy - iy + unskew];

    let i1 = if x0[0] > x0[1] { [1.0, 0.0] } else { [0.0, 1.0] };

    let x12 = [
        x0[0] + C[0] - i1[0],
        x0[1] + C[0] - i1[1],
        x0[0] + C[2],
        x0[1] + C[2],
    ];

    let ix = mod289(ix);
    let iy = mod289(iy);

    let py = [permute(iy), permute(iy + i1[1]), permute(iy + 1.0)];
    let p = [
        permute(py[0] + ix),
        permute(py[1] + ix + i1[0]),
        permute(py[2] + ix + 1.0),
    ];

    let mut m = [
        (0.5 - (x0[0] * x0[0] + x0[1] * x0[1])).max(0.0),
        (0.5 - (x12[0] * x12[0] + x12[1] * x12[1])).max(0.0),
        (0.5 - (x12[2] * x12[2] + x12[3] * x12[3])).max(0.0),
    ];
    for v in &mut m {
        *v = *v * *v;
        *v = *v * *v;
    }

    let mut g = [0.0f32; 3];
    let corners = [[x0[0], x0[1]], [x12[0], x12[1]], [x12[2], x12[3]]];
    for k in 0..3 {
        let x = 2.0 * fract(p[k] * C[3]) - 1.0;
        let h = x.abs() - 0.5;
        let ox = (x + 0.5).floor();
        let a0 = x - ox;
        m[k] *= 1.792_842_9 - 0.853_734_7 * (a0 * a0 + h * h);
        g[k] = a0 * corners[k][0] + h * corners[k][1];
    }

    130.0 * (m[0] * g[0] + m[1] * g[1] + m[2] * g[2])
}

/// WGSL transcription of [`snoise`].
pub const SNOISE_WGSL: &str = r#"
fn mod289_3(x: vec3<f32>) -> vec3<f32> { return x - floor(x * (1.0 / 289.0)) * 289.0; }
fn mod289_2(x: vec2<f32>) -> vec2<f32> { return x - floor(x * (1.0 / 289.0)) * 289.0; }
fn permute3(x: vec3<f32>) -> vec3<f32> { return mod289_3(((x * 34.0) + 1.0) * x); }

fn snoise(v: vec2<f32>) -> f32 {
    let C = vec4<f32>(0.211324865405187, 0.366025403784439, -0.577350269189626, 0.024390243902439);
    var i = floor(v + dot(v, C.yy));
    let x0 = v - i + dot(i, C.xx);
    var i1 = vec2<f32>(0.0, 1.0);
    if (x0.x > x0.y) {
        i1 = vec2<f32>(1.0, 0.0);
    }
    var x12 = x0.xyxy + C.xxzz;
    x12 = vec4<f32>(x12.xy - i1, x12.zw);
    i = mod289_2(i);
    let p = permute3(permute3(i.y + vec3<f32>(0.0, i1.y, 1.0)) + i.x + vec3<f32>(0.0, i1.x, 1.0));
    var m = max(vec3<f32>(0.5) - vec3<f32>(dot(x0, x0), dot(x12.xy, x12.xy), dot(x12.zw, x12.zw)), vec3<f32>(0.0));
    m = m * m;
    m = m * m;
    let x = 2.0 * fract(p * C.www) - 1.0;
    let h = abs(x) - 0.5;
    let ox = floor(x + 0.5);
    let a0 = x - ox;
    m = m * (1.79284291400159 - 0.85373472095314 * (a0 * a0 + h * h));
    let g = vec3<f32>(
        a0.x * x0.x + h.x * x0.y,
        a0.y * x12.x + h.y * x12.y,
        a0.z * x12.z + h.z * x12.w,
    );
    return 130.0 * dot(m, g);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded() {
        for i in 0..200 {
            for j in 0..200 {
                let n = snoise(i as f32 * 0.173, j as f32 * 0.091);
                assert!(n.is_finite());
                assert!(n.abs() <= 1.1, "noise out of range: {}", n);
            }
        }
    }

    #[test]
    fn zero_at_lattice_origin() {
        assert!(snoise(0.0, 0.0).abs() < 1e-6);
    }

    #[test]
    fn varies_over_space() {
        let a = snoise(1.3, 2.7);
        let b = snoise(4.1, 0.6);
        assert!((a - b).abs() > 1e-4);
    }

    #[test]
    fn continuous() {
        let a = snoise(3.2, 5.5);
        let b = snoise(3.2001, 5.5);
        assert!((a - b).abs() < 0.01);
    }
}
