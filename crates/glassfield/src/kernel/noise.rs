//! 2D simplex noise and the per-pixel grain hash.
//!
//! Both functions follow the GLSL in `shaders.rs` operation for operation,
//! including GLSL's `fract` (`x - floor(x)`) and `step` semantics, so the CPU
//! and GPU kernels agree up to floating-point evaluation order.

use glam::Vec2;

const C_X: f32 = 0.211_324_87; // (3 - sqrt(3)) / 6
const C_Y: f32 = 0.366_025_4; // (sqrt(3) - 1) / 2
const C_Z: f32 = -0.577_350_26; // -1 + 2 * C_X
const C_W: f32 = 0.024_390_243; // 1 / 41

/// GLSL `fract`: always in `[0, 1)`, unlike `f32::fract` for negatives.
pub(crate) fn fract(x: f32) -> f32 {
    x - x.floor()
}

fn mod289(x: f32) -> f32 {
    x - (x * (1.0 / 289.0)).floor() * 289.0
}

fn permute(x: f32) -> f32 {
    mod289((x * 34.0 + 1.0) * x)
}

/// Gradient simplex noise over the plane, roughly in `[-1, 1]`.
pub fn simplex(v: Vec2) -> f32 {
    let i = (v + Vec2::splat(v.dot(Vec2::splat(C_Y)))).floor();
    let x0 = v - i + Vec2::splat(i.dot(Vec2::splat(C_X)));
    let o = if x0.x >= x0.y { 1.0 } else { 0.0 };
    let i1 = Vec2::new(o, 1.0 - o);
    let x1 = x0 + Vec2::splat(C_X) - i1;
    let x2 = x0 + Vec2::splat(C_Z);
    let i = Vec2::new(mod289(i.x), mod289(i.y));

    let corners = [(Vec2::ZERO, x0), (i1, x1), (Vec2::ONE, x2)];
    let mut total = 0.0;
    for (offset, x) in corners {
        let p = permute(permute(i.y + offset.y) + i.x + offset.x);
        let mut m = (0.5 - x.dot(x)).max(0.0);
        m *= m;
        m *= m;
        let g = 2.0 * fract(p * C_W) - 1.0;
        let h = g.abs() - 0.5;
        let a0 = g - (g + 0.5).floor();
        m *= 1.792_842_9 - 0.853_734_7 * (a0 * a0 + h * h);
        total += m * (a0 * x.x + h * x.y);
    }
    130.0 * total
}

/// Hash of a pixel position and a time seed into `[0, 1)`.
pub fn grain_hash(position: Vec2, seed: f32) -> f32 {
    let p = position + Vec2::splat(seed);
    fract((p.dot(Vec2::new(12.9898, 78.233))).sin() * 43_758.547)
}
