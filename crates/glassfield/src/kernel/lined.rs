//! Lined glass: vertical ribs bent by the horizontal slope of the field.

use glam::{Vec2, Vec3};

use super::noise::simplex;
use super::{finish_field, line_alpha, noise_uv, ramp, shade_lines, RampSplits, PI};
use crate::uniforms::GlassUniforms;

pub const LINED_OCTAVES: usize = 3;

pub(super) const SPLITS: RampSplits = RampSplits {
    low: 0.25,
    high: 0.55,
};

/// (frequency, amplitude, drift per unit of animated time)
const OCTAVES: [(f32, f32, Vec2); LINED_OCTAVES] = [
    (3.0, 1.0, Vec2::new(0.3, 0.2)),
    (5.0, 0.5, Vec2::new(-0.2, 0.25)),
    (8.0, 0.25, Vec2::new(0.15, -0.1)),
];

/// Central-difference step for the horizontal gradient.
const GRADIENT_EPSILON: f32 = 0.005;
const DARKENING_FLOOR: f32 = 0.65;
const HIGHLIGHT_GAIN: f32 = 0.15;

pub(super) fn field(uniforms: &GlassUniforms, p: Vec2, t: f32) -> f32 {
    let raw: f32 = OCTAVES
        .iter()
        .map(|&(frequency, amplitude, drift)| {
            amplitude * simplex(p * frequency * uniforms.noise_scale + drift * t)
        })
        .sum();
    finish_field(raw, uniforms.contrast_boost)
}

pub(super) fn shade(uniforms: &GlassUniforms, uv: Vec2) -> Vec3 {
    let t = super::flow_time(uniforms);
    let p = noise_uv(uniforms, uv);
    let base = field(uniforms, p, t);

    let step = Vec2::new(GRADIENT_EPSILON, 0.0);
    let slope =
        (field(uniforms, p + step, t) - field(uniforms, p - step, t)) / (2.0 * GRADIENT_EPSILON);
    let displaced_x = uv.x + slope * uniforms.displacement_strength;
    let pattern = (displaced_x * uniforms.line_frequency * PI).sin() * 0.5 + 0.5;
    let alpha = line_alpha(pattern, uniforms.line_sharpness);

    let color = Vec3::from_array(ramp(base, &uniforms.stops(), SPLITS));
    shade_lines(color, base, alpha, DARKENING_FLOOR, 3, HIGHLIGHT_GAIN)
}
