//! Flowing wave: a swirled, domain-warped sum of directional waves seen
//! through noise-wobbled ridges.

use glam::{Mat2, Vec2, Vec3};

use super::noise::simplex;
use super::{finish_field, line_alpha, noise_uv, ramp, shade_lines, RampSplits, PI};
use crate::uniforms::GlassUniforms;

pub const FLOW_WAVES: usize = 4;
pub const FLOW_OCTAVES: usize = 2;

pub(super) const SPLITS: RampSplits = RampSplits {
    low: 1.0 / 3.0,
    high: 2.0 / 3.0,
};

struct Wave {
    weight: f32,
    angle: f32,
    sway_rate: f32,
    frequency: f32,
    speed: f32,
}

const WAVES: [Wave; FLOW_WAVES] = [
    Wave { weight: 0.30, angle: 0.0, sway_rate: 0.11, frequency: 1.7, speed: 0.9 },
    Wave { weight: 0.26, angle: 1.2, sway_rate: 0.07, frequency: 2.3, speed: -0.7 },
    Wave { weight: 0.24, angle: 2.4, sway_rate: 0.13, frequency: 3.1, speed: 0.5 },
    Wave { weight: 0.20, angle: 3.9, sway_rate: 0.05, frequency: 4.3, speed: -1.1 },
];

/// (frequency, amplitude, drift) of the detail octaves.
const OCTAVES: [(f32, f32, f32); FLOW_OCTAVES] = [(2.0, 0.6, 0.1), (4.0, 0.3, -0.15)];

const SWAY: f32 = 0.6;
const SWIRL_GAIN: f32 = 0.6;
const WARP_GAIN: f32 = 0.35;
const WAVE_MIX: f32 = 0.55;
const NOISE_MIX: f32 = 0.45;

const DARKENING_FLOOR: f32 = 0.80;
const HIGHLIGHT_GAIN: f32 = 0.12;

fn swirl(p: Vec2, center: Vec2, t: f32, flow: f32) -> Vec2 {
    let offset = p - center;
    let angle = offset.length() * SWIRL_GAIN * (t * 0.21).sin() * flow;
    center + Mat2::from_angle(angle) * offset
}

fn warp(p: Vec2, t: f32, flow: f32) -> Vec2 {
    let direction = Vec2::new((t * 0.13).cos(), (t * 0.17).sin());
    let q = p * 1.5;
    let offset = Vec2::new(
        simplex(q + direction * (0.5 * t)),
        simplex(q + Vec2::new(5.2, 1.3) - direction * (0.4 * t)),
    );
    p + offset * (WARP_GAIN * flow)
}

fn waves(p: Vec2, t: f32, complexity: f32) -> f32 {
    WAVES
        .iter()
        .map(|wave| {
            let angle = wave.angle + SWAY * (t * wave.sway_rate).sin();
            let direction = Vec2::new(angle.cos(), angle.sin());
            let phase = p.dot(direction) * wave.frequency * complexity + wave.speed * t;
            wave.weight * phase.sin()
        })
        .sum()
}

pub(super) fn field(uniforms: &GlassUniforms, p: Vec2, t: f32) -> f32 {
    let scale = uniforms.noise_scale;
    let flow = uniforms.flow_intensity;
    let center = Vec2::new(uniforms.aspect() * 0.5, 0.5) * scale;

    let p = swirl(p * scale, center, t, flow);
    let p = warp(p, t, flow);

    let detail: f32 = OCTAVES
        .iter()
        .map(|&(frequency, amplitude, drift)| amplitude * simplex(p * frequency + Vec2::splat(drift * t)))
        .sum();
    let raw = WAVE_MIX * waves(p, t, uniforms.wave_complexity) + NOISE_MIX * detail;
    finish_field(raw, uniforms.contrast_boost)
}

/// Ridge pattern in `[0, 1]` at screen position `uv`.
fn ridge(uniforms: &GlassUniforms, uv: Vec2, t: f32) -> f32 {
    let wobble = simplex(
        Vec2::new(1.5 * uv.x, 3.0 * uv.y) * uniforms.noise_scale + Vec2::new(0.05 * t, -0.08 * t),
    );
    let index = uv.x * uniforms.line_frequency
        + wobble * uniforms.waviness * 3.0
        + (uv.y * 12.0 + wobble * 2.0).sin() * uniforms.waviness * 0.5;
    (index * PI).sin() * 0.5 + 0.5
}

pub(super) fn shade(uniforms: &GlassUniforms, uv: Vec2) -> Vec3 {
    let t = super::flow_time(uniforms);
    let pattern = ridge(uniforms, uv, t);
    let lookup = noise_uv(uniforms, uv)
        + Vec2::new(0.0, (pattern - 0.5) * uniforms.displacement_strength);
    let value = field(uniforms, lookup, t);
    let alpha = line_alpha(pattern, uniforms.line_sharpness);

    let color = Vec3::from_array(ramp(value, &uniforms.stops(), SPLITS));
    shade_lines(color, value, alpha, DARKENING_FLOOR, 4, HIGHLIGHT_GAIN)
}
