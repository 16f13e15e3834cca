//! CPU reference implementation of the field kernel.
//!
//! Every stage here mirrors the GLSL in [`crate::shaders`]: the field
//! (noise, optional swirl and warp), displacement, the 4-stop ramp, and
//! shading with grain. It consumes the same [`GlassUniforms`] block the GPU
//! sees, so the render session and the still exporter cannot drift apart on
//! inputs.
//!
//! Coordinates follow the fragment shader: `uv` is in `[0, 1]^2` with the
//! origin at the bottom-left, and `frag = uv * resolution`.

mod flowing;
mod lined;
pub mod noise;

use glam::{Vec2, Vec3};
use image::{Rgb as Pixel, RgbImage};

use crate::color::Rgb;
use crate::error::StillError;
use crate::types::{ShaderVariant, Viewport, MAX_SURFACE_DIMENSION};
use crate::uniforms::GlassUniforms;

pub use flowing::{FLOW_OCTAVES, FLOW_WAVES};
pub use lined::LINED_OCTAVES;

/// Floor for the contrast exponent so `pow` stays defined for any input.
pub const MIN_CONTRAST: f32 = 1e-3;

/// Narrowest smoothstep band used for the line edge.
const MIN_EDGE_WIDTH: f32 = 1e-4;

pub(crate) const PI: f32 = 3.141_592_7;

/// Split points of the three ramp segments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampSplits {
    pub low: f32,
    pub high: f32,
}

impl ShaderVariant {
    pub fn ramp_splits(self) -> RampSplits {
        match self {
            ShaderVariant::LinedGlass => lined::SPLITS,
            ShaderVariant::FlowingWave => flowing::SPLITS,
        }
    }
}

/// Maps `s` through the dark → mid → bright → accent gradient.
///
/// Each segment fraction is clamped to `[0, 1]` and the blend is written as
/// `a * (1 - f) + b * f`, so at a split point the result is exactly the stop
/// color from either side.
pub fn ramp(s: f32, stops: &[Rgb; 4], splits: RampSplits) -> Rgb {
    let [dark, mid, bright, accent] = stops.map(Vec3::from_array);
    let color = if s < splits.low {
        mix(dark, mid, segment(s, 0.0, splits.low))
    } else if s < splits.high {
        mix(mid, bright, segment(s, splits.low, splits.high))
    } else {
        mix(bright, accent, segment(s, splits.high, 1.0))
    };
    color.to_array()
}

fn segment(s: f32, lo: f32, hi: f32) -> f32 {
    ((s - lo) / (hi - lo)).clamp(0.0, 1.0)
}

fn mix(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a * (1.0 - t) + b * t
}

fn mix_scalar(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

pub(crate) fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Normalizes a raw noise sum into the final `[0, 1]` field value.
pub(crate) fn finish_field(raw: f32, contrast: f32) -> f32 {
    let n = (raw * 0.5 + 0.5).clamp(0.0, 1.0);
    let n = smoothstep(0.0, 1.0, n);
    n.powf(contrast.max(MIN_CONTRAST)).clamp(0.0, 1.0)
}

/// Edge-smoothed line alpha around the sharpness threshold.
pub(crate) fn line_alpha(pattern: f32, sharpness: f32) -> f32 {
    let width = (sharpness * 0.4).abs().max(MIN_EDGE_WIDTH);
    smoothstep(0.5 - width, 0.5 + width, pattern)
}

/// Darkens by the line alpha (never below `floor`) and adds the ridge
/// highlight.
pub(crate) fn shade_lines(
    base: Vec3,
    field: f32,
    alpha: f32,
    floor: f32,
    highlight_power: i32,
    highlight_gain: f32,
) -> Vec3 {
    let darkened = base * mix_scalar(floor, 1.0, alpha);
    darkened + Vec3::splat(alpha.powi(highlight_power) * field * highlight_gain)
}

/// Aspect-corrected coordinate used for every field lookup.
pub(crate) fn noise_uv(uniforms: &GlassUniforms, uv: Vec2) -> Vec2 {
    Vec2::new(uv.x * uniforms.aspect(), uv.y)
}

/// Animated time, `elapsed * animation_speed`.
pub(crate) fn flow_time(uniforms: &GlassUniforms) -> f32 {
    uniforms.time * uniforms.animation_speed
}

/// Scalar field of `variant` at aspect-corrected position `p`.
pub fn field(variant: ShaderVariant, uniforms: &GlassUniforms, p: Vec2) -> f32 {
    let t = flow_time(uniforms);
    match variant {
        ShaderVariant::LinedGlass => lined::field(uniforms, p, t),
        ShaderVariant::FlowingWave => flowing::field(uniforms, p, t),
    }
}

/// Field, displacement, ramp, and shading without grain or final clamp.
pub fn shade_base(variant: ShaderVariant, uniforms: &GlassUniforms, uv: Vec2) -> Rgb {
    let color = match variant {
        ShaderVariant::LinedGlass => lined::shade(uniforms, uv),
        ShaderVariant::FlowingWave => flowing::shade(uniforms, uv),
    };
    color.to_array()
}

/// Symmetric grain offset for the pixel at `uv`, in
/// `[-grain / 2, grain / 2]`.
pub fn grain(uniforms: &GlassUniforms, uv: Vec2) -> f32 {
    let frag = uv * Vec2::from_array(uniforms.resolution);
    (noise::grain_hash(frag, uniforms.time * 10.0) - 0.5) * uniforms.grain_intensity
}

/// Final display color for the pixel at `uv`.
pub fn shade(variant: ShaderVariant, uniforms: &GlassUniforms, uv: Vec2) -> Rgb {
    let grain = grain(uniforms, uv);
    shade_base(variant, uniforms, uv).map(|channel| to_display(channel + grain))
}

fn to_display(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Evaluates one full frame on the CPU.
///
/// The image size is taken from `uniforms.resolution`; row 0 is the top of
/// the image, matching what the surface shows. Sizes beyond
/// [`MAX_SURFACE_DIMENSION`] are rejected before any pixel buffer exists.
pub fn render_still(
    variant: ShaderVariant,
    uniforms: &GlassUniforms,
) -> Result<RgbImage, StillError> {
    let width = uniforms.resolution[0].max(1.0) as u32;
    let height = uniforms.resolution[1].max(1.0) as u32;
    let too_large = StillError::TooLarge {
        width,
        height,
        max: MAX_SURFACE_DIMENSION,
    };
    if !Viewport::new(width, height).fits_limit() {
        return Err(too_large);
    }
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or(too_large)?;

    Ok(RgbImage::from_fn(width, height, |x, y| {
        let uv = Vec2::new(
            (x as f32 + 0.5) / width as f32,
            1.0 - (y as f32 + 0.5) / height as f32,
        );
        let [r, g, b] = shade(variant, uniforms, uv);
        Pixel([to_byte(r), to_byte(g), to_byte(b)])
    }))
}

fn to_byte(channel: f32) -> u8 {
    (channel * 255.0).round().clamp(0.0, 255.0) as u8
}
