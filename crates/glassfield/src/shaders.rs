//! GLSL sources for the quad vertex stage and both kernel variants.
//!
//! Every fragment program is [`PRELUDE`] followed by one variant body. The
//! prelude owns the uniform block, the simplex noise, the ramp, and the
//! shading helpers; a body only defines `glass_field` and `main`. The CPU
//! mirror in [`crate::kernel`] uses the same constants.

use std::fmt;

use wgpu::naga;

use crate::types::ShaderVariant;

/// Pipeline stage a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            Stage::Vertex => naga::ShaderStage::Vertex,
            Stage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        })
    }
}

pub fn vertex_source() -> &'static str {
    VERTEX_SHADER_GLSL
}

/// Complete fragment program for `variant`.
pub fn fragment_source(variant: ShaderVariant) -> String {
    let body = match variant {
        ShaderVariant::LinedGlass => LINED_BODY,
        ShaderVariant::FlowingWave => FLOWING_BODY,
    };
    format!("{PRELUDE}\n{body}")
}

/// Parses and validates GLSL with naga, returning the diagnostic text on
/// failure.
///
/// wgpu reports shader errors asynchronously through its error scopes; running
/// the frontend first gives the caller the compiler log before any pipeline
/// object exists.
pub fn validate(stage: Stage, source: &str) -> Result<(), String> {
    let mut frontend = naga::front::glsl::Frontend::default();
    let options = naga::front::glsl::Options {
        stage: stage.naga(),
        defines: Default::default(),
    };
    let module = frontend
        .parse(&options, source)
        .map_err(|e| format!("{stage} shader failed to parse: {e:?}"))?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| format!("{stage} shader failed validation: {e:?}"))?;
    Ok(())
}

/// Full-viewport quad: two triangles, positions in slot 0 and texture
/// coordinates in slot 1.
pub const QUAD_POSITIONS: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [-1.0, 1.0],
    [-1.0, 1.0],
    [1.0, -1.0],
    [1.0, 1.0],
];

pub const QUAD_TEX_COORDS: [[f32; 2]; 6] = [
    [0.0, 0.0],
    [1.0, 0.0],
    [0.0, 1.0],
    [0.0, 1.0],
    [1.0, 0.0],
    [1.0, 1.0],
];

const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 a_position;
layout(location = 1) in vec2 a_texCoord;
layout(location = 0) out vec2 v_uv;

void main() {
    v_uv = a_texCoord;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
";

/// Shared fragment prologue. The block layout must match
/// [`crate::uniforms::GlassUniforms`].
const PRELUDE: &str = r"#version 450
layout(location = 0) in vec2 v_uv;
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform GlassUniforms {
    vec2 resolution;
    float time;
    float animation_speed;
    float noise_scale;
    float displacement_strength;
    float line_frequency;
    float line_sharpness;
    float waviness;
    float wave_complexity;
    float flow_intensity;
    float grain_intensity;
    float contrast_boost;
    float _pad0;
    float _pad1;
    float _pad2;
    vec4 color_dark;
    vec4 color_mid;
    vec4 color_bright;
    vec4 color_accent;
} u;

const float GLASS_PI = 3.1415927;

vec3 glass_mod289v3(vec3 x) {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

vec2 glass_mod289v2(vec2 x) {
    return x - floor(x * (1.0 / 289.0)) * 289.0;
}

vec3 glass_permute(vec3 x) {
    return glass_mod289v3((x * 34.0 + vec3(1.0)) * x);
}

// Simplex noise after Ian McEwan / Ashima Arts.
float snoise(vec2 v) {
    vec2 i = floor(v + vec2(dot(v, vec2(0.366025403784439))));
    vec2 x0 = v - i + vec2(dot(i, vec2(0.211324865405187)));
    float o = step(x0.y, x0.x);
    vec2 i1 = vec2(o, 1.0 - o);
    vec2 x1 = x0 + vec2(0.211324865405187) - i1;
    vec2 x2 = x0 + vec2(-0.577350269189626);
    i = glass_mod289v2(i);
    vec3 p = glass_permute(
        glass_permute(vec3(i.y) + vec3(0.0, i1.y, 1.0)) + vec3(i.x) + vec3(0.0, i1.x, 1.0));
    vec3 m = max(vec3(0.5) - vec3(dot(x0, x0), dot(x1, x1), dot(x2, x2)), vec3(0.0));
    m = m * m;
    m = m * m;
    vec3 g = vec3(2.0) * fract(p * vec3(0.024390243902439)) - vec3(1.0);
    vec3 h = abs(g) - vec3(0.5);
    vec3 a0 = g - floor(g + vec3(0.5));
    m = m * (vec3(1.79284291400159) - vec3(0.85373472095314) * (a0 * a0 + h * h));
    vec3 grad = vec3(
        a0.x * x0.x + h.x * x0.y,
        a0.y * x1.x + h.y * x1.y,
        a0.z * x2.x + h.z * x2.y);
    return 130.0 * dot(m, grad);
}

float glass_finish_field(float raw) {
    float n = clamp(raw * 0.5 + 0.5, 0.0, 1.0);
    n = smoothstep(0.0, 1.0, n);
    return clamp(pow(n, max(u.contrast_boost, 0.001)), 0.0, 1.0);
}

float glass_segment(float s, float lo, float hi) {
    return clamp((s - lo) / (hi - lo), 0.0, 1.0);
}

vec3 glass_ramp(float s, float lo, float hi) {
    if (s < lo) {
        return mix(u.color_dark.rgb, u.color_mid.rgb, glass_segment(s, 0.0, lo));
    }
    if (s < hi) {
        return mix(u.color_mid.rgb, u.color_bright.rgb, glass_segment(s, lo, hi));
    }
    return mix(u.color_bright.rgb, u.color_accent.rgb, glass_segment(s, hi, 1.0));
}

float glass_line_alpha(float pattern) {
    float width = max(abs(u.line_sharpness * 0.4), 0.0001);
    return smoothstep(0.5 - width, 0.5 + width, pattern);
}

vec3 glass_shade_lines(vec3 base, float field, float alpha, float floor_level, float power, float gain) {
    vec3 darkened = base * mix(floor_level, 1.0, alpha);
    return darkened + vec3(pow(alpha, power) * field * gain);
}

vec2 glass_noise_uv(vec2 uv) {
    return vec2(uv.x * (u.resolution.x / max(u.resolution.y, 1.0)), uv.y);
}

float glass_hash(vec2 st, float seed) {
    return fract(sin(dot(st + vec2(seed), vec2(12.9898, 78.233))) * 43758.5453);
}

vec4 glass_output(vec3 color, vec2 uv) {
    float grain = (glass_hash(uv * u.resolution, u.time * 10.0) - 0.5) * u.grain_intensity;
    return vec4(clamp(color + vec3(grain), vec3(0.0), vec3(1.0)), 1.0);
}
";

const LINED_BODY: &str = r"
float glass_field(vec2 p, float t) {
    float s = u.noise_scale;
    float n = snoise(p * 3.0 * s + vec2(0.3, 0.2) * t);
    n += 0.5 * snoise(p * 5.0 * s + vec2(-0.2, 0.25) * t);
    n += 0.25 * snoise(p * 8.0 * s + vec2(0.15, -0.1) * t);
    return glass_finish_field(n);
}

void main() {
    vec2 uv = v_uv;
    float t = u.time * u.animation_speed;
    vec2 p = glass_noise_uv(uv);
    float base = glass_field(p, t);

    float eps = 0.005;
    float slope = (glass_field(p + vec2(eps, 0.0), t) - glass_field(p - vec2(eps, 0.0), t)) / (2.0 * eps);
    float displaced_x = uv.x + slope * u.displacement_strength;
    float pattern = sin(displaced_x * u.line_frequency * GLASS_PI) * 0.5 + 0.5;
    float alpha = glass_line_alpha(pattern);

    vec3 color = glass_ramp(base, 0.25, 0.55);
    color = glass_shade_lines(color, base, alpha, 0.65, 3.0, 0.15);
    outColor = glass_output(color, uv);
}
";

const FLOWING_BODY: &str = r"
vec2 flow_swirl(vec2 p, vec2 c, float t) {
    vec2 o = p - c;
    float a = length(o) * 0.6 * sin(t * 0.21) * u.flow_intensity;
    float sa = sin(a);
    float ca = cos(a);
    return c + mat2(ca, sa, -sa, ca) * o;
}

vec2 flow_warp(vec2 p, float t) {
    vec2 d = vec2(cos(t * 0.13), sin(t * 0.17));
    vec2 q = p * 1.5;
    vec2 w = vec2(
        snoise(q + d * (0.5 * t)),
        snoise(q + vec2(5.2, 1.3) - d * (0.4 * t)));
    return p + w * (0.35 * u.flow_intensity);
}

float flow_wave(vec2 p, float t, float weight, float angle, float rate, float freq, float speed) {
    float a = angle + 0.6 * sin(t * rate);
    vec2 d = vec2(cos(a), sin(a));
    return weight * sin(dot(p, d) * freq * u.wave_complexity + speed * t);
}

float glass_field(vec2 p, float t) {
    float s = u.noise_scale;
    vec2 c = vec2(u.resolution.x / max(u.resolution.y, 1.0) * 0.5, 0.5) * s;
    vec2 q = flow_swirl(p * s, c, t);
    q = flow_warp(q, t);

    float waves = flow_wave(q, t, 0.30, 0.0, 0.11, 1.7, 0.9);
    waves += flow_wave(q, t, 0.26, 1.2, 0.07, 2.3, -0.7);
    waves += flow_wave(q, t, 0.24, 2.4, 0.13, 3.1, 0.5);
    waves += flow_wave(q, t, 0.20, 3.9, 0.05, 4.3, -1.1);

    float detail = 0.6 * snoise(q * 2.0 + vec2(0.1 * t));
    detail += 0.3 * snoise(q * 4.0 + vec2(-0.15 * t));
    return glass_finish_field(0.55 * waves + 0.45 * detail);
}

float flow_ridge(vec2 uv, float t) {
    float r = snoise(vec2(1.5 * uv.x, 3.0 * uv.y) * u.noise_scale + vec2(0.05 * t, -0.08 * t));
    float index = uv.x * u.line_frequency
        + r * u.waviness * 3.0
        + sin(uv.y * 12.0 + r * 2.0) * u.waviness * 0.5;
    return sin(index * GLASS_PI) * 0.5 + 0.5;
}

void main() {
    vec2 uv = v_uv;
    float t = u.time * u.animation_speed;
    float pattern = flow_ridge(uv, t);
    vec2 lookup = glass_noise_uv(uv) + vec2(0.0, (pattern - 0.5) * u.displacement_strength);
    float value = glass_field(lookup, t);
    float alpha = glass_line_alpha(pattern);

    vec3 color = glass_ramp(value, 1.0 / 3.0, 2.0 / 3.0);
    color = glass_shade_lines(color, value, alpha, 0.80, 4.0, 0.12);
    outColor = glass_output(color, uv);
}
";
