use bytemuck::{Pod, Zeroable};

use crate::params::GlassParams;
use crate::types::Viewport;

/// Uniform block shared by both kernel variants.
///
/// The field order and padding must match the `GlassUniforms` std140 block in
/// `shaders.rs`. Colors are stored as `vec4` so every stop starts on a 16 byte
/// boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GlassUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub animation_speed: f32,
    pub noise_scale: f32,
    pub displacement_strength: f32,
    pub line_frequency: f32,
    pub line_sharpness: f32,
    pub waviness: f32,
    pub wave_complexity: f32,
    pub flow_intensity: f32,
    pub grain_intensity: f32,
    pub contrast_boost: f32,
    pub _padding: [f32; 3],
    pub color_dark: [f32; 4],
    pub color_mid: [f32; 4],
    pub color_bright: [f32; 4],
    pub color_accent: [f32; 4],
}

impl GlassUniforms {
    pub fn new(params: &GlassParams, viewport: Viewport) -> Self {
        let mut uniforms = Self::zeroed();
        uniforms.set_params(params);
        uniforms.set_resolution(viewport);
        uniforms
    }

    /// Re-derives every parameter-dependent field from `params`.
    pub fn set_params(&mut self, params: &GlassParams) {
        self.animation_speed = params.animation_speed;
        self.noise_scale = params.noise_scale;
        self.displacement_strength = params.displacement_strength;
        self.line_frequency = params.line_frequency;
        self.line_sharpness = params.line_sharpness;
        self.waviness = params.waviness;
        self.wave_complexity = params.wave_complexity;
        self.flow_intensity = params.flow_intensity;
        self.grain_intensity = params.grain_intensity;
        self.contrast_boost = params.contrast_boost;

        let [dark, mid, bright, accent] = params.colors.decode();
        self.color_dark = extend(dark);
        self.color_mid = extend(mid);
        self.color_bright = extend(bright);
        self.color_accent = extend(accent);
    }

    /// Stores the device-pixel resolution, clamped to at least 1x1.
    pub fn set_resolution(&mut self, viewport: Viewport) {
        let clamped = viewport.clamped();
        self.resolution = [clamped.width as f32, clamped.height as f32];
    }

    pub fn set_time(&mut self, seconds: f32) {
        self.time = seconds;
    }

    pub fn stops(&self) -> [[f32; 3]; 4] {
        [
            truncate(self.color_dark),
            truncate(self.color_mid),
            truncate(self.color_bright),
            truncate(self.color_accent),
        ]
    }

    pub fn aspect(&self) -> f32 {
        self.resolution[0] / self.resolution[1].max(1.0)
    }
}

fn extend([r, g, b]: [f32; 3]) -> [f32; 4] {
    [r, g, b, 1.0]
}

fn truncate([r, g, b, _]: [f32; 4]) -> [f32; 3] {
    [r, g, b]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GradientStops;

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(std::mem::size_of::<GlassUniforms>(), 128);
        assert_eq!(std::mem::offset_of!(GlassUniforms, contrast_boost), 48);
        assert_eq!(std::mem::offset_of!(GlassUniforms, color_dark), 64);
        assert_eq!(std::mem::offset_of!(GlassUniforms, color_accent), 112);
    }

    #[test]
    fn derives_colors_and_resolution() {
        let params = GlassParams {
            colors: GradientStops::new("#000000", "#ffffff", "#ff0000", "nope"),
            ..GlassParams::default()
        };
        let uniforms = GlassUniforms::new(&params, Viewport::new(0, 480));
        assert_eq!(uniforms.resolution, [1.0, 480.0]);
        assert_eq!(uniforms.color_mid, [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(uniforms.stops()[3], crate::color::MAGENTA_SENTINEL);
        assert_eq!(uniforms.line_frequency, params.line_frequency);
    }

    #[test]
    fn set_params_leaves_time_and_resolution_alone() {
        let mut uniforms = GlassUniforms::new(&GlassParams::default(), Viewport::new(640, 360));
        uniforms.set_time(4.0);
        uniforms.set_params(&GlassParams {
            noise_scale: 2.0,
            ..GlassParams::default()
        });
        assert_eq!(uniforms.time, 4.0);
        assert_eq!(uniforms.resolution, [640.0, 360.0]);
        assert_eq!(uniforms.noise_scale, 2.0);
    }
}
