//! Caller-owned parameter model.
//!
//! [`GlassParams`] is an immutable snapshot. Callers describe changes with a
//! sparse [`ParamPatch`]; [`GlassParams::apply`] folds the patch onto the
//! snapshot and returns a new one. The render session always re-derives the
//! whole uniform block from the latest snapshot, so there is no per-field
//! dirty tracking to get wrong.

use serde::{Deserialize, Serialize};

use crate::color::{decode_hex, Rgb};

/// Four ordered gradient stops, dark to accent, as hex strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradientStops {
    pub dark: String,
    pub mid: String,
    pub bright: String,
    pub accent: String,
}

impl GradientStops {
    pub fn new(
        dark: impl Into<String>,
        mid: impl Into<String>,
        bright: impl Into<String>,
        accent: impl Into<String>,
    ) -> Self {
        Self {
            dark: dark.into(),
            mid: mid.into(),
            bright: bright.into(),
            accent: accent.into(),
        }
    }

    /// Builds stops from an ordered array (`[dark, mid, bright, accent]`).
    pub fn from_array(colors: [String; 4]) -> Self {
        let [dark, mid, bright, accent] = colors;
        Self {
            dark,
            mid,
            bright,
            accent,
        }
    }

    pub fn to_array(&self) -> [String; 4] {
        [
            self.dark.clone(),
            self.mid.clone(),
            self.bright.clone(),
            self.accent.clone(),
        ]
    }

    /// Decodes every stop; malformed entries become the magenta sentinel.
    pub fn decode(&self) -> [Rgb; 4] {
        [
            decode_hex(&self.dark),
            decode_hex(&self.mid),
            decode_hex(&self.bright),
            decode_hex(&self.accent),
        ]
    }
}

impl Default for GradientStops {
    fn default() -> Self {
        Self::new("#0a0515", "#581c87", "#ec4899", "#06b6d4")
    }
}

/// Complete set of animation, shape, and color controls.
///
/// No field is clamped here. The UI layer owns range limits; the kernel only
/// guarantees it will not produce out-of-range or NaN output for finite input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlassParams {
    /// Blob scale (lower = larger blobs).
    pub noise_scale: f32,
    /// How strongly lines bend near field edges.
    pub displacement_strength: f32,
    /// Number of lines/ridges across the surface.
    pub line_frequency: f32,
    /// Edge sharpness of the line pattern (0 = soft, 1 = crisp).
    pub line_sharpness: f32,
    /// Ridge wobble, flowing-wave kernel only.
    pub waviness: f32,
    /// Frequency multiplier of the directional waves, flowing-wave kernel only.
    pub wave_complexity: f32,
    /// Strength of swirl and domain warp, flowing-wave kernel only.
    pub flow_intensity: f32,
    /// Multiplier applied to elapsed wall-clock seconds.
    pub animation_speed: f32,
    pub grain_intensity: f32,
    /// Exponent applied to the normalized field.
    pub contrast_boost: f32,
    pub colors: GradientStops,
}

impl Default for GlassParams {
    fn default() -> Self {
        Self {
            noise_scale: 1.0,
            displacement_strength: 0.15,
            line_frequency: 120.0,
            line_sharpness: 0.5,
            waviness: 0.5,
            wave_complexity: 1.0,
            flow_intensity: 1.0,
            animation_speed: 0.1,
            grain_intensity: 0.04,
            contrast_boost: 1.3,
            colors: GradientStops::default(),
        }
    }
}

impl GlassParams {
    /// Returns a new snapshot with every field present in `patch` replaced.
    ///
    /// Individual color fields win over the `colors` array when both are set.
    pub fn apply(&self, patch: &ParamPatch) -> Self {
        let mut next = self.clone();
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = patch.$field {
                    next.$field = value;
                })*
            };
        }
        merge!(
            noise_scale,
            displacement_strength,
            line_frequency,
            line_sharpness,
            waviness,
            wave_complexity,
            flow_intensity,
            animation_speed,
            grain_intensity,
            contrast_boost,
        );

        if let Some(colors) = &patch.colors {
            next.colors = GradientStops::from_array(colors.clone());
        }
        if let Some(dark) = &patch.color_dark {
            next.colors.dark = dark.clone();
        }
        if let Some(mid) = &patch.color_mid {
            next.colors.mid = mid.clone();
        }
        if let Some(bright) = &patch.color_bright {
            next.colors.bright = bright.clone();
        }
        if let Some(accent) = &patch.color_accent {
            next.colors.accent = accent.clone();
        }
        next
    }
}

/// Sparse update for [`GlassParams`]; absent fields keep their prior value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamPatch {
    pub noise_scale: Option<f32>,
    pub displacement_strength: Option<f32>,
    pub line_frequency: Option<f32>,
    pub line_sharpness: Option<f32>,
    pub waviness: Option<f32>,
    pub wave_complexity: Option<f32>,
    pub flow_intensity: Option<f32>,
    pub animation_speed: Option<f32>,
    pub grain_intensity: Option<f32>,
    pub contrast_boost: Option<f32>,
    /// Whole gradient as `[dark, mid, bright, accent]`.
    pub colors: Option<[String; 4]>,
    pub color_dark: Option<String>,
    pub color_mid: Option<String>,
    pub color_bright: Option<String>,
    pub color_accent: Option<String>,
}

impl ParamPatch {
    /// Patch that replaces only the four gradient stops.
    pub fn with_colors(stops: &GradientStops) -> Self {
        Self {
            colors: Some(stops.to_array()),
            ..Self::default()
        }
    }

    /// Patch that sets every field of `params`.
    pub fn full(params: &GlassParams) -> Self {
        Self {
            noise_scale: Some(params.noise_scale),
            displacement_strength: Some(params.displacement_strength),
            line_frequency: Some(params.line_frequency),
            line_sharpness: Some(params.line_sharpness),
            waviness: Some(params.waviness),
            wave_complexity: Some(params.wave_complexity),
            flow_intensity: Some(params.flow_intensity),
            animation_speed: Some(params.animation_speed),
            grain_intensity: Some(params.grain_intensity),
            contrast_boost: Some(params.contrast_boost),
            colors: Some(params.colors.to_array()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Layers `other` on top of `self`; fields set in `other` win.
    pub fn merged_with(mut self, other: &ParamPatch) -> Self {
        // A whole gradient from the upper layer replaces lower individual stops.
        if other.colors.is_some() {
            self.color_dark = None;
            self.color_mid = None;
            self.color_bright = None;
            self.color_accent = None;
        }
        macro_rules! overlay {
            ($($field:ident),* $(,)?) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field.clone();
                })*
            };
        }
        overlay!(
            noise_scale,
            displacement_strength,
            line_frequency,
            line_sharpness,
            waviness,
            wave_complexity,
            flow_intensity,
            animation_speed,
            grain_intensity,
            contrast_boost,
            colors,
            color_dark,
            color_mid,
            color_bright,
            color_accent,
        );
        self
    }
}
