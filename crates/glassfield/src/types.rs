use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::params::GlassParams;

/// The two kernel presets sharing one host contract.
///
/// They differ in noise composition, displacement strategy, ramp split points,
/// and shading constants. Selection happens once per session; the kernel never
/// branches on it at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShaderVariant {
    /// Vertical lines bent by the horizontal gradient of a three-octave field.
    #[default]
    LinedGlass,
    /// Swirled, domain-warped directional waves behind noise-wobbled ridges.
    FlowingWave,
}

impl ShaderVariant {
    pub fn all() -> &'static [ShaderVariant] {
        &[ShaderVariant::LinedGlass, ShaderVariant::FlowingWave]
    }

    pub fn id(self) -> &'static str {
        match self {
            ShaderVariant::LinedGlass => "lined",
            ShaderVariant::FlowingWave => "flowing",
        }
    }
}

impl fmt::Display for ShaderVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ShaderVariant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lined" | "lined-glass" | "glass" => Ok(ShaderVariant::LinedGlass),
            "flowing" | "flowing-wave" | "wave" => Ok(ShaderVariant::FlowingWave),
            other => Err(format!(
                "unknown shader variant '{other}'; expected lined or flowing"
            )),
        }
    }
}

/// Largest width or height accepted for a surface or an exported still.
pub const MAX_SURFACE_DIMENSION: u32 = 16_384;

/// Drawable size in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Converts a logical (CSS-style) size into device pixels.
    ///
    /// A non-finite or non-positive scale factor is treated as 1.0.
    pub fn from_logical(width: f64, height: f64, scale_factor: f64) -> Self {
        let scale = if scale_factor.is_finite() && scale_factor > 0.0 {
            scale_factor
        } else {
            1.0
        };
        let to_device = |logical: f64| {
            let scaled = (logical * scale).round();
            if scaled.is_finite() && scaled > 0.0 {
                scaled.min(u32::MAX as f64) as u32
            } else {
                0
            }
        };
        Self::new(to_device(width), to_device(height))
    }

    /// A zero-width or zero-height viewport cannot be drawn into.
    pub fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// The viewport with each dimension clamped to at least one pixel.
    pub fn clamped(&self) -> Self {
        Self::new(self.width.max(1), self.height.max(1))
    }

    /// Whether both dimensions fit within [`MAX_SURFACE_DIMENSION`].
    pub fn fits_limit(&self) -> bool {
        self.width <= MAX_SURFACE_DIMENSION && self.height <= MAX_SURFACE_DIMENSION
    }
}

/// Adapter selection preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    #[default]
    Low,
    High,
}

impl FromStr for GpuPowerPreference {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" | "low-power" => Ok(GpuPowerPreference::Low),
            "high" | "high-performance" => Ok(GpuPowerPreference::High),
            other => Err(format!("unknown power preference '{other}'; expected low or high")),
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Kernel preset to compile for the session.
    pub variant: ShaderVariant,
    /// Initial parameter snapshot.
    pub params: GlassParams,
    /// Adapter power preference.
    pub gpu_power: GpuPowerPreference,
    /// Window title.
    pub title: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            variant: ShaderVariant::default(),
            params: GlassParams::default(),
            gpu_power: GpuPowerPreference::default(),
            title: "Fractal Glass".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_round_trips_through_id() {
        for variant in ShaderVariant::all() {
            assert_eq!(variant.id().parse::<ShaderVariant>().unwrap(), *variant);
        }
        assert!("spiral".parse::<ShaderVariant>().is_err());
    }

    #[test]
    fn logical_size_scales_to_device_pixels() {
        assert_eq!(Viewport::from_logical(800.0, 600.0, 2.0), Viewport::new(1600, 1200));
        assert_eq!(Viewport::from_logical(801.0, 601.0, 1.5), Viewport::new(1202, 902));
        assert_eq!(Viewport::from_logical(800.0, 600.0, f64::NAN), Viewport::new(800, 600));
        assert_eq!(Viewport::from_logical(800.0, 600.0, 0.0), Viewport::new(800, 600));
    }

    #[test]
    fn zero_sized_viewport_is_not_drawable() {
        let empty = Viewport::from_logical(0.0, 600.0, 1.0);
        assert!(!empty.is_drawable());
        assert_eq!(empty.clamped(), Viewport::new(1, 600));
        assert!(empty.fits_limit());
        assert!(!Viewport::new(MAX_SURFACE_DIMENSION + 1, 10).fits_limit());
    }
}
