use std::path::{Path, PathBuf};

use clap::{Args, Parser};
use glassfield::{GpuPowerPreference, ParamPatch, ShaderVariant, MAX_SURFACE_DIMENSION};

use crate::presets::{self, Preset};

#[derive(Parser, Debug)]
#[command(
    name = "glasswall",
    author,
    version,
    about = "Animated fractal glass background preview"
)]
pub struct Cli {
    /// Kernel variant: `lined` or `flowing`.
    #[arg(long, value_name = "VARIANT", value_parser = parse_variant)]
    pub variant: Option<ShaderVariant>,

    /// TOML file with default parameters; command-line flags take precedence.
    #[arg(long, value_name = "FILE", env = "GLASSWALL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Named color preset (see `--list-presets`).
    #[arg(long, value_name = "NAME", value_parser = parse_preset)]
    pub preset: Option<&'static Preset>,

    /// Print the available color presets and exit.
    #[arg(long)]
    pub list_presets: bool,

    /// Window or export size in physical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// GPU adapter preference: `low` or `high`.
    #[arg(
        long,
        value_name = "POWER",
        value_parser = parse_power,
        default_value = "low"
    )]
    pub power: GpuPowerPreference,

    /// Render one frame on the CPU to the provided PNG path and exit.
    #[arg(long, value_name = "PATH", value_parser = parse_export_path)]
    pub export: Option<PathBuf>,

    /// Elapsed seconds to evaluate for `--export`.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0)]
    pub time: f32,

    /// Window title.
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    #[command(flatten)]
    pub params: ParamArgs,
}

/// Per-field parameter overrides.
#[derive(Args, Debug, Default)]
pub struct ParamArgs {
    /// Blob scale (lower = larger blobs).
    #[arg(long, value_name = "SCALE")]
    pub noise_scale: Option<f32>,

    /// How strongly lines bend.
    #[arg(long, value_name = "STRENGTH")]
    pub displacement: Option<f32>,

    /// Number of lines across the surface.
    #[arg(long, value_name = "COUNT")]
    pub line_frequency: Option<f32>,

    /// Line edge sharpness (0 = soft, 1 = crisp).
    #[arg(long, value_name = "SHARPNESS")]
    pub line_sharpness: Option<f32>,

    /// Ridge wobble (flowing variant).
    #[arg(long, value_name = "AMOUNT")]
    pub waviness: Option<f32>,

    /// Directional wave frequency multiplier (flowing variant).
    #[arg(long, value_name = "FACTOR")]
    pub wave_complexity: Option<f32>,

    /// Swirl and warp strength (flowing variant).
    #[arg(long, value_name = "AMOUNT")]
    pub flow_intensity: Option<f32>,

    /// Animation speed multiplier.
    #[arg(long, value_name = "SPEED")]
    pub speed: Option<f32>,

    /// Film grain amplitude.
    #[arg(long, value_name = "AMOUNT")]
    pub grain: Option<f32>,

    /// Contrast exponent.
    #[arg(long, value_name = "EXPONENT")]
    pub contrast: Option<f32>,

    /// Four comma-separated hex colors, dark to accent.
    #[arg(long, value_name = "HEX,HEX,HEX,HEX", value_parser = parse_colors)]
    pub colors: Option<[String; 4]>,

    #[arg(long, value_name = "HEX")]
    pub color_dark: Option<String>,

    #[arg(long, value_name = "HEX")]
    pub color_mid: Option<String>,

    #[arg(long, value_name = "HEX")]
    pub color_bright: Option<String>,

    #[arg(long, value_name = "HEX")]
    pub color_accent: Option<String>,
}

impl ParamArgs {
    pub fn to_patch(&self) -> ParamPatch {
        ParamPatch {
            noise_scale: self.noise_scale,
            displacement_strength: self.displacement,
            line_frequency: self.line_frequency,
            line_sharpness: self.line_sharpness,
            waviness: self.waviness,
            wave_complexity: self.wave_complexity,
            flow_intensity: self.flow_intensity,
            animation_speed: self.speed,
            grain_intensity: self.grain,
            contrast_boost: self.contrast,
            colors: self.colors.clone(),
            color_dark: self.color_dark.clone(),
            color_mid: self.color_mid.clone(),
            color_bright: self.color_bright.clone(),
            color_accent: self.color_accent.clone(),
        }
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_variant(value: &str) -> Result<ShaderVariant, String> {
    if value.trim().is_empty() {
        return Err("variant must not be empty".to_string());
    }
    value.parse()
}

pub fn parse_power(value: &str) -> Result<GpuPowerPreference, String> {
    if value.trim().is_empty() {
        return Err("power preference must not be empty".to_string());
    }
    value.parse()
}

pub fn parse_preset(value: &str) -> Result<&'static Preset, String> {
    presets::find(value).ok_or_else(|| {
        format!(
            "unknown preset '{}'; expected one of: {}",
            value.trim(),
            presets::ids().join(", ")
        )
    })
}

pub fn parse_size(value: &str) -> Result<(u32, u32), String> {
    let (w, h) = value
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid width '{}'", w.trim()))?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("invalid height '{}'", h.trim()))?;
    if width == 0 || height == 0 {
        return Err("size must be greater than zero".into());
    }
    if width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION {
        return Err(format!(
            "size {width}x{height} exceeds the {MAX_SURFACE_DIMENSION}px limit"
        ));
    }
    Ok((width, height))
}

pub fn parse_colors(value: &str) -> Result<[String; 4], String> {
    let parts: Vec<String> = value
        .split(',')
        .map(|part| part.trim().to_string())
        .collect();
    let count = parts.len();
    <[String; 4]>::try_from(parts)
        .map_err(|_| format!("expected four comma-separated colors, got {count}"))
}

pub fn parse_export_path(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    check_png_extension(&path)?;
    Ok(path)
}

fn check_png_extension(path: &Path) -> Result<(), String> {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => Ok(()),
        None => Err("export path has no extension; expected .png".to_string()),
        Some(other) => Err(format!(
            "unsupported export format '.{other}'; expected .png"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sizes() {
        assert_eq!(parse_size("1280x720").unwrap(), (1280, 720));
        assert_eq!(parse_size(" 64 X 36 ").unwrap(), (64, 36));
        assert!(parse_size("0x720").is_err());
        assert!(parse_size("1280").is_err());
        assert!(parse_size("widexhigh").is_err());
    }

    #[test]
    fn rejects_sizes_beyond_the_surface_limit() {
        assert!(parse_size("16384x16384").is_ok());
        assert!(parse_size("16385x720").is_err());
        assert!(parse_size("100000x100000").is_err());
        let err = parse_size("4294967295x4294967295").unwrap_err();
        assert!(err.contains("limit"), "{err}");
    }

    #[test]
    fn parses_color_lists() {
        let colors = parse_colors("#0a0515, #581c87,#ec4899 ,#06b6d4").unwrap();
        assert_eq!(colors[1], "#581c87");
        assert_eq!(colors[2], "#ec4899");
        assert!(parse_colors("#000000,#ffffff").is_err());
    }

    #[test]
    fn export_path_requires_png() {
        assert!(parse_export_path("still.png").is_ok());
        assert!(parse_export_path("still.PNG").is_ok());
        assert!(parse_export_path("still.exr").is_err());
        assert!(parse_export_path("still").is_err());
    }

    #[test]
    fn flags_map_onto_patch_fields() {
        let cli = Cli::try_parse_from([
            "glasswall",
            "--variant",
            "flowing",
            "--speed",
            "0.2",
            "--displacement",
            "0.3",
            "--color-accent",
            "#ffffff",
            "--preset",
            "gold-lux",
        ])
        .unwrap();
        assert_eq!(cli.variant, Some(ShaderVariant::FlowingWave));
        assert_eq!(cli.preset.map(|preset| preset.name), Some("Gold Lux"));
        let patch = cli.params.to_patch();
        assert_eq!(patch.animation_speed, Some(0.2));
        assert_eq!(patch.displacement_strength, Some(0.3));
        assert_eq!(patch.color_accent.as_deref(), Some("#ffffff"));
        assert_eq!(patch.noise_scale, None);
    }

    #[test]
    fn rejects_unknown_variant_and_preset() {
        assert!(Cli::try_parse_from(["glasswall", "--variant", "spiral"]).is_err());
        assert!(Cli::try_parse_from(["glasswall", "--preset", "teal"]).is_err());
    }
}
