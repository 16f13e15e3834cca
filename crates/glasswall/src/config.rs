use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glassfield::{ParamPatch, ShaderVariant};
use serde::de::{self, Deserializer};
use serde::Deserialize;

use crate::cli;
use crate::presets::{self, Preset};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Optional launcher defaults read from TOML. Every key may be omitted.
///
/// ```toml
/// variant = "flowing"
/// preset = "Blue Ocean"
/// size = "1920x1080"
///
/// [params]
/// animation_speed = 0.5
/// line_frequency = 40
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    #[serde(deserialize_with = "deserialize_variant_opt")]
    pub variant: Option<ShaderVariant>,
    pub preset: Option<String>,
    pub size: Option<String>,
    pub title: Option<String>,
    pub params: ParamPatch,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: FileConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.preset()?;
        self.size()?;
        Ok(())
    }

    pub fn preset(&self) -> Result<Option<&'static Preset>, ConfigError> {
        match self.preset.as_deref() {
            None => Ok(None),
            Some(name) => presets::find(name)
                .map(Some)
                .ok_or_else(|| ConfigError::Invalid(format!("unknown preset '{name}'"))),
        }
    }

    pub fn size(&self) -> Result<Option<(u32, u32)>, ConfigError> {
        self.size
            .as_deref()
            .map(cli::parse_size)
            .transpose()
            .map_err(ConfigError::Invalid)
    }

    /// Parameter overrides from the file, with a named preset applied under
    /// the explicit `[params]` table.
    pub fn patch(&self) -> Result<ParamPatch, ConfigError> {
        let base = match self.preset()? {
            Some(preset) => ParamPatch::with_colors(&preset.stops()),
            None => ParamPatch::default(),
        };
        Ok(base.merged_with(&self.params))
    }
}

fn deserialize_variant_opt<'de, D>(deserializer: D) -> Result<Option<ShaderVariant>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    value
        .map(|text| text.parse::<ShaderVariant>().map_err(de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_is_valid() {
        let config = FileConfig::parse("").unwrap();
        assert!(config.variant.is_none());
        assert!(config.patch().unwrap().is_empty());
    }

    #[test]
    fn parses_full_file() {
        let config = FileConfig::parse(
            r##"
variant = "flowing"
preset = "aurora"
size = "640x360"
title = "Lobby"

[params]
animation_speed = 0.5
line_frequency = 40
color_accent = "#ffffff"
"##,
        )
        .unwrap();
        assert_eq!(config.variant, Some(ShaderVariant::FlowingWave));
        assert_eq!(config.size().unwrap(), Some((640, 360)));
        let patch = config.patch().unwrap();
        assert_eq!(patch.animation_speed, Some(0.5));
        assert_eq!(patch.line_frequency, Some(40.0));
        let colors = patch.colors.clone().unwrap();
        assert_eq!(colors[0], "#022c22");
        assert_eq!(patch.color_accent.as_deref(), Some("#ffffff"));
    }

    #[test]
    fn rejects_unknown_variant() {
        let err = FileConfig::parse("variant = \"spiral\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("spiral"));
    }

    #[test]
    fn rejects_unknown_preset_and_bad_size() {
        assert!(matches!(
            FileConfig::parse("preset = \"teal\"").unwrap_err(),
            ConfigError::Invalid(_)
        ));
        assert!(matches!(
            FileConfig::parse("size = \"0x10\"").unwrap_err(),
            ConfigError::Invalid(_)
        ));
        assert!(matches!(
            FileConfig::parse("size = \"20000x10\"").unwrap_err(),
            ConfigError::Invalid(_)
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[params]\ngrain_intensity = 0.0").unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.params.grain_intensity, Some(0.0));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = FileConfig::load(Path::new("/nonexistent/glasswall.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/glasswall.toml"));
    }
}
