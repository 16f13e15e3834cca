use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use glassfield::{GlassParams, ParamPatch, Renderer, RendererConfig, WindowSignal};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::FileConfig;
use crate::presets::{self, PRESETS};

const DEFAULT_SIZE: (u32, u32) = (1280, 720);
const SIGNAL_POLL: Duration = Duration::from_millis(100);

pub fn run(cli: Cli) -> Result<()> {
    if cli.list_presets {
        print_presets();
        return Ok(());
    }

    let config = resolve_config(&cli)?;
    tracing::debug!(
        variant = %config.variant,
        width = config.surface_size.0,
        height = config.surface_size.1,
        "resolved renderer configuration"
    );

    let renderer = Renderer::new(config);
    match cli.export.as_deref() {
        Some(path) => export_still(&renderer, path, cli.time),
        None => run_window(&renderer),
    }
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Folds defaults, the optional TOML file, and command-line flags into one
/// configuration. Later layers win field by field.
fn resolve_config(cli: &Cli) -> Result<RendererConfig> {
    let file = match cli.config.as_deref() {
        Some(path) => {
            let file = FileConfig::load(path)?;
            tracing::info!(path = %path.display(), "loaded configuration file");
            file
        }
        None => FileConfig::default(),
    };

    let mut patch = file.patch()?;
    if let Some(preset) = cli.preset {
        patch = patch.merged_with(&ParamPatch::with_colors(&preset.stops()));
    }
    patch = patch.merged_with(&cli.params.to_patch());

    let defaults = RendererConfig::default();
    Ok(RendererConfig {
        surface_size: match cli.size {
            Some(size) => size,
            None => file.size()?.unwrap_or(DEFAULT_SIZE),
        },
        variant: cli.variant.or(file.variant).unwrap_or_default(),
        params: GlassParams::default().apply(&patch),
        gpu_power: cli.power,
        title: cli
            .title
            .clone()
            .or(file.title)
            .unwrap_or(defaults.title),
    })
}

fn export_still(renderer: &Renderer, path: &Path, time: f32) -> Result<()> {
    let image = renderer
        .render_still(time)
        .context("failed to render still frame")?;
    image
        .save(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        time,
        variant = %renderer.config().variant,
        "exported still frame"
    );
    Ok(())
}

fn run_window(renderer: &Renderer) -> Result<()> {
    let window = renderer
        .spawn_window()
        .context("failed to open render window")?;
    tracing::info!(
        variant = %renderer.config().variant,
        "render window running; press Space to cycle color presets"
    );

    let mut current = presets::position_of(&renderer.config().params.colors);
    loop {
        match window.next_signal(SIGNAL_POLL) {
            Some(WindowSignal::CyclePreset) => {
                let index = current.map_or(0, presets::next_index);
                let preset = &PRESETS[index];
                current = Some(index);
                tracing::info!(preset = preset.name, "switching color preset");
                if let Err(err) = window.update(ParamPatch::with_colors(&preset.stops())) {
                    tracing::warn!(error = %err, "preset update was not delivered");
                }
            }
            Some(WindowSignal::Closed) => break,
            None => {}
        }
    }

    window.shutdown()
}

fn print_presets() {
    for preset in PRESETS {
        println!(
            "{:<14} {:<14} {}",
            preset.name,
            preset.id(),
            preset.colors.join(" ")
        );
    }
}
