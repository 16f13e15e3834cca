//! Procedural ribbed-glass background renderer.
//!
//! A continuously animated noise field is displaced into glass ribs, mapped
//! through a four-stop color ramp, and shaded with highlights and film grain.
//! The flow from caller to pixels:
//!
//! ```text
//!   ParamPatch ──▶ GlassParams::apply ──▶ GlassUniforms (one write)
//!                                              │
//!   WindowRuntime ──▶ winit loop ──▶ Session::frame ──▶ GpuDevice::draw
//!                                              │
//!                                   GLSL kernel per pixel ──▶ surface
//! ```
//!
//! [`Session`] owns the lifecycle (compile once, resize, upload, dispose) and
//! is generic over [`GraphicsDevice`], with [`GpuDevice`] as the wgpu backend.
//! [`kernel`] evaluates the same pipeline on the CPU for tests and still
//! export.

pub mod color;
pub mod error;
pub mod gpu;
pub mod kernel;
pub mod params;
pub mod runtime;
pub mod session;
pub mod shaders;
pub mod types;
pub mod uniforms;
pub mod window;

use anyhow::Result;
use image::RgbImage;

pub use color::{decode_hex, Rgb, MAGENTA_SENTINEL};
pub use error::{FrameError, SessionError, StillError};
pub use gpu::GpuDevice;
pub use params::{GlassParams, GradientStops, ParamPatch};
pub use runtime::{FixedTimeSource, FrameClock, TimeSample, TimeSource};
pub use session::{FrameOutcome, FrameTicket, GraphicsDevice, Session, SessionState, SkipReason};
pub use types::{
    GpuPowerPreference, RendererConfig, ShaderVariant, Viewport, MAX_SURFACE_DIMENSION,
};
pub use uniforms::GlassUniforms;
pub use window::{WindowCommand, WindowRuntime, WindowSignal};

/// Entry point that owns a configuration and chooses how to present it.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the animated window on its own thread.
    pub fn spawn_window(&self) -> Result<WindowRuntime> {
        WindowRuntime::spawn(self.config.clone())
    }

    /// Evaluates one frame at `time` seconds on the CPU, sized like the
    /// configured surface.
    pub fn render_still(&self, time: f32) -> Result<RgbImage, StillError> {
        let (width, height) = self.config.surface_size;
        let mut uniforms = GlassUniforms::new(&self.config.params, Viewport::new(width, height));
        uniforms.set_time(time);
        kernel::render_still(self.config.variant, &uniforms)
    }
}
