//! wgpu implementation of [`GraphicsDevice`].
//!
//! All methods must be called from the thread that owns the window; the
//! window driver in [`crate::window`] is the only caller.

mod context;
mod pipeline;

use std::sync::Arc;
use std::time::{Duration, Instant};

use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::debug;

use crate::error::{FrameError, SessionError};
use crate::session::GraphicsDevice;
use crate::types::{GpuPowerPreference, ShaderVariant, Viewport};
use crate::uniforms::GlassUniforms;

use self::context::GpuContext;
use self::pipeline::QuadProgram;

pub struct GpuDevice {
    context: GpuContext,
    program: Option<QuadProgram>,
    frames_since_report: u32,
    last_report: Instant,
}

impl GpuDevice {
    /// Acquires an adapter and device for `target` and configures its
    /// surface at `size`.
    pub fn new<W>(
        target: Arc<W>,
        size: Viewport,
        gpu_power: GpuPowerPreference,
    ) -> Result<Self, SessionError>
    where
        W: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
    {
        let context = GpuContext::new(target, size, gpu_power)
            .map_err(|err| SessionError::NoContext(format!("{err:#}")))?;
        Ok(Self {
            context,
            program: None,
            frames_since_report: 0,
            last_report: Instant::now(),
        })
    }

    fn report_stats(&mut self) {
        self.frames_since_report += 1;
        let elapsed = self.last_report.elapsed();
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames_since_report as f32 / elapsed.as_secs_f32();
            debug!(fps = fps.round(), "render stats");
            self.frames_since_report = 0;
            self.last_report = Instant::now();
        }
    }
}

impl GraphicsDevice for GpuDevice {
    fn compile(&mut self, variant: ShaderVariant) -> Result<(), SessionError> {
        let program =
            QuadProgram::new(&self.context.device, self.context.surface_format, variant)?;
        debug!(%variant, format = ?self.context.surface_format, "linked glass program");
        self.program = Some(program);
        Ok(())
    }

    fn configure(&mut self, viewport: Viewport) -> Viewport {
        self.context.resize(viewport)
    }

    fn upload(&mut self, uniforms: &GlassUniforms) {
        if let Some(program) = self.program.as_ref() {
            program.write_uniforms(&self.context.queue, uniforms);
        }
    }

    fn draw(&mut self) -> Result<(), FrameError> {
        let Some(program) = self.program.as_ref() else {
            return Err(FrameError::Other("no compiled program".into()));
        };
        let frame = match self.context.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                return Err(FrameError::Lost)
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(FrameError::Timeout),
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(FrameError::OutOfMemory),
            Err(err) => return Err(FrameError::Other(err.to_string())),
        };

        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("glass encoder"),
                });
        program.encode(&mut encoder, &view);
        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        self.report_stats();
        Ok(())
    }

    fn release(&mut self) {
        if let Some(program) = self.program.take() {
            program.destroy();
            debug!("released glass program and buffers");
        }
    }
}
