use std::sync::Arc;

use anyhow::{anyhow, Context as AnyhowContext, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::types::{GpuPowerPreference, Viewport};

/// Instance, adapter-backed device, and the configured window surface.
pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub surface_format: wgpu::TextureFormat,
    max_dimension: u32,
}

impl GpuContext {
    pub(crate) fn new<W>(
        target: Arc<W>,
        initial_size: Viewport,
        gpu_power: GpuPowerPreference,
    ) -> Result<Self>
    where
        W: HasDisplayHandle + HasWindowHandle + Send + Sync + 'static,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let surface = instance
            .create_surface(target)
            .context("failed to create rendering surface")?;

        let power_preference = match gpu_power {
            GpuPowerPreference::Low => wgpu::PowerPreference::LowPower,
            GpuPowerPreference::High => wgpu::PowerPreference::HighPerformance,
        };
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let adapter_info = adapter.get_info();
        let limits = adapter.limits();
        tracing::debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "selected GPU adapter"
        );

        let max_dimension = limits.max_texture_dimension_2d;
        let size = initial_size.clamped();
        if size.width > max_dimension || size.height > max_dimension {
            anyhow::bail!(
                "GPU max texture dimension is {max_dimension}, requested surface is {}x{}",
                size.width,
                size.height
            );
        }

        let surface_caps = surface.get_capabilities(&adapter);
        // The kernel writes display-ready values, so avoid a second sRGB encode.
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or_else(|| anyhow!("surface reports no supported formats"))?;
        if surface_format.is_srgb() {
            tracing::warn!(
                ?surface_format,
                "no linear (non-sRGB) surface format available; colors will be re-encoded"
            );
        }

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("glassfield device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits.clone(),
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let present_mode = surface_caps
            .present_modes
            .iter()
            .copied()
            .find(|mode| *mode == wgpu::PresentMode::Fifo)
            .or_else(|| surface_caps.present_modes.first().copied())
            .unwrap_or(wgpu::PresentMode::Fifo);
        tracing::debug!(?present_mode, ?surface_format, "configuring surface");

        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            surface_format,
            max_dimension,
        })
    }

    /// Reconfigures the surface and returns the size it now has. Empty sizes
    /// are ignored and oversized ones are clamped to the adapter limit.
    pub(crate) fn resize(&mut self, viewport: Viewport) -> Viewport {
        if !viewport.is_drawable() {
            return Viewport::new(self.config.width, self.config.height);
        }
        let width = viewport.width.min(self.max_dimension);
        let height = viewport.height.min(self.max_dimension);
        if width != viewport.width || height != viewport.height {
            tracing::warn!(
                requested_width = viewport.width,
                requested_height = viewport.height,
                max = self.max_dimension,
                "surface clamped to the GPU texture limit"
            );
        }
        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);
        Viewport::new(width, height)
    }
}
