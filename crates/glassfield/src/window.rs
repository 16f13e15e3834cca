use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::{error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::gpu::GpuDevice;
use crate::params::ParamPatch;
use crate::session::{FrameOutcome, FrameTicket, Session, SkipReason};
use crate::types::{RendererConfig, Viewport};

/// Messages delivered to the window thread.
#[derive(Debug, Clone)]
pub enum WindowCommand {
    Update(ParamPatch),
    Shutdown,
}

/// Notifications raised by the window thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSignal {
    /// The user pressed Space.
    CyclePreset,
    /// The event loop has exited and the session is disposed.
    Closed,
}

/// Handle to a render window running on its own thread.
///
/// The thread owns the winit event loop, the wgpu device, and the render
/// session; callers only exchange owned messages with it.
pub struct WindowRuntime {
    proxy: EventLoopProxy<WindowCommand>,
    events: Receiver<WindowSignal>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl WindowRuntime {
    /// Opens the window and blocks until the session is running or has
    /// failed to start.
    pub fn spawn(config: RendererConfig) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let (signal_tx, signal_rx) = unbounded();
        let handle = thread::Builder::new()
            .name("glassfield-window".into())
            .spawn(move || run_window_thread(config, ready_tx, signal_tx))
            .map_err(|err| anyhow!("failed to spawn window thread: {err}"))?;

        let proxy = ready_rx
            .recv()
            .map_err(|err| anyhow!("window thread failed to initialise: {err}"))??;

        Ok(Self {
            proxy,
            events: signal_rx,
            join_handle: Some(handle),
        })
    }

    pub fn update(&self, patch: ParamPatch) -> Result<()> {
        self.proxy
            .send_event(WindowCommand::Update(patch))
            .map_err(|err| anyhow!("window is no longer running: {err}"))
    }

    /// Waits up to `timeout` for the next signal.
    pub fn next_signal(&self, timeout: Duration) -> Option<WindowSignal> {
        match self.events.recv_timeout(timeout) {
            Ok(signal) => Some(signal),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(WindowSignal::Closed),
        }
    }

    pub fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))??;
        }
        Ok(())
    }
}

impl Drop for WindowRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(WindowCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

fn run_window_thread(
    config: RendererConfig,
    ready_tx: Sender<Result<EventLoopProxy<WindowCommand>, anyhow::Error>>,
    signal_tx: Sender<WindowSignal>,
) -> Result<()> {
    let mut builder = EventLoopBuilder::<WindowCommand>::with_user_event();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }

    #[cfg(any(
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }
    let event_loop = builder
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let proxy = event_loop.create_proxy();

    let (width, height) = config.surface_size;
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(PhysicalSize::new(width.max(1), height.max(1)))
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create window: {err}"))?;
    let window = Arc::new(window);

    let mut session = match start_session(window.clone(), &config) {
        Ok(session) => session,
        Err(err) => {
            let message = format!("failed to start render session: {err:#}");
            let _ = ready_tx.send(Err(anyhow!(message.clone())));
            return Err(anyhow!(message));
        }
    };
    let _ = ready_tx.send(Ok(proxy.clone()));

    let closed_tx = signal_tx.clone();
    let mut scale_factor = window.scale_factor();
    let mut ticket = session.request_frame();
    window.request_redraw();

    let run_result = event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);
        match event {
            Event::UserEvent(WindowCommand::Update(patch)) => {
                if let Err(err) = session.update(&patch) {
                    warn!(error = %err, "dropping parameter update");
                }
            }
            Event::UserEvent(WindowCommand::Shutdown) => elwt.exit(),
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                WindowEvent::KeyboardInput { event, .. } => {
                    if is_space_press(&event) {
                        let _ = signal_tx.send(WindowSignal::CyclePreset);
                    }
                }
                WindowEvent::Resized(size) => {
                    let viewport = Viewport::new(size.width, size.height);
                    resume(&mut session, &window, &mut ticket, viewport);
                }
                WindowEvent::ScaleFactorChanged {
                    scale_factor: new_scale,
                    mut inner_size_writer,
                } => {
                    let logical = window.inner_size().to_logical::<f64>(scale_factor);
                    let viewport = Viewport::from_logical(logical.width, logical.height, new_scale);
                    scale_factor = new_scale;
                    let _ = inner_size_writer
                        .request_inner_size(PhysicalSize::new(viewport.width, viewport.height));
                    resume(&mut session, &window, &mut ticket, viewport);
                }
                WindowEvent::RedrawRequested => {
                    if let Some(current) = ticket.take() {
                        match session.frame(current, Instant::now()) {
                            Ok(FrameOutcome::Skipped(SkipReason::EmptyViewport)) => return,
                            Ok(_) => {}
                            Err(err) => {
                                error!(error = %err, "render session ended");
                                elwt.exit();
                                return;
                            }
                        }
                    }
                    ticket = next_frame(&mut session, &window);
                }
                _ => {}
            },
            Event::LoopExiting => session.dispose(),
            _ => {}
        }
    });

    let _ = closed_tx.send(WindowSignal::Closed);
    info!("render window closed");
    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}

fn start_session(window: Arc<Window>, config: &RendererConfig) -> Result<Session<GpuDevice>> {
    let size = window.inner_size();
    let viewport = Viewport::new(size.width, size.height);
    let device = GpuDevice::new(window, viewport, config.gpu_power)?;
    let config = RendererConfig {
        surface_size: (size.width, size.height),
        ..config.clone()
    };
    Ok(Session::start(device, &config)?)
}

/// Schedules the next frame; presentation with Fifo ties the loop to the
/// display refresh.
fn next_frame(session: &mut Session<GpuDevice>, window: &Window) -> Option<FrameTicket> {
    let ticket = session.request_frame();
    if ticket.is_some() {
        window.request_redraw();
    }
    ticket
}

/// Applies a new viewport and restarts the redraw chain if it had paused on
/// an empty one.
fn resume(
    session: &mut Session<GpuDevice>,
    window: &Window,
    ticket: &mut Option<FrameTicket>,
    viewport: Viewport,
) {
    if let Some(fresh) = session.resize_resuming(viewport) {
        *ticket = Some(fresh);
        window.request_redraw();
    }
}

fn is_space_press(event: &KeyEvent) -> bool {
    event.state == ElementState::Pressed
        && !event.repeat
        && (matches!(event.logical_key, Key::Named(NamedKey::Space))
            || matches!(event.logical_key, Key::Character(ref value) if value.as_str() == " "))
}
