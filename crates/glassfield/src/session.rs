//! Render session lifecycle.
//!
//! A [`Session`] owns one [`GraphicsDevice`] from compilation to teardown.
//! The device is compiled exactly once in [`Session::start`]; parameter
//! changes only rewrite the uniform block. Frames are driven by tickets: the
//! host asks for a ticket when it wants the next frame and redeems it in the
//! frame callback. Disposal clears the pending ticket, so a callback that
//! arrives late can never draw into released resources.

use std::time::Instant;

use tracing::{debug, error, info, trace, warn};

use crate::error::{FrameError, SessionError};
use crate::params::{GlassParams, ParamPatch};
use crate::runtime::{BoxedTimeSource, FrameClock, TimeSample};
use crate::types::{RendererConfig, ShaderVariant, Viewport};
use crate::uniforms::GlassUniforms;

/// Graphics backend driven by a [`Session`].
///
/// Implementations hold the compiled program, the two quad vertex buffers,
/// and the uniform buffer with its binding.
pub trait GraphicsDevice {
    /// Validates and links the program for `variant`, uploads the quad, and
    /// resolves the uniform binding. Called once per session.
    fn compile(&mut self, variant: ShaderVariant) -> Result<(), SessionError>;

    /// Resizes the drawable surface to `viewport` (always non-empty) and
    /// returns the size actually applied, which may be smaller when the
    /// device clamps to its limits.
    fn configure(&mut self, viewport: Viewport) -> Viewport;

    /// Replaces the whole uniform block in one write.
    fn upload(&mut self, uniforms: &GlassUniforms);

    /// Draws the quad and presents it.
    fn draw(&mut self) -> Result<(), FrameError>;

    /// Destroys every GPU object the device created.
    fn release(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Running,
    Disposed,
}

/// Handle for one scheduled frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NotRunning,
    StaleTicket,
    EmptyViewport,
    SurfaceLost,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Drawn(TimeSample),
    Skipped(SkipReason),
}

impl FrameOutcome {
    pub fn is_drawn(&self) -> bool {
        matches!(self, FrameOutcome::Drawn(_))
    }
}

pub struct Session<D: GraphicsDevice> {
    device: D,
    state: SessionState,
    variant: ShaderVariant,
    params: GlassParams,
    uniforms: GlassUniforms,
    viewport: Viewport,
    clock: BoxedTimeSource,
    issued: u64,
    pending: Option<FrameTicket>,
}

impl<D: GraphicsDevice> Session<D> {
    /// Starts a session timed by the wall clock from now.
    pub fn start(device: D, config: &RendererConfig) -> Result<Self, SessionError> {
        Self::start_with_clock(device, config, Box::new(FrameClock::new(Instant::now())))
    }

    /// Starts a session with a caller-supplied time source.
    ///
    /// On failure the device has already been released and the diagnostic
    /// has been logged; the caller must not retry with the same device.
    pub fn start_with_clock(
        device: D,
        config: &RendererConfig,
        clock: BoxedTimeSource,
    ) -> Result<Self, SessionError> {
        let (width, height) = config.surface_size;
        let viewport = Viewport::new(width, height);
        let mut session = Self {
            device,
            state: SessionState::Uninitialized,
            variant: config.variant,
            params: config.params.clone(),
            uniforms: GlassUniforms::new(&config.params, viewport),
            viewport,
            clock,
            issued: 0,
            pending: None,
        };

        session.state = SessionState::Initializing;
        debug!(variant = %session.variant, width, height, "initialising render session");
        if let Err(err) = session.device.compile(session.variant) {
            error!(variant = %session.variant, "{err}");
            session.dispose();
            return Err(err);
        }

        if viewport.is_drawable() {
            let applied = session.device.configure(viewport);
            session.uniforms.set_resolution(applied);
        }
        session.device.upload(&session.uniforms);
        session.state = SessionState::Running;
        info!(
            variant = %session.variant,
            "render session running at {}x{}",
            viewport.width,
            viewport.height
        );
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn variant(&self) -> ShaderVariant {
        self.variant
    }

    pub fn params(&self) -> &GlassParams {
        &self.params
    }

    pub fn uniforms(&self) -> &GlassUniforms {
        &self.uniforms
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Schedules the next frame, replacing any ticket still pending.
    pub fn request_frame(&mut self) -> Option<FrameTicket> {
        if self.state != SessionState::Running {
            return None;
        }
        self.issued += 1;
        let ticket = FrameTicket(self.issued);
        self.pending = Some(ticket);
        Some(ticket)
    }

    /// Redeems `ticket` and draws one frame at `now`.
    ///
    /// Lost surfaces are reconfigured and the frame is skipped. Any other
    /// device failure except a timeout ends the session.
    pub fn frame(&mut self, ticket: FrameTicket, now: Instant) -> Result<FrameOutcome, FrameError> {
        if self.state != SessionState::Running {
            return Ok(FrameOutcome::Skipped(SkipReason::NotRunning));
        }
        if self.pending != Some(ticket) {
            return Ok(FrameOutcome::Skipped(SkipReason::StaleTicket));
        }
        self.pending = None;
        if !self.viewport.is_drawable() {
            return Ok(FrameOutcome::Skipped(SkipReason::EmptyViewport));
        }

        let sample = self.clock.sample(now);
        self.uniforms.set_time(sample.seconds);
        self.device.upload(&self.uniforms);

        match self.device.draw() {
            Ok(()) => {
                trace!(
                    frame = sample.frame_index,
                    delta = sample.delta,
                    seconds = sample.seconds,
                    "drew frame"
                );
                Ok(FrameOutcome::Drawn(sample))
            }
            Err(err) if !err.is_recoverable() => {
                error!(error = %err, "frame failed; disposing render session");
                self.dispose();
                Err(err)
            }
            Err(FrameError::Lost) => {
                warn!(
                    "surface lost; reconfiguring at {}x{}",
                    self.viewport.width, self.viewport.height
                );
                self.apply_viewport();
                Ok(FrameOutcome::Skipped(SkipReason::SurfaceLost))
            }
            Err(_) => {
                debug!("timed out waiting for the surface; skipping frame");
                Ok(FrameOutcome::Skipped(SkipReason::Timeout))
            }
        }
    }

    /// Applies a new device-pixel viewport. Returns `false` when nothing
    /// changed.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        if self.state == SessionState::Disposed || viewport == self.viewport {
            return false;
        }
        self.viewport = viewport;
        if !viewport.is_drawable() {
            debug!("viewport collapsed to {}x{}; pausing frames", viewport.width, viewport.height);
            return true;
        }
        let applied = self.apply_viewport();
        debug!("resized render session to {}x{}", applied.width, applied.height);
        true
    }

    /// Resizes and, when the session leaves an empty viewport, schedules the
    /// frame that restarts the paused redraw chain.
    pub fn resize_resuming(&mut self, viewport: Viewport) -> Option<FrameTicket> {
        let paused = !self.viewport.is_drawable();
        if self.resize(viewport) && paused && viewport.is_drawable() {
            self.request_frame()
        } else {
            None
        }
    }

    /// Configures the device for the current viewport and uploads the
    /// resolution it actually applied.
    fn apply_viewport(&mut self) -> Viewport {
        let applied = self.device.configure(self.viewport);
        self.uniforms.set_resolution(applied);
        self.device.upload(&self.uniforms);
        applied
    }

    /// Merges `patch` into the parameter snapshot and uploads the new
    /// uniform block. The program is never rebuilt.
    pub fn update(&mut self, patch: &ParamPatch) -> Result<(), SessionError> {
        if self.state == SessionState::Disposed {
            return Err(SessionError::Disposed);
        }
        if patch.is_empty() {
            return Ok(());
        }
        self.params = self.params.apply(patch);
        self.uniforms.set_params(&self.params);
        self.device.upload(&self.uniforms);
        debug!(?patch, "applied parameter update");
        Ok(())
    }

    /// Cancels the pending frame and releases every device resource. Safe to
    /// call more than once.
    pub fn dispose(&mut self) {
        if self.state == SessionState::Disposed {
            return;
        }
        self.pending = None;
        self.device.release();
        self.state = SessionState::Disposed;
        info!(variant = %self.variant, "render session disposed");
    }
}

impl<D: GraphicsDevice> Drop for Session<D> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::runtime::FixedTimeSource;
    use crate::shaders::Stage;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Compile(ShaderVariant),
        Configure(Viewport),
        Upload(GlassUniforms),
        Draw,
        Release,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        fail_compile: bool,
        max_dimension: Option<u32>,
        draw_results: VecDeque<Result<(), FrameError>>,
    }

    #[derive(Clone, Default)]
    struct RecordingDevice(Rc<RefCell<Recorder>>);

    impl RecordingDevice {
        fn calls(&self) -> Vec<Call> {
            self.0.borrow().calls.clone()
        }

        fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
            self.0.borrow().calls.iter().filter(|call| predicate(call)).count()
        }

        fn uploads(&self) -> usize {
            self.count(|call| matches!(call, Call::Upload(_)))
        }

        fn last_upload(&self) -> Option<GlassUniforms> {
            self.0.borrow().calls.iter().rev().find_map(|call| match call {
                Call::Upload(uniforms) => Some(*uniforms),
                _ => None,
            })
        }

        fn clear(&self) {
            self.0.borrow_mut().calls.clear();
        }

        fn queue_draw(&self, result: Result<(), FrameError>) {
            self.0.borrow_mut().draw_results.push_back(result);
        }
    }

    impl GraphicsDevice for RecordingDevice {
        fn compile(&mut self, variant: ShaderVariant) -> Result<(), SessionError> {
            let mut recorder = self.0.borrow_mut();
            recorder.calls.push(Call::Compile(variant));
            if recorder.fail_compile {
                return Err(SessionError::Compile {
                    stage: Stage::Fragment,
                    variant,
                    log: "0:12: 'snoise' : no matching overloaded function found".into(),
                });
            }
            Ok(())
        }

        fn configure(&mut self, viewport: Viewport) -> Viewport {
            let mut recorder = self.0.borrow_mut();
            recorder.calls.push(Call::Configure(viewport));
            match recorder.max_dimension {
                Some(max) => Viewport::new(viewport.width.min(max), viewport.height.min(max)),
                None => viewport,
            }
        }

        fn upload(&mut self, uniforms: &GlassUniforms) {
            self.0.borrow_mut().calls.push(Call::Upload(*uniforms));
        }

        fn draw(&mut self) -> Result<(), FrameError> {
            let mut recorder = self.0.borrow_mut();
            recorder.calls.push(Call::Draw);
            recorder.draw_results.pop_front().unwrap_or(Ok(()))
        }

        fn release(&mut self) {
            self.0.borrow_mut().calls.push(Call::Release);
        }
    }

    fn config() -> RendererConfig {
        RendererConfig {
            surface_size: (640, 360),
            ..RendererConfig::default()
        }
    }

    fn start(device: &RecordingDevice) -> Session<RecordingDevice> {
        Session::start(device.clone(), &config()).unwrap()
    }

    #[test]
    fn start_compiles_once_and_uploads_initial_block() {
        let device = RecordingDevice::default();
        let session = start(&device);
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(
            device.calls(),
            vec![
                Call::Compile(ShaderVariant::LinedGlass),
                Call::Configure(Viewport::new(640, 360)),
                Call::Upload(*session.uniforms()),
            ]
        );
        assert_eq!(session.uniforms().resolution, [640.0, 360.0]);
    }

    #[test]
    fn compile_failure_releases_device_and_reports_log() {
        let device = RecordingDevice::default();
        device.0.borrow_mut().fail_compile = true;
        let err = match Session::start(device.clone(), &config()) {
            Err(err) => err,
            Ok(_) => panic!("start should fail"),
        };
        assert!(err.to_string().contains("no matching overloaded function"));
        assert_eq!(
            device.calls(),
            vec![Call::Compile(ShaderVariant::LinedGlass), Call::Release]
        );
    }

    #[test]
    fn updates_never_recompile() {
        let device = RecordingDevice::default();
        let mut session = start(&device);
        for step in 0..5 {
            let patch = ParamPatch {
                noise_scale: Some(1.0 + step as f32 * 0.25),
                ..ParamPatch::default()
            };
            session.update(&patch).unwrap();
        }
        session
            .update(&ParamPatch::with_colors(&crate::params::GradientStops::new(
                "#0c0a09", "#7c2d12", "#f97316", "#fbbf24",
            )))
            .unwrap();
        assert_eq!(device.count(|call| matches!(call, Call::Compile(_))), 1);
        let uploaded = device.last_upload().unwrap();
        assert_eq!(uploaded.noise_scale, 2.0);
        assert_eq!(uploaded, *session.uniforms());
        assert_eq!(session.params().colors.bright, "#f97316");
    }

    #[test]
    fn update_is_visible_on_next_draw() {
        let device = RecordingDevice::default();
        let mut session = start(&device);
        session
            .update(&ParamPatch {
                line_frequency: Some(80.0),
                ..ParamPatch::default()
            })
            .unwrap();
        let ticket = session.request_frame().unwrap();
        device.clear();
        assert!(session.frame(ticket, Instant::now()).unwrap().is_drawn());
        match device.calls().as_slice() {
            [Call::Upload(uniforms), Call::Draw] => assert_eq!(uniforms.line_frequency, 80.0),
            other => panic!("unexpected calls {other:?}"),
        }
    }

    #[test]
    fn empty_patch_uploads_nothing() {
        let device = RecordingDevice::default();
        let mut session = start(&device);
        device.clear();
        session.update(&ParamPatch::default()).unwrap();
        assert_eq!(device.uploads(), 0);
    }

    #[test]
    fn resize_is_idempotent() {
        let device = RecordingDevice::default();
        let mut session = start(&device);
        assert!(session.resize(Viewport::new(1920, 1080)));
        let after_first = *session.uniforms();
        device.clear();
        assert!(!session.resize(Viewport::new(1920, 1080)));
        assert!(device.calls().is_empty());
        assert_eq!(*session.uniforms(), after_first);
        assert_eq!(after_first.resolution, [1920.0, 1080.0]);
    }

    #[test]
    fn empty_viewport_skips_frames_until_resized() {
        let device = RecordingDevice::default();
        let mut session = start(&device);
        device.clear();
        assert!(session.resize(Viewport::new(0, 360)));
        assert!(device.calls().is_empty());

        let ticket = session.request_frame().unwrap();
        assert_eq!(
            session.frame(ticket, Instant::now()).unwrap(),
            FrameOutcome::Skipped(SkipReason::EmptyViewport)
        );
        assert_eq!(device.count(|call| *call == Call::Draw), 0);

        assert!(session.resize(Viewport::new(640, 360)));
        let ticket = session.request_frame().unwrap();
        assert!(session.frame(ticket, Instant::now()).unwrap().is_drawn());
    }

    #[test]
    fn leaving_empty_viewport_issues_a_drawable_ticket() {
        let device = RecordingDevice::default();
        let mut session = start(&device);
        assert!(session.resize_resuming(Viewport::new(0, 360)).is_none());
        assert!(session.resize_resuming(Viewport::new(0, 720)).is_none());

        let ticket = session.resize_resuming(Viewport::new(1280, 720)).unwrap();
        assert!(session.frame(ticket, Instant::now()).unwrap().is_drawn());
        assert_eq!(session.uniforms().resolution, [1280.0, 720.0]);

        assert!(session.resize_resuming(Viewport::new(1920, 1080)).is_none());
    }

    #[test]
    fn disposed_session_never_resumes() {
        let device = RecordingDevice::default();
        let mut session = start(&device);
        session.resize(Viewport::new(0, 0));
        session.dispose();
        assert!(session.resize_resuming(Viewport::new(640, 360)).is_none());
    }

    #[test]
    fn ticket_issued_before_dispose_never_draws() {
        let device = RecordingDevice::default();
        let mut session = start(&device);
        let ticket = session.request_frame().unwrap();
        session.dispose();
        assert_eq!(
            session.frame(ticket, Instant::now()).unwrap(),
            FrameOutcome::Skipped(SkipReason::NotRunning)
        );
        assert!(session.request_frame().is_none());
        assert_eq!(device.count(|call| *call == Call::Draw), 0);
    }

    #[test]
    fn dispose_releases_exactly_once() {
        let device = RecordingDevice::default();
        {
            let mut session = start(&device);
            session.dispose();
            session.dispose();
            assert_eq!(session.state(), SessionState::Disposed);
            assert!(matches!(
                session.update(&ParamPatch::full(&GlassParams::default())),
                Err(SessionError::Disposed)
            ));
            assert!(!session.resize(Viewport::new(10, 10)));
        }
        assert_eq!(device.count(|call| *call == Call::Release), 1);
    }

    #[test]
    fn drop_releases_device() {
        let device = RecordingDevice::default();
        drop(start(&device));
        assert_eq!(device.calls().last(), Some(&Call::Release));
    }

    #[test]
    fn newer_ticket_supersedes_pending_one() {
        let device = RecordingDevice::default();
        let mut session = start(&device);
        let old = session.request_frame().unwrap();
        let new = session.request_frame().unwrap();
        assert_ne!(old, new);
        assert_eq!(
            session.frame(old, Instant::now()).unwrap(),
            FrameOutcome::Skipped(SkipReason::StaleTicket)
        );
        assert!(session.frame(new, Instant::now()).unwrap().is_drawn());
        assert_eq!(
            session.frame(new, Instant::now()).unwrap(),
            FrameOutcome::Skipped(SkipReason::StaleTicket)
        );
    }

    #[test]
    fn lost_surface_is_reconfigured() {
        let device = RecordingDevice::default();
        let mut session = start(&device);
        device.queue_draw(Err(FrameError::Lost));
        device.clear();
        let ticket = session.request_frame().unwrap();
        assert_eq!(
            session.frame(ticket, Instant::now()).unwrap(),
            FrameOutcome::Skipped(SkipReason::SurfaceLost)
        );
        match device.calls().as_slice() {
            [Call::Upload(_), Call::Draw, Call::Configure(viewport), Call::Upload(_)] => {
                assert_eq!(*viewport, Viewport::new(640, 360));
            }
            other => panic!("unexpected calls {other:?}"),
        }
        assert_eq!(session.state(), SessionState::Running);
    }

    #[test]
    fn timeout_skips_frame_and_keeps_running() {
        let device = RecordingDevice::default();
        let mut session = start(&device);
        device.queue_draw(Err(FrameError::Timeout));
        let ticket = session.request_frame().unwrap();
        assert_eq!(
            session.frame(ticket, Instant::now()).unwrap(),
            FrameOutcome::Skipped(SkipReason::Timeout)
        );
        assert_eq!(session.state(), SessionState::Running);
        assert_eq!(device.count(|call| *call == Call::Release), 0);
    }

    #[test]
    fn clamped_surface_size_reaches_the_uniforms() {
        let device = RecordingDevice::default();
        device.0.borrow_mut().max_dimension = Some(1024);
        let mut session = start(&device);
        assert!(session.resize(Viewport::new(4096, 600)));
        assert_eq!(session.viewport(), Viewport::new(4096, 600));
        assert_eq!(session.uniforms().resolution, [1024.0, 600.0]);
        assert_eq!(device.last_upload().unwrap().resolution, [1024.0, 600.0]);
        assert!(!session.resize(Viewport::new(4096, 600)));
    }

    #[test]
    fn start_uploads_the_clamped_size() {
        let device = RecordingDevice::default();
        device.0.borrow_mut().max_dimension = Some(512);
        let session = start(&device);
        assert_eq!(session.uniforms().resolution, [512.0, 360.0]);
        assert_eq!(device.last_upload().unwrap().resolution, [512.0, 360.0]);
    }

    #[test]
    fn out_of_memory_ends_the_session() {
        let device = RecordingDevice::default();
        let mut session = start(&device);
        device.queue_draw(Err(FrameError::OutOfMemory));
        let ticket = session.request_frame().unwrap();
        assert_eq!(
            session.frame(ticket, Instant::now()),
            Err(FrameError::OutOfMemory)
        );
        assert_eq!(session.state(), SessionState::Disposed);
        assert_eq!(device.count(|call| *call == Call::Release), 1);
    }

    #[test]
    fn frame_time_is_monotonic() {
        let device = RecordingDevice::default();
        let origin = Instant::now();
        let mut session = Session::start_with_clock(
            device.clone(),
            &config(),
            Box::new(FrameClock::new(origin)),
        )
        .unwrap();
        let offsets_ms = [16_u64, 33, 20, 500, 499, 516];
        let mut last = 0.0;
        for offset in offsets_ms {
            let ticket = session.request_frame().unwrap();
            let outcome = session.frame(ticket, origin + Duration::from_millis(offset)).unwrap();
            let FrameOutcome::Drawn(sample) = outcome else {
                panic!("frame skipped: {outcome:?}");
            };
            assert!(sample.seconds >= last);
            assert_eq!(device.last_upload().unwrap().time, sample.seconds);
            last = sample.seconds;
        }
        assert!((last - 0.516).abs() < 1e-4);
    }

    #[test]
    fn fixed_clock_pins_time() {
        let device = RecordingDevice::default();
        let mut session =
            Session::start_with_clock(device.clone(), &config(), Box::new(FixedTimeSource::new(7.5)))
                .unwrap();
        let ticket = session.request_frame().unwrap();
        session.frame(ticket, Instant::now()).unwrap();
        assert_eq!(session.uniforms().time, 7.5);
    }
}
