use std::time::Instant;

/// Snapshot of the time state supplied to the kernel uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f32,
    /// Seconds since the previous sample (zero for the first one).
    pub delta: f32,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f32, delta: f32, frame_index: u64) -> Self {
        Self {
            seconds,
            delta,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self, now: Instant);
    /// Produces a time sample for a frame drawn at `now`.
    fn sample(&mut self, now: Instant) -> TimeSample;
}

/// Wall-clock time measured from a fixed session origin.
///
/// Elapsed time is derived from clock deltas, never from frame counts, so the
/// animation runs at the same speed regardless of frame rate. A sample taken
/// with an earlier `now` than its predecessor repeats the previous value
/// instead of stepping backwards.
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    origin: Instant,
    last_seconds: f32,
    frame: u64,
}

impl FrameClock {
    pub fn new(origin: Instant) -> Self {
        Self {
            origin,
            last_seconds: 0.0,
            frame: 0,
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl TimeSource for FrameClock {
    fn reset(&mut self, now: Instant) {
        *self = Self::new(now);
    }

    fn sample(&mut self, now: Instant) -> TimeSample {
        let elapsed = now.saturating_duration_since(self.origin).as_secs_f32();
        let seconds = elapsed.max(self.last_seconds);
        let delta = if self.frame == 0 {
            0.0
        } else {
            seconds - self.last_seconds
        };
        let sample = TimeSample::new(seconds, delta, self.frame);
        self.last_seconds = seconds;
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f32,
    frame: u64,
}

impl FixedTimeSource {
    pub fn new(time: f32) -> Self {
        Self { time, frame: 0 }
    }
}

impl TimeSource for FixedTimeSource {
    fn reset(&mut self, _now: Instant) {
        self.frame = 0;
    }

    fn sample(&mut self, _now: Instant) -> TimeSample {
        let sample = TimeSample::new(self.time, 0.0, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;
