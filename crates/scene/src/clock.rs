use std::time::Instant;

/// Snapshot of the time state handed to the compositor each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Elapsed wall-clock or simulated time in seconds.
    pub seconds: f64,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    /// Creates a new time sample.
    pub fn new(seconds: f64, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource: Send {
    /// Resets the source to its initial state.
    fn reset(&mut self);
    /// Produces a time sample for the next frame.
    fn sample(&mut self) -> TimeSample;
}

/// Time source backed by the system monotonic clock.
///
/// The origin is captured on the first sample rather than at construction, so
/// the first frame after mount always reads zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource {
    origin: Option<Instant>,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeSource for SystemTimeSource {
    fn reset(&mut self) {
        self.origin = None;
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let now = Instant::now();
        let origin = *self.origin.get_or_insert(now);
        let sample = TimeSample::new(now.duration_since(origin).as_secs_f64(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f64,
    frame: u64,
}

impl FixedTimeSource {
    /// Constructs a fixed time source that always returns the provided time.
    pub fn new(time: f64) -> Self {
        Self { time, frame: 0 }
    }

    /// Accesses the fixed timestamp without advancing the frame counter.
    pub fn time(&self) -> f64 {
        self.time
    }
}

impl TimeSource for FixedTimeSource {
    fn reset(&mut self) {
        self.frame = 0;
    }

    fn sample(&mut self) -> TimeSample {
        let sample = TimeSample::new(self.time, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource + Send>;

/// Monotonic elapsed-time source for the render loop.
///
/// No frame-time clamping is applied: if the host stalls, the next tick
/// reports the full jump.
pub struct Clock {
    source: BoxedTimeSource,
    elapsed: f64,
    frames: u64,
}

impl Clock {
    pub fn new(source: BoxedTimeSource) -> Self {
        Self {
            source,
            elapsed: 0.0,
            frames: 0,
        }
    }

    /// Clock driven by the system monotonic clock.
    pub fn system() -> Self {
        Self::new(Box::new(SystemTimeSource::new()))
    }

    /// Clock frozen at `seconds`, used for still frames and snapshots.
    pub fn fixed(seconds: f64) -> Self {
        Self::new(Box::new(FixedTimeSource::new(seconds)))
    }

    /// Advances the clock and returns the elapsed seconds since the first tick.
    pub fn tick(&mut self) -> f64 {
        let sample = self.source.sample();
        // Sources are trusted to be monotonic, but a misbehaving one must not
        // move the animation backwards.
        if sample.seconds.is_finite() {
            self.elapsed = sample.seconds.max(self.elapsed);
        }
        self.frames = self.frames.saturating_add(1);
        self.elapsed
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of ticks since construction or the last reset.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn reset(&mut self) {
        self.source.reset();
        self.elapsed = 0.0;
        self.frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedSource {
        values: Vec<f64>,
        cursor: usize,
    }

    impl TimeSource for ScriptedSource {
        fn reset(&mut self) {
            self.cursor = 0;
        }

        fn sample(&mut self) -> TimeSample {
            let value = self.values[self.cursor.min(self.values.len() - 1)];
            let sample = TimeSample::new(value, self.cursor as u64);
            self.cursor += 1;
            sample
        }
    }

    #[test]
    fn system_source_starts_at_zero() {
        let mut source = SystemTimeSource::new();
        let first = source.sample();
        assert_eq!(first.seconds, 0.0);
        assert_eq!(first.frame_index, 0);
        let second = source.sample();
        assert!(second.seconds >= 0.0);
        assert_eq!(second.frame_index, 1);
    }

    #[test]
    fn clock_never_moves_backwards() {
        let mut clock = Clock::new(Box::new(ScriptedSource {
            values: vec![0.0, 1.0, 0.5, f64::NAN, 3.0],
            cursor: 0,
        }));
        let ticks: Vec<f64> = (0..5).map(|_| clock.tick()).collect();
        assert_eq!(ticks, vec![0.0, 1.0, 1.0, 1.0, 3.0]);
        assert_eq!(clock.frames(), 5);
    }

    #[test]
    fn stalls_are_reported_as_a_single_jump() {
        let mut clock = Clock::new(Box::new(ScriptedSource {
            values: vec![0.0, 0.016, 5.0],
            cursor: 0,
        }));
        clock.tick();
        clock.tick();
        assert_eq!(clock.tick(), 5.0);
    }

    #[test]
    fn reset_restarts_from_zero() {
        let mut clock = Clock::fixed(2.5);
        assert_eq!(clock.tick(), 2.5);
        clock.reset();
        assert_eq!(clock.elapsed(), 0.0);
        assert_eq!(clock.frames(), 0);
    }
}
