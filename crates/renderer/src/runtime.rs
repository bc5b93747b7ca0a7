use std::time::{Duration, Instant};

/// Paces redraws against an optional frames-per-second cap.
///
/// Without a cap every `AboutToWait` turn requests a redraw and presentation
/// blocks on vsync.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    interval: Option<Duration>,
    next_frame: Option<Instant>,
}

impl FrameScheduler {
    pub fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| fps.is_finite() && *fps > 0.0)
            .map(|fps| Duration::from_secs_f64(1.0 / f64::from(fps)));
        Self {
            interval,
            next_frame: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match self.next_frame {
            Some(deadline) => now >= deadline,
            None => true,
        }
    }

    /// Records a presented frame and schedules the next one.
    pub fn mark_rendered(&mut self, now: Instant) {
        let Some(interval) = self.interval else {
            return;
        };
        let next = match self.next_frame {
            // Keep cadence unless we fell more than a frame behind.
            Some(previous) if now.saturating_duration_since(previous) < interval => {
                previous + interval
            }
            _ => now + interval,
        };
        self.next_frame = Some(next);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_frame
    }

    pub fn reset(&mut self) {
        self.next_frame = None;
    }
}

/// Wall-clock limit after which the background unmounts itself.
#[derive(Debug, Clone, Copy)]
pub struct RunDeadline {
    deadline: Option<Instant>,
}

impl RunDeadline {
    pub fn new(started: Instant, run_for: Option<Duration>) -> Self {
        Self {
            deadline: run_for.and_then(|limit| started.checked_add(limit)),
        }
    }

    pub fn expired(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

/// Earliest of two optional wake-up instants.
pub(crate) fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncapped_scheduler_is_always_ready() {
        let mut scheduler = FrameScheduler::new(None);
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(scheduler.ready_for_frame(now));
        assert_eq!(scheduler.next_deadline(), None);
        assert_eq!(FrameScheduler::new(Some(0.0)).interval(), None);
        assert_eq!(FrameScheduler::new(Some(f32::NAN)).interval(), None);
    }

    #[test]
    fn capped_scheduler_waits_one_interval() {
        let mut scheduler = FrameScheduler::new(Some(10.0));
        let start = Instant::now();
        assert!(scheduler.ready_for_frame(start));
        scheduler.mark_rendered(start);
        assert!(!scheduler.ready_for_frame(start + Duration::from_millis(50)));
        assert!(scheduler.ready_for_frame(start + Duration::from_millis(100)));
        assert_eq!(scheduler.next_deadline(), Some(start + Duration::from_millis(100)));
    }

    #[test]
    fn capped_scheduler_keeps_cadence_and_resyncs_after_stall() {
        let mut scheduler = FrameScheduler::new(Some(10.0));
        let start = Instant::now();
        scheduler.mark_rendered(start);
        scheduler.mark_rendered(start + Duration::from_millis(105));
        assert_eq!(scheduler.next_deadline(), Some(start + Duration::from_millis(200)));

        let late = start + Duration::from_secs(5);
        scheduler.mark_rendered(late);
        assert_eq!(scheduler.next_deadline(), Some(late + Duration::from_millis(100)));

        scheduler.reset();
        assert!(scheduler.ready_for_frame(start));
    }

    #[test]
    fn run_deadline_expires() {
        let start = Instant::now();
        let deadline = RunDeadline::new(start, Some(Duration::from_secs(2)));
        assert!(!deadline.expired(start + Duration::from_secs(1)));
        assert!(deadline.expired(start + Duration::from_secs(2)));
        assert!(!RunDeadline::new(start, None).expired(start + Duration::from_secs(3600)));
    }

    #[test]
    fn earliest_prefers_the_sooner_instant() {
        let now = Instant::now();
        let later = now + Duration::from_secs(1);
        assert_eq!(earliest(Some(now), Some(later)), Some(now));
        assert_eq!(earliest(None, Some(later)), Some(later));
        assert_eq!(earliest(None, None), None);
    }
}
