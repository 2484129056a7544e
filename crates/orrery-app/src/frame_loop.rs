//! Per-frame driver with an explicit stop flag.
//!
//! Frames are scheduled by the windowing system (one `RedrawRequested` per
//! display refresh). [`FrameLoop`] counts them, measures wall-clock time since
//! start, and refuses to run once stopped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Cloneable handle that stops a [`FrameLoop`] from anywhere.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub struct FrameLoop {
    start: Instant,
    frame_count: u64,
    stopped: Arc<AtomicBool>,
}

impl FrameLoop {
    /// A loop whose clock starts now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        Self {
            start,
            frame_count: 0,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run one frame with the time elapsed since start.
    ///
    /// Returns `false` without calling `frame` once the loop is stopped.
    pub fn tick(&mut self, frame: impl FnOnce(Duration)) -> bool {
        self.tick_at(Instant::now(), frame)
    }

    /// [`tick`](Self::tick) with an explicit clock reading.
    pub fn tick_at(&mut self, now: Instant, frame: impl FnOnce(Duration)) -> bool {
        if !self.is_running() {
            return false;
        }
        frame(now.saturating_duration_since(self.start));
        self.frame_count += 1;
        true
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stopped))
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        !self.stopped.load(Ordering::Acquire)
    }

    /// Frames run so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Wall-clock time since the loop started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counts_frames() {
        let start = Instant::now();
        let mut frames = FrameLoop::starting_at(start);
        for i in 1..=5 {
            assert!(frames.tick_at(start + Duration::from_millis(16 * i), |_| {}));
        }
        assert_eq!(frames.frame_count(), 5);
    }

    #[test]
    fn test_tick_passes_elapsed_time() {
        let start = Instant::now();
        let mut frames = FrameLoop::starting_at(start);
        let mut seen = Duration::ZERO;
        frames.tick_at(start + Duration::from_millis(3500), |elapsed| seen = elapsed);
        assert_eq!(seen, Duration::from_millis(3500));
    }

    #[test]
    fn test_clock_before_start_saturates() {
        let start = Instant::now() + Duration::from_secs(1);
        let mut frames = FrameLoop::starting_at(start);
        let mut seen = Duration::MAX;
        frames.tick_at(Instant::now(), |elapsed| seen = elapsed);
        assert_eq!(seen, Duration::ZERO);
    }

    #[test]
    fn test_no_frames_after_stop() {
        let mut frames = FrameLoop::new();
        let handle = frames.stop_handle();
        assert!(frames.tick(|_| {}));

        handle.stop();
        assert!(handle.is_stopped());
        assert!(!frames.is_running());

        let mut ran = false;
        assert!(!frames.tick(|_| ran = true));
        assert!(!ran);
        assert_eq!(frames.frame_count(), 1);
    }

    #[test]
    fn test_stop_is_shared_between_handles() {
        let frames = FrameLoop::new();
        let a = frames.stop_handle();
        let b = a.clone();
        frames.stop();
        assert!(a.is_stopped());
        assert!(b.is_stopped());
    }
}
