//! A single eased interpolation between two scalar values.

use std::time::Duration;

use crate::Easing;

/// Interpolates `from` to `to` over `duration`, starting at `start`.
///
/// Times are offsets from an arbitrary session origin, as produced by
/// [`Instant::elapsed`](std::time::Instant::elapsed).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub start: Duration,
    pub duration: Duration,
    pub easing: Easing,
}

impl Tween {
    pub fn new(from: f32, to: f32, start: Duration, duration: Duration, easing: Easing) -> Self {
        Self {
            from,
            to,
            start,
            duration,
            easing,
        }
    }

    /// Linear progress in `[0, 1]` at `now`.
    pub fn progress(&self, now: Duration) -> f32 {
        if self.duration.is_zero() {
            return if now >= self.start { 1.0 } else { 0.0 };
        }
        let elapsed = now.saturating_sub(self.start);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0) as f32
    }

    /// Interpolated value at `now`. Returns `to` exactly once finished.
    pub fn value_at(&self, now: Duration) -> f32 {
        if self.is_finished(now) {
            return self.to;
        }
        let eased = self.easing.apply(self.progress(now));
        self.from + (self.to - self.from) * eased
    }

    /// Whether the tween has reached its end at `now`.
    pub fn is_finished(&self, now: Duration) -> bool {
        now >= self.start + self.duration
    }

    /// Time at which the tween reaches `to`.
    pub fn end(&self) -> Duration {
        self.start + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_value_before_start_is_from() {
        let tween = Tween::new(1.0, 3.0, ms(1000), ms(500), Easing::Linear);
        assert_eq!(tween.value_at(ms(0)), 1.0);
        assert_eq!(tween.value_at(ms(1000)), 1.0);
    }

    #[test]
    fn test_linear_midpoint() {
        let tween = Tween::new(0.0, 10.0, ms(0), ms(2000), Easing::Linear);
        assert!((tween.value_at(ms(500)) - 2.5).abs() < 1e-5);
        assert!((tween.value_at(ms(1000)) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_finished_value_is_exact() {
        let quarter = 0.3 + std::f32::consts::FRAC_PI_2;
        let tween = Tween::new(0.3, quarter, ms(10), ms(2000), Easing::ExpoInOut);
        assert!(!tween.is_finished(ms(2009)));
        assert!(tween.is_finished(ms(2010)));
        assert_eq!(tween.value_at(ms(2010)), tween.to);
        assert_eq!(tween.value_at(ms(60_000)), tween.to);
        assert_eq!(tween.end(), ms(2010));
    }

    #[test]
    fn test_zero_duration_jumps() {
        let tween = Tween::new(0.0, 1.0, ms(100), Duration::ZERO, Easing::ExpoInOut);
        assert_eq!(tween.value_at(ms(50)), 0.0);
        assert_eq!(tween.value_at(ms(100)), 1.0);
    }

    #[test]
    fn test_easing_is_applied() {
        let tween = Tween::new(0.0, 1.0, ms(0), ms(1000), Easing::ExpoInOut);
        // Expo in-out barely moves in the first tenth.
        assert!(tween.value_at(ms(100)) < 0.01);
        assert!((tween.value_at(ms(500)) - 0.5).abs() < 1e-5);
    }
}
