//! A tween that re-fires on a fixed wall-clock interval, each firing moving
//! its target by a constant step relative to where it currently is.

use std::f32::consts::TAU;
use std::time::Duration;

use crate::{Easing, Tween};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Periodic relative tween.
///
/// The first firing happens one `interval` after time zero, later firings on
/// the same grid. A firing that lands while the previous tween is still
/// running completes that tween first, so every firing adds exactly `step`.
/// When several intervals elapse between two updates only the latest one
/// fires. Each tween starts from the target folded into `[0, TAU)`, so the
/// value never grows past one turn plus one step.
#[derive(Clone, Debug)]
pub struct PeriodicTween {
    interval: Duration,
    duration: Duration,
    step: f32,
    easing: Easing,
    next_fire: Duration,
    active: Option<Tween>,
    firings: u64,
}

impl PeriodicTween {
    pub fn new(interval: Duration, duration: Duration, step: f32, easing: Easing) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        Self {
            interval,
            duration,
            step,
            easing,
            next_fire: interval,
            active: None,
            firings: 0,
        }
    }

    /// Advance to `now` and return the new value of the target, given its
    /// `current` value.
    pub fn update(&mut self, now: Duration, current: f32) -> f32 {
        let mut value = current;

        if now >= self.next_fire {
            if let Some(running) = self.active.take() {
                value = running.to;
            }
            value = value.rem_euclid(TAU);

            let missed = (now - self.next_fire).as_nanos() / self.interval.as_nanos();
            let fire_at = self.next_fire + self.interval * missed as u32;
            if missed > 0 {
                log::debug!("Coalesced {} missed group rotations", missed);
            }

            self.active = Some(Tween::new(
                value,
                value + self.step,
                fire_at,
                self.duration,
                self.easing,
            ));
            self.next_fire = fire_at + self.interval;
            self.firings += 1;
        }

        if let Some(tween) = self.active {
            value = tween.value_at(now);
            if tween.is_finished(now) {
                self.active = None;
            }
        }

        value
    }

    /// Whether a tween is currently running.
    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// Number of firings so far.
    pub fn firings(&self) -> u64 {
        self.firings
    }

    /// Time of the next scheduled firing.
    pub fn next_fire(&self) -> Duration {
        self.next_fire
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn step(&self) -> f32 {
        self.step
    }
}
