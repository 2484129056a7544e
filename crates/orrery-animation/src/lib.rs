//! Time-driven animation primitives: easing curves, single tweens, a periodic
//! relative tween, and fixed per-frame spin.
//!
//! Nothing here reads the clock. Callers pass the elapsed session time so the
//! same code runs under the window loop and under tests.

pub mod easing;
pub mod periodic;
pub mod spin;
pub mod tween;

pub use easing::{Easing, EasingParseError};
pub use periodic::PeriodicTween;
pub use spin::Spin;
pub use tween::Tween;
