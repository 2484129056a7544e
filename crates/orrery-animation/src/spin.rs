//! Fixed per-frame rotation.

use std::f32::consts::TAU;

/// Adds a constant angle every frame, independent of frame time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spin {
    pub step: f32,
}

impl Spin {
    pub fn new(step: f32) -> Self {
        Self { step }
    }

    /// Advance `angle` by one frame, keeping it within one turn.
    pub fn advance(&self, angle: &mut f32) {
        *angle = (*angle + self.step).rem_euclid(TAU);
    }
}
