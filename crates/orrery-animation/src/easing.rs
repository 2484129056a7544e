//! Easing curves mapping linear progress in `[0, 1]` to eased progress.

use std::fmt;
use std::str::FromStr;

/// Easing curve applied to a tween's progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// Constant speed.
    Linear,
    /// Quadratic acceleration then deceleration.
    QuadInOut,
    /// Exponential acceleration.
    ExpoIn,
    /// Exponential deceleration.
    ExpoOut,
    /// Exponential acceleration then deceleration.
    #[default]
    ExpoInOut,
}

/// Returned when an easing name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown easing curve '{0}'")]
pub struct EasingParseError(pub String);

impl Easing {
    /// Every supported curve.
    pub const ALL: [Easing; 5] = [
        Easing::Linear,
        Easing::QuadInOut,
        Easing::ExpoIn,
        Easing::ExpoOut,
        Easing::ExpoInOut,
    ];

    /// Map linear progress to eased progress. Input is clamped to `[0, 1]`;
    /// `apply(0.0) == 0.0` and `apply(1.0) == 1.0` hold exactly for every curve.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::ExpoIn => expo_in(t),
            Easing::ExpoOut => 1.0 - expo_in(1.0 - t),
            Easing::ExpoInOut => {
                if t < 0.5 {
                    expo_in(t * 2.0) / 2.0
                } else {
                    1.0 - expo_in((1.0 - t) * 2.0) / 2.0
                }
            }
        }
    }

    /// Canonical name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::QuadInOut => "quad.inOut",
            Easing::ExpoIn => "expo.in",
            Easing::ExpoOut => "expo.out",
            Easing::ExpoInOut => "expo.inOut",
        }
    }
}

/// `2^(10(t-1))`, pinned to exactly 0 at `t == 0`.
fn expo_in(t: f32) -> f32 {
    if t <= 0.0 {
        0.0
    } else {
        2f32.powf(10.0 * (t - 1.0))
    }
}

impl FromStr for Easing {
    type Err = EasingParseError;

    /// Accepts the canonical names plus the older `easeIn`/`easeOut`/`easeInOut`
    /// suffix spelling. Matching ignores ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let easing = match normalized.as_str() {
            "linear" | "none" => Easing::Linear,
            "quad.inout" | "quad.easeinout" => Easing::QuadInOut,
            "expo.in" | "expo.easein" => Easing::ExpoIn,
            "expo.out" | "expo.easeout" => Easing::ExpoOut,
            "expo.inout" | "expo.easeinout" => Easing::ExpoInOut,
            _ => return Err(EasingParseError(s.to_string())),
        };
        Ok(easing)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
