//! Ambient and directional lights, and the GPU uniform that carries them.
//!
//! [`LightingUniform`] is written to the lighting buffer once at startup and
//! again whenever the environment map changes.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

/// Uniform light from every direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmbientLight {
    /// Linear RGB color (not premultiplied by intensity).
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: 0.5,
        }
    }
}

/// Infinitely distant light shining from `position` toward `target`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub target: Vec3,
    /// Linear RGB color (not premultiplied by intensity).
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            position: Vec3::new(5.0, 5.0, 5.0),
            target: Vec3::ZERO,
            color: Vec3::ONE,
            intensity: 1.0,
        }
    }
}

impl DirectionalLight {
    /// Normalized direction the light travels in. Falls back to straight down
    /// when position and target coincide.
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Y)
    }
}

/// GPU-side lighting, 64 bytes, std140-compatible.
///
/// Bound at `@group(1) @binding(0)` visible to `ShaderStages::FRAGMENT`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct LightingUniform {
    /// rgb = ambient color * intensity, w = padding.
    pub ambient: [f32; 4],
    /// xyz = unit vector from the surface toward the light, w = padding.
    pub to_light: [f32; 4],
    /// rgb = directional color * intensity, w = padding.
    pub direct: [f32; 4],
    /// x = environment intensity, y = 1.0 when an environment map is bound.
    pub environment: [f32; 4],
}

impl LightingUniform {
    pub fn new(
        ambient: &AmbientLight,
        directional: &DirectionalLight,
        environment_intensity: f32,
        has_environment: bool,
    ) -> Self {
        let a = ambient.color * ambient.intensity;
        let l = -directional.direction();
        let d = directional.color * directional.intensity;
        Self {
            ambient: [a.x, a.y, a.z, 0.0],
            to_light: [l.x, l.y, l.z, 0.0],
            direct: [d.x, d.y, d.z, 0.0],
            environment: [
                environment_intensity,
                if has_environment { 1.0 } else { 0.0 },
                0.0,
                0.0,
            ],
        }
    }
}
