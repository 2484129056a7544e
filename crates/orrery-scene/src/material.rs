//! Lit, optionally textured surface material.

use glam::Vec3;

/// Which faces of a mesh are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Side {
    #[default]
    Front,
    /// Inside faces only, for geometry viewed from within.
    Back,
    Double,
}

/// State of a material's color map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MapSlot {
    /// No image yet. The material renders with its base color alone.
    #[default]
    Unloaded,
    /// An image of the given size is bound.
    Loaded { width: u32, height: u32 },
}

impl MapSlot {
    pub fn is_loaded(&self) -> bool {
        matches!(self, MapSlot::Loaded { .. })
    }
}

/// Physically based material with a base color, optional color map and
/// alpha blending.
#[derive(Clone, Debug, PartialEq)]
pub struct StandardMaterial {
    /// Linear RGB base color, multiplied with the map.
    pub color: Vec3,
    pub map: MapSlot,
    /// Alpha. Only takes effect when `transparent` is set.
    pub opacity: f32,
    pub transparent: bool,
    pub side: Side,
    /// 0 = mirror, 1 = fully diffuse.
    pub roughness: f32,
    pub metalness: f32,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            map: MapSlot::Unloaded,
            opacity: 1.0,
            transparent: false,
            side: Side::Front,
            roughness: 1.0,
            metalness: 0.0,
        }
    }
}

impl StandardMaterial {
    /// Alpha actually written by the fragment shader.
    pub fn effective_opacity(&self) -> f32 {
        if self.transparent {
            self.opacity.clamp(0.0, 1.0)
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let m = StandardMaterial::default();
        assert_eq!(m.color, Vec3::ONE);
        assert_eq!(m.map, MapSlot::Unloaded);
        assert!(!m.map.is_loaded());
        assert_eq!(m.side, Side::Front);
        assert_eq!(m.roughness, 1.0);
        assert_eq!(m.metalness, 0.0);
    }

    #[test]
    fn test_opacity_requires_transparent() {
        let mut m = StandardMaterial {
            opacity: 0.25,
            ..Default::default()
        };
        assert_eq!(m.effective_opacity(), 1.0);
        m.transparent = true;
        assert_eq!(m.effective_opacity(), 0.25);
    }
}
