//! The Orrery scene: sphere geometry, transforms, materials, lights, and the
//! fixed object graph of a star backdrop and an orbiting group of spheres.
//!
//! Everything here is CPU-side. The renderer reads a [`Scene`] each frame and
//! mirrors it to GPU resources.

pub mod geometry;
pub mod light;
pub mod material;
pub mod scene;
pub mod transform;

pub use geometry::{MeshData, SphereGeometry};
pub use light::{AmbientLight, DirectionalLight, LightingUniform};
pub use material::{MapSlot, Side, StandardMaterial};
pub use scene::{orbit_positions, GeometryHandle, Group, Mesh, MeshSlot, Scene};
pub use transform::Transform;
