//! The fixed object graph: one backdrop sphere and one group of orbiters.

use std::f32::consts::TAU;

use glam::{Mat4, Vec3};
use orrery_config::{SceneConfig, ORBITER_COUNT};

use crate::{
    AmbientLight, DirectionalLight, LightingUniform, MapSlot, MeshData, Side, SphereGeometry,
    StandardMaterial, Transform,
};

/// Index into [`Scene::geometries`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GeometryHandle(pub usize);

/// A drawable object: shared geometry plus its own material and transform.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub name: String,
    pub geometry: GeometryHandle,
    pub material: StandardMaterial,
    pub transform: Transform,
}

/// The orbiting group. Children are positioned relative to the group transform.
#[derive(Clone, Debug)]
pub struct Group {
    pub transform: Transform,
    pub children: [Mesh; ORBITER_COUNT],
}

/// Addresses a mesh in the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MeshSlot {
    Backdrop,
    Orbiter(usize),
}

impl std::fmt::Display for MeshSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MeshSlot::Backdrop => write!(f, "backdrop"),
            MeshSlot::Orbiter(i) => write!(f, "orbiter {i}"),
        }
    }
}

/// Everything drawn or lit in a session. Built once; nothing is ever removed.
#[derive(Clone, Debug)]
pub struct Scene {
    geometries: Vec<MeshData>,
    pub backdrop: Mesh,
    pub orbiters: Group,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    /// Environment map state. Lights the scene but is never drawn.
    pub environment: MapSlot,
    pub environment_intensity: f32,
}

/// `count` points evenly spaced on a circle of `radius` in the XZ plane,
/// starting on +X and turning toward +Z.
pub fn orbit_positions(count: usize, radius: f32) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * TAU;
            Vec3::new(radius * angle.cos(), 0.0, radius * angle.sin())
        })
        .collect()
}

impl Scene {
    pub fn build(config: &SceneConfig) -> Self {
        let sphere = SphereGeometry::new(
            config.sphere_radius,
            config.sphere_segments,
            config.sphere_segments,
        );
        let backdrop_sphere = SphereGeometry::new(
            config.backdrop_radius,
            config.backdrop_segments,
            config.backdrop_segments,
        );
        let geometries = vec![sphere.build(), backdrop_sphere.build()];
        let sphere_handle = GeometryHandle(0);
        let backdrop_handle = GeometryHandle(1);

        let backdrop = Mesh {
            name: "backdrop".to_string(),
            geometry: backdrop_handle,
            material: StandardMaterial {
                opacity: config.backdrop_opacity,
                transparent: true,
                side: Side::Back,
                ..Default::default()
            },
            transform: Transform::default(),
        };

        let positions = orbit_positions(ORBITER_COUNT, config.orbit_radius);
        let children = std::array::from_fn(|i| Mesh {
            name: format!("orbiter-{i}"),
            geometry: sphere_handle,
            material: StandardMaterial::default(),
            transform: Transform::from_position(positions[i]),
        });

        let orbiters = Group {
            transform: Transform {
                position: Vec3::new(0.0, config.group_offset_y, 0.0),
                rotation: Vec3::new(config.group_tilt, 0.0, 0.0),
                scale: Vec3::ONE,
            },
            children,
        };

        let ambient = AmbientLight {
            color: Vec3::from(config.ambient.color),
            intensity: config.ambient.intensity,
        };
        let directional = DirectionalLight {
            position: Vec3::from(config.directional.position),
            target: Vec3::ZERO,
            color: Vec3::from(config.directional.color),
            intensity: config.directional.intensity,
        };

        log::info!(
            "Scene built: {} orbiters on r={}, backdrop r={}",
            ORBITER_COUNT,
            config.orbit_radius,
            config.backdrop_radius
        );

        Self {
            geometries,
            backdrop,
            orbiters,
            ambient,
            directional,
            environment: MapSlot::Unloaded,
            environment_intensity: config.environment_intensity,
        }
    }

    pub fn geometries(&self) -> &[MeshData] {
        &self.geometries
    }

    pub fn geometry(&self, handle: GeometryHandle) -> &MeshData {
        &self.geometries[handle.0]
    }

    /// All mesh slots: the orbiters in group order, then the backdrop.
    pub fn slots(&self) -> impl Iterator<Item = MeshSlot> + use<> {
        (0..ORBITER_COUNT)
            .map(MeshSlot::Orbiter)
            .chain(std::iter::once(MeshSlot::Backdrop))
    }

    pub fn mesh(&self, slot: MeshSlot) -> Option<&Mesh> {
        match slot {
            MeshSlot::Backdrop => Some(&self.backdrop),
            MeshSlot::Orbiter(i) => self.orbiters.children.get(i),
        }
    }

    pub fn mesh_mut(&mut self, slot: MeshSlot) -> Option<&mut Mesh> {
        match slot {
            MeshSlot::Backdrop => Some(&mut self.backdrop),
            MeshSlot::Orbiter(i) => self.orbiters.children.get_mut(i),
        }
    }

    /// Model-to-world matrix of a mesh, including the group transform for orbiters.
    pub fn world_matrix(&self, slot: MeshSlot) -> Option<Mat4> {
        match slot {
            MeshSlot::Backdrop => Some(self.backdrop.transform.matrix()),
            MeshSlot::Orbiter(i) => self
                .orbiters
                .children
                .get(i)
                .map(|child| self.orbiters.transform.matrix() * child.transform.matrix()),
        }
    }

    pub fn lighting_uniform(&self) -> LightingUniform {
        LightingUniform::new(
            &self.ambient,
            &self.directional,
            self.environment_intensity,
            self.environment.is_loaded(),
        )
    }
}
