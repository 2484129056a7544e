//! UV sphere generation.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

/// Indexed triangle mesh on the CPU.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Outward unit normals, one per position.
    pub normals: Vec<Vec3>,
    /// Texture coordinates with a top-left origin.
    pub uvs: Vec<[f32; 2]>,
    /// Counter-clockwise triangle indices (seen from outside).
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Latitude/longitude sphere.
///
/// Rows run from the north pole (`v = 0`) to the south pole (`v = 1`), columns
/// wrap once around the Y axis with a duplicated seam column so UVs stay
/// continuous. Pole rows emit a single triangle per quad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SphereGeometry {
    pub radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,
}

impl SphereGeometry {
    pub fn new(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self {
            radius,
            width_segments: width_segments.max(3),
            height_segments: height_segments.max(2),
        }
    }

    pub fn build(&self) -> MeshData {
        let w = self.width_segments.max(3);
        let h = self.height_segments.max(2);
        let vertex_count = ((w + 1) * (h + 1)) as usize;

        let mut positions = Vec::with_capacity(vertex_count);
        let mut normals = Vec::with_capacity(vertex_count);
        let mut uvs = Vec::with_capacity(vertex_count);
        let mut grid: Vec<Vec<u32>> = Vec::with_capacity(h as usize + 1);

        for iy in 0..=h {
            let v = iy as f32 / h as f32;
            // Shift pole UVs half a column so each pole triangle samples its own column.
            let u_offset = if iy == 0 {
                0.5 / w as f32
            } else if iy == h {
                -0.5 / w as f32
            } else {
                0.0
            };

            let mut row = Vec::with_capacity(w as usize + 1);
            for ix in 0..=w {
                let u = ix as f32 / w as f32;
                let phi = u * TAU;
                let theta = v * PI;

                let position = Vec3::new(
                    -self.radius * phi.cos() * theta.sin(),
                    self.radius * theta.cos(),
                    self.radius * phi.sin() * theta.sin(),
                );
                row.push(positions.len() as u32);
                normals.push(position.normalize_or_zero());
                positions.push(position);
                uvs.push([u + u_offset, v]);
            }
            grid.push(row);
        }

        let mut indices = Vec::with_capacity((6 * w * (h - 1)) as usize);
        for iy in 0..h as usize {
            for ix in 0..w as usize {
                let a = grid[iy][ix + 1];
                let b = grid[iy][ix];
                let c = grid[iy + 1][ix];
                let d = grid[iy + 1][ix + 1];

                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != h as usize - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        let mesh = MeshData {
            positions,
            normals,
            uvs,
            indices,
        };
        log::debug!(
            "Built sphere r={} {}x{}: {} vertices, {} triangles",
            self.radius,
            w,
            h,
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        mesh
    }
}
