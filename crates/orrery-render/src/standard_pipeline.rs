//! Lit, textured pipeline for scene meshes.
//!
//! Bind groups:
//! - group 0: [`CameraUniform`](crate::CameraUniform)
//! - group 1: [`LightingUniform`](orrery_scene::LightingUniform), environment
//!   radiance and irradiance (RGBA32F, read with `textureLoad`)
//! - group 2: [`ObjectUniform`], color map, sampler

use std::collections::HashMap;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use orrery_scene::{Side, StandardMaterial};

use crate::buffer::VertexPositionNormalUv;
use crate::depth::DepthBuffer;

/// Per-mesh transform and material parameters, 160 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    /// Inverse transpose of `model`, for transforming normals.
    pub normal_matrix: [[f32; 4]; 4],
    /// rgb = base color, a = opacity.
    pub color_opacity: [f32; 4],
    /// x = roughness, y = metalness.
    pub params: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, material: &StandardMaterial) -> Self {
        let c = material.color;
        Self {
            model: model.to_cols_array_2d(),
            normal_matrix: model.inverse().transpose().to_cols_array_2d(),
            color_opacity: [c.x, c.y, c.z, material.effective_opacity()],
            params: [material.roughness, material.metalness, 0.0, 0.0],
        }
    }
}

/// Render state selected by a material.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PipelineKey {
    pub side: Side,
    /// Alpha blended, no depth writes.
    pub blended: bool,
}

impl PipelineKey {
    pub fn for_material(material: &StandardMaterial) -> Self {
        Self {
            side: material.side,
            blended: material.transparent,
        }
    }

    fn cull_mode(&self) -> Option<wgpu::Face> {
        match self.side {
            Side::Front => Some(wgpu::Face::Back),
            Side::Back => Some(wgpu::Face::Front),
            Side::Double => None,
        }
    }
}

/// Every culling/blending combination of the standard shader.
pub struct StandardPipeline {
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    pub camera_bind_group_layout: wgpu::BindGroupLayout,
    pub environment_bind_group_layout: wgpu::BindGroupLayout,
    pub material_bind_group_layout: wgpu::BindGroupLayout,
}

impl StandardPipeline {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("standard-shader"),
            source: wgpu::ShaderSource::Wgsl(STANDARD_SHADER_SOURCE.into()),
        });

        let camera_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("standard-camera-bind-group-layout"),
                entries: &[uniform_entry(
                    0,
                    wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    80,
                )],
            });

        let environment_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("standard-environment-bind-group-layout"),
                entries: &[
                    uniform_entry(0, wgpu::ShaderStages::FRAGMENT, 64),
                    texture_entry(1, false),
                    texture_entry(2, false),
                ],
            });

        let material_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("standard-material-bind-group-layout"),
                entries: &[
                    uniform_entry(
                        0,
                        wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                        std::mem::size_of::<ObjectUniform>() as u64,
                    ),
                    texture_entry(1, true),
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("standard-pipeline-layout"),
            bind_group_layouts: &[
                &camera_bind_group_layout,
                &environment_bind_group_layout,
                &material_bind_group_layout,
            ],
            immediate_size: 0,
        });

        let mut pipelines = HashMap::new();
        for side in [Side::Front, Side::Back, Side::Double] {
            for blended in [false, true] {
                let key = PipelineKey { side, blended };
                let pipeline = create_pipeline(
                    device,
                    &shader,
                    &pipeline_layout,
                    surface_format,
                    sample_count,
                    key,
                );
                pipelines.insert(key, pipeline);
            }
        }

        Self {
            pipelines,
            camera_bind_group_layout,
            environment_bind_group_layout,
            material_bind_group_layout,
        }
    }

    pub fn get(&self, key: PipelineKey) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&key)
    }

    pub fn variant_count(&self) -> usize {
        self.pipelines.len()
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    shader: &wgpu::ShaderModule,
    layout: &wgpu::PipelineLayout,
    surface_format: wgpu::TextureFormat,
    sample_count: u32,
    key: PipelineKey,
) -> wgpu::RenderPipeline {
    let blend = key.blended.then_some(wgpu::BlendState::ALPHA_BLENDING);
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("standard-pipeline"),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[VertexPositionNormalUv::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: key.cull_mode(),
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(DepthBuffer::stencil_state(!key.blended)),
        multisample: wgpu::MultisampleState {
            count: sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: u64,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size),
        },
        count: None,
    }
}

fn texture_entry(binding: u32, filterable: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// WGSL source for the standard material.
///
/// Diffuse uses the Lambert BRDF (albedo / PI) against the ambient and
/// directional lights, plus environment irradiance. Specular is a
/// Schlick-weighted environment reflection that fades out with roughness.
pub const STANDARD_SHADER_SOURCE: &str = r#"
const PI: f32 = 3.141592653589793;

struct CameraUniform {
    view_proj: mat4x4<f32>,
    camera_pos: vec4<f32>,
};

struct LightingUniform {
    ambient: vec4<f32>,
    to_light: vec4<f32>,
    direct: vec4<f32>,
    // x = intensity, y = 1.0 when loaded
    environment: vec4<f32>,
};

struct ObjectUniform {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color_opacity: vec4<f32>,
    params: vec4<f32>,
};

@group(0) @binding(0) var<uniform> camera: CameraUniform;

@group(1) @binding(0) var<uniform> lighting: LightingUniform;
@group(1) @binding(1) var env_radiance: texture_2d<f32>;
@group(1) @binding(2) var env_irradiance: texture_2d<f32>;

@group(2) @binding(0) var<uniform> mesh_params: ObjectUniform;
@group(2) @binding(1) var t_map: texture_2d<f32>;
@group(2) @binding(2) var s_map: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = mesh_params.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = camera.view_proj * world;
    out.world_position = world.xyz;
    out.normal = (mesh_params.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

fn equirect_uv(dir: vec3<f32>) -> vec2<f32> {
    let d = normalize(dir);
    return vec2<f32>(
        atan2(d.z, d.x) / (2.0 * PI) + 0.5,
        0.5 - asin(clamp(d.y, -1.0, 1.0)) / PI,
    );
}

// Bilinear lookup with horizontal wrap. Float32 textures are not filterable.
fn sample_equirect(tex: texture_2d<f32>, dir: vec3<f32>) -> vec3<f32> {
    let size = vec2<i32>(textureDimensions(tex));
    let st = equirect_uv(dir) * vec2<f32>(size) - 0.5;
    let base = vec2<i32>(floor(st));
    let f = fract(st);

    let x0 = ((base.x % size.x) + size.x) % size.x;
    let x1 = (x0 + 1) % size.x;
    let y0 = clamp(base.y, 0, size.y - 1);
    let y1 = clamp(base.y + 1, 0, size.y - 1);

    let a = textureLoad(tex, vec2<i32>(x0, y0), 0).rgb;
    let b = textureLoad(tex, vec2<i32>(x1, y0), 0).rgb;
    let c = textureLoad(tex, vec2<i32>(x0, y1), 0).rgb;
    let d = textureLoad(tex, vec2<i32>(x1, y1), 0).rgb;
    return mix(mix(a, b, f.x), mix(c, d, f.x), f.y);
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front_facing: bool) -> @location(0) vec4<f32> {
    let texel = textureSample(t_map, s_map, in.uv);
    let albedo = texel.rgb * mesh_params.color_opacity.rgb;
    let roughness = mesh_params.params.x;
    let metalness = mesh_params.params.y;

    var n = normalize(in.normal);
    if (!front_facing) {
        n = -n;
    }
    let v = normalize(camera.camera_pos.xyz - in.world_position);
    let l = normalize(lighting.to_light.xyz);

    let diffuse_color = albedo * (1.0 - metalness);
    let n_dot_l = max(dot(n, l), 0.0);
    var color = diffuse_color / PI * (lighting.ambient.rgb + lighting.direct.rgb * n_dot_l);

    let env_scale = lighting.environment.x * lighting.environment.y;
    if (env_scale > 0.0) {
        color += diffuse_color * sample_equirect(env_irradiance, n) * env_scale;

        let f0 = mix(vec3<f32>(0.04), albedo, metalness);
        let n_dot_v = clamp(dot(n, v), 0.0, 1.0);
        let fresnel = f0 + (vec3<f32>(1.0) - f0) * pow(1.0 - n_dot_v, 5.0);
        let reflected = sample_equirect(env_radiance, reflect(-v, n));
        color += reflected * fresnel * (1.0 - roughness) * env_scale;
    }

    return vec4<f32>(color, texel.a * mesh_params.color_opacity.a);
}
"#;

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::test_util::create_test_device;

    #[test]
    fn test_object_uniform_layout() {
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 160);
        assert_eq!(std::mem::offset_of!(ObjectUniform, normal_matrix), 64);
        assert_eq!(std::mem::offset_of!(ObjectUniform, color_opacity), 128);
        assert_eq!(std::mem::offset_of!(ObjectUniform, params), 144);
    }

    #[test]
    fn test_object_uniform_from_material() {
        let material = StandardMaterial {
            opacity: 0.25,
            transparent: true,
            ..Default::default()
        };
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let uniform = ObjectUniform::new(model, &material);
        assert_eq!(uniform.color_opacity, [1.0, 1.0, 1.0, 0.25]);
        assert_eq!(uniform.params[0], 1.0);
        assert_eq!(uniform.model[3], [1.0, 2.0, 3.0, 1.0]);
        // Pure translation leaves the normal matrix's rotation part untouched.
        assert_eq!(uniform.normal_matrix[0][..3], [1.0, 0.0, 0.0]);
        assert_eq!(uniform.normal_matrix[1][..3], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_pipeline_key_culling() {
        let orbiter = PipelineKey::for_material(&StandardMaterial::default());
        assert_eq!(orbiter.cull_mode(), Some(wgpu::Face::Back));
        assert!(!orbiter.blended);

        let backdrop = PipelineKey::for_material(&StandardMaterial {
            side: Side::Back,
            transparent: true,
            ..Default::default()
        });
        assert_eq!(backdrop.cull_mode(), Some(wgpu::Face::Front));
        assert!(backdrop.blended);

        let double = PipelineKey {
            side: Side::Double,
            blended: false,
        };
        assert_eq!(double.cull_mode(), None);
    }

    #[test]
    fn test_shader_declares_entry_points() {
        assert!(STANDARD_SHADER_SOURCE.contains("fn vs_main"));
        assert!(STANDARD_SHADER_SOURCE.contains("fn fs_main"));
        assert!(STANDARD_SHADER_SOURCE.contains("@group(2) @binding(2)"));
    }

    #[test]
    fn test_pipeline_creation() {
        let Some((device, _queue)) = create_test_device() else {
            return;
        };
        let pipeline = StandardPipeline::new(&device, wgpu::TextureFormat::Rgba8UnormSrgb, 1);
        assert_eq!(pipeline.variant_count(), 6);
        assert!(
            pipeline
                .get(PipelineKey {
                    side: Side::Back,
                    blended: true
                })
                .is_some()
        );
    }
}
