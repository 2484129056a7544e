//! Draws a [`Scene`]: one pass, opaque meshes first, then blended ones.

use std::collections::HashMap;

use orrery_assets::{DecodedImage, EnvironmentImage, ImagePixels};
use orrery_config::RenderConfig;
use orrery_scene::{MeshSlot, Scene};

use crate::buffer::{BufferAllocator, MeshBuffer};
use crate::camera::Camera;
use crate::depth::DepthBuffer;
use crate::gpu::{RenderContext, SurfaceError};
use crate::msaa::MsaaTarget;
use crate::pass::{FrameEncoder, RenderPassBuilder};
use crate::standard_pipeline::{ObjectUniform, PipelineKey, StandardPipeline};
use crate::texture::{ManagedTexture, TextureError, TextureManager};

/// GPU state of one mesh slot.
struct MeshGpu {
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    /// `None` while the slot samples the white placeholder.
    map: Option<ManagedTexture>,
}

pub struct SceneRenderer {
    pipeline: StandardPipeline,
    textures: TextureManager,
    depth: DepthBuffer,
    msaa: MsaaTarget,
    geometry_buffers: Vec<MeshBuffer>,
    meshes: HashMap<MeshSlot, MeshGpu>,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    lighting_buffer: wgpu::Buffer,
    environment_bind_group: wgpu::BindGroup,
    /// Radiance and irradiance, once loaded.
    environment: Option<(ManagedTexture, ManagedTexture)>,
    clear_color: wgpu::Color,
}

impl SceneRenderer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
        scene: &Scene,
        camera: &Camera,
        config: &RenderConfig,
    ) -> Self {
        let pipeline = StandardPipeline::new(device, surface_format, sample_count);
        let textures = TextureManager::new(device, queue);
        let depth = DepthBuffer::new(device, width, height, sample_count);
        let msaa = MsaaTarget::new(device, surface_format, width, height, sample_count);

        let allocator = BufferAllocator::new(device);
        let geometry_buffers = scene
            .geometries()
            .iter()
            .enumerate()
            .map(|(i, mesh)| allocator.create_mesh(&format!("geometry-{i}"), mesh))
            .collect();

        let camera_buffer = allocator.create_uniform("camera-uniform", &camera.to_uniform());
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera-bind-group"),
            layout: &pipeline.camera_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let lighting_buffer =
            allocator.create_uniform("lighting-uniform", &scene.lighting_uniform());
        let environment_bind_group = create_environment_bind_group(
            device,
            &pipeline,
            &lighting_buffer,
            textures.black_environment(),
            textures.black_environment(),
        );

        let mut meshes = HashMap::new();
        for slot in scene.slots() {
            let Some(model) = scene.world_matrix(slot) else {
                continue;
            };
            let Some(mesh) = scene.mesh(slot) else {
                continue;
            };
            let uniform = allocator.create_uniform(
                &format!("{slot}-uniform"),
                &ObjectUniform::new(model, &mesh.material),
            );
            let bind_group =
                create_material_bind_group(device, &pipeline, &textures, &uniform, None);
            meshes.insert(
                slot,
                MeshGpu {
                    uniform,
                    bind_group,
                    map: None,
                },
            );
        }

        let [r, g, b] = config.clear_color;
        log::info!(
            "Scene renderer ready: {} meshes, {} pipelines, MSAA x{}",
            meshes.len(),
            pipeline.variant_count(),
            sample_count
        );

        Self {
            pipeline,
            textures,
            depth,
            msaa,
            geometry_buffers,
            meshes,
            camera_buffer,
            camera_bind_group,
            lighting_buffer,
            environment_bind_group,
            environment: None,
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: 1.0,
            },
        }
    }

    /// Upload a decoded color map and bind it to `slot`'s material.
    pub fn apply_map(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        slot: MeshSlot,
        image: &DecodedImage,
    ) -> Result<(), TextureError> {
        let name = format!("{slot}-map");
        let ImagePixels::Rgba8(data) = &image.pixels else {
            return Err(TextureError::UnsupportedPixels {
                name,
                expected: "8-bit RGBA",
            });
        };
        let texture = self.textures.create_texture(
            device,
            queue,
            &name,
            data,
            image.width,
            image.height,
            image.srgb,
            true,
        )?;

        let Some(gpu) = self.meshes.get_mut(&slot) else {
            log::warn!("No mesh for {slot}, dropping its map");
            return Ok(());
        };
        gpu.bind_group = create_material_bind_group(
            device,
            &self.pipeline,
            &self.textures,
            &gpu.uniform,
            Some(&texture),
        );
        gpu.map = Some(texture);
        Ok(())
    }

    /// Upload the environment radiance and irradiance and light the scene with them.
    pub fn apply_environment(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        environment: &EnvironmentImage,
    ) -> Result<(), TextureError> {
        let radiance =
            self.upload_float(device, queue, "environment-radiance", &environment.radiance)?;
        let irradiance =
            self.upload_float(device, queue, "environment-irradiance", &environment.irradiance)?;

        self.environment_bind_group = create_environment_bind_group(
            device,
            &self.pipeline,
            &self.lighting_buffer,
            &radiance,
            &irradiance,
        );
        self.environment = Some((radiance, irradiance));
        Ok(())
    }

    fn upload_float(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        image: &DecodedImage,
    ) -> Result<ManagedTexture, TextureError> {
        let ImagePixels::Rgba32F(texels) = &image.pixels else {
            return Err(TextureError::UnsupportedPixels {
                name: name.to_string(),
                expected: "32-bit float RGBA",
            });
        };
        self.textures
            .create_float_texture(device, queue, name, texels, image.width, image.height)
    }

    pub fn has_environment(&self) -> bool {
        self.environment.is_some()
    }

    pub fn has_map(&self, slot: MeshSlot) -> bool {
        self.meshes.get(&slot).is_some_and(|gpu| gpu.map.is_some())
    }

    /// Largest texture edge the device accepts.
    pub fn max_texture_dimension(&self) -> u32 {
        self.textures.max_dimension()
    }

    pub fn sample_count(&self) -> u32 {
        self.msaa.sample_count()
    }

    /// Recreate the size-dependent attachments.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth.resize(device, width, height);
        self.msaa.resize(device, width, height);
    }

    /// Render one frame to the window surface and present it.
    pub fn render(
        &self,
        ctx: &RenderContext,
        scene: &Scene,
        camera: &Camera,
    ) -> Result<(), SurfaceError> {
        let surface_texture = ctx.get_current_texture()?;
        let mut frame = FrameEncoder::new(&ctx.device, surface_texture);
        let (encoder, view) = frame.parts();
        self.encode(&ctx.queue, encoder, view, scene, camera);
        frame.submit(&ctx.queue);
        Ok(())
    }

    /// Upload this frame's uniforms and record the scene pass into `encoder`.
    pub fn encode(
        &self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
        scene: &Scene,
        camera: &Camera,
    ) {
        queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::bytes_of(&camera.to_uniform()),
        );
        queue.write_buffer(
            &self.lighting_buffer,
            0,
            bytemuck::bytes_of(&scene.lighting_uniform()),
        );

        let order = draw_order(scene);
        for &slot in &order {
            let (Some(gpu), Some(mesh), Some(model)) = (
                self.meshes.get(&slot),
                scene.mesh(slot),
                scene.world_matrix(slot),
            ) else {
                continue;
            };
            let uniform = ObjectUniform::new(model, &mesh.material);
            queue.write_buffer(&gpu.uniform, 0, bytemuck::bytes_of(&uniform));
        }

        let builder = RenderPassBuilder::new()
            .label("scene-pass")
            .clear_color(self.clear_color)
            .depth(self.depth.view.clone(), DepthBuffer::CLEAR_VALUE)
            .multisampled(self.msaa.view().cloned());
        let mut pass = builder.begin(encoder, target);

        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.set_bind_group(1, &self.environment_bind_group, &[]);

        for slot in order {
            let (Some(gpu), Some(mesh)) = (self.meshes.get(&slot), scene.mesh(slot)) else {
                continue;
            };
            let Some(buffers) = self.geometry_buffers.get(mesh.geometry.0) else {
                continue;
            };
            let Some(pipeline) = self.pipeline.get(PipelineKey::for_material(&mesh.material))
            else {
                continue;
            };
            pass.set_pipeline(pipeline);
            pass.set_bind_group(2, &gpu.bind_group, &[]);
            buffers.bind(&mut pass);
            buffers.draw(&mut pass);
        }
    }
}

/// Opaque meshes in slot order, then transparent ones.
pub fn draw_order(scene: &Scene) -> Vec<MeshSlot> {
    let (mut opaque, transparent): (Vec<_>, Vec<_>) = scene.slots().partition(|&slot| {
        scene
            .mesh(slot)
            .is_some_and(|mesh| !mesh.material.transparent)
    });
    opaque.extend(transparent);
    opaque
}

fn create_environment_bind_group(
    device: &wgpu::Device,
    pipeline: &StandardPipeline,
    lighting: &wgpu::Buffer,
    radiance: &ManagedTexture,
    irradiance: &ManagedTexture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("environment-bind-group"),
        layout: &pipeline.environment_bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: lighting.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&radiance.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(&irradiance.view),
            },
        ],
    })
}

fn create_material_bind_group(
    device: &wgpu::Device,
    pipeline: &StandardPipeline,
    textures: &TextureManager,
    uniform: &wgpu::Buffer,
    map: Option<&ManagedTexture>,
) -> wgpu::BindGroup {
    let map = map.unwrap_or_else(|| textures.white());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("material-bind-group"),
        layout: &pipeline.material_bind_group_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&map.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(textures.sampler_linear()),
            },
        ],
    })
}
