//! GPU texture creation: color maps with mipmaps, float environment images,
//! and 1x1 placeholders for slots whose image has not arrived.

use std::collections::HashMap;

/// Texture plus the full view the bind groups use.
pub struct ManagedTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    /// Width and height in texels.
    pub dimensions: (u32, u32),
    pub format: wgpu::TextureFormat,
    /// Number of mip levels (1 if mipmaps were not generated).
    pub mip_level_count: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error("{actual} bytes of pixel data, {width}x{height} {format:?} needs {expected}")]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    },

    #[error("empty image ({width}x{height})")]
    ZeroDimensions { width: u32, height: u32 },

    /// Pixel storage does not fit the texture being created.
    #[error("{name}: expected {expected} pixels")]
    UnsupportedPixels { name: String, expected: &'static str },

    /// Larger than the device allows.
    #[error("texture {width}x{height} exceeds the device limit of {max}")]
    TooLarge { width: u32, height: u32, max: u32 },
}

/// Number of mip levels for a full chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Format used for environment images.
pub const ENVIRONMENT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

/// Each mip level is drawn from the one above it with a single oversized triangle.
const DOWNSAMPLE_WGSL: &str = r#"
@group(0) @binding(0) var parent_level: texture_2d<f32>;
@group(0) @binding(1) var parent_sampler: sampler;

struct Varyings {
    @builtin(position) clip: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) corner: u32) -> Varyings {
    let xy = vec2<f32>(f32((corner << 1u) & 2u), f32(corner & 2u));
    var v: Varyings;
    v.clip = vec4<f32>(xy * 2.0 - 1.0, 0.0, 1.0);
    v.uv = vec2<f32>(xy.x, 1.0 - xy.y);
    return v;
}

@fragment
fn fs_main(v: Varyings) -> @location(0) vec4<f32> {
    return textureSample(parent_level, parent_sampler, v.uv);
}
"#;

/// Downsampling passes that fill a texture's mip chain, one pipeline per format.
struct MipChainBuilder {
    shader: wgpu::ShaderModule,
    layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    sampler: wgpu::Sampler,
    pipelines: HashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
}

impl MipChainBuilder {
    fn new(device: &wgpu::Device) -> Self {
        let stage = wgpu::ShaderStages::FRAGMENT;
        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("mip-chain-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: stage,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: stage,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("mip-chain-pipeline-layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });
        Self {
            shader: device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("mip-downsample"),
                source: wgpu::ShaderSource::Wgsl(DOWNSAMPLE_WGSL.into()),
            }),
            sampler: device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("mip-downsample-sampler"),
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                ..Default::default()
            }),
            layout,
            pipeline_layout,
            pipelines: HashMap::new(),
        }
    }

    fn pipeline_for(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> &wgpu::RenderPipeline {
        let shader = &self.shader;
        let pipeline_layout = &self.pipeline_layout;
        self.pipelines.entry(format).or_insert_with(|| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("mip-downsample-pipeline"),
                layout: Some(pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[],
                    compilation_options: Default::default(),
                },
                primitive: wgpu::PrimitiveState::default(),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(format.into())],
                    compilation_options: Default::default(),
                }),
                multiview_mask: None,
                cache: None,
            })
        })
    }

    /// Render levels `1..levels` of `texture`, each from its parent level.
    fn build(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        levels: u32,
    ) {
        let format = texture.format();
        self.pipeline_for(device, format);
        let Some(pipeline) = self.pipelines.get(&format) else {
            return;
        };
        let level_view = |level: u32| {
            texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level,
                mip_level_count: Some(1),
                ..Default::default()
            })
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mip-chain"),
        });
        for level in 1..levels {
            let parent = level_view(level - 1);
            let target = level_view(level);
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("mip-chain-level"),
                layout: &self.layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&parent),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mip-chain-level"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                ..Default::default()
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        queue.submit([encoder.finish()]);
    }
}

/// Owns the shared sampler, the mip chain builder and the placeholder textures.
pub struct TextureManager {
    sampler_linear: wgpu::Sampler,
    white: ManagedTexture,
    black_environment: ManagedTexture,
    mip_chain: MipChainBuilder,
    max_dimension: u32,
}

impl TextureManager {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let sampler_linear = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("orbiter-map-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Linear,
            ..Default::default()
        });
        let white = upload(
            device,
            queue,
            "placeholder-white",
            &[u8::MAX; 4],
            1,
            1,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            1,
        );
        let black_environment = upload(
            device,
            queue,
            "placeholder-environment",
            bytemuck::cast_slice(&[0.0f32; 4]),
            1,
            1,
            ENVIRONMENT_FORMAT,
            1,
        );

        Self {
            sampler_linear,
            white,
            black_environment,
            mip_chain: MipChainBuilder::new(device),
            max_dimension: device.limits().max_texture_dimension_2d,
        }
    }

    /// Create an 8-bit RGBA texture, optionally with a full mip chain.
    #[allow(clippy::too_many_arguments)]
    pub fn create_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        data: &[u8],
        width: u32,
        height: u32,
        srgb: bool,
        generate_mipmaps: bool,
    ) -> Result<ManagedTexture, TextureError> {
        let format = if srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        self.check_fits(data.len(), width, height, format)?;

        let levels = if generate_mipmaps {
            mip_level_count(width, height)
        } else {
            1
        };
        let managed = upload(device, queue, name, data, width, height, format, levels);
        if levels > 1 {
            self.mip_chain.build(device, queue, &managed.texture, levels);
        }
        log::info!("Uploaded map '{name}' {width}x{height} with {levels} mip level(s)");
        Ok(managed)
    }

    /// Create an RGBA32F texture (environment radiance or irradiance).
    pub fn create_float_texture(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        texels: &[f32],
        width: u32,
        height: u32,
    ) -> Result<ManagedTexture, TextureError> {
        let data: &[u8] = bytemuck::cast_slice(texels);
        self.check_fits(data.len(), width, height, ENVIRONMENT_FORMAT)?;
        let managed = upload(device, queue, name, data, width, height, ENVIRONMENT_FORMAT, 1);
        log::info!("Uploaded environment '{name}' {width}x{height}");
        Ok(managed)
    }

    fn check_fits(
        &self,
        len: usize,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Result<(), TextureError> {
        validate_dimensions(width, height)?;
        if width.max(height) > self.max_dimension {
            return Err(TextureError::TooLarge {
                width,
                height,
                max: self.max_dimension,
            });
        }
        validate_data_size(len, width, height, format)
    }

    /// Map used by materials whose color map has not loaded.
    pub fn white(&self) -> &ManagedTexture {
        &self.white
    }

    /// Environment used before the HDRI arrives: no light contribution.
    pub fn black_environment(&self) -> &ManagedTexture {
        &self.black_environment
    }

    /// Linear sampler, repeating horizontally to hide the sphere seam.
    pub fn sampler_linear(&self) -> &wgpu::Sampler {
        &self.sampler_linear
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }
}

/// Allocate a sampled texture and write mip level 0.
#[allow(clippy::too_many_arguments)]
fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    name: &str,
    data: &[u8],
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    mip_levels: u32,
) -> ManagedTexture {
    let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
    if mip_levels > 1 {
        usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    }
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(name),
        size,
        mip_level_count: mip_levels,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(bytes_per_row(width, format)),
            rows_per_image: None,
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    ManagedTexture {
        texture,
        view,
        dimensions: (width, height),
        format,
        mip_level_count: mip_levels,
    }
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    Ok(())
}

fn validate_data_size(
    actual: usize,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> Result<(), TextureError> {
    let expected = bytes_per_row(width, format) as usize * height as usize;
    if actual != expected {
        return Err(TextureError::DataSizeMismatch {
            actual,
            expected,
            width,
            height,
            format,
        });
    }
    Ok(())
}

fn bytes_per_row(width: u32, format: wgpu::TextureFormat) -> u32 {
    width * format.block_copy_size(None).unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::create_test_device;

    #[test]
    fn test_mip_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(2, 1), 2);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(2048, 1024), 12);
        assert_eq!(mip_level_count(1000, 10), 10);
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            validate_dimensions(0, 16),
            Err(TextureError::ZeroDimensions { .. })
        ));
        assert!(validate_data_size(16 * 4, 4, 4, wgpu::TextureFormat::Rgba8Unorm).is_ok());
        assert!(matches!(
            validate_data_size(10, 4, 4, wgpu::TextureFormat::Rgba8Unorm),
            Err(TextureError::DataSizeMismatch { expected: 64, .. })
        ));
        assert!(validate_data_size(4 * 16, 2, 2, ENVIRONMENT_FORMAT).is_ok());
    }

    #[test]
    fn test_placeholders() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let manager = TextureManager::new(&device, &queue);
        assert_eq!(manager.white().dimensions, (1, 1));
        assert_eq!(manager.white().format, wgpu::TextureFormat::Rgba8UnormSrgb);
        assert_eq!(manager.black_environment().format, ENVIRONMENT_FORMAT);
    }

    #[test]
    fn test_create_texture_with_mipmaps() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let mut manager = TextureManager::new(&device, &queue);
        let data = vec![128u8; 64 * 32 * 4];
        let texture = manager
            .create_texture(&device, &queue, "map", &data, 64, 32, true, true)
            .unwrap();
        assert_eq!(texture.mip_level_count, 7);
        assert_eq!(texture.texture.mip_level_count(), 7);

        let linear = manager
            .create_texture(&device, &queue, "stars", &data, 64, 32, false, true)
            .unwrap();
        assert_eq!(linear.format, wgpu::TextureFormat::Rgba8Unorm);
    }

    #[test]
    fn test_create_texture_rejects_bad_size() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let mut manager = TextureManager::new(&device, &queue);
        let result = manager.create_texture(&device, &queue, "bad", &[0; 7], 2, 2, true, false);
        assert!(matches!(result, Err(TextureError::DataSizeMismatch { .. })));
    }

    #[test]
    fn test_create_float_texture() {
        let Some((device, queue)) = create_test_device() else {
            return;
        };
        let manager = TextureManager::new(&device, &queue);
        let texels = vec![1.5f32; 8 * 4 * 4];
        let texture = manager
            .create_float_texture(&device, &queue, "env", &texels, 8, 4)
            .unwrap();
        assert_eq!(texture.dimensions, (8, 4));
        assert_eq!(texture.mip_level_count, 1);
    }
}
