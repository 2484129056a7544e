//! Multisampled color target resolved into the swapchain image.

/// Color attachment rendered into when antialiasing is enabled.
///
/// With a sample count of 1 no texture is allocated and passes render
/// straight into the surface.
pub struct MsaaTarget {
    view: Option<wgpu::TextureView>,
    format: wgpu::TextureFormat,
    sample_count: u32,
    width: u32,
    height: u32,
}

impl MsaaTarget {
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let view = (sample_count > 1).then(|| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("msaa-color"),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        });

        Self {
            view,
            format,
            sample_count,
            width,
            height,
        }
    }

    /// Reallocate at a new size. No-op if unchanged.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        if self.width == width.max(1) && self.height == height.max(1) {
            return;
        }
        *self = Self::new(device, self.format, width, height, self.sample_count);
    }

    /// The multisampled view, or `None` when rendering straight to the surface.
    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.view.as_ref()
    }

    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

/// Clamp a requested sample count to what the adapter supports for `format`.
pub fn supported_sample_count(
    adapter: &wgpu::Adapter,
    format: wgpu::TextureFormat,
    requested: u32,
) -> u32 {
    let flags = adapter.get_texture_format_features(format).flags;
    let depth_flags = adapter
        .get_texture_format_features(wgpu::TextureFormat::Depth32Float)
        .flags;
    pick_sample_count(requested, |count| {
        flags.sample_count_supported(count) && depth_flags.sample_count_supported(count)
    })
}

fn pick_sample_count(requested: u32, supported: impl Fn(u32) -> bool) -> u32 {
    let mut count = requested.clamp(1, 16).next_power_of_two().min(16);
    if count > requested.max(1) {
        count /= 2;
    }
    while count > 1 && !supported(count) {
        count /= 2;
    }
    if count != requested {
        log::warn!("MSAA x{} unavailable, using x{}", requested, count.max(1));
    }
    count.max(1)
}
