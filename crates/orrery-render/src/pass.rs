//! Per-frame encoding helpers.
//!
//! [`RenderPassBuilder`] collects the attachments of the scene pass;
//! [`FrameEncoder`] holds the command encoder together with the acquired swapchain image.

/// Depth target for a pass and the value it is cleared to.
#[derive(Debug)]
pub struct DepthClear {
    pub view: wgpu::TextureView,
    pub value: f32,
}

/// Attachment setup for a single color pass with optional depth and MSAA resolve.
#[derive(Debug)]
pub struct RenderPassBuilder {
    clear_color: wgpu::Color,
    depth: Option<DepthClear>,
    msaa_color: Option<wgpu::TextureView>,
    label: Option<&'static str>,
}

impl Default for RenderPassBuilder {
    fn default() -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
            depth: None,
            msaa_color: None,
            label: None,
        }
    }
}

impl RenderPassBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear_color(self, clear_color: wgpu::Color) -> Self {
        Self {
            clear_color,
            ..self
        }
    }

    pub fn depth(self, view: wgpu::TextureView, value: f32) -> Self {
        Self {
            depth: Some(DepthClear { view, value }),
            ..self
        }
    }

    /// `Some` routes color into the multisampled view and resolves it into the target.
    pub fn multisampled(self, msaa_color: Option<wgpu::TextureView>) -> Self {
        Self { msaa_color, ..self }
    }

    pub fn label(self, label: &'static str) -> Self {
        Self {
            label: Some(label),
            ..self
        }
    }

    /// Open the pass on `encoder`. Depth contents are discarded when the pass ends.
    pub fn begin<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        target: &wgpu::TextureView,
    ) -> wgpu::RenderPass<'encoder> {
        let color = match &self.msaa_color {
            Some(samples) => wgpu::RenderPassColorAttachment {
                view: samples,
                resolve_target: Some(target),
                ops: self.color_ops(),
                depth_slice: None,
            },
            None => wgpu::RenderPassColorAttachment {
                view: target,
                resolve_target: None,
                ops: self.color_ops(),
                depth_slice: None,
            },
        };
        let depth = self.depth.as_ref().map(|depth| wgpu::RenderPassDepthStencilAttachment {
            view: &depth.view,
            depth_ops: Some(wgpu::Operations {
                load: wgpu::LoadOp::Clear(depth.value),
                store: wgpu::StoreOp::Discard,
            }),
            stencil_ops: None,
        });

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: self.label,
            color_attachments: &[Some(color)],
            depth_stencil_attachment: depth,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }

    fn color_ops(&self) -> wgpu::Operations<wgpu::Color> {
        wgpu::Operations {
            load: wgpu::LoadOp::Clear(self.clear_color),
            store: wgpu::StoreOp::Store,
        }
    }
}

/// Command encoder and swapchain image for the frame being drawn.
pub struct FrameEncoder {
    encoder: wgpu::CommandEncoder,
    frame: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
}

impl FrameEncoder {
    pub fn new(device: &wgpu::Device, frame: wgpu::SurfaceTexture) -> Self {
        let view = frame.texture.create_view(&Default::default());
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("orrery-frame"),
        });
        Self {
            encoder,
            frame,
            view,
        }
    }

    pub fn parts(&mut self) -> (&mut wgpu::CommandEncoder, &wgpu::TextureView) {
        (&mut self.encoder, &self.view)
    }

    /// Submit everything recorded and present the swapchain image.
    pub fn submit(self, queue: &wgpu::Queue) {
        queue.submit([self.encoder.finish()]);
        self.frame.present();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_pass_clears_black_without_attachments() {
        let builder = RenderPassBuilder::new();
        assert_eq!(builder.clear_color, wgpu::Color::BLACK);
        assert!(builder.depth.is_none());
        assert!(builder.msaa_color.is_none());
        assert_eq!(builder.label, None);
    }

    #[test]
    fn test_setters_keep_earlier_choices() {
        let night = wgpu::Color {
            r: 0.0,
            g: 0.0,
            b: 0.02,
            a: 1.0,
        };
        let builder = RenderPassBuilder::new()
            .clear_color(night)
            .label("scene-pass")
            .multisampled(None);
        assert_eq!(builder.clear_color, night);
        assert_eq!(builder.label, Some("scene-pass"));
        assert!(builder.msaa_color.is_none());
    }
}
