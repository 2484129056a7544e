//! wgpu rendering: surface management, depth and MSAA targets, textures, and the lit scene pass.

pub mod buffer;
pub mod camera;
pub mod depth;
pub mod gpu;
pub mod msaa;
pub mod pass;
pub mod scene_renderer;
pub mod standard_pipeline;
pub mod surface;
pub mod texture;

#[cfg(test)]
mod test_util;

pub use buffer::{BufferAllocator, MeshBuffer, VertexPositionNormalUv};
pub use camera::{Camera, CameraUniform};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use msaa::{MsaaTarget, supported_sample_count};
pub use pass::{DepthClear, FrameEncoder, RenderPassBuilder};
pub use scene_renderer::{SceneRenderer, draw_order};
pub use standard_pipeline::{ObjectUniform, PipelineKey, STANDARD_SHADER_SOURCE, StandardPipeline};
pub use surface::{PhysicalSize, SurfaceResizeEvent, SurfaceWrapper};
pub use texture::{ManagedTexture, TextureError, TextureManager, mip_level_count};
