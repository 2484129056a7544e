//! Image decoding on worker threads.

use image::imageops::FilterType;

use crate::AssetError;

/// Default cap on decoded image edges, the minimum every wgpu device supports.
pub const DEFAULT_MAX_DIMENSION: u32 = 8192;

/// Width of the prefiltered diffuse environment image.
pub const IRRADIANCE_WIDTH: u32 = 32;
/// Height of the prefiltered diffuse environment image.
pub const IRRADIANCE_HEIGHT: u32 = 16;

/// How a source should be decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    /// 8-bit color map. `srgb` selects the sRGB texture format on upload.
    ColorMap { srgb: bool },
    /// Equirectangular high dynamic range environment.
    Environment,
}

/// Pixel storage, always four channels.
#[derive(Clone, Debug, PartialEq)]
pub enum ImagePixels {
    Rgba8(Vec<u8>),
    Rgba32F(Vec<f32>),
}

/// A decoded image ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: ImagePixels,
    /// Whether the 8-bit channels are sRGB encoded.
    pub srgb: bool,
}

/// Environment map: full-resolution radiance and a blurred low-resolution
/// copy used for diffuse lighting.
#[derive(Clone, Debug, PartialEq)]
pub struct EnvironmentImage {
    pub radiance: DecodedImage,
    pub irradiance: DecodedImage,
}

/// Result of a successful load.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadedAsset {
    Image(DecodedImage),
    Environment(EnvironmentImage),
}

impl LoadedAsset {
    /// Size of the primary image.
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            LoadedAsset::Image(image) => (image.width, image.height),
            LoadedAsset::Environment(env) => (env.radiance.width, env.radiance.height),
        }
    }
}

/// Decode `bytes` into the representation `kind` asks for. The format is
/// detected from the content.
///
/// Images with an edge longer than `max_dimension` are scaled down to fit,
/// keeping their aspect ratio.
pub fn decode(
    bytes: &[u8],
    kind: AssetKind,
    max_dimension: u32,
) -> Result<LoadedAsset, AssetError> {
    let mut image = image::load_from_memory(bytes)?;
    let max_dimension = max_dimension.max(1);
    if image.width() > max_dimension || image.height() > max_dimension {
        log::warn!(
            "Scaling {}x{} image down to fit {max_dimension}",
            image.width(),
            image.height()
        );
        image = image.resize(max_dimension, max_dimension, FilterType::Triangle);
    }
    let (width, height) = (image.width(), image.height());

    match kind {
        AssetKind::ColorMap { srgb } => Ok(LoadedAsset::Image(DecodedImage {
            width,
            height,
            pixels: ImagePixels::Rgba8(image.to_rgba8().into_raw()),
            srgb,
        })),
        AssetKind::Environment => {
            let radiance = image.to_rgba32f().into_raw();
            let out_w = IRRADIANCE_WIDTH.min(width);
            let out_h = IRRADIANCE_HEIGHT.min(height);
            let irradiance = downsample_box(&radiance, width, height, out_w, out_h);
            Ok(LoadedAsset::Environment(EnvironmentImage {
                radiance: DecodedImage {
                    width,
                    height,
                    pixels: ImagePixels::Rgba32F(radiance),
                    srgb: false,
                },
                irradiance: DecodedImage {
                    width: out_w,
                    height: out_h,
                    pixels: ImagePixels::Rgba32F(irradiance),
                    srgb: false,
                },
            }))
        }
    }
}

/// Average RGBA32F texels over the source block covered by each output texel.
fn downsample_box(src: &[f32], width: u32, height: u32, out_w: u32, out_h: u32) -> Vec<f32> {
    let (w, h) = (width as usize, height as usize);
    let (ow, oh) = (out_w.max(1) as usize, out_h.max(1) as usize);
    let mut out = Vec::with_capacity(ow * oh * 4);

    for oy in 0..oh {
        let y0 = oy * h / oh;
        let y1 = ((oy + 1) * h / oh).max(y0 + 1);
        for ox in 0..ow {
            let x0 = ox * w / ow;
            let x1 = ((ox + 1) * w / ow).max(x0 + 1);

            let mut sum = [0.0f32; 4];
            for y in y0..y1 {
                for x in x0..x1 {
                    let i = (y * w + x) * 4;
                    for c in 0..4 {
                        sum[c] += src[i + c];
                    }
                }
            }
            let count = ((y1 - y0) * (x1 - x0)) as f32;
            out.extend(sum.iter().map(|s| s / count));
        }
    }
    out
}
