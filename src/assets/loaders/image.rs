use futures::future::BoxFuture;
use wgpu::TextureFormat;

use crate::assets::decoders::TextureDecoder;
use crate::assets::io::{AssetReader, FileAssetReader};
use crate::assets::kind::{classify_environment, display_name};
use crate::errors::{MirageError, Result};
use crate::resources::texture::{EnvironmentKind, Texture};

/// Built-in [`TextureDecoder`] for background panoramas.
///
/// LDR images decode to `Rgba8UnormSrgb`; `.hdr` and `.exr` decode to
/// `Rgba16Float`. Decoding runs on the blocking pool on native targets.
#[derive(Debug, Clone, Default)]
pub struct ImageTextureDecoder<R = FileAssetReader> {
    reader: R,
}

impl<R: AssetReader> ImageTextureDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: AssetReader> TextureDecoder for ImageTextureDecoder<R> {
    fn decode<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Texture>> {
        Box::pin(async move {
            let kind = classify_environment(path)?;
            let bytes = self.reader.read_bytes(path).await?;
            let label = display_name(path).to_string();
            decode_image_async(bytes, kind, label).await
        })
    }
}

async fn decode_image_async(bytes: Vec<u8>, kind: EnvironmentKind, label: String) -> Result<Texture> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::task::spawn_blocking(move || decode_image_cpu(&bytes, kind, &label)).await?
    }
    #[cfg(target_arch = "wasm32")]
    {
        decode_image_cpu(&bytes, kind, &label)
    }
}

/// Decodes an in-memory image into a texture of the format `kind` calls for.
pub fn decode_image_cpu(bytes: &[u8], kind: EnvironmentKind, label: &str) -> Result<Texture> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| MirageError::ImageDecodeError(format!("Failed to decode image {label}: {e}")))?;
    let (width, height) = (img.width(), img.height());

    match kind {
        EnvironmentKind::Equirectangular => Ok(Texture::new(
            label,
            width,
            height,
            TextureFormat::Rgba8UnormSrgb,
            img.into_rgba8().into_raw(),
        )),
        EnvironmentKind::HighDynamicRange => {
            let rgb32f = img.into_rgb32f();
            let mut data = Vec::with_capacity((width * height * 4) as usize * 2);
            for pixel in rgb32f.pixels() {
                for channel in [pixel[0], pixel[1], pixel[2], 1.0] {
                    data.extend_from_slice(&half::f16::from_f32(channel).to_le_bytes());
                }
            }
            Ok(Texture::new(label, width, height, TextureFormat::Rgba16Float, data))
        }
    }
}

/// Decodes a color map (base color and similar) as sRGB RGBA8.
pub fn decode_color_map(bytes: &[u8], label: &str) -> Result<Texture> {
    decode_image_cpu(bytes, EnvironmentKind::Equirectangular, label)
}
