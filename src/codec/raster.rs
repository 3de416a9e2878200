//! Pure-Rust codec on the `image` crate.
//!
//! `image` has no HEIF decoder, so this codec is mostly useful for inputs that
//! are really PNG or JPEG under a `.heic` name, and as a dependency-free
//! fallback. Decoding and encoding are CPU-bound and run in `spawn_blocking`.

use super::{quality_percent, ImageCodec, TargetFormat};
use crate::error::CodecError;
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Decode with `image::load_from_memory`, re-encode as JPEG or PNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

#[async_trait]
impl ImageCodec for RasterCodec {
    fn name(&self) -> &'static str {
        "raster"
    }

    async fn convert(
        &self,
        payload: &[u8],
        target: TargetFormat,
        quality: f32,
    ) -> Result<Vec<u8>, CodecError> {
        let payload = payload.to_vec();
        tokio::task::spawn_blocking(move || convert_blocking(&payload, target, quality))
            .await
            .map_err(|e| CodecError::Decode {
                detail: format!("codec task panicked: {e}"),
            })?
    }
}

fn convert_blocking(
    payload: &[u8],
    target: TargetFormat,
    quality: f32,
) -> Result<Vec<u8>, CodecError> {
    let img = image::load_from_memory(payload).map_err(|e| CodecError::Decode {
        detail: e.to_string(),
    })?;
    debug!("Decoded {}x{} px", img.width(), img.height());
    encode(&img, target, quality)
}

/// Encode an already-decoded image.
pub fn encode(img: &DynamicImage, target: TargetFormat, quality: f32) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::new();
    match target {
        TargetFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            let encoder = JpegEncoder::new_with_quality(&mut buf, quality_percent(quality));
            rgb.write_with_encoder(encoder)
                .map_err(|e| CodecError::Encode {
                    detail: e.to_string(),
                })?;
        }
        TargetFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
                .map_err(|e| CodecError::Encode {
                    detail: e.to_string(),
                })?;
        }
    }
    Ok(buf)
}
