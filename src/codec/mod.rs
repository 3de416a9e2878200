//! Codec adapters: the black box that turns one HEIC payload into JPEG bytes.
//!
//! The orchestrator never looks inside a codec. It hands over the raw payload,
//! the target format and a quality factor, and gets back either an encoded
//! buffer or a [`CodecError`]. Anything implementing [`ImageCodec`] can be
//! plugged in through [`crate::config::ConversionConfigBuilder::codec`].
//!
//! ## Built-in codecs
//!
//! | Codec | Backend | Decodes HEIC |
//! |-------|---------|--------------|
//! | [`CommandCodec`] | external `heif-convert` (libheif) | yes |
//! | [`RasterCodec`]  | pure-Rust `image` crate | no — PNG/JPEG only |
//!
//! [`resolve_codec`] picks one from the configuration.

pub mod command;
pub mod raster;

pub use command::CommandCodec;
pub use raster::RasterCodec;

use crate::config::ConversionConfig;
use crate::error::{CodecError, Heic2JpgError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Output raster format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetFormat {
    /// Baseline JPEG, `.jpg`. (default)
    #[default]
    Jpeg,
    /// Lossless PNG, `.png`. Quality is ignored.
    Png,
}

impl TargetFormat {
    /// File suffix including the leading dot.
    pub fn suffix(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => ".jpg",
            TargetFormat::Png => ".png",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "image/jpeg",
            TargetFormat::Png => "image/png",
        }
    }
}

/// Map a 0.0–1.0 quality factor onto the 1–100 scale encoders expect.
pub fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// A format converter invoked once per source item.
///
/// Implementations must be `Send + Sync`; with `concurrency > 1` several
/// calls may be in flight at once.
#[async_trait]
pub trait ImageCodec: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Convert `payload` into an encoded `target` buffer.
    ///
    /// `quality` is on a 0.0–1.0 scale where 1.0 is maximum fidelity.
    async fn convert(
        &self,
        payload: &[u8],
        target: TargetFormat,
        quality: f32,
    ) -> Result<Vec<u8>, CodecError>;
}

/// Pick the codec for a run, from most-specific to least-specific.
///
/// 1. **Pre-built codec** (`config.codec`) — used as-is.
/// 2. **Explicit tool path** (`config.tool_path`) — must exist, otherwise
///    [`Heic2JpgError::ToolNotFound`].
/// 3. **`heif-convert` on `PATH`**.
/// 4. **[`RasterCodec`]** — always available, but cannot read HEIC, so every
///    real HEIC item will fail. A warning is logged.
pub fn resolve_codec(config: &ConversionConfig) -> Result<Arc<dyn ImageCodec>, Heic2JpgError> {
    if let Some(ref codec) = config.codec {
        return Ok(Arc::clone(codec));
    }

    if let Some(ref path) = config.tool_path {
        if !path.exists() {
            return Err(Heic2JpgError::ToolNotFound {
                tool: path.display().to_string(),
                hint: "The configured decoder path does not exist.".to_string(),
            });
        }
        return Ok(Arc::new(CommandCodec::new(path.clone())));
    }

    if let Some(codec) = CommandCodec::from_path() {
        debug!("Using {} at {}", codec.name(), codec.program().display());
        return Ok(Arc::new(codec));
    }

    warn!(
        "heif-convert not found on PATH; falling back to the built-in raster codec, \
         which cannot decode HEIC. Install libheif (heif-convert) for real conversions."
    );
    Ok(Arc::new(RasterCodec))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl ImageCodec for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn convert(
            &self,
            payload: &[u8],
            _target: TargetFormat,
            _quality: f32,
        ) -> Result<Vec<u8>, CodecError> {
            Ok(payload.to_vec())
        }
    }

    #[test]
    fn quality_mapping() {
        assert_eq!(quality_percent(0.9), 90);
        assert_eq!(quality_percent(1.0), 100);
        assert_eq!(quality_percent(0.0), 1);
        assert_eq!(quality_percent(0.555), 56);
    }

    #[test]
    fn target_format_suffix_and_mime() {
        assert_eq!(TargetFormat::default(), TargetFormat::Jpeg);
        assert_eq!(TargetFormat::Jpeg.suffix(), ".jpg");
        assert_eq!(TargetFormat::Png.mime_type(), "image/png");
    }

    #[test]
    fn prebuilt_codec_wins() {
        let config = ConversionConfig::builder()
            .codec(Arc::new(Echo))
            .tool_path("/definitely/not/here/heif-convert")
            .build()
            .unwrap();
        let codec = resolve_codec(&config).expect("pre-built codec");
        assert_eq!(codec.name(), "echo");
    }

    #[test]
    fn missing_tool_path_is_fatal() {
        let config = ConversionConfig::builder()
            .tool_path("/definitely/not/here/heif-convert")
            .build()
            .unwrap();
        let err = resolve_codec(&config).err().expect("should fail");
        assert!(matches!(err, Heic2JpgError::ToolNotFound { .. }));
    }

    #[tokio::test]
    async fn trait_object_is_callable() {
        let codec: Arc<dyn ImageCodec> = Arc::new(Echo);
        let out = codec.convert(b"abc", TargetFormat::Jpeg, 0.9).await.unwrap();
        assert_eq!(out, b"abc");
    }
}
