//! Configuration types for HEIC-to-JPEG conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Setters clamp obviously out-of-range
//! values; [`ConversionConfigBuilder::build`] rejects the rest.

use crate::codec::{ImageCodec, TargetFormat};
use crate::error::Heic2JpgError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default encoder quality on a 0.0–1.0 scale.
pub const DEFAULT_QUALITY: f32 = 0.9;

/// Configuration for a batch conversion.
///
/// # Example
/// ```rust
/// use heic2jpg::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .quality(0.8)
///     .concurrency(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 2);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Output format. Default: [`TargetFormat::Jpeg`].
    pub target: TargetFormat,

    /// Encoder quality, 0.0–1.0 where 1.0 is maximum fidelity. Default: 0.9.
    ///
    /// 0.9 keeps photographic content visually lossless at roughly half the
    /// size of 1.0. Ignored for PNG output.
    pub quality: f32,

    /// Items converted at once. Default: 1 (strictly sequential).
    ///
    /// Results are always reported in roster order, whatever the value.
    pub concurrency: usize,

    /// Pre-constructed codec. Takes precedence over `tool_path`.
    pub codec: Option<Arc<dyn ImageCodec>>,

    /// Path to a `heif-convert`-compatible binary.
    /// If None along with `codec`, `heif-convert` is looked up on `PATH`.
    pub tool_path: Option<PathBuf>,

    /// Optional per-item progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            target: TargetFormat::default(),
            quality: DEFAULT_QUALITY,
            concurrency: 1,
            codec: None,
            tool_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("target", &self.target)
            .field("quality", &self.quality)
            .field("concurrency", &self.concurrency)
            .field("codec", &self.codec.as_ref().map(|c| c.name()))
            .field("tool_path", &self.tool_path)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn target(mut self, target: TargetFormat) -> Self {
        self.config.target = target;
        self
    }

    /// NaN is kept as-is so that `build()` can reject it.
    pub fn quality(mut self, q: f32) -> Self {
        self.config.quality = if q.is_nan() { q } else { q.clamp(0.0, 1.0) };
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn codec(mut self, codec: Arc<dyn ImageCodec>) -> Self {
        self.config.codec = Some(codec);
        self
    }

    pub fn tool_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.tool_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Heic2JpgError> {
        let c = &self.config;
        if !(0.0..=1.0).contains(&c.quality) {
            return Err(Heic2JpgError::InvalidConfig(format!(
                "Quality must be 0.0–1.0, got {}",
                c.quality
            )));
        }
        if c.concurrency == 0 {
            return Err(Heic2JpgError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
