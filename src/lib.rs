//! # heic2jpg
//!
//! Batch-convert HEIC images to JPEG, one file at a time, without letting a
//! single bad file sink the batch.
//!
//! ## Pipeline Overview
//!
//! ```text
//! candidates (picker / drop / CLI args)
//!  │
//!  ├─ 1. Roster    keep *.heic (any case), in order, duplicates allowed
//!  ├─ 2. Codec     heif-convert / image crate / your own ImageCodec
//!  ├─ 3. Batch     per-item isolation, one generic batch error
//!  ├─ 4. Registry  artifacts (name, blob handle, size), replaced per run
//!  └─ 5. Export    materialise bytes by handle, write, release
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use heic2jpg::{ConversionConfig, ConversionSession, SourceItem, format_byte_size};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = ConversionSession::new(ConversionConfig::default())?;
//!     session.select(vec![SourceItem::from_path("IMG_0001.HEIC").await?]);
//!
//!     session.run().await;
//!     for artifact in session.outputs() {
//!         println!("{}  {}", artifact.name, format_byte_size(artifact.size));
//!     }
//!     if let Some(err) = session.last_error() {
//!         eprintln!("{err}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `heic2jpg` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! heic2jpg = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod codec;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod naming;
pub mod output;
pub mod progress;
pub mod roster;
pub mod session;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use codec::{resolve_codec, CommandCodec, ImageCodec, RasterCodec, TargetFormat};
pub use config::{ConversionConfig, ConversionConfigBuilder, DEFAULT_QUALITY};
pub use convert::{convert_batch, BatchOutcome};
pub use error::{BatchError, CodecError, Heic2JpgError, BATCH_FAILURE_MESSAGE};
pub use export::{export_all, write_artifact};
pub use naming::{derive_output_name, derive_output_name_for, format_byte_size, has_source_suffix};
pub use output::{BlobHandle, BlobStore, ConversionStats, ItemFailure, OutputArtifact, OutputRegistry};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use roster::{InputRoster, SourceItem};
pub use session::{ConversionSession, ConvertingStatus, RunReport};
pub use stream::{convert_stream, ItemStream};
