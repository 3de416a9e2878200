//! Error types for the heic2jpg library.
//!
//! Three error types reflect three distinct failure scopes:
//!
//! * [`Heic2JpgError`] — **Fatal**: something outside the conversion loop went
//!   wrong (bad configuration, unreadable input file, output directory not
//!   writable, decoder tool missing). Returned as `Err(Heic2JpgError)`.
//!
//! * [`CodecError`] — **Per item**: one codec invocation failed. The
//!   orchestrator logs it, skips the item and moves on; it is never
//!   propagated out of a batch run.
//!
//! * [`BatchError`] — **Per batch**: the single user-visible notice that at
//!   least one item in the last run failed. It deliberately does not say
//!   which item or why.

use std::path::PathBuf;
use thiserror::Error;

/// User-facing text of the batch failure notice.
pub const BATCH_FAILURE_MESSAGE: &str = "Failed to convert one or more files. Please try again.";

/// All fatal errors returned by the heic2jpg library.
///
/// Codec failures use [`CodecError`] and never abort a batch.
#[derive(Debug, Error)]
pub enum Heic2JpgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The path has no usable UTF-8 file name.
    #[error("Invalid input '{path}': no file name")]
    InvalidInput { path: PathBuf },

    /// Reading the input failed for another reason.
    #[error("Failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Codec errors ──────────────────────────────────────────────────────
    /// The requested external decoder could not be located.
    #[error("Decoder tool '{tool}' not found.\n{hint}")]
    ToolNotFound { tool: String, hint: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The artifact handle was already released or never existed.
    #[error("Artifact '{name}' is no longer available (handle {handle})")]
    ArtifactReleased { name: String, handle: u64 },

    /// The artifact name is not a bare file name and would leave the output
    /// directory.
    #[error("Invalid output name '{name}': must be a plain file name")]
    InvalidOutputName { name: String },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure of a single codec invocation.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum CodecError {
    /// The payload could not be decoded (malformed or unsupported container).
    #[error("decode failed: {detail}")]
    Decode { detail: String },

    /// The decoded image could not be encoded in the target format.
    #[error("encode failed: {detail}")]
    Encode { detail: String },

    /// The external decoder process failed.
    #[error("{tool} failed: {detail}")]
    Tool { tool: String, detail: String },

    /// Scratch-file I/O around the codec failed.
    #[error("codec I/O error: {detail}")]
    Io { detail: String },
}

impl From<std::io::Error> for CodecError {
    fn from(e: std::io::Error) -> Self {
        CodecError::Io {
            detail: e.to_string(),
        }
    }
}

/// The batch-scoped failure signal of one conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
#[error("{message}")]
pub struct BatchError {
    message: String,
}

impl BatchError {
    /// The generic "one or more conversions failed" notice.
    pub fn conversion_failed() -> Self {
        Self {
            message: BATCH_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_error_display_is_generic() {
        let e = BatchError::conversion_failed();
        assert_eq!(e.to_string(), BATCH_FAILURE_MESSAGE);
        assert_eq!(e.message(), BATCH_FAILURE_MESSAGE);
    }

    #[test]
    fn tool_error_display() {
        let e = CodecError::Tool {
            tool: "heif-convert".into(),
            detail: "exited with status 1".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("heif-convert"), "got: {msg}");
        assert!(msg.contains("status 1"), "got: {msg}");
    }

    #[test]
    fn io_error_converts_to_codec_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let e: CodecError = io.into();
        assert!(matches!(e, CodecError::Io { .. }));
        assert!(e.to_string().contains("disk full"));
    }

    #[test]
    fn artifact_released_display() {
        let e = Heic2JpgError::ArtifactReleased {
            name: "a.jpg".into(),
            handle: 7,
        };
        assert!(e.to_string().contains("a.jpg"));
        assert!(e.to_string().contains("handle 7"));
    }
}
