//! External-decoder codec: shells out to libheif's `heif-convert`.
//!
//! `heif-convert` only works on files, so each call writes the payload into a
//! private [`TempDir`], runs
//!
//! ```text
//! heif-convert -q <1-100> <dir>/input.heic <dir>/output.jpg
//! ```
//!
//! and reads the output back. The directory is removed when the call returns,
//! on success and failure alike.

use super::{quality_percent, ImageCodec, TargetFormat};
use crate::error::CodecError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

/// Binary name looked up on `PATH` by [`CommandCodec::from_path`].
pub const DEFAULT_TOOL: &str = "heif-convert";

/// A codec backed by an external `heif-convert`-compatible binary.
#[derive(Debug, Clone)]
pub struct CommandCodec {
    program: PathBuf,
}

impl CommandCodec {
    /// Use the binary at `program`.
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Find `heif-convert` on `PATH`.
    pub fn from_path() -> Option<Self> {
        which::which(DEFAULT_TOOL).ok().map(Self::new)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    fn tool_error(&self, detail: impl Into<String>) -> CodecError {
        CodecError::Tool {
            tool: self.tool_name(),
            detail: detail.into(),
        }
    }
}

#[async_trait]
impl ImageCodec for CommandCodec {
    fn name(&self) -> &'static str {
        DEFAULT_TOOL
    }

    async fn convert(
        &self,
        payload: &[u8],
        target: TargetFormat,
        quality: f32,
    ) -> Result<Vec<u8>, CodecError> {
        let scratch = TempDir::new()?;
        let input = scratch.path().join("input.heic");
        let output = scratch.path().join(format!("output{}", target.suffix()));

        tokio::fs::write(&input, payload).await?;

        let mut cmd = Command::new(&self.program);
        if target == TargetFormat::Jpeg {
            cmd.arg("-q").arg(quality_percent(quality).to_string());
        }
        cmd.arg(&input)
            .arg(&output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let result = cmd
            .output()
            .await
            .map_err(|e| self.tool_error(format!("failed to spawn: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(self.tool_error(format!(
                "exited with status {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        let bytes = tokio::fs::read(&output)
            .await
            .map_err(|e| self.tool_error(format!("produced no output: {e}")))?;
        debug!(
            "{} wrote {} bytes to {}",
            self.tool_name(),
            bytes.len(),
            output.display()
        );
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_name_from_program_path() {
        let codec = CommandCodec::new(PathBuf::from("/usr/local/bin/heif-convert"));
        assert_eq!(codec.tool_name(), "heif-convert");
        assert_eq!(codec.program(), Path::new("/usr/local/bin/heif-convert"));
    }

    #[tokio::test]
    async fn nonexistent_tool_fails_per_item() {
        let codec = CommandCodec::new(PathBuf::from("nonexistent_tool_xyz_12345"));
        let err = codec
            .convert(b"payload", TargetFormat::Jpeg, 0.9)
            .await
            .unwrap_err();
        match err {
            CodecError::Tool { tool, detail } => {
                assert_eq!(tool, "nonexistent_tool_xyz_12345");
                assert!(detail.contains("spawn"), "unexpected detail: {detail}");
            }
            other => panic!("expected Tool error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_tool_reports_exit_status() {
        // `false` ignores its arguments and exits 1.
        let Ok(path) = which::which("false") else {
            return;
        };
        let err = CommandCodec::new(path)
            .convert(b"payload", TargetFormat::Jpeg, 0.9)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exited with status"), "got: {err}");
    }
}
