//! Conversion session: the roster, the last batch's outputs and error, and
//! the converting flag, owned in one place.
//!
//! A session lives as long as the user's workspace (a browser tab, a CLI
//! invocation). All mutation goes through the methods below; `run` takes
//! `&mut self`, so two batches on the same session can never overlap.

use crate::codec::{resolve_codec, ImageCodec};
use crate::config::ConversionConfig;
use crate::convert::convert_batch;
use crate::error::{BatchError, Heic2JpgError};
use crate::output::{BlobStore, ConversionStats, OutputArtifact, OutputRegistry};
use crate::roster::{InputRoster, SourceItem};
use bytes::Bytes;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Read-only view of a session's converting flag, shareable with observers.
#[derive(Debug, Clone)]
pub struct ConvertingStatus(Arc<AtomicBool>);

impl ConvertingStatus {
    pub fn is_converting(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Holds the flag up for as long as it lives.
struct ConvertingGuard(Arc<AtomicBool>);

impl ConvertingGuard {
    fn engage(flag: &Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(Arc::clone(flag))
    }
}

impl Drop for ConvertingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// What a non-empty [`ConversionSession::run`] reports back.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub stats: ConversionStats,
    /// Artifacts of the previous run, now dropped from the registry. Their
    /// handles are still live; release them once nothing displays them.
    pub superseded: Vec<OutputArtifact>,
}

/// Single-session pipeline state.
pub struct ConversionSession {
    config: ConversionConfig,
    codec: Arc<dyn ImageCodec>,
    store: Arc<BlobStore>,
    roster: InputRoster,
    outputs: OutputRegistry,
    last_error: Option<BatchError>,
    converting: Arc<AtomicBool>,
}

impl ConversionSession {
    /// Create a session, resolving the codec up front.
    ///
    /// # Errors
    /// [`Heic2JpgError::ToolNotFound`] when `config.tool_path` does not exist.
    pub fn new(config: ConversionConfig) -> Result<Self, Heic2JpgError> {
        let codec = resolve_codec(&config)?;
        Ok(Self {
            config,
            codec,
            store: Arc::new(BlobStore::new()),
            roster: InputRoster::new(),
            outputs: OutputRegistry::new(),
            last_error: None,
            converting: Arc::new(AtomicBool::new(false)),
        })
    }

    // ── Roster ───────────────────────────────────────────────────────────

    /// Add files picked by the user and dismiss any previous batch error.
    pub fn select(&mut self, candidates: impl IntoIterator<Item = SourceItem>) -> usize {
        self.last_error = None;
        self.roster.add(candidates)
    }

    /// Add dropped files. The batch error, if any, stays visible.
    pub fn drop_in(&mut self, candidates: impl IntoIterator<Item = SourceItem>) -> usize {
        self.roster.add(candidates)
    }

    pub fn remove_at(&mut self, index: usize) -> Option<SourceItem> {
        self.roster.remove_at(index)
    }

    pub fn clear_roster(&mut self) {
        self.roster.clear();
    }

    pub fn roster(&self) -> &InputRoster {
        &self.roster
    }

    // ── Conversion ───────────────────────────────────────────────────────

    /// Convert the whole roster and replace the output set.
    ///
    /// Returns `None` without touching any state when the roster is empty.
    /// Otherwise the converting flag is held for the whole run and dropped on
    /// every exit path, the previous batch error is cleared, and the outputs
    /// are replaced by this run's successes (possibly none).
    pub async fn run(&mut self) -> Option<RunReport> {
        if self.roster.is_empty() {
            debug!("Nothing to convert");
            return None;
        }

        let _guard = ConvertingGuard::engage(&self.converting);
        self.last_error = None;

        let outcome = convert_batch(
            self.roster.items(),
            self.codec.as_ref(),
            &self.store,
            &self.config,
        )
        .await;

        self.last_error = outcome.error;
        let superseded = self.outputs.replace_all(outcome.artifacts);

        Some(RunReport {
            stats: outcome.stats,
            superseded,
        })
    }

    pub fn is_converting(&self) -> bool {
        self.converting.load(Ordering::SeqCst)
    }

    /// A handle that keeps reporting the flag while `run` borrows the session.
    pub fn status(&self) -> ConvertingStatus {
        ConvertingStatus(Arc::clone(&self.converting))
    }

    // ── Results ──────────────────────────────────────────────────────────

    pub fn outputs(&self) -> &[OutputArtifact] {
        self.outputs.list()
    }

    pub fn last_error(&self) -> Option<&BatchError> {
        self.last_error.as_ref()
    }

    /// Bytes of one artifact.
    pub fn materialize(&self, artifact: &OutputArtifact) -> Result<Bytes, Heic2JpgError> {
        self.store
            .get(artifact.handle)
            .ok_or_else(|| Heic2JpgError::ArtifactReleased {
                name: artifact.name.clone(),
                handle: artifact.handle.id(),
            })
    }

    /// The blob store backing every handle this session has issued.
    pub fn store(&self) -> &Arc<BlobStore> {
        &self.store
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn codec_name(&self) -> &'static str {
        self.codec.name()
    }
}
