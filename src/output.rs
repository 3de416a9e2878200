//! Conversion results: artifacts, their byte storage, and run statistics.
//!
//! Converted bytes do not live inside [`OutputArtifact`]. They are parked in a
//! [`BlobStore`] and the artifact carries a [`BlobHandle`] to them, the same
//! way a browser hands out object URLs. Whoever presents the artifacts
//! (download button, CLI writer) materialises the bytes through the handle and
//! calls [`BlobStore::release`] when the artifact is discarded. The pipeline
//! itself never releases a handle.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Opaque reference to bytes held in a [`BlobStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobHandle(u64);

impl BlobHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blob:heic2jpg/{}", self.0)
    }
}

/// Session-scoped storage for converted bytes.
///
/// Handles are never reused: every [`insert`](Self::insert) allocates a fresh
/// id, so converting the same roster twice yields different handles.
#[derive(Debug, Default)]
pub struct BlobStore {
    next_id: AtomicU64,
    blobs: Mutex<HashMap<u64, Bytes>>,
}

impl BlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of `bytes` and return a new handle to them.
    pub fn insert(&self, bytes: impl Into<Bytes>) -> BlobHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.lock().insert(id, bytes.into());
        BlobHandle(id)
    }

    /// Bytes behind `handle`, or `None` once released.
    pub fn get(&self, handle: BlobHandle) -> Option<Bytes> {
        self.lock().get(&handle.0).cloned()
    }

    /// Render the bytes as a `data:` URI with the given MIME type.
    pub fn data_uri(&self, handle: BlobHandle, mime_type: &str) -> Option<String> {
        self.get(handle)
            .map(|bytes| format!("data:{};base64,{}", mime_type, STANDARD.encode(&bytes)))
    }

    /// Drop the bytes behind `handle`. Returns `false` if already released.
    pub fn release(&self, handle: BlobHandle) -> bool {
        self.lock().remove(&handle.0).is_some()
    }

    /// Release every handle in `artifacts`; returns how many were live.
    pub fn release_all<'a>(&self, artifacts: impl IntoIterator<Item = &'a OutputArtifact>) -> usize {
        let mut blobs = self.lock();
        artifacts
            .into_iter()
            .filter(|a| blobs.remove(&a.handle.0).is_some())
            .count()
    }

    /// Number of live blobs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Bytes>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One successfully converted file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputArtifact {
    /// Output file name, e.g. `IMG_0001.jpg`.
    pub name: String,
    /// Handle to the encoded bytes in the session's [`BlobStore`].
    pub handle: BlobHandle,
    /// Encoded size in bytes.
    pub size: u64,
}

/// The artifacts of the most recent run.
///
/// Batches are replaced whole, never edited item by item.
#[derive(Debug, Clone, Default)]
pub struct OutputRegistry {
    artifacts: Vec<OutputArtifact>,
}

impl OutputRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new batch and hand back the one it supersedes.
    pub fn replace_all(&mut self, artifacts: Vec<OutputArtifact>) -> Vec<OutputArtifact> {
        std::mem::replace(&mut self.artifacts, artifacts)
    }

    pub fn list(&self) -> &[OutputArtifact] {
        &self.artifacts
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// A failed item as reported by [`crate::stream::convert_stream`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemFailure {
    /// 0-based roster position.
    pub index: usize,
    pub name: String,
    pub error: crate::error::CodecError,
}

/// Summary of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Items attempted.
    pub total_items: usize,
    pub converted_items: usize,
    pub failed_items: usize,
    /// Sum of source payload sizes.
    pub input_bytes: u64,
    /// Sum of artifact sizes.
    pub output_bytes: u64,
    pub total_duration_ms: u64,
}
