//! Input roster: the ordered list of HEIC files waiting to be converted.
//!
//! Candidates arrive from a file picker, a drag-and-drop target or a command
//! line. The roster keeps only names ending in `.heic` (any case), keeps them
//! in arrival order, and never deduplicates.

use crate::error::Heic2JpgError;
use crate::naming::has_source_suffix;
use bytes::Bytes;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// One user-selected input file.
#[derive(Clone, PartialEq, Eq)]
pub struct SourceItem {
    name: String,
    size: u64,
    payload: Bytes,
}

impl SourceItem {
    /// Wrap an in-memory file. `size` is the payload length.
    pub fn new(name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        Self {
            name: name.into(),
            size: payload.len() as u64,
            payload,
        }
    }

    /// Read a file from disk. The item name is the path's file name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, Heic2JpgError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Heic2JpgError::InvalidInput {
                path: path.to_path_buf(),
            })?
            .to_string();

        let payload = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Heic2JpgError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => Heic2JpgError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => Heic2JpgError::InputReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        debug!("Read {} ({} bytes)", path.display(), payload.len());
        Ok(Self::new(name, payload))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    /// Raw file bytes. Cloning is cheap.
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}

impl fmt::Debug for SourceItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceItem")
            .field("name", &self.name)
            .field("size", &self.size)
            .finish()
    }
}

/// Ordered, duplicate-tolerant collection of accepted [`SourceItem`]s.
#[derive(Debug, Clone, Default)]
pub struct InputRoster {
    items: Vec<SourceItem>,
}

impl InputRoster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append every candidate whose name ends in `.heic`, in the given order.
    ///
    /// Returns how many were accepted.
    pub fn add(&mut self, candidates: impl IntoIterator<Item = SourceItem>) -> usize {
        let before = self.items.len();
        for item in candidates {
            if has_source_suffix(item.name()) {
                self.items.push(item);
            } else {
                debug!("Ignoring '{}': not a .heic file", item.name());
            }
        }
        self.items.len() - before
    }

    /// Remove the item at `index`; later items shift down by one.
    ///
    /// Out-of-range indices are ignored and return `None`.
    pub fn remove_at(&mut self, index: usize) -> Option<SourceItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[SourceItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of the sizes of all items.
    pub fn total_size(&self) -> u64 {
        self.items.iter().map(SourceItem::size).sum()
    }
}
