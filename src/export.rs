//! Export sink: write artifacts to disk under their output names.

use crate::error::Heic2JpgError;
use crate::output::{BlobStore, OutputArtifact};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write one artifact into `dir` and return the final path.
///
/// Uses atomic write (temp file + rename) to prevent partial files. An
/// existing file with the same name is overwritten. The handle stays live.
///
/// # Errors
/// [`Heic2JpgError::InvalidOutputName`] when the name contains a path
/// component, [`Heic2JpgError::ArtifactReleased`] for a dead handle.
pub async fn write_artifact(
    store: &BlobStore,
    artifact: &OutputArtifact,
    dir: impl AsRef<Path>,
) -> Result<PathBuf, Heic2JpgError> {
    write_as(store, artifact, dir.as_ref(), &artifact.name).await
}

/// Write every artifact into `dir`, then release their handles.
///
/// Repeated names within the batch get a numbered suffix
/// (`IMG_1.jpg`, `IMG_1 (1).jpg`, ...) so no artifact overwrites another.
/// Every name is checked before anything is written. Stops at the first
/// write failure; artifacts not yet written keep their handles.
pub async fn export_all(
    store: &BlobStore,
    artifacts: &[OutputArtifact],
    dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>, Heic2JpgError> {
    let dir = dir.as_ref();
    for artifact in artifacts {
        check_file_name(&artifact.name)?;
    }

    let mut taken = HashSet::with_capacity(artifacts.len());
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let file_name = unique_name(&artifact.name, &mut taken);
        written.push(write_as(store, artifact, dir, &file_name).await?);
        store.release(artifact.handle);
    }
    Ok(written)
}

async fn write_as(
    store: &BlobStore,
    artifact: &OutputArtifact,
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf, Heic2JpgError> {
    check_file_name(file_name)?;
    let bytes = store
        .get(artifact.handle)
        .ok_or_else(|| Heic2JpgError::ArtifactReleased {
            name: artifact.name.clone(),
            handle: artifact.handle.id(),
        })?;

    let path = dir.join(file_name);
    let write_err = |source| Heic2JpgError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_err)?;

    let tmp_path = dir.join(format!(".{file_name}.tmp"));
    tokio::fs::write(&tmp_path, &bytes).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, &path).await.map_err(write_err)?;

    debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Reject names that are empty, `.`/`..`, or carry a directory part.
fn check_file_name(name: &str) -> Result<(), Heic2JpgError> {
    let bare = Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);
    if bare && name != "." && name != ".." {
        Ok(())
    } else {
        Err(Heic2JpgError::InvalidOutputName {
            name: name.to_string(),
        })
    }
}

/// First of `name`, `stem (1).ext`, `stem (2).ext`, ... not yet in `taken`.
fn unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > 0 => name.split_at(dot),
        _ => (name, ""),
    };
    let mut n = 1;
    loop {
        let candidate = format!("{stem} ({n}){ext}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
