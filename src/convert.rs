//! Batch conversion: run every roster item through the codec, keep going on
//! failure.
//!
//! A batch is a fold over an ordered stream of per-item futures. Each item is
//! converted on its own; a codec failure is logged, counted and folded into a
//! single [`BatchError`] without touching the remaining items. With the
//! default `concurrency = 1` items are converted strictly one after another.
//! Higher values overlap codec calls via [`StreamExt::buffered`], which still
//! yields results in roster order, so the artifact list always matches the
//! roster minus its failures.

use crate::codec::ImageCodec;
use crate::config::ConversionConfig;
use crate::error::{BatchError, CodecError};
use crate::naming::derive_output_name_for;
use crate::output::{BlobStore, ConversionStats, OutputArtifact};
use crate::roster::SourceItem;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Everything one batch produced.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Successful conversions, in roster order.
    pub artifacts: Vec<OutputArtifact>,
    /// Set when at least one item failed.
    pub error: Option<BatchError>,
    pub stats: ConversionStats,
}

/// Convert `items` in order and collect the results.
///
/// Never fails: per-item codec errors end up in [`BatchOutcome::error`].
/// An empty slice yields an empty outcome and fires no callbacks.
pub async fn convert_batch(
    items: &[SourceItem],
    codec: &dyn ImageCodec,
    store: &BlobStore,
    config: &ConversionConfig,
) -> BatchOutcome {
    if items.is_empty() {
        return BatchOutcome::default();
    }

    let start = Instant::now();
    let total = items.len();
    info!(
        "Converting {} item(s) with {} (concurrency {})",
        total,
        codec.name(),
        config.concurrency
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let mut outcome = stream::iter(items.iter().enumerate())
        .map(|(index, item)| convert_item(codec, index, total, item, store, config))
        .buffered(config.concurrency.max(1))
        .fold(BatchOutcome::default(), |mut acc, result| async move {
            acc.stats.total_items += 1;
            match result {
                Ok(artifact) => {
                    acc.stats.converted_items += 1;
                    acc.stats.output_bytes += artifact.size;
                    acc.artifacts.push(artifact);
                }
                Err(_) => {
                    acc.stats.failed_items += 1;
                    acc.error = Some(BatchError::conversion_failed());
                }
            }
            acc
        })
        .await;

    outcome.stats.input_bytes = items.iter().map(SourceItem::size).sum();
    outcome.stats.total_duration_ms = start.elapsed().as_millis() as u64;

    info!(
        "Batch complete: {}/{} converted, {}ms",
        outcome.stats.converted_items, total, outcome.stats.total_duration_ms
    );

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, outcome.stats.converted_items);
    }

    outcome
}

/// Convert one item and park its bytes in `store`.
///
/// Fires the per-item progress callbacks and logs failures; the error detail
/// goes no further than the returned `Err`.
pub(crate) async fn convert_item(
    codec: &dyn ImageCodec,
    index: usize,
    total: usize,
    item: &SourceItem,
    store: &BlobStore,
    config: &ConversionConfig,
) -> Result<OutputArtifact, CodecError> {
    let start = Instant::now();
    if let Some(ref cb) = config.progress_callback {
        cb.on_item_start(index, total, item.name());
    }

    match codec
        .convert(item.payload(), config.target, config.quality)
        .await
    {
        Ok(encoded) => {
            let name = derive_output_name_for(item.name(), config.target);
            let size = encoded.len() as u64;
            let handle = store.insert(encoded);
            debug!(
                "{} → {}: {} → {} bytes in {:?}",
                item.name(),
                name,
                item.size(),
                size,
                start.elapsed()
            );
            if let Some(ref cb) = config.progress_callback {
                cb.on_item_complete(index, total, &name, size);
            }
            Ok(OutputArtifact { name, handle, size })
        }
        Err(e) => {
            warn!("Error converting '{}': {}", item.name(), e);
            if let Some(ref cb) = config.progress_callback {
                cb.on_item_error(index, total, item.name(), &e.to_string());
            }
            Err(e)
        }
    }
}
