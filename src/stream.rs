//! Streaming conversion API: emit each item's result as soon as it is ready.
//!
//! [`crate::session::ConversionSession::run`] only reports after the whole
//! batch, and keeps nothing but a generic error for failures. A stream lets a
//! caller show results progressively and see *which* item failed and why.
//! Items are yielded in roster order, also when `concurrency > 1`.

use crate::codec::resolve_codec;
use crate::config::ConversionConfig;
use crate::convert::convert_item;
use crate::error::Heic2JpgError;
use crate::output::{BlobStore, ItemFailure, OutputArtifact};
use crate::roster::SourceItem;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-item results.
pub type ItemStream = Pin<Box<dyn Stream<Item = Result<OutputArtifact, ItemFailure>> + Send>>;

/// Convert `items`, yielding one result per item in input order.
///
/// Successful bytes are parked in `store`, exactly as a batch run would.
///
/// # Errors
/// Only codec resolution can fail ([`Heic2JpgError::ToolNotFound`]); item
/// failures are stream elements.
///
/// # Example
/// ```rust,no_run
/// use heic2jpg::{convert_stream, BlobStore, ConversionConfig, SourceItem};
/// use futures::StreamExt;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let item = SourceItem::from_path("IMG_0001.HEIC").await?;
/// let store = Arc::new(BlobStore::new());
/// let mut stream = convert_stream(vec![item], &ConversionConfig::default(), Arc::clone(&store))?;
/// while let Some(result) = stream.next().await {
///     match result {
///         Ok(a) => println!("{} ({} bytes)", a.name, a.size),
///         Err(f) => eprintln!("{}: {}", f.name, f.error),
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub fn convert_stream(
    items: Vec<SourceItem>,
    config: &ConversionConfig,
    store: Arc<BlobStore>,
) -> Result<ItemStream, Heic2JpgError> {
    let codec = resolve_codec(config)?;
    let total = items.len();
    info!("Starting streaming conversion of {} item(s)", total);

    let concurrency = config.concurrency.max(1);
    let config = config.clone();

    let s = stream::iter(items.into_iter().enumerate())
        .map(move |(index, item)| {
            let codec = Arc::clone(&codec);
            let store = Arc::clone(&store);
            let cfg = config.clone();
            async move {
                convert_item(codec.as_ref(), index, total, &item, &store, &cfg)
                    .await
                    .map_err(|error| ItemFailure {
                        index,
                        name: item.name().to_string(),
                        error,
                    })
            }
        })
        .buffered(concurrency);

    Ok(Box::pin(s))
}
