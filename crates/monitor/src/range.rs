//! Historical replay of a closed block range.

use crate::aggregator::{BlockAggregator, BlockSnapshot};
use crate::error::MonitorError;
use futures::future::join_all;

/// Aggregate blocks `from..=to` and hand them to `on_block` in increasing order.
///
/// Blocks are processed in sequential batches of `concurrency`; a batch is
/// complete before any of its snapshots is delivered. The first failing block
/// stops the walk: earlier blocks of its batch are still delivered, and the
/// returned [`MonitorError::Block`] names the block to resume from.
///
/// Returns the number of delivered blocks.
pub async fn walk_range<F>(
    aggregator: &BlockAggregator,
    from: u64,
    to: u64,
    concurrency: usize,
    mut on_block: F,
) -> Result<u64, MonitorError>
where
    F: FnMut(BlockSnapshot),
{
    if from > to {
        return Err(MonitorError::InvalidRange { from, to });
    }
    if concurrency == 0 {
        return Err(MonitorError::InvalidConcurrency);
    }

    tracing::info!(from, to, concurrency, "Walking block range");
    let batch_size = u64::try_from(concurrency).unwrap_or(u64::MAX);
    let mut delivered = 0;
    let mut start = from;
    loop {
        let end = start.saturating_add(batch_size - 1).min(to);
        let results = join_all((start..=end).map(|number| async move {
            snapshot_at(aggregator, number)
                .await
                .map_err(|source| MonitorError::Block {
                    number,
                    source: Box::new(source),
                })
        }))
        .await;

        for result in results {
            on_block(result?);
            delivered += 1;
        }

        if end == to {
            break;
        }
        start = end + 1;
    }

    tracing::info!(from, to, blocks = delivered, "Finished block range");
    Ok(delivered)
}

async fn snapshot_at(aggregator: &BlockAggregator, number: u64) -> Result<BlockSnapshot, MonitorError> {
    let hash = aggregator.chain().get_block_hash(number).await?;
    aggregator.aggregate(hash).await
}
