// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Live head following.
//!
//! A pump task forwards head notifications into a bounded channel. A single
//! consumer task drains it, so a head is only aggregated once the callback
//! for the previous one has returned.

use crate::aggregator::{BlockAggregator, RealtimeSnapshot};
use crate::chain::{ChainApi, HeadMode, Header};
use crate::error::{ChainError, MonitorError};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

const HEAD_CHANNEL_CAPACITY: usize = 16;

/// Control over a running [`follow`].
///
/// Dropping the handle stops following as well.
pub struct FollowHandle {
    stop: watch::Sender<bool>,
    pump: JoinHandle<()>,
    consumer: JoinHandle<()>,
}

impl FollowHandle {
    /// Stop both tasks and release the subscription. A head already being
    /// processed is finished first.
    pub fn unsubscribe(&self) {
        let _ = self.stop.send(true);
        self.pump.abort();
    }

    /// Resolves once the consumer has stopped, without consuming the handle.
    pub async fn closed(&self) {
        self.stop.closed().await;
    }

    /// Wait until following ends, either after [`Self::unsubscribe`] or when
    /// the node closes the subscription.
    pub async fn join(mut self) {
        if let Err(e) = (&mut self.consumer).await {
            tracing::warn!(error = %e, "Head consumer task failed");
        }
        self.pump.abort();
        let _ = (&mut self.pump).await;
    }
}

impl Drop for FollowHandle {
    fn drop(&mut self) {
        // The pump owns the head stream; aborting it releases the subscription.
        self.pump.abort();
    }
}

/// Timestamp of the block before the current head.
async fn parent_timestamp(chain: &dyn ChainApi, mode: HeadMode) -> Result<u64, ChainError> {
    let at = match mode {
        HeadMode::Best => None,
        HeadMode::Finalized => Some(chain.get_finalized_head().await?),
    };
    let head = chain.get_header(at).await?;
    chain.query_timestamp_at(head.parent_hash).await
}

/// Follow best or finalized heads, calling `on_head` once per notification.
///
/// Failed aggregations and subscription errors are passed to `on_head` as
/// `Err`; following continues until the caller unsubscribes or the
/// subscription ends.
pub async fn follow<F>(
    aggregator: Arc<BlockAggregator>,
    mode: HeadMode,
    mut on_head: F,
) -> Result<FollowHandle, MonitorError>
where
    F: FnMut(Result<RealtimeSnapshot, MonitorError>) + Send + 'static,
{
    let mut previous_timestamp = match parent_timestamp(aggregator.chain().as_ref(), mode).await {
        Ok(timestamp) => timestamp,
        Err(e) => {
            tracing::debug!(error = %e, "No baseline block time, starting from 0");
            0
        }
    };
    let mut heads = aggregator.chain().subscribe_heads(mode).await?;
    tracing::info!(?mode, baseline = previous_timestamp, "Following heads");

    let (tx, mut rx) = mpsc::channel::<Result<Header, ChainError>>(HEAD_CHANNEL_CAPACITY);
    let pump = tokio::spawn(async move {
        while let Some(item) = heads.next().await {
            if tx.send(item).await.is_err() {
                break;
            }
        }
        tracing::info!("Head subscription closed");
    });

    let (stop, mut stopped) = watch::channel(false);
    let consumer = tokio::spawn(async move {
        loop {
            let item = tokio::select! {
                biased;
                _ = stopped.changed() => break,
                item = rx.recv() => match item {
                    Some(item) => item,
                    None => break,
                },
            };

            let header = match item {
                Ok(header) => header,
                Err(e) => {
                    on_head(Err(e.into()));
                    continue;
                }
            };

            let (block, pending) = tokio::join!(
                aggregator.aggregate(header.hash),
                aggregator.chain().get_pending_transactions(),
            );
            let realtime = block.and_then(|block| {
                let pending = pending?;
                let elapsed_ms = block.timestamp.saturating_sub(previous_timestamp);
                previous_timestamp = block.timestamp;
                Ok(RealtimeSnapshot {
                    block,
                    elapsed_ms,
                    pending,
                })
            });
            on_head(realtime);
        }
        tracing::info!("Stopped following heads");
    });

    Ok(FollowHandle {
        stop,
        pump,
        consumer,
    })
}
