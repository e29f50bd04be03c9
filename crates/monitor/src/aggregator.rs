// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Block aggregation: everything the monitor shows about one block, gathered
//! concurrently and reconciled into an immutable [`BlockSnapshot`].

use crate::author::AuthorExtractor;
use crate::chain::{BlockHash, ChainApi, ChainEvent, Extrinsic, FeeQuote, Header};
use crate::error::{ChainError, MonitorError};
use crate::fee::{
    DispatchOutcome, FeeCalculator, dispatch_outcome, is_ethereum_transaction, transferred_value,
};
use crate::identity::IdentityResolver;
use futures::future::join_all;
use polkadot_block_monitor_config::MonitorSettings;
use std::sync::Arc;
use tracing::Instrument;

/// One extrinsic with the events it emitted, its outcome and its fee.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtrinsicDetails {
    pub extrinsic: Extrinsic,
    pub events: Vec<ChainEvent>,
    pub outcome: Option<DispatchOutcome>,
    /// Quote obtained against the parent block's state.
    pub quote: FeeQuote,
    pub fee: u128,
    pub transferred: u128,
}

impl ExtrinsicDetails {
    pub fn is_ethereum(&self) -> bool {
        is_ethereum_transaction(&self.extrinsic)
    }

    pub fn is_fee_paying(&self) -> bool {
        FeeCalculator::is_fee_paying(self.outcome.as_ref(), &self.quote)
    }

    pub fn dispatched_weight(&self) -> u64 {
        self.outcome.map_or(0, |o| o.weight)
    }
}

/// Everything known about one block. Never modified once built.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSnapshot {
    pub header: Header,
    /// Author display name, or the zero account when unknown.
    pub author: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    pub extrinsics: Vec<ExtrinsicDetails>,
    /// All events of the block, including those not tied to an extrinsic.
    pub events: Vec<ChainEvent>,
    /// Share of the maximum block weight used, with two decimals.
    pub weight_percent: f64,
    pub total_fees: u128,
    pub total_transferred: u128,
    pub extrinsic_count: usize,
    pub ethereum_count: usize,
}

impl BlockSnapshot {
    pub fn number(&self) -> u64 {
        self.header.number
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash
    }
}

/// A block seen by the live follower.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeSnapshot {
    pub block: BlockSnapshot,
    /// Time since the previously observed block.
    pub elapsed_ms: u64,
    /// Transaction pool contents when the block was processed.
    pub pending: Vec<Extrinsic>,
}

/// `used / max` as a percentage with two decimals, computed on integers.
pub fn weight_percent(used: u64, max: u64) -> f64 {
    if max == 0 {
        return 0.0;
    }
    (u128::from(used) * 10_000 / u128::from(max)) as f64 / 100.0
}

pub struct BlockAggregator {
    chain: Arc<dyn ChainApi>,
    identities: Arc<IdentityResolver>,
    authors: AuthorExtractor,
    fees: FeeCalculator,
}

impl BlockAggregator {
    pub fn new(
        chain: Arc<dyn ChainApi>,
        identities: Arc<IdentityResolver>,
        authors: AuthorExtractor,
        fees: FeeCalculator,
    ) -> Self {
        Self {
            chain,
            identities,
            authors,
            fees,
        }
    }

    pub fn from_settings(
        chain: Arc<dyn ChainApi>,
        identities: Arc<IdentityResolver>,
        settings: &MonitorSettings,
    ) -> Self {
        Self::new(
            chain,
            identities,
            AuthorExtractor::from_settings(settings),
            FeeCalculator::from_settings(settings),
        )
    }

    pub fn chain(&self) -> &Arc<dyn ChainApi> {
        &self.chain
    }

    /// Build the snapshot of block `hash`.
    ///
    /// Any failed fetch fails the whole aggregation. Author identity lookups
    /// are only cached once the snapshot is complete.
    pub async fn aggregate(&self, hash: BlockHash) -> Result<BlockSnapshot, MonitorError> {
        self.build_snapshot(hash)
            .instrument(tracing::debug_span!("aggregate", block_hash = ?hash))
            .await
    }

    async fn build_snapshot(&self, hash: BlockHash) -> Result<BlockSnapshot, MonitorError> {
        let (block, max_weight, events, timestamp) = tokio::join!(
            self.chain.get_block(hash),
            self.chain.query_max_block_weight(),
            self.chain.query_events_at(hash),
            self.chain.query_timestamp_at(hash),
        );
        let (block, max_weight, events, timestamp) = (block?, max_weight?, events?, timestamp?);

        let author = self.authors.extract(&block);
        let parent_hash = block.header.parent_hash;
        let quotes = join_all(
            block
                .extrinsics
                .iter()
                .map(|xt| self.chain.query_fee_quote(&xt.bytes, parent_hash)),
        );
        let author_lookup = async {
            match &author {
                Some(author) => self.identities.lookup_author(author).await,
                None => Ok(self.identities.unknown_author()),
            }
        };
        let (quotes, author_lookup) = tokio::join!(quotes, author_lookup);
        let quotes = quotes.into_iter().collect::<Result<Vec<_>, _>>()?;
        let author_lookup = author_lookup?;

        let mut grouped: Vec<Vec<ChainEvent>> = vec![Vec::new(); block.extrinsics.len()];
        for event in &events {
            let Some(index) = event.extrinsic_index() else {
                continue;
            };
            let Some(group) = grouped.get_mut(index as usize) else {
                return Err(ChainError::UnexpectedShape(format!(
                    "event {}.{} refers to extrinsic {index} of {}",
                    event.pallet,
                    event.method,
                    block.extrinsics.len()
                ))
                .into());
            };
            group.push(event.clone());
        }

        let extrinsics: Vec<ExtrinsicDetails> = block
            .extrinsics
            .into_iter()
            .zip(grouped)
            .zip(quotes)
            .map(|((extrinsic, events), quote)| {
                let outcome = dispatch_outcome(&events);
                let fee = self.fees.extrinsic_fee(&extrinsic, outcome.as_ref(), &quote);
                let transferred = transferred_value(&extrinsic, &events);
                ExtrinsicDetails {
                    extrinsic,
                    events,
                    outcome,
                    quote,
                    fee,
                    transferred,
                }
            })
            .collect();

        let dispatched: u64 = extrinsics
            .iter()
            .map(ExtrinsicDetails::dispatched_weight)
            .fold(0, u64::saturating_add);
        let total_fees = extrinsics
            .iter()
            .filter(|xt| xt.is_fee_paying())
            .map(|xt| xt.fee)
            .fold(0, u128::saturating_add);
        let total_transferred = extrinsics
            .iter()
            .map(|xt| xt.transferred)
            .fold(0, u128::saturating_add);
        let ethereum_count = extrinsics.iter().filter(|xt| xt.is_ethereum()).count();

        let author = self.identities.commit(author_lookup).await;
        let snapshot = BlockSnapshot {
            header: block.header,
            author,
            timestamp,
            extrinsic_count: extrinsics.len(),
            ethereum_count,
            weight_percent: weight_percent(dispatched, max_weight),
            total_fees,
            total_transferred,
            extrinsics,
            events,
        };

        tracing::debug!(
            number = snapshot.number(),
            extrinsics = snapshot.extrinsic_count,
            weight_percent = snapshot.weight_percent,
            "Aggregated block"
        );
        Ok(snapshot)
    }
}
