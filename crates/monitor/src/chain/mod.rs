//! Chain access: the [`ChainApi`] contract the monitor is written against,
//! its domain types, and the JSON-RPC implementation [`RpcChainApi`].

mod decode;
mod digest;
mod extrinsic;
mod metadata;
mod rpc;
mod storage;
mod types;

pub use decode::{json_field, json_to_bytes, json_to_u128, json_variant_name};
pub use digest::{DigestItemDiscriminant, decode_digest_item, decode_digest_logs};
pub use extrinsic::decode_extrinsic;
pub use metadata::Metadata;
pub use rpc::RpcChainApi;
pub use storage::{hash_key, storage_prefix};
pub use types::*;

use crate::error::ChainError;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Stream of head notifications. Dropping it releases the subscription.
pub type HeadStream = BoxStream<'static, Result<Header, ChainError>>;

/// Everything the monitor reads from a chain.
///
/// Implementations never retry; failures are returned as-is so the caller
/// decides whether to skip, retry or abort.
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Block header and decoded extrinsics.
    async fn get_block(&self, hash: BlockHash) -> Result<Block, ChainError>;

    /// Canonical hash at `number`; [`ChainError::BlockNotFound`] past the head.
    async fn get_block_hash(&self, number: u64) -> Result<BlockHash, ChainError>;

    /// Header at `hash`, or of the best block when `None`.
    async fn get_header(&self, hash: Option<BlockHash>) -> Result<Header, ChainError>;

    async fn get_finalized_head(&self) -> Result<BlockHash, ChainError>;

    /// Events emitted by the block, read from its post-state.
    async fn query_events_at(&self, hash: BlockHash) -> Result<Vec<ChainEvent>, ChainError>;

    /// On-chain timestamp (ms since epoch) set by the block.
    async fn query_timestamp_at(&self, hash: BlockHash) -> Result<u64, ChainError>;

    /// Maximum ref-time weight a block may consume, read at the best block.
    ///
    /// Blocks from before a runtime upgrade are measured against the current limit.
    async fn query_max_block_weight(&self) -> Result<u64, ChainError>;

    /// Fee estimation for an encoded extrinsic against the state at `at`.
    async fn query_fee_quote(&self, extrinsic: &[u8], at: BlockHash)
    -> Result<FeeQuote, ChainError>;

    async fn query_identity_of(
        &self,
        account: &AccountId,
    ) -> Result<Option<IdentityRecord>, ChainError>;

    /// Identities of several accounts with a single storage query, in input order.
    async fn query_identities(
        &self,
        accounts: &[AccountId],
    ) -> Result<Vec<Option<IdentityRecord>>, ChainError>;

    /// Account registered for a block author key.
    async fn query_author_mapping(&self, author: &AuthorId)
    -> Result<Option<AccountId>, ChainError>;

    async fn subscribe_heads(&self, mode: HeadMode) -> Result<HeadStream, ChainError>;

    /// Extrinsics waiting in the node's transaction pool.
    async fn get_pending_transactions(&self) -> Result<Vec<Extrinsic>, ChainError>;
}
