//! Shared test helpers: an in-memory [`ChainApi`] and builders for the values it serves.

pub mod runtime;

use crate::chain::{
    AccountId, AuthorId, Block, BlockHash, ChainApi, ChainEvent, DecodedCall, DigestLog,
    DispatchClass, EventPhase, Extrinsic, FeeQuote, HeadMode, HeadStream, Header, IdentityRecord,
};
use crate::error::ChainError;
use async_trait::async_trait;
use futures::StreamExt;
use futures::channel::mpsc::{UnboundedSender, unbounded};
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Number of calls made to each [`MockChain`] method.
#[derive(Debug, Default)]
pub struct CallCounters {
    pub get_block: AtomicUsize,
    pub get_block_hash: AtomicUsize,
    pub fee_quotes: AtomicUsize,
    pub identity_queries: AtomicUsize,
    pub identities_batched: AtomicUsize,
    pub author_mappings: AtomicUsize,
    pub pending: AtomicUsize,
}

impl CallCounters {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
struct Failures {
    blocks: HashSet<u64>,
    fee_quotes: bool,
    identities: bool,
    max_weight: bool,
    headers: bool,
}

#[derive(Default)]
struct MockState {
    blocks: HashMap<BlockHash, Block>,
    hashes: HashMap<u64, BlockHash>,
    events: HashMap<BlockHash, Vec<ChainEvent>>,
    timestamps: HashMap<BlockHash, u64>,
    fees: HashMap<Vec<u8>, FeeQuote>,
    identities: HashMap<AccountId, IdentityRecord>,
    mappings: HashMap<AuthorId, AccountId>,
    max_weight: u64,
    pending: Vec<Extrinsic>,
    best: Option<BlockHash>,
    finalized: Option<BlockHash>,
    heads: Option<HeadStream>,
    failures: Failures,
}

/// In-memory chain. Block `n` has hash `n + 1` and parent hash `n`.
pub struct MockChain {
    state: Mutex<MockState>,
    pub calls: CallCounters,
}

impl Default for MockChain {
    fn default() -> Self {
        Self::new()
    }
}

pub fn hash_of(number: u64) -> BlockHash {
    BlockHash::from_low_u64_be(number + 1)
}

fn injected(what: &str) -> ChainError {
    ChainError::UnexpectedShape(format!("injected {what} failure"))
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                max_weight: 1_000_000,
                ..Default::default()
            }),
            calls: CallCounters::default(),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Add block `number` and make it the best block.
    pub fn push_block(
        &self,
        number: u64,
        extrinsics: Vec<Extrinsic>,
        events: Vec<ChainEvent>,
        timestamp: u64,
    ) -> Header {
        self.push_block_with_digest(number, Vec::new(), extrinsics, events, timestamp)
    }

    pub fn push_block_with_digest(
        &self,
        number: u64,
        digest: Vec<DigestLog>,
        extrinsics: Vec<Extrinsic>,
        events: Vec<ChainEvent>,
        timestamp: u64,
    ) -> Header {
        let header = Header {
            number,
            hash: hash_of(number),
            parent_hash: BlockHash::from_low_u64_be(number),
            digest,
        };
        let mut state = self.state();
        state.blocks.insert(
            header.hash,
            Block {
                header: header.clone(),
                extrinsics,
            },
        );
        state.hashes.insert(number, header.hash);
        state.events.insert(header.hash, events);
        state.timestamps.insert(header.hash, timestamp);
        state.best = Some(header.hash);
        header
    }

    /// Empty blocks `from..=to`, with timestamps 6 seconds apart.
    pub fn push_empty_blocks(&self, from: u64, to: u64) {
        for number in from..=to {
            self.push_block(number, Vec::new(), Vec::new(), number * 6_000);
        }
    }

    pub fn header(&self, number: u64) -> Header {
        let state = self.state();
        state.blocks[&hash_of(number)].header.clone()
    }

    pub fn set_fee(&self, extrinsic: &Extrinsic, quote: FeeQuote) {
        self.state().fees.insert(extrinsic.bytes.clone(), quote);
    }

    pub fn set_identity(&self, account: &AccountId, display: &[u8]) {
        self.state().identities.insert(
            account.clone(),
            IdentityRecord {
                display: display.to_vec(),
            },
        );
    }

    pub fn set_author_mapping(&self, author: &AuthorId, account: &AccountId) {
        self.state().mappings.insert(author.clone(), account.clone());
    }

    pub fn set_max_weight(&self, weight: u64) {
        self.state().max_weight = weight;
    }

    pub fn set_pending(&self, pending: Vec<Extrinsic>) {
        self.state().pending = pending;
    }

    pub fn set_best(&self, number: u64) {
        self.state().best = Some(hash_of(number));
    }

    pub fn set_finalized(&self, number: u64) {
        self.state().finalized = Some(hash_of(number));
    }

    pub fn fail_block(&self, number: u64) {
        self.state().failures.blocks.insert(number);
    }

    pub fn fail_fee_quotes(&self, fail: bool) {
        self.state().failures.fee_quotes = fail;
    }

    pub fn fail_identities(&self, fail: bool) {
        self.state().failures.identities = fail;
    }

    pub fn fail_max_weight(&self) {
        self.state().failures.max_weight = true;
    }

    pub fn fail_headers(&self) {
        self.state().failures.headers = true;
    }

    /// Feed for the next head subscription.
    pub fn head_feed(&self) -> UnboundedSender<Result<Header, ChainError>> {
        let (tx, rx) = unbounded();
        self.state().heads = Some(rx.boxed());
        tx
    }
}

#[async_trait]
impl ChainApi for MockChain {
    async fn get_block(&self, hash: BlockHash) -> Result<Block, ChainError> {
        self.calls.get_block.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        let block = state
            .blocks
            .get(&hash)
            .cloned()
            .ok_or_else(|| ChainError::BlockNotFound(format!("{hash:?}")))?;
        if state.failures.blocks.contains(&block.header.number) {
            return Err(injected("block"));
        }
        Ok(block)
    }

    async fn get_block_hash(&self, number: u64) -> Result<BlockHash, ChainError> {
        self.calls.get_block_hash.fetch_add(1, Ordering::SeqCst);
        self.state()
            .hashes
            .get(&number)
            .copied()
            .ok_or_else(|| ChainError::BlockNotFound(number.to_string()))
    }

    async fn get_header(&self, hash: Option<BlockHash>) -> Result<Header, ChainError> {
        let state = self.state();
        if state.failures.headers {
            return Err(injected("header"));
        }
        hash.or(state.best)
            .and_then(|hash| state.blocks.get(&hash))
            .map(|block| block.header.clone())
            .ok_or_else(|| ChainError::BlockNotFound("head".to_string()))
    }

    async fn get_finalized_head(&self) -> Result<BlockHash, ChainError> {
        let state = self.state();
        state
            .finalized
            .or(state.best)
            .ok_or_else(|| ChainError::BlockNotFound("finalized".to_string()))
    }

    async fn query_events_at(&self, hash: BlockHash) -> Result<Vec<ChainEvent>, ChainError> {
        Ok(self.state().events.get(&hash).cloned().unwrap_or_default())
    }

    async fn query_timestamp_at(&self, hash: BlockHash) -> Result<u64, ChainError> {
        self.state()
            .timestamps
            .get(&hash)
            .copied()
            .ok_or_else(|| ChainError::BlockNotFound(format!("{hash:?}")))
    }

    async fn query_max_block_weight(&self) -> Result<u64, ChainError> {
        let state = self.state();
        if state.failures.max_weight {
            return Err(injected("max weight"));
        }
        Ok(state.max_weight)
    }

    async fn query_fee_quote(
        &self,
        extrinsic: &[u8],
        _at: BlockHash,
    ) -> Result<FeeQuote, ChainError> {
        self.calls.fee_quotes.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.failures.fee_quotes {
            return Err(injected("fee quote"));
        }
        Ok(state.fees.get(extrinsic).copied().unwrap_or(FeeQuote {
            pays_fee: true,
            ..Default::default()
        }))
    }

    async fn query_identity_of(
        &self,
        account: &AccountId,
    ) -> Result<Option<IdentityRecord>, ChainError> {
        self.calls.identity_queries.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.failures.identities {
            return Err(injected("identity"));
        }
        Ok(state.identities.get(account).cloned())
    }

    async fn query_identities(
        &self,
        accounts: &[AccountId],
    ) -> Result<Vec<Option<IdentityRecord>>, ChainError> {
        self.calls.identities_batched.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.failures.identities {
            return Err(injected("identity"));
        }
        Ok(accounts
            .iter()
            .map(|account| state.identities.get(account).cloned())
            .collect())
    }

    async fn query_author_mapping(
        &self,
        author: &AuthorId,
    ) -> Result<Option<AccountId>, ChainError> {
        self.calls.author_mappings.fetch_add(1, Ordering::SeqCst);
        Ok(self.state().mappings.get(author).cloned())
    }

    async fn subscribe_heads(&self, _mode: HeadMode) -> Result<HeadStream, ChainError> {
        self.state()
            .heads
            .take()
            .ok_or_else(|| ChainError::Subscription("no head feed".to_string()))
    }

    async fn get_pending_transactions(&self) -> Result<Vec<Extrinsic>, ChainError> {
        self.calls.pending.fetch_add(1, Ordering::SeqCst);
        Ok(self.state().pending.clone())
    }
}

/// Extrinsic with a pre-decoded call. The bytes are unique per call content.
pub fn extrinsic(pallet: &str, method: &str, args: Value) -> Extrinsic {
    let args: Map<String, Value> = match args {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let bytes = format!("{pallet}.{method}({})", Value::Object(args.clone())).into_bytes();
    Extrinsic {
        bytes,
        signed: true,
        call: DecodedCall {
            pallet: pallet.to_string(),
            method: method.to_string(),
            args,
        },
    }
}

pub fn event(phase: EventPhase, pallet: &str, method: &str, data: Vec<Value>) -> ChainEvent {
    ChainEvent {
        phase,
        pallet: pallet.to_string(),
        method: method.to_string(),
        data,
    }
}

/// `DispatchInfo` rendered the way decoded events carry it.
pub fn dispatch_info(weight: u64, class: DispatchClass, pays_fee: bool) -> Value {
    json!({
        "weight": { "ref_time": weight, "proof_size": 0 },
        "class": { "name": format!("{class:?}"), "values": [] },
        "pays_fee": { "name": if pays_fee { "Yes" } else { "No" }, "values": [] },
    })
}

pub fn success(index: u32, weight: u64, pays_fee: bool) -> ChainEvent {
    event(
        EventPhase::ApplyExtrinsic(index),
        "System",
        "ExtrinsicSuccess",
        vec![dispatch_info(weight, DispatchClass::Normal, pays_fee)],
    )
}

pub fn transfer(index: u32, amount: u128) -> ChainEvent {
    event(
        EventPhase::ApplyExtrinsic(index),
        "Balances",
        "Transfer",
        vec![json!("0x01"), json!("0x02"), json!(amount.to_string())],
    )
}
