//! Domain types handed out by a [`ChainApi`](super::ChainApi) implementation.

use serde_json::{Map, Value};
use std::fmt;

pub use sp_core::H256 as BlockHash;

/// Length of a consensus engine id in digest items.
pub const CONSENSUS_ENGINE_ID_LEN: usize = 4;

pub type ConsensusEngineId = [u8; CONSENSUS_ENGINE_ID_LEN];

/// Opaque account identifier (20 bytes on Ethereum-style chains, 32 elsewhere).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AccountId(Vec<u8>);

impl AccountId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// All-zero account, shown when a block author cannot be mapped to an account.
    pub fn zero(len: usize) -> Self {
        Self(vec![0u8; len])
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

/// Key a block author signs with (collator/validator session key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct AuthorId(Vec<u8>);

impl AuthorId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

/// Header digest item, tagged the same way as on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestLog {
    PreRuntime(ConsensusEngineId, Vec<u8>),
    Consensus(ConsensusEngineId, Vec<u8>),
    Seal(ConsensusEngineId, Vec<u8>),
    RuntimeEnvironmentUpdated,
    Other(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub number: u64,
    pub hash: BlockHash,
    pub parent_hash: BlockHash,
    pub digest: Vec<DigestLog>,
}

impl Header {
    /// Payload of the first pre-runtime digest produced by `engine`.
    pub fn pre_runtime(&self, engine: &ConsensusEngineId) -> Option<&[u8]> {
        self.digest.iter().find_map(|log| match log {
            DigestLog::PreRuntime(id, data) if id == engine => Some(data.as_slice()),
            _ => None,
        })
    }
}

/// Call carried by an extrinsic, with arguments decoded against runtime metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedCall {
    pub pallet: String,
    pub method: String,
    pub args: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extrinsic {
    /// SCALE encoding including the compact length prefix, as submitted to the node.
    pub bytes: Vec<u8>,
    pub signed: bool,
    pub call: DecodedCall,
}

impl Extrinsic {
    pub fn is_call(&self, pallet: &str, method: &str) -> bool {
        self.call.pallet == pallet && self.call.method == method
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.call.args.get(name)
    }

    /// Argument at `position`, regardless of its name.
    pub fn arg_at(&self, position: usize) -> Option<&Value> {
        self.call.args.values().nth(position)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.bytes))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    Initialization,
    ApplyExtrinsic(u32),
    Finalization,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainEvent {
    pub phase: EventPhase,
    pub pallet: String,
    pub method: String,
    pub data: Vec<Value>,
}

impl ChainEvent {
    pub fn is(&self, pallet: &str, method: &str) -> bool {
        self.pallet == pallet && self.method == method
    }

    pub fn extrinsic_index(&self) -> Option<u32> {
        match self.phase {
            EventPhase::ApplyExtrinsic(index) => Some(index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchClass {
    #[default]
    Normal,
    Operational,
    Mandatory,
}

impl DispatchClass {
    /// Parse the class name as found in RPC responses and decoded events.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "operational" => Some(Self::Operational),
            "mandatory" => Some(Self::Mandatory),
            _ => None,
        }
    }
}

/// Pre-dispatch fee estimation for one extrinsic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeQuote {
    pub weight: u64,
    pub partial_fee: u128,
    pub pays_fee: bool,
    pub class: DispatchClass,
}

/// On-chain identity registration. Only the display field is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub display: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub header: Header,
    pub extrinsics: Vec<Extrinsic>,
}

/// Which head notifications to follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadMode {
    #[default]
    Best,
    Finalized,
}
