// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! [`ChainApi`] over the legacy Substrate JSON-RPC methods.
//!
//! Storage values and extrinsics are decoded with the runtime metadata of the
//! block they belong to. Metadata is fetched once per spec version.

use super::decode::{json_field, json_to_u128, json_variant_name, scale_to_u128};
use super::digest::decode_digest_item;
use super::extrinsic::decode_extrinsic;
use super::metadata::Metadata;
use super::storage::{StorageLocation, decode_author_mapping, decode_events, decode_identity};
use super::types::{
    AccountId, AuthorId, Block, BlockHash, ChainEvent, DispatchClass, Extrinsic, FeeQuote,
    HeadMode, Header, IdentityRecord,
};
use super::{ChainApi, HeadStream};
use crate::error::{ChainError, decode_hex};
use async_trait::async_trait;
use futures::StreamExt;
use parity_scale_codec::{Compact, Encode};
use serde::Deserialize;
use serde_json::Value;
use sp_crypto_hashing::blake2_256;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use subxt_rpcs::client::{RpcClient, RpcParams, rpc_params};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcDigest {
    logs: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcHeader {
    parent_hash: String,
    number: String,
    state_root: String,
    extrinsics_root: String,
    digest: RpcDigest,
}

#[derive(Debug, Deserialize)]
struct RpcBlock {
    header: RpcHeader,
    extrinsics: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RpcSignedBlock {
    block: RpcBlock,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeVersion {
    spec_version: u32,
}

#[derive(Debug, Deserialize)]
struct StorageChangeSet {
    changes: Vec<(String, Option<String>)>,
}

impl RpcHeader {
    /// Convert into a [`Header`]. Without a known hash, the hash is recomputed
    /// as blake2-256 of the SCALE-encoded header.
    fn into_header(self, known_hash: Option<BlockHash>) -> Result<Header, ChainError> {
        let number = parse_hex_u64(&self.number)?;
        let parent_hash = parse_hash(&self.parent_hash)?;
        let logs = self
            .digest
            .logs
            .iter()
            .map(|log| decode_hex(log))
            .collect::<Result<Vec<_>, _>>()?;

        let hash = match known_hash {
            Some(hash) => hash,
            None => {
                let mut encoded = parent_hash.as_bytes().to_vec();
                Compact(number).encode_to(&mut encoded);
                encoded.extend(parse_hash(&self.state_root)?.as_bytes());
                encoded.extend(parse_hash(&self.extrinsics_root)?.as_bytes());
                Compact(logs.len() as u32).encode_to(&mut encoded);
                for log in &logs {
                    encoded.extend(log);
                }
                BlockHash::from(blake2_256(&encoded))
            }
        };

        Ok(Header {
            number,
            hash,
            parent_hash,
            digest: logs
                .iter()
                .map(|log| decode_digest_item(log))
                .collect::<Result<_, _>>()?,
        })
    }
}

fn parse_hex_u64(value: &str) -> Result<u64, ChainError> {
    u64::from_str_radix(value.trim_start_matches("0x"), 16)
        .map_err(|_| ChainError::InvalidHex(value.to_string()))
}

fn parse_hash(value: &str) -> Result<BlockHash, ChainError> {
    let bytes = decode_hex(value)?;
    if bytes.len() != 32 {
        return Err(ChainError::InvalidHex(value.to_string()));
    }
    Ok(BlockHash::from_slice(&bytes))
}

fn hash_hex(hash: &BlockHash) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}

fn at_params(at: Option<BlockHash>) -> RpcParams {
    match at {
        Some(hash) => rpc_params![hash_hex(&hash)],
        None => rpc_params![],
    }
}

/// Parse a `payment_queryInfo` response.
fn parse_fee_quote(info: &Value) -> Result<FeeQuote, ChainError> {
    let weight = info
        .get("weight")
        .and_then(|w| match w {
            Value::Object(_) => json_field(w, "ref_time", "refTime").and_then(json_to_u128),
            other => json_to_u128(other),
        })
        .ok_or_else(|| ChainError::UnexpectedShape(format!("fee info without weight: {info}")))?;

    let partial_fee = json_field(info, "partial_fee", "partialFee")
        .and_then(json_to_u128)
        .ok_or_else(|| {
            ChainError::UnexpectedShape(format!("fee info without partialFee: {info}"))
        })?;

    let class = info
        .get("class")
        .and_then(json_variant_name)
        .and_then(DispatchClass::from_name)
        .unwrap_or_default();

    Ok(FeeQuote {
        weight: u64::try_from(weight).unwrap_or(u64::MAX),
        partial_fee,
        // queryInfo has no pays-fee flag; the dispatch outcome event refines it
        pays_fee: true,
        class,
    })
}

pub struct RpcChainApi {
    rpc: RpcClient,
    metadata: RwLock<HashMap<u32, Arc<Metadata>>>,
}

impl RpcChainApi {
    pub fn new(rpc: RpcClient) -> Self {
        Self {
            rpc,
            metadata: RwLock::new(HashMap::new()),
        }
    }

    /// Connect to a node over WebSocket or HTTP.
    pub async fn connect(url: &str) -> Result<Self, ChainError> {
        let rpc = if url.starts_with("wss://") || url.starts_with("https://") {
            RpcClient::from_url(url).await?
        } else {
            RpcClient::from_insecure_url(url).await?
        };
        tracing::info!(url, "Connected to node");
        Ok(Self::new(rpc))
    }

    /// Metadata of the runtime active at `at` (best block when `None`).
    async fn metadata_at(&self, at: Option<BlockHash>) -> Result<Arc<Metadata>, ChainError> {
        let version: RuntimeVersion = self
            .rpc
            .request("state_getRuntimeVersion", at_params(at))
            .await?;

        let cached = self
            .metadata
            .read()
            .ok()
            .and_then(|cache| cache.get(&version.spec_version).cloned());
        if let Some(metadata) = cached {
            return Ok(metadata);
        }

        let metadata_hex: String = self.rpc.request("state_getMetadata", at_params(at)).await?;
        let metadata = Arc::new(Metadata::decode(&decode_hex(&metadata_hex)?)?);
        tracing::debug!(spec_version = version.spec_version, "Fetched runtime metadata");

        if let Ok(mut cache) = self.metadata.write() {
            cache.insert(version.spec_version, metadata.clone());
        }
        Ok(metadata)
    }

    async fn storage(&self, key: &str, at: Option<BlockHash>) -> Result<Option<Vec<u8>>, ChainError> {
        let value: Option<String> = match at {
            Some(hash) => {
                self.rpc
                    .request("state_getStorage", rpc_params![key, hash_hex(&hash)])
                    .await?
            }
            None => self.rpc.request("state_getStorage", rpc_params![key]).await?,
        };
        value.map(|v| decode_hex(&v)).transpose()
    }
}

#[async_trait]
impl ChainApi for RpcChainApi {
    async fn get_block(&self, hash: BlockHash) -> Result<Block, ChainError> {
        let (signed_block, metadata) = tokio::join!(
            self.rpc
                .request::<Option<RpcSignedBlock>>("chain_getBlock", rpc_params![hash_hex(&hash)]),
            self.metadata_at(Some(hash)),
        );
        let block = signed_block?
            .ok_or_else(|| ChainError::BlockNotFound(hash_hex(&hash)))?
            .block;
        let metadata = metadata?;

        let extrinsics = block
            .extrinsics
            .iter()
            .map(|hex| decode_extrinsic(&metadata, decode_hex(hex)?))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Block {
            header: block.header.into_header(Some(hash))?,
            extrinsics,
        })
    }

    async fn get_block_hash(&self, number: u64) -> Result<BlockHash, ChainError> {
        let hash: Option<String> = self
            .rpc
            .request("chain_getBlockHash", rpc_params![number])
            .await?;
        let hash = hash.ok_or_else(|| ChainError::BlockNotFound(number.to_string()))?;
        parse_hash(&hash)
    }

    async fn get_header(&self, hash: Option<BlockHash>) -> Result<Header, ChainError> {
        let header: Option<RpcHeader> = self.rpc.request("chain_getHeader", at_params(hash)).await?;
        let header = header.ok_or_else(|| {
            ChainError::BlockNotFound(hash.map_or_else(|| "best".to_string(), |h| hash_hex(&h)))
        })?;
        header.into_header(hash)
    }

    async fn get_finalized_head(&self) -> Result<BlockHash, ChainError> {
        let hash: String = self
            .rpc
            .request("chain_getFinalizedHead", rpc_params![])
            .await?;
        parse_hash(&hash)
    }

    async fn query_events_at(&self, hash: BlockHash) -> Result<Vec<ChainEvent>, ChainError> {
        let metadata = self.metadata_at(Some(hash)).await?;
        let location = StorageLocation::find(&metadata, "System", "Events")
            .ok_or_else(|| ChainError::Metadata("System.Events not found".to_string()))?;

        match self.storage(&location.key(None), Some(hash)).await? {
            Some(bytes) => decode_events(&metadata, &location.decode(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn query_timestamp_at(&self, hash: BlockHash) -> Result<u64, ChainError> {
        let metadata = self.metadata_at(Some(hash)).await?;
        let location = StorageLocation::find(&metadata, "Timestamp", "Now")
            .ok_or_else(|| ChainError::Metadata("Timestamp.Now not found".to_string()))?;

        let Some(bytes) = self.storage(&location.key(None), Some(hash)).await? else {
            return Ok(0);
        };
        scale_to_u128(&location.decode(&bytes)?)
            .and_then(|ms| u64::try_from(ms).ok())
            .ok_or_else(|| ChainError::UnexpectedShape("Timestamp.Now is not a u64".to_string()))
    }

    async fn query_max_block_weight(&self) -> Result<u64, ChainError> {
        self.metadata_at(None).await?.max_block_weight()
    }

    async fn query_fee_quote(
        &self,
        extrinsic: &[u8],
        at: BlockHash,
    ) -> Result<FeeQuote, ChainError> {
        let encoded = format!("0x{}", hex::encode(extrinsic));
        let info: Value = self
            .rpc
            .request("payment_queryInfo", rpc_params![encoded, hash_hex(&at)])
            .await?;
        parse_fee_quote(&info)
    }

    async fn query_identity_of(
        &self,
        account: &AccountId,
    ) -> Result<Option<IdentityRecord>, ChainError> {
        let metadata = self.metadata_at(None).await?;
        let Some(location) = StorageLocation::find(&metadata, "Identity", "IdentityOf") else {
            return Ok(None);
        };

        match self.storage(&location.key(Some(account.as_bytes())), None).await? {
            Some(bytes) => Ok(decode_identity(&location.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn query_identities(
        &self,
        accounts: &[AccountId],
    ) -> Result<Vec<Option<IdentityRecord>>, ChainError> {
        if accounts.is_empty() {
            return Ok(Vec::new());
        }

        let metadata = self.metadata_at(None).await?;
        let Some(location) = StorageLocation::find(&metadata, "Identity", "IdentityOf") else {
            return Ok(vec![None; accounts.len()]);
        };

        let keys: Vec<String> = accounts
            .iter()
            .map(|account| location.key(Some(account.as_bytes())))
            .collect();
        let change_sets: Vec<StorageChangeSet> = self
            .rpc
            .request("state_queryStorageAt", rpc_params![keys.clone()])
            .await?;

        let values: HashMap<String, Option<String>> = change_sets
            .into_iter()
            .flat_map(|set| set.changes)
            .map(|(key, value)| (key.to_ascii_lowercase(), value))
            .collect();

        keys.iter()
            .map(|key| match values.get(key).cloned().flatten() {
                Some(hex) => Ok(decode_identity(&location.decode(&decode_hex(&hex)?)?)),
                None => Ok(None),
            })
            .collect()
    }

    async fn query_author_mapping(
        &self,
        author: &AuthorId,
    ) -> Result<Option<AccountId>, ChainError> {
        let metadata = self.metadata_at(None).await?;
        let Some(location) = StorageLocation::find(&metadata, "AuthorMapping", "MappingWithDeposit")
        else {
            return Ok(None);
        };

        match self.storage(&location.key(Some(author.as_bytes())), None).await? {
            Some(bytes) => Ok(decode_author_mapping(&location.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn subscribe_heads(&self, mode: HeadMode) -> Result<HeadStream, ChainError> {
        let (method, unsubscribe) = match mode {
            HeadMode::Best => ("chain_subscribeNewHeads", "chain_unsubscribeNewHeads"),
            HeadMode::Finalized => (
                "chain_subscribeFinalizedHeads",
                "chain_unsubscribeFinalizedHeads",
            ),
        };

        let subscription = self
            .rpc
            .subscribe::<RpcHeader>(method, rpc_params![], unsubscribe)
            .await?;
        tracing::info!(method, "Subscribed to heads");

        Ok(subscription
            .map(|item| {
                item.map_err(|e| ChainError::Subscription(e.to_string()))
                    .and_then(|header| header.into_header(None))
            })
            .boxed())
    }

    async fn get_pending_transactions(&self) -> Result<Vec<Extrinsic>, ChainError> {
        let (pending, metadata) = tokio::join!(
            self.rpc
                .request::<Vec<String>>("author_pendingExtrinsics", rpc_params![]),
            self.metadata_at(None),
        );
        let metadata = metadata?;

        pending?
            .iter()
            .map(|hex| decode_extrinsic(&metadata, decode_hex(hex)?))
            .collect()
    }
}
