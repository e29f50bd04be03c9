// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

/// Failures while talking to the node or decoding what it returned.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC request failed: {0}")]
    Rpc(#[from] subxt_rpcs::Error),

    #[error("Block {0} not found")]
    BlockNotFound(String),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Failed to decode SCALE data: {0}")]
    Decode(#[from] parity_scale_codec::Error),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Unexpected data shape: {0}")]
    UnexpectedShape(String),

    #[error("Head subscription failed: {0}")]
    Subscription(String),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Identity display of {account} is not valid UTF-8: {source}")]
    InvalidDisplay {
        account: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Invalid block range: from ({from}) is greater than to ({to})")]
    InvalidRange { from: u64, to: u64 },

    #[error("Concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("Failed to process block #{number}: {source}")]
    Block {
        number: u64,
        #[source]
        source: Box<MonitorError>,
    },
}

impl MonitorError {
    /// Block number a range walk stopped at, if the error came from one.
    pub fn failed_block(&self) -> Option<u64> {
        match self {
            MonitorError::Block { number, .. } => Some(*number),
            _ => None,
        }
    }
}

/// Decode a `0x`-prefixed (or bare) hex string into bytes.
pub(crate) fn decode_hex(value: &str) -> Result<Vec<u8>, ChainError> {
    let hex_str = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(hex_str).map_err(|_| ChainError::InvalidHex(value.to_string()))
}
