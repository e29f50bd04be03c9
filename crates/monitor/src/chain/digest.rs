// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! SCALE decoding of header digest items.

use super::types::{CONSENSUS_ENGINE_ID_LEN, ConsensusEngineId, DigestLog};
use crate::error::{ChainError, decode_hex};
use parity_scale_codec::Decode;

/// Wire discriminant of a digest item.
///
/// ChangesTrieRoot (2) and ChangesTrieSignal (3) have been removed from Substrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DigestItemDiscriminant {
    Other = 0,
    Consensus = 4,
    Seal = 5,
    PreRuntime = 6,
    RuntimeEnvironmentUpdated = 8,
}

impl TryFrom<u8> for DigestItemDiscriminant {
    type Error = ChainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Other),
            4 => Ok(Self::Consensus),
            5 => Ok(Self::Seal),
            6 => Ok(Self::PreRuntime),
            8 => Ok(Self::RuntimeEnvironmentUpdated),
            other => Err(ChainError::UnexpectedShape(format!(
                "unknown digest item discriminant {other}"
            ))),
        }
    }
}

/// Decode one SCALE-encoded digest item.
pub fn decode_digest_item(bytes: &[u8]) -> Result<DigestLog, ChainError> {
    let (first, mut rest) = bytes
        .split_first()
        .ok_or_else(|| ChainError::UnexpectedShape("empty digest item".to_string()))?;

    let log = match DigestItemDiscriminant::try_from(*first)? {
        DigestItemDiscriminant::PreRuntime => {
            let (engine, payload) = decode_engine_payload(&mut rest)?;
            DigestLog::PreRuntime(engine, payload)
        }
        DigestItemDiscriminant::Consensus => {
            let (engine, payload) = decode_engine_payload(&mut rest)?;
            DigestLog::Consensus(engine, payload)
        }
        DigestItemDiscriminant::Seal => {
            let (engine, payload) = decode_engine_payload(&mut rest)?;
            DigestLog::Seal(engine, payload)
        }
        DigestItemDiscriminant::Other => DigestLog::Other(Vec::<u8>::decode(&mut rest)?),
        DigestItemDiscriminant::RuntimeEnvironmentUpdated => DigestLog::RuntimeEnvironmentUpdated,
    };

    Ok(log)
}

/// Decode the hex-encoded digest logs of a header as returned by `chain_getHeader`.
pub fn decode_digest_logs(logs: &[String]) -> Result<Vec<DigestLog>, ChainError> {
    logs.iter()
        .map(|log| decode_digest_item(&decode_hex(log)?))
        .collect()
}

// The engine id is 4 raw bytes, the payload a SCALE `Vec<u8>` (compact length + bytes).
fn decode_engine_payload(input: &mut &[u8]) -> Result<(ConsensusEngineId, Vec<u8>), ChainError> {
    if input.len() < CONSENSUS_ENGINE_ID_LEN {
        return Err(ChainError::UnexpectedShape(
            "digest item shorter than a consensus engine id".to_string(),
        ));
    }
    let engine = ConsensusEngineId::decode(input)?;
    let payload = Vec::<u8>::decode(input)?;
    Ok((engine, payload))
}
