//! Storage key construction and decoding of the storage values the monitor reads.

use super::decode::{
    ScaleValue, composite_to_bytes, scale_field, scale_to_bytes, scale_to_json, scale_to_u128,
};
use super::metadata::{Metadata, StorageEntryInfo};
use super::types::{AccountId, ChainEvent, EventPhase, IdentityRecord};
use crate::error::ChainError;
use frame_metadata::v14::StorageHasher;
use scale_value::{Composite, ValueDef};
use sp_crypto_hashing::{blake2_128, blake2_256, twox_64, twox_128, twox_256};

/// `twox128(pallet) ++ twox128(entry)`.
pub fn storage_prefix(pallet_prefix: &str, entry: &str) -> Vec<u8> {
    let mut key = twox_128(pallet_prefix.as_bytes()).to_vec();
    key.extend_from_slice(&twox_128(entry.as_bytes()));
    key
}

/// Hash an encoded map key with the hasher declared in metadata.
pub fn hash_key(hasher: &StorageHasher, key: &[u8]) -> Vec<u8> {
    match hasher {
        StorageHasher::Blake2_128 => blake2_128(key).to_vec(),
        StorageHasher::Blake2_256 => blake2_256(key).to_vec(),
        StorageHasher::Blake2_128Concat => {
            let mut hashed = blake2_128(key).to_vec();
            hashed.extend_from_slice(key);
            hashed
        }
        StorageHasher::Twox128 => twox_128(key).to_vec(),
        StorageHasher::Twox256 => twox_256(key).to_vec(),
        StorageHasher::Twox64Concat => {
            let mut hashed = twox_64(key).to_vec();
            hashed.extend_from_slice(key);
            hashed
        }
        StorageHasher::Identity => key.to_vec(),
    }
}

/// A resolved storage entry, ready to build keys and decode values.
pub struct StorageLocation<'a> {
    metadata: &'a Metadata,
    prefix: Vec<u8>,
    entry: &'a StorageEntryInfo,
}

impl<'a> StorageLocation<'a> {
    /// `None` when the runtime has no such pallet or entry.
    pub fn find(metadata: &'a Metadata, pallet: &str, entry: &str) -> Option<Self> {
        let (pallet_prefix, entry) = metadata.storage_entry(pallet, entry)?;
        Some(Self {
            metadata,
            prefix: storage_prefix(pallet_prefix, &entry.name),
            entry,
        })
    }

    /// Hex key of a plain value, or of a map entry when `key` is the encoded map key.
    pub fn key(&self, key: Option<&[u8]>) -> String {
        let mut full = self.prefix.clone();
        if let (Some(key), Some(hasher)) = (key, self.entry.hashers.first()) {
            full.extend(hash_key(hasher, key));
        }
        format!("0x{}", hex::encode(full))
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<ScaleValue, ChainError> {
        self.metadata.decode_storage_value(self.entry, bytes)
    }
}

/// Decode the `System.Events` value into events tagged with their phase.
pub fn decode_events(metadata: &Metadata, value: &ScaleValue) -> Result<Vec<ChainEvent>, ChainError> {
    let ValueDef::Composite(records) = &value.value else {
        return Err(ChainError::UnexpectedShape(
            "System.Events is not a sequence".to_string(),
        ));
    };

    records
        .values()
        .map(|record| decode_event_record(metadata, record))
        .collect()
}

fn decode_event_record(metadata: &Metadata, record: &ScaleValue) -> Result<ChainEvent, ChainError> {
    let phase = scale_field(record, "phase")
        .ok_or_else(|| ChainError::UnexpectedShape("event record without phase".to_string()))?;
    let phase = match &phase.value {
        ValueDef::Variant(v) if v.name == "ApplyExtrinsic" => {
            let index = v
                .values
                .values()
                .next()
                .and_then(scale_to_u128)
                .and_then(|i| u32::try_from(i).ok())
                .ok_or_else(|| {
                    ChainError::UnexpectedShape("ApplyExtrinsic phase without index".to_string())
                })?;
            EventPhase::ApplyExtrinsic(index)
        }
        ValueDef::Variant(v) if v.name == "Finalization" => EventPhase::Finalization,
        ValueDef::Variant(v) if v.name == "Initialization" => EventPhase::Initialization,
        _ => {
            return Err(ChainError::UnexpectedShape(
                "unknown event phase".to_string(),
            ));
        }
    };

    // RuntimeEvent::Pallet(pallet::Event::Method { .. })
    let event = scale_field(record, "event")
        .ok_or_else(|| ChainError::UnexpectedShape("event record without event".to_string()))?;
    let ValueDef::Variant(pallet) = &event.value else {
        return Err(ChainError::UnexpectedShape("event is not a variant".to_string()));
    };
    let Some(ValueDef::Variant(method)) = pallet.values.values().next().map(|v| &v.value) else {
        return Err(ChainError::UnexpectedShape(format!(
            "event of pallet {} has no inner variant",
            pallet.name
        )));
    };

    let registry = metadata.registry();
    Ok(ChainEvent {
        phase,
        pallet: pallet.name.clone(),
        method: method.name.clone(),
        data: method
            .values
            .values()
            .map(|field| scale_to_json(field, registry))
            .collect(),
    })
}

/// Pull the display name out of an `Identity.IdentityOf` value.
///
/// Newer runtimes store `(Registration, Option<Username>)`, older ones the
/// bare `Registration`. Only `Data::Raw*` displays are readable; anything
/// else counts as no display name.
pub fn decode_identity(value: &ScaleValue) -> Option<IdentityRecord> {
    let registration = match &value.value {
        ValueDef::Composite(Composite::Unnamed(parts)) => parts.first()?,
        _ => value,
    };
    let info = scale_field(registration, "info")?;
    let display = scale_field(info, "display")?;

    match &display.value {
        ValueDef::Variant(data) if data.name.starts_with("Raw") => {
            composite_to_bytes(&data.values).map(|display| IdentityRecord { display })
        }
        _ => None,
    }
}

/// Pull the account out of an `AuthorMapping.MappingWithDeposit` value.
pub fn decode_author_mapping(value: &ScaleValue) -> Option<AccountId> {
    scale_field(value, "account")
        .and_then(scale_to_bytes)
        .map(AccountId::new)
}
