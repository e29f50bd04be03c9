//! Runtime metadata, flattened into the handful of lookups the monitor needs.
//!
//! V14 and V15 metadata are both accepted. Storage entries, constants and the
//! extrinsic component types are copied out once at decode time so the rest of
//! the crate never matches on the metadata version.

use super::decode::{ScaleValue, scale_field, scale_to_u128};
use crate::error::ChainError;
use frame_metadata::{
    RuntimeMetadata, RuntimeMetadataPrefixed,
    v14::{PalletConstantMetadata, PalletStorageMetadata, StorageEntryType, StorageHasher},
};
use parity_scale_codec::Decode;
use scale_info::{PortableRegistry, form::PortableForm};
use scale_value::scale::decode_as_type;

#[derive(Debug, Clone)]
pub struct StorageEntryInfo {
    pub name: String,
    pub hashers: Vec<StorageHasher>,
    pub value_ty: u32,
}

#[derive(Debug, Clone)]
struct ConstantInfo {
    name: String,
    ty: u32,
    value: Vec<u8>,
}

#[derive(Debug, Clone)]
struct PalletInfo {
    name: String,
    storage_prefix: Option<String>,
    storage: Vec<StorageEntryInfo>,
    constants: Vec<ConstantInfo>,
}

/// Type ids needed to walk an encoded extrinsic.
#[derive(Debug, Clone, Copy)]
pub struct ExtrinsicTypes {
    pub address_ty: u32,
    pub call_ty: u32,
    pub signature_ty: u32,
    pub extra_ty: u32,
}

#[derive(Debug, Clone)]
pub struct Metadata {
    registry: PortableRegistry,
    pallets: Vec<PalletInfo>,
    extrinsic: ExtrinsicTypes,
}

impl Metadata {
    /// Decode the bytes returned by `state_getMetadata`.
    pub fn decode(bytes: &[u8]) -> Result<Self, ChainError> {
        let prefixed = RuntimeMetadataPrefixed::decode(&mut &bytes[..])?;
        Self::from_runtime_metadata(prefixed.1)
    }

    pub fn from_runtime_metadata(metadata: RuntimeMetadata) -> Result<Self, ChainError> {
        match metadata {
            RuntimeMetadata::V14(m) => {
                let pallets = m
                    .pallets
                    .iter()
                    .map(|p| pallet_info(&p.name, p.storage.as_ref(), &p.constants))
                    .collect();
                let extrinsic = v14_extrinsic_types(&m.types, m.extrinsic.ty.id)?;
                Ok(Self {
                    registry: m.types,
                    pallets,
                    extrinsic,
                })
            }
            RuntimeMetadata::V15(m) => {
                let pallets = m
                    .pallets
                    .iter()
                    .map(|p| pallet_info(&p.name, p.storage.as_ref(), &p.constants))
                    .collect();
                let extrinsic = ExtrinsicTypes {
                    address_ty: m.extrinsic.address_ty.id,
                    call_ty: m.extrinsic.call_ty.id,
                    signature_ty: m.extrinsic.signature_ty.id,
                    extra_ty: m.extrinsic.extra_ty.id,
                };
                Ok(Self {
                    registry: m.types,
                    pallets,
                    extrinsic,
                })
            }
            other => Err(ChainError::Metadata(format!(
                "unsupported metadata version V{}",
                other.version()
            ))),
        }
    }

    pub fn registry(&self) -> &PortableRegistry {
        &self.registry
    }

    pub fn extrinsic_types(&self) -> ExtrinsicTypes {
        self.extrinsic
    }

    pub fn has_pallet(&self, pallet: &str) -> bool {
        self.pallet(pallet).is_some()
    }

    /// Storage prefix and entry description of `pallet.entry`.
    pub fn storage_entry(&self, pallet: &str, entry: &str) -> Option<(&str, &StorageEntryInfo)> {
        let info = self.pallet(pallet)?;
        let prefix = info.storage_prefix.as_deref()?;
        let entry = info.storage.iter().find(|e| e.name == entry)?;
        Some((prefix, entry))
    }

    /// Decode the value of a storage entry read from the node.
    pub fn decode_storage_value(
        &self,
        entry: &StorageEntryInfo,
        bytes: &[u8],
    ) -> Result<ScaleValue, ChainError> {
        decode_as_type(&mut &bytes[..], entry.value_ty, &self.registry).map_err(|e| {
            ChainError::UnexpectedShape(format!("storage entry {}: {}", entry.name, e))
        })
    }

    pub fn decode_constant(&self, pallet: &str, name: &str) -> Result<ScaleValue, ChainError> {
        let constant = self
            .pallet(pallet)
            .and_then(|p| p.constants.iter().find(|c| c.name == name))
            .ok_or_else(|| ChainError::Metadata(format!("constant {pallet}.{name} not found")))?;

        decode_as_type(&mut &constant.value[..], constant.ty, &self.registry)
            .map_err(|e| ChainError::Metadata(format!("constant {pallet}.{name}: {e}")))
    }

    /// Ref time of `System.BlockWeights.max_block`. Pre-weight-v2 runtimes store
    /// a plain number there.
    pub fn max_block_weight(&self) -> Result<u64, ChainError> {
        let block_weights = self.decode_constant("System", "BlockWeights")?;
        let max_block = scale_field(&block_weights, "max_block")
            .or_else(|| scale_field(&block_weights, "maxBlock"))
            .ok_or_else(|| {
                ChainError::Metadata("System.BlockWeights has no max_block field".to_string())
            })?;

        let ref_time = scale_field(max_block, "ref_time")
            .or_else(|| scale_field(max_block, "refTime"))
            .map_or_else(|| scale_to_u128(max_block), scale_to_u128)
            .ok_or_else(|| {
                ChainError::Metadata("System.BlockWeights.max_block is not a weight".to_string())
            })?;

        u64::try_from(ref_time)
            .map_err(|_| ChainError::Metadata(format!("max block weight {ref_time} overflows u64")))
    }

    fn pallet(&self, name: &str) -> Option<&PalletInfo> {
        self.pallets.iter().find(|p| p.name == name)
    }
}

fn pallet_info(
    name: &str,
    storage: Option<&PalletStorageMetadata<PortableForm>>,
    constants: &[PalletConstantMetadata<PortableForm>],
) -> PalletInfo {
    let entries = storage
        .map(|s| {
            s.entries
                .iter()
                .map(|entry| match &entry.ty {
                    StorageEntryType::Plain(ty) => StorageEntryInfo {
                        name: entry.name.clone(),
                        hashers: Vec::new(),
                        value_ty: ty.id,
                    },
                    StorageEntryType::Map { hashers, value, .. } => StorageEntryInfo {
                        name: entry.name.clone(),
                        hashers: hashers.clone(),
                        value_ty: value.id,
                    },
                })
                .collect()
        })
        .unwrap_or_default();

    PalletInfo {
        name: name.to_string(),
        storage_prefix: storage.map(|s| s.prefix.clone()),
        storage: entries,
        constants: constants
            .iter()
            .map(|c| ConstantInfo {
                name: c.name.clone(),
                ty: c.ty.id,
                value: c.value.clone(),
            })
            .collect(),
    }
}

// V14 only records the `UncheckedExtrinsic` type; its generic parameters carry
// the address, call, signature and extra types.
fn v14_extrinsic_types(
    registry: &PortableRegistry,
    extrinsic_ty: u32,
) -> Result<ExtrinsicTypes, ChainError> {
    let ty = registry
        .resolve(extrinsic_ty)
        .ok_or_else(|| ChainError::Metadata("extrinsic type not in registry".to_string()))?;

    let param = |name: &str| {
        ty.type_params
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.ty.as_ref())
            .map(|t| t.id)
            .ok_or_else(|| {
                ChainError::Metadata(format!("extrinsic type has no {name} parameter"))
            })
    };

    Ok(ExtrinsicTypes {
        address_ty: param("Address")?,
        call_ty: param("Call")?,
        signature_ty: param("Signature")?,
        extra_ty: param("Extra")?,
    })
}
