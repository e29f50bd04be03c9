// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Metadata-driven decoding of raw extrinsics.

use super::decode::{ScaleValue, scale_to_json};
use super::metadata::Metadata;
use super::types::{DecodedCall, Extrinsic};
use crate::error::ChainError;
use parity_scale_codec::{Compact, Decode};
use scale_value::{Composite, ValueDef, scale::decode_as_type};
use serde_json::Map;

const VERSION_MASK: u8 = 0b0011_1111;
const BARE: u8 = 0b00;
const SIGNED: u8 = 0b10;
const GENERAL: u8 = 0b01;

/// Decode a length-prefixed extrinsic as found in a block body or the pool.
pub fn decode_extrinsic(metadata: &Metadata, bytes: Vec<u8>) -> Result<Extrinsic, ChainError> {
    let types = metadata.extrinsic_types();
    let registry = metadata.registry();

    let mut input = &bytes[..];
    let Compact(len) = Compact::<u32>::decode(&mut input)?;
    if input.len() != len as usize {
        return Err(ChainError::UnexpectedShape(format!(
            "extrinsic length prefix {} does not match body of {} bytes",
            len,
            input.len()
        )));
    }

    let format = u8::decode(&mut input)?;
    let version = format & VERSION_MASK;
    let signed = match (version, format >> 6) {
        (4, SIGNED) => {
            skip_type(&mut input, types.address_ty, metadata, "address")?;
            skip_type(&mut input, types.signature_ty, metadata, "signature")?;
            skip_type(&mut input, types.extra_ty, metadata, "signed extensions")?;
            true
        }
        (4 | 5, BARE) => false,
        (5, GENERAL) => {
            // extension version byte, then the extensions themselves
            u8::decode(&mut input)?;
            skip_type(&mut input, types.extra_ty, metadata, "transaction extensions")?;
            true
        }
        _ => {
            return Err(ChainError::UnexpectedShape(format!(
                "unsupported extrinsic format byte 0x{format:02x}"
            )));
        }
    };

    let call_value = decode_as_type(&mut input, types.call_ty, registry)
        .map_err(|e| ChainError::UnexpectedShape(format!("extrinsic call: {e}")))?;
    if !input.is_empty() {
        return Err(ChainError::UnexpectedShape(format!(
            "{} trailing bytes after extrinsic call",
            input.len()
        )));
    }

    let call = decoded_call(&call_value, metadata)?;
    Ok(Extrinsic {
        bytes,
        signed,
        call,
    })
}

fn skip_type(
    input: &mut &[u8],
    type_id: u32,
    metadata: &Metadata,
    what: &str,
) -> Result<(), ChainError> {
    decode_as_type(input, type_id, metadata.registry())
        .map(|_| ())
        .map_err(|e| ChainError::UnexpectedShape(format!("extrinsic {what}: {e}")))
}

// RuntimeCall::Pallet(pallet::Call::method { args })
fn decoded_call(value: &ScaleValue, metadata: &Metadata) -> Result<DecodedCall, ChainError> {
    let ValueDef::Variant(pallet) = &value.value else {
        return Err(ChainError::UnexpectedShape("call is not a variant".to_string()));
    };
    let Some(ValueDef::Variant(method)) = pallet.values.values().next().map(|v| &v.value) else {
        return Err(ChainError::UnexpectedShape(format!(
            "call of pallet {} has no inner variant",
            pallet.name
        )));
    };

    let registry = metadata.registry();
    let args: Map<_, _> = match &method.values {
        Composite::Named(fields) => fields
            .iter()
            .map(|(name, v)| (name.clone(), scale_to_json(v, registry)))
            .collect(),
        Composite::Unnamed(fields) => fields
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), scale_to_json(v, registry)))
            .collect(),
    };

    Ok(DecodedCall {
        pallet: pallet.name.clone(),
        method: method.name.clone(),
        args,
    })
}
