// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Registry-aware conversion of decoded SCALE values into JSON, plus the
//! helpers used to read numbers and bytes back out of that JSON.
//!
//! Conversion rules:
//! - `Vec<u8>` / `[u8; N]` become `0x`-prefixed hex strings
//! - single-field tuple structs (`AccountId20`, `H256`, `U256`) are unwrapped
//! - named structs become objects, other unnamed composites become arrays
//! - enum variants become `{ "name": ..., "values": ... }`
//! - integers that fit in a `u64`/`i64` become numbers, larger ones strings

use primitive_types::U256;
use scale_info::{PortableRegistry, TypeDef, TypeDefPrimitive};
use scale_value::{BitSequence, Composite, Primitive, ValueDef};
use serde_json::{Map, Value as Json, json};

pub type ScaleValue = scale_value::Value<u32>;

/// Convert a decoded value into JSON, using its type id to tell byte strings,
/// sequences and newtype wrappers apart.
pub fn scale_to_json(value: &ScaleValue, registry: &PortableRegistry) -> Json {
    let type_def = registry.resolve(value.context).map(|ty| &ty.type_def);

    if let Some(type_def) = type_def
        && is_byte_container(type_def, registry)
        && let Some(bytes) = scale_to_bytes(value)
    {
        return Json::String(format!("0x{}", hex::encode(bytes)));
    }

    match &value.value {
        ValueDef::Composite(Composite::Unnamed(values))
            if values.len() == 1 && is_newtype(type_def) =>
        {
            scale_to_json(&values[0], registry)
        }
        ValueDef::Composite(composite) => composite_to_json(composite, registry),
        ValueDef::Variant(variant) => json!({
            "name": variant.name,
            "values": variant_values_to_json(&variant.values, registry),
        }),
        ValueDef::Primitive(primitive) => primitive_to_json(primitive),
        ValueDef::BitSequence(bits) => bits_to_json(bits),
    }
}

fn composite_to_json(composite: &Composite<u32>, registry: &PortableRegistry) -> Json {
    match composite {
        Composite::Named(fields) => Json::Object(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), scale_to_json(value, registry)))
                .collect::<Map<_, _>>(),
        ),
        Composite::Unnamed(values) => Json::Array(
            values
                .iter()
                .map(|value| scale_to_json(value, registry))
                .collect(),
        ),
    }
}

// A variant carrying exactly one unnamed field is shown as that field.
fn variant_values_to_json(values: &Composite<u32>, registry: &PortableRegistry) -> Json {
    match values {
        Composite::Unnamed(fields) if fields.len() == 1 => scale_to_json(&fields[0], registry),
        other => composite_to_json(other, registry),
    }
}

fn primitive_to_json(primitive: &Primitive) -> Json {
    match primitive {
        Primitive::Bool(b) => Json::Bool(*b),
        Primitive::Char(c) => Json::String(c.to_string()),
        Primitive::String(s) => Json::String(s.clone()),
        Primitive::U128(n) => match u64::try_from(*n) {
            Ok(small) => json!(small),
            Err(_) => Json::String(n.to_string()),
        },
        Primitive::I128(n) => match i64::try_from(*n) {
            Ok(small) => json!(small),
            Err(_) => Json::String(n.to_string()),
        },
        Primitive::U256(bytes) | Primitive::I256(bytes) => {
            Json::String(format!("0x{}", hex::encode(bytes)))
        }
    }
}

fn bits_to_json(bits: &BitSequence) -> Json {
    let bytes: Vec<u8> = bits
        .iter()
        .collect::<Vec<_>>()
        .chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, bit)| acc | ((*bit as u8) << i))
        })
        .collect();
    Json::String(format!("0x{}", hex::encode(bytes)))
}

fn is_newtype(type_def: Option<&TypeDef<scale_info::form::PortableForm>>) -> bool {
    match type_def {
        Some(TypeDef::Composite(composite)) => {
            composite.fields.len() == 1 && composite.fields[0].name.is_none()
        }
        _ => false,
    }
}

fn is_byte_container(
    type_def: &TypeDef<scale_info::form::PortableForm>,
    registry: &PortableRegistry,
) -> bool {
    let element = match type_def {
        TypeDef::Sequence(seq) => seq.type_param.id,
        TypeDef::Array(arr) => arr.type_param.id,
        _ => return false,
    };
    registry.resolve(element).is_some_and(|ty| {
        matches!(ty.type_def, TypeDef::Primitive(TypeDefPrimitive::U8))
    })
}

/// Read raw bytes out of a decoded value: a composite of `u8`s, possibly
/// wrapped in single-field composites.
pub fn scale_to_bytes(value: &ScaleValue) -> Option<Vec<u8>> {
    match &value.value {
        ValueDef::Composite(composite) => composite_to_bytes(composite),
        _ => None,
    }
}

/// Same as [`scale_to_bytes`] for the fields of a composite or variant.
pub fn composite_to_bytes(composite: &Composite<u32>) -> Option<Vec<u8>> {
    let values: Vec<&ScaleValue> = composite.values().collect();
    if let [inner] = values.as_slice()
        && matches!(inner.value, ValueDef::Composite(_))
    {
        return scale_to_bytes(inner);
    }
    values
        .into_iter()
        .map(|v| match v.value {
            ValueDef::Primitive(Primitive::U128(n)) => u8::try_from(n).ok(),
            _ => None,
        })
        .collect()
}

/// Read an unsigned integer out of a decoded value.
pub fn scale_to_u128(value: &ScaleValue) -> Option<u128> {
    match &value.value {
        ValueDef::Primitive(Primitive::U128(n)) => Some(*n),
        ValueDef::Composite(composite) => {
            let mut values = composite.values();
            match (values.next(), values.next()) {
                (Some(inner), None) => scale_to_u128(inner),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Field of a named composite (or of a variant with named fields).
pub fn scale_field<'a>(value: &'a ScaleValue, name: &str) -> Option<&'a ScaleValue> {
    let fields = match &value.value {
        ValueDef::Composite(Composite::Named(fields)) => fields,
        ValueDef::Variant(variant) => match &variant.values {
            Composite::Named(fields) => fields,
            Composite::Unnamed(_) => return None,
        },
        _ => return None,
    };
    fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
}

/// Field of a JSON object under either its snake_case or camelCase key.
pub fn json_field<'a>(value: &'a Json, snake: &str, camel: &str) -> Option<&'a Json> {
    value.get(snake).or_else(|| value.get(camel))
}

/// Read an unsigned integer from a JSON number, a decimal or hex string, or
/// the little-endian `u64` limbs of a `U256`. Values above `u128::MAX` saturate.
pub fn json_to_u128(value: &Json) -> Option<u128> {
    match value {
        Json::Number(n) => n.as_u64().map(u128::from),
        Json::String(s) => match s.strip_prefix("0x") {
            Some(hex_str) if hex_str.is_empty() => Some(0),
            Some(hex_str) if hex_str.len() <= 32 => u128::from_str_radix(hex_str, 16).ok(),
            Some(hex_str) => U256::from_str_radix(hex_str, 16)
                .ok()
                .map(|n| u256_to_u128(&n)),
            None => s.parse().ok(),
        },
        Json::Array(limbs) if limbs.len() == 4 => {
            let mut words = [0u64; 4];
            for (word, limb) in words.iter_mut().zip(limbs) {
                *word = limb.as_u64()?;
            }
            Some(u256_to_u128(&U256(words)))
        }
        _ => None,
    }
}

fn u256_to_u128(value: &U256) -> u128 {
    if value.bits() > 128 {
        u128::MAX
    } else {
        value.low_u128()
    }
}

/// Read bytes from a hex string or an array of byte-sized numbers.
pub fn json_to_bytes(value: &Json) -> Option<Vec<u8>> {
    match value {
        Json::String(s) => hex::decode(s.strip_prefix("0x").unwrap_or(s)).ok(),
        Json::Array(items) => items
            .iter()
            .map(|item| item.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect(),
        _ => None,
    }
}

/// Name of a variant rendered by [`scale_to_json`], or a bare string.
pub fn json_variant_name(value: &Json) -> Option<&str> {
    match value {
        Json::String(s) => Some(s.as_str()),
        Json::Object(obj) => obj.get("name").and_then(Json::as_str),
        _ => None,
    }
}
