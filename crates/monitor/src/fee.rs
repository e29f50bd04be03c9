// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Dispatch outcomes, fees and transferred value of extrinsics.
//!
//! Substrate extrinsics pay the partial fee quoted by `payment_queryInfo`.
//! Ethereum transactions pay `gas_price * dispatched_weight / weight_per_gas`,
//! where the gas price comes from whichever transaction payload shape
//! (legacy, EIP-2930, EIP-1559) the transaction uses.

use crate::chain::{
    ChainEvent, DispatchClass, Extrinsic, FeeQuote, json_field, json_to_u128, json_variant_name,
};
use polkadot_block_monitor_config::MonitorSettings;
use serde_json::{Map, Value};

/// What the runtime reported about executing one extrinsic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub success: bool,
    pub pays_fee: Option<bool>,
    /// Actual ref-time weight consumed.
    pub weight: u64,
    pub class: Option<DispatchClass>,
}

/// Outcome from the extrinsic's `System.ExtrinsicSuccess` or
/// `System.ExtrinsicFailed` event.
pub fn dispatch_outcome(events: &[ChainEvent]) -> Option<DispatchOutcome> {
    events.iter().find_map(|event| {
        let success = if event.is("System", "ExtrinsicSuccess") {
            true
        } else if event.is("System", "ExtrinsicFailed") {
            false
        } else {
            return None;
        };

        // ExtrinsicSuccess: [DispatchInfo]; ExtrinsicFailed: [DispatchError, DispatchInfo]
        let info = event.data.get(if success { 0 } else { 1 });
        Some(DispatchOutcome {
            success,
            pays_fee: info.and_then(pays_fee_from_info),
            weight: info.and_then(weight_from_info).unwrap_or(0),
            class: info.and_then(class_from_info),
        })
    })
}

fn pays_fee_from_info(info: &Value) -> Option<bool> {
    let pays_fee = json_field(info, "pays_fee", "paysFee")?;
    if let Value::Bool(b) = pays_fee {
        return Some(*b);
    }
    match json_variant_name(pays_fee)? {
        "Yes" => Some(true),
        "No" => Some(false),
        other => {
            tracing::debug!(value = other, "Unknown paysFee value");
            None
        }
    }
}

fn weight_from_info(info: &Value) -> Option<u64> {
    let weight = info.get("weight")?;
    let ref_time = match weight {
        Value::Object(_) => json_field(weight, "ref_time", "refTime").and_then(json_to_u128),
        // pre-V2 weights are a bare number
        other => json_to_u128(other),
    }?;
    Some(u64::try_from(ref_time).unwrap_or(u64::MAX))
}

fn class_from_info(info: &Value) -> Option<DispatchClass> {
    info.get("class")
        .and_then(json_variant_name)
        .and_then(DispatchClass::from_name)
}

pub fn is_ethereum_transaction(extrinsic: &Extrinsic) -> bool {
    extrinsic.is_call("Ethereum", "transact")
}

/// Fields of the ethereum transaction carried by an `Ethereum.transact` call.
pub fn ethereum_payload(extrinsic: &Extrinsic) -> Option<&Map<String, Value>> {
    if !is_ethereum_transaction(extrinsic) {
        return None;
    }
    let transaction = extrinsic.arg("transaction")?;
    match transaction.get("values")? {
        Value::Object(fields) => Some(fields),
        Value::Array(items) => items.first()?.as_object(),
        _ => None,
    }
}

/// `gas_price` of legacy and EIP-2930 transactions, `max_fee_per_gas` of EIP-1559 ones.
pub fn ethereum_gas_price(extrinsic: &Extrinsic) -> Option<u128> {
    let payload = ethereum_payload(extrinsic)?;
    payload
        .get("gas_price")
        .or_else(|| payload.get("gasPrice"))
        .or_else(|| payload.get("max_fee_per_gas"))
        .or_else(|| payload.get("maxFeePerGas"))
        .and_then(json_to_u128)
}

pub fn ethereum_value(extrinsic: &Extrinsic) -> Option<u128> {
    ethereum_payload(extrinsic)?
        .get("value")
        .and_then(json_to_u128)
}

/// Value moved by an extrinsic: the ethereum `value` for ethereum
/// transactions, otherwise the sum of its `Balances.Transfer` amounts.
pub fn transferred_value(extrinsic: &Extrinsic, events: &[ChainEvent]) -> u128 {
    if is_ethereum_transaction(extrinsic) {
        return ethereum_value(extrinsic).unwrap_or(0);
    }
    events
        .iter()
        .filter(|event| event.is("Balances", "Transfer"))
        .filter_map(|event| event.data.get(2).and_then(json_to_u128))
        .fold(0u128, u128::saturating_add)
}

/// Fee rules of the monitored chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeCalculator {
    weight_per_gas: u64,
}

impl FeeCalculator {
    pub fn new(weight_per_gas: u64) -> Self {
        Self {
            weight_per_gas: weight_per_gas.max(1),
        }
    }

    pub fn from_settings(settings: &MonitorSettings) -> Self {
        Self::new(settings.weight_per_gas)
    }

    /// Fee charged for one extrinsic, in the chain's smallest unit.
    pub fn extrinsic_fee(
        &self,
        extrinsic: &Extrinsic,
        outcome: Option<&DispatchOutcome>,
        quote: &FeeQuote,
    ) -> u128 {
        match ethereum_gas_price(extrinsic) {
            Some(gas_price) => {
                let weight = outcome.map_or(0, |o| o.weight);
                gas_price.saturating_mul(u128::from(weight)) / u128::from(self.weight_per_gas)
            }
            None => quote.partial_fee,
        }
    }

    /// Whether the fee counts towards block totals: the extrinsic pays fees
    /// and is not a mandatory (inherent) dispatch.
    pub fn is_fee_paying(outcome: Option<&DispatchOutcome>, quote: &FeeQuote) -> bool {
        let pays_fee = outcome.and_then(|o| o.pays_fee).unwrap_or(quote.pays_fee);
        let class = outcome.and_then(|o| o.class).unwrap_or(quote.class);
        pays_fee && class != DispatchClass::Mandatory
    }
}
