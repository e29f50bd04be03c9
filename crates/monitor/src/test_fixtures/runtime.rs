//! A small Moonbeam-shaped runtime described with `scale-info`, so metadata,
//! storage values and extrinsics can be produced without a node.

#![allow(non_camel_case_types, dead_code)]

use crate::chain::Metadata;
use frame_metadata::{
    RuntimeMetadataPrefixed,
    v14::{
        ExtrinsicMetadata, PalletCallMetadata, PalletConstantMetadata, PalletEventMetadata,
        PalletMetadata, PalletStorageMetadata, RuntimeMetadataV14, StorageEntryMetadata,
        StorageEntryModifier, StorageEntryType, StorageHasher,
    },
};
use parity_scale_codec::{Compact, Encode};
use scale_info::{MetaType, TypeInfo, meta_type};
use std::marker::PhantomData;

pub const MAX_BLOCK_REF_TIME: u64 = 2_000_000_000_000;

#[derive(Encode, TypeInfo, Clone, Copy, Debug, PartialEq)]
pub struct AccountId20(pub [u8; 20]);

#[derive(Encode, TypeInfo, Clone, Copy, Debug, PartialEq)]
pub struct NimbusId(pub [u8; 32]);

#[derive(Encode, TypeInfo, Clone, Copy)]
pub struct EthereumSignature(pub [u8; 65]);

/// Ethereum `U256` as little-endian `u64` limbs.
#[derive(Encode, TypeInfo, Clone, Copy)]
pub struct U256(pub [u64; 4]);

impl U256 {
    pub fn from_u128(value: u128) -> Self {
        Self([value as u64, (value >> 64) as u64, 0, 0])
    }
}

#[derive(Encode, TypeInfo)]
pub struct CheckNonce(#[codec(compact)] pub u32);

#[derive(Encode, TypeInfo)]
pub struct ChargeTransactionPayment(#[codec(compact)] pub u128);

pub type SignedExtra = (CheckNonce, ChargeTransactionPayment);

#[derive(TypeInfo)]
pub struct UncheckedExtrinsic<Address, Call, Signature, Extra>(
    PhantomData<(Address, Call, Signature, Extra)>,
);

#[derive(Encode, TypeInfo, Clone, Copy)]
pub struct Weight {
    #[codec(compact)]
    pub ref_time: u64,
    #[codec(compact)]
    pub proof_size: u64,
}

#[derive(Encode, TypeInfo)]
pub struct BlockWeights {
    pub base_block: Weight,
    pub max_block: Weight,
}

#[derive(Encode, TypeInfo, Clone, Copy)]
pub enum DispatchClass {
    Normal,
    Operational,
    Mandatory,
}

#[derive(Encode, TypeInfo, Clone, Copy)]
pub enum Pays {
    Yes,
    No,
}

#[derive(Encode, TypeInfo, Clone, Copy)]
pub struct DispatchInfo {
    pub weight: Weight,
    pub class: DispatchClass,
    pub pays_fee: Pays,
}

#[derive(Encode, TypeInfo)]
pub enum DispatchError {
    Other,
    BadOrigin,
}

#[derive(Encode, TypeInfo)]
pub enum SystemEvent {
    ExtrinsicSuccess {
        dispatch_info: DispatchInfo,
    },
    ExtrinsicFailed {
        dispatch_error: DispatchError,
        dispatch_info: DispatchInfo,
    },
    NewAccount {
        account: AccountId20,
    },
}

#[derive(Encode, TypeInfo)]
pub enum BalancesEvent {
    Transfer {
        from: AccountId20,
        to: AccountId20,
        amount: u128,
    },
}

#[derive(Encode, TypeInfo)]
pub enum RuntimeEvent {
    #[codec(index = 0)]
    System(SystemEvent),
    #[codec(index = 10)]
    Balances(BalancesEvent),
}

#[derive(Encode, TypeInfo)]
pub enum Phase {
    ApplyExtrinsic(u32),
    Finalization,
    Initialization,
}

#[derive(Encode, TypeInfo)]
pub struct EventRecord {
    pub phase: Phase,
    pub event: RuntimeEvent,
    pub topics: Vec<[u8; 32]>,
}

#[derive(Encode, TypeInfo)]
pub enum SystemCall {
    remark { remark: Vec<u8> },
}

#[derive(Encode, TypeInfo)]
pub enum TimestampCall {
    set {
        #[codec(compact)]
        now: u64,
    },
}

#[derive(Encode, TypeInfo)]
pub enum BalancesCall {
    transfer_allow_death {
        dest: AccountId20,
        #[codec(compact)]
        value: u128,
    },
}

#[derive(Encode, TypeInfo)]
pub enum AuthorInherentCall {
    set_author { author: NimbusId },
}

#[derive(Encode, TypeInfo)]
pub struct LegacyTransaction {
    pub nonce: U256,
    pub gas_price: U256,
    pub gas_limit: U256,
    pub value: U256,
    pub input: Vec<u8>,
}

#[derive(Encode, TypeInfo)]
pub struct EIP1559Transaction {
    pub chain_id: u64,
    pub nonce: U256,
    pub max_priority_fee_per_gas: U256,
    pub max_fee_per_gas: U256,
    pub gas_limit: U256,
    pub value: U256,
    pub input: Vec<u8>,
}

#[derive(Encode, TypeInfo)]
pub enum TransactionV2 {
    Legacy(LegacyTransaction),
    EIP1559(EIP1559Transaction),
}

#[derive(Encode, TypeInfo)]
pub enum EthereumCall {
    transact { transaction: TransactionV2 },
}

#[derive(Encode, TypeInfo)]
pub enum RuntimeCall {
    #[codec(index = 0)]
    System(SystemCall),
    #[codec(index = 3)]
    Timestamp(TimestampCall),
    #[codec(index = 10)]
    Balances(BalancesCall),
    #[codec(index = 20)]
    AuthorInherent(AuthorInherentCall),
    #[codec(index = 51)]
    Ethereum(EthereumCall),
}

#[derive(Encode, TypeInfo)]
pub enum Data {
    #[codec(index = 0)]
    None,
    #[codec(index = 5)]
    Raw4([u8; 4]),
    #[codec(index = 6)]
    Raw5([u8; 5]),
    #[codec(index = 34)]
    BlakeTwo256([u8; 32]),
}

#[derive(Encode, TypeInfo)]
pub struct IdentityInfo {
    pub display: Data,
    pub web: Data,
}

#[derive(Encode, TypeInfo)]
pub struct Registration {
    pub judgements: Vec<(u32, u8)>,
    pub deposit: u128,
    pub info: IdentityInfo,
}

#[derive(Encode, TypeInfo)]
pub struct RegistrationInfo {
    pub account: AccountId20,
    pub deposit: u128,
}

#[derive(TypeInfo)]
pub struct Runtime;

fn plain(name: &'static str, ty: MetaType) -> StorageEntryMetadata {
    StorageEntryMetadata {
        name,
        modifier: StorageEntryModifier::Default,
        ty: StorageEntryType::Plain(ty),
        default: Vec::new(),
        docs: Vec::new(),
    }
}

fn map(name: &'static str, hasher: StorageHasher, key: MetaType, value: MetaType) -> StorageEntryMetadata {
    StorageEntryMetadata {
        name,
        modifier: StorageEntryModifier::Optional,
        ty: StorageEntryType::Map {
            hashers: vec![hasher],
            key,
            value,
        },
        default: Vec::new(),
        docs: Vec::new(),
    }
}

fn pallet(
    name: &'static str,
    index: u8,
    entries: Vec<StorageEntryMetadata>,
    calls: Option<MetaType>,
    event: Option<MetaType>,
    constants: Vec<PalletConstantMetadata>,
) -> PalletMetadata {
    PalletMetadata {
        name,
        storage: (!entries.is_empty()).then_some(PalletStorageMetadata {
            prefix: name,
            entries,
        }),
        calls: calls.map(|ty| PalletCallMetadata { ty }),
        event: event.map(|ty| PalletEventMetadata { ty }),
        constants,
        error: None,
        index,
    }
}

pub fn runtime_metadata() -> RuntimeMetadataPrefixed {
    let block_weights = BlockWeights {
        base_block: Weight {
            ref_time: 5_000_000,
            proof_size: 0,
        },
        max_block: Weight {
            ref_time: MAX_BLOCK_REF_TIME,
            proof_size: 5_242_880,
        },
    };

    let pallets = vec![
        pallet(
            "System",
            0,
            vec![plain("Events", meta_type::<Vec<EventRecord>>())],
            Some(meta_type::<SystemCall>()),
            Some(meta_type::<SystemEvent>()),
            vec![PalletConstantMetadata {
                name: "BlockWeights",
                ty: meta_type::<BlockWeights>(),
                value: block_weights.encode(),
                docs: Vec::new(),
            }],
        ),
        pallet(
            "Timestamp",
            3,
            vec![plain("Now", meta_type::<u64>())],
            Some(meta_type::<TimestampCall>()),
            None,
            Vec::new(),
        ),
        pallet(
            "Balances",
            10,
            Vec::new(),
            Some(meta_type::<BalancesCall>()),
            Some(meta_type::<BalancesEvent>()),
            Vec::new(),
        ),
        pallet(
            "AuthorInherent",
            20,
            Vec::new(),
            Some(meta_type::<AuthorInherentCall>()),
            None,
            Vec::new(),
        ),
        pallet(
            "AuthorMapping",
            21,
            vec![map(
                "MappingWithDeposit",
                StorageHasher::Blake2_128Concat,
                meta_type::<NimbusId>(),
                meta_type::<RegistrationInfo>(),
            )],
            None,
            None,
            Vec::new(),
        ),
        pallet(
            "Ethereum",
            51,
            Vec::new(),
            Some(meta_type::<EthereumCall>()),
            None,
            Vec::new(),
        ),
        pallet(
            "Identity",
            104,
            vec![map(
                "IdentityOf",
                StorageHasher::Twox64Concat,
                meta_type::<AccountId20>(),
                meta_type::<(Registration, Option<Vec<u8>>)>(),
            )],
            None,
            None,
            Vec::new(),
        ),
    ];

    let extrinsic = ExtrinsicMetadata {
        ty: meta_type::<UncheckedExtrinsic<AccountId20, RuntimeCall, EthereumSignature, SignedExtra>>(),
        version: 4,
        signed_extensions: Vec::new(),
    };

    RuntimeMetadataV14::new(pallets, extrinsic, meta_type::<Runtime>()).into()
}

pub fn metadata_bytes() -> Vec<u8> {
    runtime_metadata().encode()
}

pub fn metadata_hex() -> String {
    format!("0x{}", hex::encode(metadata_bytes()))
}

pub fn metadata() -> Metadata {
    Metadata::from_runtime_metadata(runtime_metadata().1).expect("test metadata is valid")
}

pub fn record(phase: Phase, event: RuntimeEvent) -> EventRecord {
    EventRecord {
        phase,
        event,
        topics: Vec::new(),
    }
}

pub fn dispatch_info(ref_time: u64, class: DispatchClass, pays_fee: Pays) -> DispatchInfo {
    DispatchInfo {
        weight: Weight {
            ref_time,
            proof_size: 0,
        },
        class,
        pays_fee,
    }
}

pub fn success_event(ref_time: u64, pays_fee: Pays) -> RuntimeEvent {
    RuntimeEvent::System(SystemEvent::ExtrinsicSuccess {
        dispatch_info: dispatch_info(ref_time, DispatchClass::Normal, pays_fee),
    })
}

pub fn events_bytes(records: &[EventRecord]) -> Vec<u8> {
    records.encode()
}

pub fn identity_bytes(display: Data) -> Vec<u8> {
    let registration = Registration {
        judgements: Vec::new(),
        deposit: 0,
        info: IdentityInfo {
            display,
            web: Data::None,
        },
    };
    (registration, Option::<Vec<u8>>::None).encode()
}

fn with_length_prefix(body: Vec<u8>) -> Vec<u8> {
    let mut extrinsic = Compact(body.len() as u32).encode();
    extrinsic.extend(body);
    extrinsic
}

/// Version 4 signed extrinsic from `signer`.
pub fn signed_extrinsic(signer: [u8; 20], nonce: u32, call: RuntimeCall) -> Vec<u8> {
    let mut body = vec![0x84];
    AccountId20(signer).encode_to(&mut body);
    EthereumSignature([0xaa; 65]).encode_to(&mut body);
    (CheckNonce(nonce), ChargeTransactionPayment(0)).encode_to(&mut body);
    call.encode_to(&mut body);
    with_length_prefix(body)
}

/// Version 4 unsigned (inherent or self-contained) extrinsic.
pub fn unsigned_extrinsic(call: RuntimeCall) -> Vec<u8> {
    let mut body = vec![0x04];
    call.encode_to(&mut body);
    with_length_prefix(body)
}

pub fn transfer_call(dest: [u8; 20], value: u128) -> RuntimeCall {
    RuntimeCall::Balances(BalancesCall::transfer_allow_death {
        dest: AccountId20(dest),
        value,
    })
}

pub fn set_author_call(author: [u8; 32]) -> RuntimeCall {
    RuntimeCall::AuthorInherent(AuthorInherentCall::set_author {
        author: NimbusId(author),
    })
}

pub fn legacy_transact_call(gas_price: u128, value: u128) -> RuntimeCall {
    RuntimeCall::Ethereum(EthereumCall::transact {
        transaction: TransactionV2::Legacy(LegacyTransaction {
            nonce: U256::from_u128(0),
            gas_price: U256::from_u128(gas_price),
            gas_limit: U256::from_u128(21_000),
            value: U256::from_u128(value),
            input: Vec::new(),
        }),
    })
}

pub fn eip1559_transact_call(max_fee_per_gas: u128, value: u128) -> RuntimeCall {
    RuntimeCall::Ethereum(EthereumCall::transact {
        transaction: TransactionV2::EIP1559(EIP1559Transaction {
            chain_id: 1284,
            nonce: U256::from_u128(0),
            max_priority_fee_per_gas: U256::from_u128(0),
            max_fee_per_gas: U256::from_u128(max_fee_per_gas),
            gas_limit: U256::from_u128(21_000),
            value: U256::from_u128(value),
            input: Vec::new(),
        }),
    })
}
