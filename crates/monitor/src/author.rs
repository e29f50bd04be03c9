//! Block author extraction.
//!
//! Chains announce their author either as an argument of an inherent call or
//! as a pre-runtime digest log. Each way is an [`AuthorSource`]; the
//! [`AuthorExtractor`] tries its sources in order.

use crate::chain::{AuthorId, Block, ConsensusEngineId, json_to_bytes};
use polkadot_block_monitor_config::MonitorSettings;

const SET_AUTHOR: &str = "set_author";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorSource {
    /// First argument of `<pallet>.set_author`.
    InherentCall { pallet: String },
    /// Payload of the pre-runtime digest produced by `engine`.
    PreRuntimeDigest { engine: ConsensusEngineId },
}

impl AuthorSource {
    pub fn extract(&self, block: &Block) -> Option<AuthorId> {
        let bytes = match self {
            AuthorSource::InherentCall { pallet } => block
                .extrinsics
                .iter()
                .find(|xt| xt.is_call(pallet, SET_AUTHOR))
                .and_then(|xt| xt.arg_at(0))
                .and_then(json_to_bytes)?,
            AuthorSource::PreRuntimeDigest { engine } => block.header.pre_runtime(engine)?.to_vec(),
        };
        (!bytes.is_empty()).then(|| AuthorId::new(bytes))
    }
}

#[derive(Debug, Clone)]
pub struct AuthorExtractor {
    sources: Vec<AuthorSource>,
}

impl AuthorExtractor {
    pub fn new(sources: Vec<AuthorSource>) -> Self {
        Self { sources }
    }

    /// Inherent call first, then the pre-runtime digest.
    pub fn from_settings(settings: &MonitorSettings) -> Self {
        Self::new(vec![
            AuthorSource::InherentCall {
                pallet: settings.author_pallet.clone(),
            },
            AuthorSource::PreRuntimeDigest {
                engine: settings.author_engine_id(),
            },
        ])
    }

    /// Author of `block`, or `None` when no source knows it.
    pub fn extract(&self, block: &Block) -> Option<AuthorId> {
        self.sources.iter().find_map(|source| source.extract(block))
    }
}
