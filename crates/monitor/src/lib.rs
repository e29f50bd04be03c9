// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod aggregator;
pub mod author;
pub mod cache;
pub mod chain;
pub mod error;
pub mod fee;
pub mod format;
pub mod identity;
pub mod live;
pub mod logging;
pub mod range;

#[cfg(test)]
pub mod test_fixtures;

pub use aggregator::{BlockAggregator, BlockSnapshot, ExtrinsicDetails, RealtimeSnapshot};
pub use chain::{ChainApi, HeadMode, RpcChainApi};
pub use error::{ChainError, IdentityError, MonitorError};
pub use format::{FormatOptions, format_realtime, format_snapshot};
pub use identity::IdentityResolver;
pub use live::{FollowHandle, follow};
pub use range::walk_range;
