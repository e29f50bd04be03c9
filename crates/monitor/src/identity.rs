// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Resolution of accounts and block authors to on-chain identity display names.

use crate::cache::TtlCache;
use crate::chain::{AccountId, AuthorId, ChainApi, IdentityRecord};
use crate::error::{ChainError, IdentityError};
use polkadot_block_monitor_config::MonitorSettings;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::time::Duration;

/// Author display name looked up without touching the caches.
///
/// Pass it to [`IdentityResolver::commit`] to store what was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorLookup {
    display: String,
    mapping: Option<(AuthorId, Option<AccountId>)>,
    identity: Option<(AccountId, Option<String>)>,
}

impl AuthorLookup {
    pub fn display(&self) -> &str {
        &self.display
    }
}

/// Identity and author-mapping lookups, cached per account / author key.
///
/// Cached values are `Option`s so that "nothing registered" is cached too.
pub struct IdentityResolver {
    chain: Arc<dyn ChainApi>,
    identities: TtlCache<AccountId, Option<String>>,
    authors: TtlCache<AuthorId, Option<AccountId>>,
    account_id_len: usize,
}

impl IdentityResolver {
    pub fn new(
        chain: Arc<dyn ChainApi>,
        capacity: NonZeroUsize,
        ttl: Duration,
        account_id_len: usize,
    ) -> Self {
        Self {
            chain,
            identities: TtlCache::new(capacity, ttl),
            authors: TtlCache::new(capacity, ttl),
            account_id_len,
        }
    }

    pub fn from_settings(chain: Arc<dyn ChainApi>, settings: &MonitorSettings) -> Self {
        Self::new(
            chain,
            NonZeroUsize::new(settings.identity_cache_capacity).unwrap_or(NonZeroUsize::MIN),
            Duration::from_secs(settings.identity_ttl_secs),
            settings.account_id_len,
        )
    }

    /// Display name of `account`, or the account itself when it has no identity.
    pub async fn resolve_identity(&self, account: &AccountId) -> Result<String, IdentityError> {
        if let Some(name) = self.identities.get_fresh(account).await {
            return Ok(display_or_account(name, account));
        }

        let name = self.fetch_identity(account).await?;
        self.identities.insert(account.clone(), name.clone()).await;
        Ok(display_or_account(name, account))
    }

    /// Display names of several accounts, in input order.
    ///
    /// Accounts without a fresh cache entry are fetched with one batched query.
    pub async fn resolve_identities(
        &self,
        accounts: &[AccountId],
    ) -> Result<Vec<String>, IdentityError> {
        let mut cached = Vec::with_capacity(accounts.len());
        let mut missing: Vec<AccountId> = Vec::new();
        for account in accounts {
            let name = self.identities.get_fresh(account).await;
            if name.is_none() && !missing.contains(account) {
                missing.push(account.clone());
            }
            cached.push(name);
        }

        let mut fetched = HashMap::new();
        if !missing.is_empty() {
            tracing::debug!(accounts = missing.len(), "Fetching identities");
            let records = self.chain.query_identities(&missing).await?;
            if records.len() != missing.len() {
                return Err(ChainError::UnexpectedShape(format!(
                    "asked for {} identities, got {}",
                    missing.len(),
                    records.len()
                ))
                .into());
            }

            let names = missing
                .iter()
                .zip(records)
                .map(|(account, record)| Ok((account.clone(), decode_display(account, record)?)))
                .collect::<Result<Vec<_>, IdentityError>>()?;
            self.identities.insert_many(names.iter().cloned()).await;
            fetched.extend(names);
        }

        Ok(accounts
            .iter()
            .zip(cached)
            .map(|(account, name)| {
                let name = name.or_else(|| fetched.get(account).cloned()).flatten();
                display_or_account(name, account)
            })
            .collect())
    }

    /// Display name of the account a block author key is mapped to.
    pub async fn resolve_author(&self, author: &AuthorId) -> Result<String, IdentityError> {
        let lookup = self.lookup_author(author).await?;
        Ok(self.commit(lookup).await)
    }

    /// Same as [`Self::resolve_author`], but leaves the caches untouched.
    pub async fn lookup_author(&self, author: &AuthorId) -> Result<AuthorLookup, IdentityError> {
        let (account, mapping) = match self.authors.get_fresh(author).await {
            Some(account) => (account, None),
            None => {
                let account = self.chain.query_author_mapping(author).await?;
                (account.clone(), Some((author.clone(), account)))
            }
        };

        let Some(account) = account else {
            return Ok(AuthorLookup {
                mapping,
                ..self.unknown_author()
            });
        };

        let (name, identity) = match self.identities.get_fresh(&account).await {
            Some(name) => (name, None),
            None => {
                let name = self.fetch_identity(&account).await?;
                (name.clone(), Some((account.clone(), name)))
            }
        };

        Ok(AuthorLookup {
            display: display_or_account(name, &account),
            mapping,
            identity,
        })
    }

    /// Placeholder shown for blocks whose author could not be determined.
    pub fn unknown_author(&self) -> AuthorLookup {
        AuthorLookup {
            display: AccountId::zero(self.account_id_len).to_string(),
            mapping: None,
            identity: None,
        }
    }

    /// Store what a lookup fetched and return its display name.
    pub async fn commit(&self, lookup: AuthorLookup) -> String {
        if let Some((author, account)) = lookup.mapping {
            self.authors.insert(author, account).await;
        }
        if let Some((account, name)) = lookup.identity {
            self.identities.insert(account, name).await;
        }
        lookup.display
    }

    async fn fetch_identity(&self, account: &AccountId) -> Result<Option<String>, IdentityError> {
        let record = self.chain.query_identity_of(account).await?;
        decode_display(account, record)
    }
}

fn decode_display(
    account: &AccountId,
    record: Option<IdentityRecord>,
) -> Result<Option<String>, IdentityError> {
    record
        .map(|record| {
            String::from_utf8(record.display).map_err(|source| IdentityError::InvalidDisplay {
                account: account.to_string(),
                source,
            })
        })
        .transpose()
}

fn display_or_account(name: Option<String>, account: &AccountId) -> String {
    name.unwrap_or_else(|| account.to_string())
}
