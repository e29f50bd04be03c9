use crate::ConfigError;
use serde::Deserialize;

/// Settings of the aggregation pipeline and of the block feed.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorSettings {
    /// Blocks fetched in parallel during a range walk
    ///
    /// Env: SBM_MONITOR_CONCURRENCY
    /// Default: 10
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Seconds a resolved identity or author mapping stays fresh
    ///
    /// Env: SBM_MONITOR_IDENTITY_TTL_SECS
    /// Default: 3600
    #[serde(default = "default_identity_ttl_secs")]
    pub identity_ttl_secs: u64,

    /// Maximum number of entries in each identity cache
    ///
    /// Env: SBM_MONITOR_IDENTITY_CACHE_CAPACITY
    /// Default: 1024
    #[serde(default = "default_identity_cache_capacity")]
    pub identity_cache_capacity: usize,

    /// Weight units per unit of gas, used to price ethereum transactions
    ///
    /// Env: SBM_MONITOR_WEIGHT_PER_GAS
    /// Default: 25000
    #[serde(default = "default_weight_per_gas")]
    pub weight_per_gas: u64,

    /// Decimals of the native token, for display
    ///
    /// Env: SBM_MONITOR_TOKEN_DECIMALS
    /// Default: 18
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u8,

    /// Length in bytes of an account id (20 for ethereum-style chains, 32 otherwise)
    ///
    /// Env: SBM_MONITOR_ACCOUNT_ID_LEN
    /// Default: 20
    #[serde(default = "default_account_id_len")]
    pub account_id_len: usize,

    /// Pallet holding the `set_author` inherent
    ///
    /// Env: SBM_MONITOR_AUTHOR_PALLET
    /// Default: AuthorInherent
    #[serde(default = "default_author_pallet")]
    pub author_pallet: String,

    /// Consensus engine id of the pre-runtime digest carrying the author
    ///
    /// Env: SBM_MONITOR_AUTHOR_ENGINE
    /// Default: nmbs
    #[serde(default = "default_author_engine")]
    pub author_engine: String,
}

fn default_concurrency() -> usize {
    10
}

fn default_identity_ttl_secs() -> u64 {
    3600
}

fn default_identity_cache_capacity() -> usize {
    1024
}

fn default_weight_per_gas() -> u64 {
    25_000
}

fn default_token_decimals() -> u8 {
    18
}

fn default_account_id_len() -> usize {
    20
}

fn default_author_pallet() -> String {
    "AuthorInherent".to_string()
}

fn default_author_engine() -> String {
    "nmbs".to_string()
}

impl MonitorSettings {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ValidateError(
                "SBM_MONITOR_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        if self.identity_ttl_secs == 0 {
            return Err(ConfigError::ValidateError(
                "SBM_MONITOR_IDENTITY_TTL_SECS must be greater than 0".to_string(),
            ));
        }

        if self.identity_cache_capacity == 0 {
            return Err(ConfigError::ValidateError(
                "SBM_MONITOR_IDENTITY_CACHE_CAPACITY must be greater than 0".to_string(),
            ));
        }

        if self.weight_per_gas == 0 {
            return Err(ConfigError::ValidateError(
                "SBM_MONITOR_WEIGHT_PER_GAS must be greater than 0".to_string(),
            ));
        }

        if !matches!(self.account_id_len, 20 | 32) {
            return Err(ConfigError::ValidateError(format!(
                "SBM_MONITOR_ACCOUNT_ID_LEN must be 20 or 32, got {}",
                self.account_id_len
            )));
        }

        if self.author_engine.len() != 4 {
            return Err(ConfigError::ValidateError(format!(
                "SBM_MONITOR_AUTHOR_ENGINE must be exactly 4 bytes, got '{}'",
                self.author_engine
            )));
        }

        Ok(())
    }

    /// Consensus engine id as the 4 raw bytes found in digest items
    pub fn author_engine_id(&self) -> [u8; 4] {
        let mut id = [0u8; 4];
        for (slot, byte) in id.iter_mut().zip(self.author_engine.bytes()) {
            *slot = byte;
        }
        id
    }
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            identity_ttl_secs: default_identity_ttl_secs(),
            identity_cache_capacity: default_identity_cache_capacity(),
            weight_per_gas: default_weight_per_gas(),
            token_decimals: default_token_decimals(),
            account_id_len: default_account_id_len(),
            author_pallet: default_author_pallet(),
            author_engine: default_author_engine(),
        }
    }
}
