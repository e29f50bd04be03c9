mod args;
mod error;
mod log;
mod monitor;
mod substrate;

pub use args::Args;
pub use error::ConfigError;
pub use log::LogConfig;
pub use monitor::MonitorSettings;
pub use substrate::SubstrateConfig;

use std::path::Path;

/// Full configuration of the block monitor.
///
/// Each section is read from its own environment prefix:
/// `SBM_SUBSTRATE_*`, `SBM_LOG_*` and `SBM_MONITOR_*`.
#[derive(Debug, Clone, Default)]
pub struct MonitorConfig {
    pub substrate: SubstrateConfig,
    pub log: LogConfig,
    pub monitor: MonitorSettings,
}

impl MonitorConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            substrate: envy::prefixed("SBM_SUBSTRATE_").from_env::<SubstrateConfig>()?,
            log: envy::prefixed("SBM_LOG_").from_env::<LogConfig>()?,
            monitor: envy::prefixed("SBM_MONITOR_").from_env::<MonitorSettings>()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load `path` into the process environment, then read the configuration.
    ///
    /// A missing file is not an error. Variables already set in the
    /// environment take precedence over the file.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            dotenv::from_path(path).map_err(|source| ConfigError::EnvFileError {
                path: path.display().to_string(),
                source,
            })?;
        }
        Self::from_env()
    }

    /// Apply command line overrides on top of the environment.
    pub fn apply_args(&mut self, args: &Args) -> Result<(), ConfigError> {
        if let Some(concurrency) = args.concurrency {
            self.monitor.concurrency = concurrency;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.substrate.validate()?;
        self.log.validate()?;
        self.monitor.validate()?;
        Ok(())
    }
}
