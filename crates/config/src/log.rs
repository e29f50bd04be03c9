use crate::ConfigError;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log Level
    ///
    /// Env: SBM_LOG_LEVEL
    /// Valid values: trace, debug, info, warn, error
    /// Default: info
    #[serde(default = "default_level")]
    pub level: String,

    /// Output logs in JSON format
    ///
    /// Env: SBM_LOG_JSON
    /// Default: false
    #[serde(default)]
    pub json: bool,

    /// Strip ANSI color codes from logs and block lines
    ///
    /// Env: SBM_LOG_STRIP_ANSI
    /// Default: false
    #[serde(default)]
    pub strip_ansi: bool,

    /// Also write logs to a size-rotated file
    ///
    /// Env: SBM_LOG_WRITE
    /// Default: false
    #[serde(default)]
    pub write: bool,

    /// Directory for log files
    ///
    /// Env: SBM_LOG_WRITE_PATH
    /// Default: ./logs
    #[serde(default = "default_write_path")]
    pub write_path: String,

    /// Maximum size of a log file in bytes before it is rotated
    ///
    /// Env: SBM_LOG_WRITE_MAX_FILE_SIZE
    /// Default: 5242880
    #[serde(default = "default_write_max_file_size")]
    pub write_max_file_size: u64,

    /// Number of log files kept, including the current one
    ///
    /// Env: SBM_LOG_WRITE_MAX_FILES
    /// Default: 5
    #[serde(default = "default_write_max_files")]
    pub write_max_files: usize,

    /// Loki push endpoint, e.g. http://127.0.0.1:3100
    ///
    /// Env: SBM_LOG_LOKI_URL
    /// Default: unset
    #[serde(default)]
    pub loki_url: Option<String>,
}

fn default_level() -> String {
    "info".to_string()
}

fn default_write_path() -> String {
    "./logs".to_string()
}

fn default_write_max_file_size() -> u64 {
    5_242_880
}

fn default_write_max_files() -> usize {
    5
}

impl LogConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];

        if !valid_levels.contains(&self.level.as_str()) {
            return Err(ConfigError::ValidateError(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.level,
                valid_levels.join(", ")
            )));
        }

        if self.write && self.write_max_files == 0 {
            return Err(ConfigError::ValidateError(
                "SBM_LOG_WRITE_MAX_FILES must be at least 1".to_string(),
            ));
        }

        if let Some(url) = &self.loki_url {
            url::Url::parse(url).map_err(|e| {
                ConfigError::ValidateError(format!("Invalid Loki URL '{}': {}", url, e))
            })?;
        }

        Ok(())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            strip_ansi: false,
            write: false,
            write_path: default_write_path(),
            write_max_file_size: default_write_max_file_size(),
            write_max_files: default_write_max_files(),
            loki_url: None,
        }
    }
}
