use polkadot_block_monitor_config::LogConfig;
use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level '{level}': {source}")]
    InvalidLogLevel {
        level: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("Failed to create log directory or file appender: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse Loki URL '{url}': {source}")]
    InvalidLokiUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to configure Loki integration: {0}")]
    LokiError(#[from] tracing_loki::Error),

    #[error("Failed to install the global subscriber: {0}")]
    InitError(#[from] tracing_subscriber::util::TryInitError),
}

/// Configuration for logging initialization
pub struct LoggingConfig<'a> {
    pub level: &'a str,
    pub json_format: bool,
    pub strip_ansi: bool,
    pub write_to_file: bool,
    pub write_path: &'a str,
    pub write_max_file_size: u64,
    pub write_max_files: usize,
    pub loki_url: Option<&'a str>,
}

impl<'a> From<&'a LogConfig> for LoggingConfig<'a> {
    fn from(config: &'a LogConfig) -> Self {
        Self {
            level: &config.level,
            json_format: config.json,
            strip_ansi: config.strip_ansi,
            write_to_file: config.write,
            write_path: &config.write_path,
            write_max_file_size: config.write_max_file_size,
            write_max_files: config.write_max_files,
            loki_url: config.loki_url.as_deref(),
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize tracing with console output, plus optional rotated files and Loki.
///
/// Console logs go to stderr; stdout carries the block lines.
///
/// # Log Rotation
/// When `logs.log` reaches `write_max_file_size` it is rotated to
/// `logs.log.1`, `logs.log.2`, ... keeping `write_max_files` files in total.
///
/// # Loki Integration
/// Logs are pushed in the background with the labels
/// `service = "polkadot-block-monitor"` and `pid`. Must be called from within
/// a tokio runtime when a Loki URL is given.
pub fn init_with_config(config: LoggingConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(config.level).map_err(|source| {
        LoggingError::InvalidLogLevel {
            level: config.level.to_string(),
            source,
        }
    })?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    if config.json_format {
        layers.push(fmt::layer().json().with_writer(std::io::stderr).boxed());
    } else {
        layers.push(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_ansi(!config.strip_ansi)
                .with_writer(std::io::stderr)
                .boxed(),
        );
    }

    if config.write_to_file {
        std::fs::create_dir_all(config.write_path)?;

        let log_file_path = PathBuf::from(config.write_path).join("logs.log");
        // write_max_files counts the current file too
        let file_appender = BasicRollingFileAppender::new(
            log_file_path,
            RollingConditionBasic::new().max_size(config.write_max_file_size),
            config.write_max_files.saturating_sub(1),
        )?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        // The guard flushes on drop; keep it for the lifetime of the process.
        std::mem::forget(guard);

        if config.json_format {
            layers.push(fmt::layer().json().with_writer(non_blocking).boxed());
        } else {
            layers.push(
                fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .with_writer(non_blocking)
                    .boxed(),
            );
        }
    }

    if let Some(url) = config.loki_url {
        let parsed_url = url::Url::parse(url).map_err(|source| LoggingError::InvalidLokiUrl {
            url: url.to_string(),
            source,
        })?;

        let (loki_layer, task) = tracing_loki::builder()
            .label("service", "polkadot-block-monitor")?
            .extra_field("pid", format!("{}", std::process::id()))?
            .build_url(parsed_url)?;
        tokio::spawn(task);

        layers.push(loki_layer.boxed());
    }

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()?;

    Ok(())
}
