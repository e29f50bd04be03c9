use anyhow::Context;
use block_monitor::{
    BlockAggregator, BlockSnapshot, ChainApi, FormatOptions, HeadMode, IdentityResolver,
    RealtimeSnapshot, RpcChainApi, follow, format, logging, walk_range,
};
use polkadot_block_monitor_config::{Args, MonitorConfig};
use std::sync::Arc;

#[cfg(not(target_os = "windows"))]
#[global_allocator]
static ALLOC: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse_args();
    let mut config = MonitorConfig::from_env_file(&args.env_file)?;
    config.apply_args(&args)?;
    logging::init_with_config((&config.log).into())?;

    tracing::info!("Substrate URL: {}", config.substrate.url);
    let chain: Arc<dyn ChainApi> = Arc::new(
        RpcChainApi::connect(&config.substrate.url)
            .await
            .with_context(|| format!("Failed to connect to {}", config.substrate.url))?,
    );
    let identities = Arc::new(IdentityResolver::from_settings(
        chain.clone(),
        &config.monitor,
    ));
    let aggregator = Arc::new(BlockAggregator::from_settings(
        chain,
        identities,
        &config.monitor,
    ));

    let options = FormatOptions {
        prefix: args.prefix.clone().unwrap_or_default(),
        decimals: config.monitor.token_decimals,
        plain: args.no_color || config.log.strip_ansi,
        ..Default::default()
    };

    match args.range() {
        Some((from, to)) => {
            let mut previous: Option<BlockSnapshot> = None;
            let result = walk_range(&aggregator, from, to, config.monitor.concurrency, |snapshot| {
                format::print_snapshot(&snapshot, previous.as_ref(), &options);
                previous = Some(snapshot);
            })
            .await;
            if let Err(e) = &result
                && let Some(number) = e.failed_block()
            {
                tracing::error!("Range walk stopped, resume with --from {}", number);
            }
            result?;
        }
        None => {
            let mode = if args.finalized {
                HeadMode::Finalized
            } else {
                HeadMode::Best
            };
            let mut previous: Option<RealtimeSnapshot> = None;
            let handle = follow(aggregator, mode, move |result| match result {
                Ok(realtime) => {
                    format::print_realtime(&realtime, previous.as_ref(), &options);
                    previous = Some(realtime);
                }
                Err(e) => tracing::warn!(error = %e, "Failed to process head"),
            })
            .await?;

            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    result?;
                    tracing::info!("Interrupted, unsubscribing");
                }
                _ = handle.closed() => tracing::warn!("Head subscription ended"),
            }
            handle.unsubscribe();
            handle.join().await;
        }
    }

    Ok(())
}
