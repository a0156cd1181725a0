use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use yt_chat_embed::config::Config;
use yt_chat_embed::sources::{MetadataFetcher, PluginClient};
use yt_chat_embed::MessagePipeline;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("yt_chat_embed=debug".parse()?)
                .add_directive("reqwest=info".parse()?),
        )
        .init();

    info!("🎬 Starting yt-chat-embed v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    info!("{}", config.summary());

    let plugin = Arc::new(PluginClient::new(&config)?);

    if std::env::args().any(|arg| arg == "--health-check") {
        return health_check(&plugin).await;
    }

    if let Err(e) = plugin.probe().await {
        warn!(
            "⚠️ YouTube plugin not reachable at {} ({}), macros will expand to nothing",
            config.plugin_base_url, e
        );
    }

    info!("🔌 Metadata source: {}", plugin.source_name());
    let pipeline = MessagePipeline::from_config(&config, plugin);

    // One stdin line per chat message
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("⚠️ Shutdown signal received, exiting...");
                break;
            }
            line = lines.next_line() => match line? {
                Some(message) => match pipeline.process_message(&message).await {
                    Ok(processed) => println!("{}", processed),
                    Err(e) => {
                        error!("❌ Could not process message: {}", e);
                        println!("{}", message);
                    }
                },
                None => break,
            },
        }
    }

    let metrics = pipeline.cache().metrics();
    info!(
        "📊 Cache: {} entries, {} hits, {} misses ({:.0}% hit rate)",
        metrics.entries,
        metrics.hits,
        metrics.misses,
        metrics.hit_rate() * 100.0
    );

    Ok(())
}

async fn health_check(plugin: &PluginClient) -> Result<()> {
    match plugin.probe().await {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => anyhow::bail!("YouTube plugin unavailable: {}", e),
    }
}
