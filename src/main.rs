use anyhow::Context;
use std::future::IntoFuture;
use std::sync::Arc;
use word_stream::config::Config;
use word_stream::ingestion::backfill::BackfillIngestor;
use word_stream::ingestion::stream::StreamIngestor;
use word_stream::provider::twitter::TwitterClient;
use word_stream::snapshot::manager::{SnapshotManager, StartupSource};
use word_stream::snapshot::store::FileStore;
use word_stream::words::handlers::router;
use word_stream::words::table::FrequencyTable;
use word_stream::words::tokenizer::Tokenizer;
use word_stream::words::counting_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        // .with_max_level(tracing::Level::DEBUG)
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut config = Config::from_env()?;

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                let value = args.get(i + 1).context("--bind needs <addr:port>")?;
                config.bind_addr = value.parse()?;
                i += 2;
            }
            "--seed-file" => {
                let value = args.get(i + 1).context("--seed-file needs <path>")?;
                config.seed_file = value.into();
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }

    tracing::info!("Tracking filter {}", config.filter);

    let table = FrequencyTable::new();
    let tokenizer = Arc::new(Tokenizer::new(&config.language, &config.denylist));
    let handler = counting_handler(tokenizer, table.clone());
    let client = Arc::new(TwitterClient::new(&config.api_base, &config.bearer_token));

    // 1. Initial contents: snapshot, or one backfill over the last 7 days:
    let snapshots = Arc::new(SnapshotManager::new(
        FileStore::new(&config.seed_file),
        table.clone(),
        config.save_interval,
    ));
    let backfill = BackfillIngestor::new(
        client.clone(),
        &config.filter,
        handler.clone(),
        config.page_delay,
    );

    match snapshots.restore_or_backfill(&backfill).await {
        StartupSource::Snapshot { words } => {
            tracing::info!(
                "Seeded {} words from {}",
                words,
                snapshots.store().path().display()
            );
        }
        StartupSource::Backfill(report) => {
            tracing::info!(
                "Seeded {} words from backfill ({} pages, completed: {})",
                table.len(),
                report.pages,
                report.completed
            );
        }
    }

    // 2. Spawn periodic snapshots:
    let saver = snapshots.clone();
    tokio::spawn(async move {
        saver.run().await;
    });

    // 3. Spawn live stream:
    let stream = StreamIngestor::new(client, &config.filter, handler);
    let mut stream_handle = tokio::spawn(async move { stream.run().await });

    // 4. Start HTTP server:
    let app = router(table.clone());
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("HTTP server listening on {}", config.bind_addr);
    tracing::info!("Press Ctrl+C to shutdown");

    tokio::select! {
        served = axum::serve(listener, app).into_future() => {
            served?;
        }
        joined = &mut stream_handle => {
            match joined {
                Ok(Err(e)) => {
                    tracing::error!("Stopping: {}", e);
                    return Err(e.into());
                }
                Ok(Ok(())) => tracing::warn!("Stream ingestor stopped"),
                Err(e) => return Err(anyhow::anyhow!("stream task failed: {}", e)),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down, saving a final snapshot");
            match snapshots.save_now().await {
                Ok(words) => tracing::info!("Saved {} words", words),
                Err(e) => tracing::error!("Unable to save word values to snapshot: {:#}", e),
            }
        }
    }

    Ok(())
}
