use std::sync::Arc;

use market_server::core::logger;
use market_server::core::tasks::{BackgroundTasks, TaskKind};
use market_server::media::MediaStore;
use market_server::notify::SmtpTransport;
use market_server::{
    Config, CropLifecycleManager, ExpiryScheduler, IdentityResolver, NotificationDispatcher,
    Storage,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment and logging
    dotenv::dotenv().ok();
    let config = Config::from_env();
    logger::init_logger(&config.log_level, config.log_dir.as_deref());

    tracing::info!("AgriMarket server starting...");

    // 2. Storage — one backend, resolved now, never substituted later
    let storage = Storage::connect(&config.storage).await?;

    // 3. Mail transport and dispatcher
    let transport = SmtpTransport::new(config.smtp.clone());
    if !transport.is_configured() {
        tracing::warn!("No SMTP credential configured; notifications will be skipped");
    }
    let dispatcher = NotificationDispatcher::new(Arc::new(transport));

    // 4. Engine components the scheduler depends on; the rest of the engine
    //    (cart, deals, settlement) is constructed by the embedding service.
    let media = MediaStore::new(config.media_dir.clone());
    let identity = IdentityResolver::new(storage.clone(), dispatcher.clone());
    let listings = CropLifecycleManager::new(
        storage.clone(),
        identity,
        dispatcher,
        media,
    );

    // 5. Background tasks
    let mut tasks = BackgroundTasks::new();
    let scheduler = ExpiryScheduler::new(
        listings,
        config.expiry_poll_interval(),
        tasks.shutdown_token(),
    );
    tasks.spawn("expiry-scheduler", TaskKind::Periodic, scheduler.run());

    tracing::info!(
        mode = ?storage.mode(),
        poll_interval = ?config.expiry_poll_interval(),
        "AgriMarket server ready"
    );

    // 6. Run until interrupted, then stop the background tasks cleanly
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    tasks.shutdown().await;

    Ok(())
}
