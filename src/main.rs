use std::sync::Arc;

use intake_relay::channels::{Messenger, TelegramMessenger};
use intake_relay::config::RelayConfig;
use intake_relay::relay::{Relay, RelayState, UploadStore, relay_routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = RelayConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export TELEGRAM_BOT_TOKEN=123456:ABC...");
        eprintln!("  export TELEGRAM_CHAT_ID=-100...");
        std::process::exit(1);
    });

    // ── Upload directory ────────────────────────────────────────────────
    let store = UploadStore::new(&config.uploads);
    store.ensure_dir().await?;
    match store.sweep().await {
        Ok(0) => {}
        Ok(removed) => tracing::warn!(removed, "Removed uploads left by a previous run"),
        Err(e) => tracing::warn!(error = %e, "Could not sweep upload directory"),
    }

    // ── Relay ───────────────────────────────────────────────────────────
    let messenger: Arc<dyn Messenger> = Arc::new(TelegramMessenger::new(&config.telegram));
    let relay = Relay::new(messenger, config.telegram.chat_id.clone());
    let app = relay_routes(RelayState::new(relay, store), config.max_body_bytes);

    let addr = config.server.socket_addr();
    eprintln!("Intake Relay v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Submit: http://{addr}/submit-form");
    eprintln!("   Uploads: {}", config.uploads.dir.display());
    eprintln!(
        "   File limit: {} bytes, body limit: {} bytes\n",
        config.uploads.max_file_bytes, config.max_body_bytes
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Relay server started");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Relay server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
