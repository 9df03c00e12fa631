use anyhow::Result;
use axum::serve;
use tokio::{net::TcpListener, signal, time::Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use api::{create_app, sqlite, Settings};

async fn shutdown_signal(start: Instant) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = signal::ctrl_c() => {},
        _ = terminate => {},
    }
    let duration = start.elapsed();
    info!("Shutting down gracefully... in {:?}", duration);
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    dotenv::from_path("./api/.env").ok();

    let start = Instant::now();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("api=info,tower_http=info")),
        )
        .init();

    let settings = Settings::new()?;

    // Nothing listens until the schema is in place.
    let db = match sqlite::create_pool(&settings.sqlite).await {
        Ok(db) => db,
        Err(e) => {
            error!("Unable to prepare database {}: {:#}", settings.sqlite.url, e);
            return Err(e);
        }
    };

    let app = create_app(db.clone(), &settings.server.cors_origins);

    let listener = TcpListener::bind(settings.server.address()).await?;
    info!("Listening on {}", listener.local_addr()?);

    let server = serve(listener, app).with_graceful_shutdown(shutdown_signal(start));

    if let Err(e) = server.await {
        error!("Server error: {}", e);
    }

    db.close().await;

    Ok(())
}
