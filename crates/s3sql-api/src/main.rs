use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use s3sql_api::{router, AppConfig, AppState, PresignBackendKind};
use s3sql_db::{log_pool_metrics, Database, HttpPresignBackend, PresignBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "s3sql_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "s3sql_api=debug,s3sql_db=info,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("s3sql-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            // no ANSI in files unless asked
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    let config = AppConfig::from_env()?;
    info!(
        metadata_table = %config.metadata_table,
        row_limit = config.search_row_limit,
        search_cache_ttl_secs = config.search_cache_ttl.map(|d| d.as_secs()).unwrap_or(0),
        link_cache_ttl_secs = config.link_cache_ttl.as_secs(),
        presign_expiry_secs = config.presign_expiry.as_secs(),
        "Configuration loaded"
    );
    if config.link_cache_ttl > config.presign_expiry {
        tracing::warn!(
            "LINK_CACHE_TTL_SECS exceeds PRESIGN_EXPIRY_SECS; cached links may be served after they expire"
        );
    }

    let db = Database::connect_with_config(
        &config.database_url,
        &config.metadata_table,
        config.pool_config(),
    )
    .await?;

    if config.run_migrations {
        info!("Running database migrations");
        db.migrate().await?;
    }
    log_pool_metrics(db.pool());

    let presign: Arc<dyn PresignBackend> = match &config.presign_backend {
        PresignBackendKind::Sql => Arc::new(db.sql_presign_backend()),
        PresignBackendKind::Http { base_url } => Arc::new(HttpPresignBackend::new(
            base_url.clone(),
            config.presign_http_timeout,
        )?),
    };
    info!(backend = presign.name(), "Presign backend selected");

    let state = AppState::new(Arc::new(db.files.clone()), presign, &config);
    let app = router(state);

    // Start server
    let addr: SocketAddr = config.bind_addr().parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
