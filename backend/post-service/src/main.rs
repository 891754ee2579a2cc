use actix_cors::Cors;
use actix_middleware::{CorrelationIdMiddleware, SessionAuthMiddleware, SessionValidator};
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use db_pool::{create_pool, DbConfig};
use post_service::assets::{AssetStore, S3AssetStore};
use post_service::config::{Config, LogConfig};
use post_service::db::{InMemoryPostStore, PgPostStore, PostStore};
use post_service::{handlers, AppState};
use s3_utils::S3Client;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let registry = tracing_subscriber::registry().with(filter);

    if log.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn PostStore>> {
    if config.database.in_memory {
        tracing::warn!("POST_STORE_IN_MEMORY set; data will not survive a restart");
        return Ok(Arc::new(InMemoryPostStore::new()));
    }

    let db_cfg = DbConfig::from_env("post-service", &config.database.url);
    db_cfg.log_config();
    let pool = create_pool(db_cfg)
        .await
        .context("Failed to create database pool")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    Ok(Arc::new(PgPostStore::new(pool)))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    init_tracing(&config.log);

    tracing::info!("Starting post-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let store = build_store(&config).await?;

    let s3 = S3Client::connect(config.s3.clone()).await;
    tracing::info!(bucket = %s3.config().bucket, "S3 asset store configured");
    let assets: Arc<dyn AssetStore> = Arc::new(S3AssetStore::new(
        s3.operations(),
        &config.media.asset_key_prefix,
    ));

    let state = web::Data::new(AppState::new(store, assets, config.media.max_image_bytes));
    let validator = Arc::new(SessionValidator::new(&config.auth.jwt_secret));
    let max_image_bytes = config.media.max_image_bytes;
    let origins: Vec<String> = config.cors.origins().map(str::to_string).collect();

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in &origins {
            cors = if origin == "*" {
                cors.allow_any_origin()
            } else {
                cors.allowed_origin(origin)
            };
        }
        // Session cookie must cross origins for the web client.
        let cors = cors
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        let auth = SessionAuthMiddleware::new(validator.clone());
        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(CorrelationIdMiddleware)
            .configure(|cfg| handlers::configure(cfg, auth, max_image_bytes))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("HTTP server failed")?;

    tracing::info!("post-service stopped");
    Ok(())
}
