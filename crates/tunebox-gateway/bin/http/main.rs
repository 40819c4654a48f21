mod cli;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use redis::aio::ConnectionManager;
use tunebox_cache::redis::connect_manager;
use tunebox_cache::{MokaStreamCache, RedisCacheConfig, RedisStreamCache};
use tunebox_core::{CredentialSource, NoCredentials, StreamCache};
use tunebox_extractor::{CookieFileSource, EnvCookieSource, YtDlpConfig, YtDlpExtractor};
use tunebox_gateway::{
    cors_layer, App, AppState, Catalog, CatalogConfig, RedisSearchCache, YouTubeCatalog,
};
use tunebox_resolver::{ResolverConfig, StreamResolver};
use tunebox_telemetry::TelemetryConfig;
use tunebox_validator::{HttpUrlValidator, ValidatorConfig};

use crate::cli::{CacheBackendArg, CLI};

const SERVICE_NAME: &str = "tunebox-gateway";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();

    let _telemetry = tunebox_telemetry::init(
        TelemetryConfig::builder()
            .service_name(SERVICE_NAME)
            .log_format(config.log_format)
            .otlp_endpoint(config.otlp_endpoint.clone())
            .build(),
    )
    .context("initializing telemetry")?;

    info!(
        listen_addr = %config.listen_addr,
        cache_backend = %config.cache,
        ytdlp = %config.ytdlp_path.display(),
        search_enabled = config.youtube_api_key.is_some(),
        "starting tunebox gateway"
    );

    let redis = connect_redis(&config).await?;
    let cache = build_cache(&config, redis.clone());
    let credentials = build_credentials(&config);

    let extractor = YtDlpExtractor::new(
        YtDlpConfig::builder()
            .binary(config.ytdlp_path.clone())
            .preferred_container(config.preferred_container.clone())
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.extract_timeout_secs))
            .record_ttl(Duration::from_secs(config.record_ttl_secs))
            .build(),
    );
    let validator = HttpUrlValidator::new(
        ValidatorConfig::builder()
            .user_agent(config.user_agent.clone())
            .build(),
    )
    .context("building validator http client")?;

    let resolver = StreamResolver::with_config(
        cache,
        validator,
        extractor,
        credentials,
        ResolverConfig::builder()
            .validation_timeout(Duration::from_secs(config.validation_timeout_secs))
            .build(),
    );

    let catalog = match config.youtube_api_key.clone() {
        Some(api_key) => {
            let mut catalog = YouTubeCatalog::new(
                CatalogConfig::builder()
                    .api_key(api_key)
                    .cache_ttl(Duration::from_secs(config.search_ttl_secs))
                    .build(),
            )
            .context("building search http client")?;
            if let Some(conn) = redis {
                catalog = catalog.with_cache(Arc::new(
                    RedisSearchCache::new(conn).with_op_timeout(Duration::from_millis(
                        config.cache_op_timeout_ms,
                    )),
                ));
            }
            Some(Arc::new(catalog) as Arc<dyn Catalog>)
        }
        None => {
            warn!("no YouTube API key configured, /search is disabled");
            None
        }
    };

    let cors = cors_layer(&config.cors_origins).context("parsing CORS origins")?;
    let app = App::router(AppState::new(Arc::new(resolver), catalog), cors);

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding to {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running gateway server")?;

    info!("gateway stopped");
    Ok(())
}

/// Opens the Redis connection shared by the stream and search caches.
async fn connect_redis(config: &CLI) -> anyhow::Result<Option<ConnectionManager>> {
    match config.cache {
        CacheBackendArg::Memory => Ok(None),
        CacheBackendArg::Redis => {
            let url = config
                .redis_url
                .as_deref()
                .context("redis url is required when cache backend is redis")?;
            let timeout = Duration::from_millis(config.cache_op_timeout_ms) * 10;
            let conn = connect_manager(url, timeout)
                .await
                .context("connecting to redis")?;
            Ok(Some(conn))
        }
    }
}

fn build_cache(config: &CLI, redis: Option<ConnectionManager>) -> Arc<dyn StreamCache> {
    match redis {
        None => Arc::new(MokaStreamCache::new()),
        Some(conn) => Arc::new(RedisStreamCache::with_config(
            conn,
            RedisCacheConfig::builder()
                .key_prefix(config.cache_key_prefix.clone())
                .op_timeout(Duration::from_millis(config.cache_op_timeout_ms))
                .build(),
        )),
    }
}

fn build_credentials(config: &CLI) -> Arc<dyn CredentialSource> {
    if let Some(path) = &config.cookies_file {
        info!(path = %path.display(), "using cookie file");
        Arc::new(CookieFileSource::new(path.clone()))
    } else if let Some(var) = &config.cookies_var {
        info!(var = %var, "using cookies from environment");
        Arc::new(EnvCookieSource::new(var.clone()))
    } else {
        Arc::new(NoCredentials)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining connections");
}
