use crate::config::Settings;
use crate::error::ThrottlerResult;
use crate::handlers::{
    current_config, global_metrics, health_check, key_metrics, readiness_check, throttle_key,
    AppState,
};
use crate::middleware::logging_middleware;
use crate::store::{BucketStore, MemoryStore, RedisStore};
use crate::throttler::Throttler;
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the HTTP router around a throttler
pub fn create_app(throttler: Throttler) -> Router {
    let shared_state = AppState::new(throttler);

    Router::new()
        .route("/throttle/:key", post(throttle_key))
        .route("/metrics", get(global_metrics))
        .route("/metrics/:key", get(key_metrics))
        .route("/config", get(current_config))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .with_state(shared_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(logging_middleware)),
        )
}

pub struct Server {
    app: Router,
    bind_address: String,
}

impl Server {
    pub async fn new(settings: &Settings) -> ThrottlerResult<Self> {
        settings.check()?;

        let store: Arc<dyn BucketStore> = if settings.uses_redis() {
            tracing::info!("Connecting to Redis bucket store");
            Arc::new(RedisStore::connect(&settings.redis_url).await?)
        } else {
            tracing::warn!("No REDIS_URL configured, buckets are kept in process memory");
            let store = MemoryStore::new();
            store.spawn_purge_task(settings.purge_interval());
            Arc::new(store)
        };

        let throttler = Throttler::builder()
            .shared_store(store)
            .namespace(settings.namespace.clone())
            .limit(settings.limit)
            .ttl(settings.ttl_ms)
            .build()?;

        tracing::info!(?throttler, "Throttler configured");

        Ok(Self {
            app: create_app(throttler),
            bind_address: settings.bind_address.clone(),
        })
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;

        tracing::info!("Throttle server listening on {}", self.bind_address);
        tracing::info!("Health check available at /health");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        },
    }
}
