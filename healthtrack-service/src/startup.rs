use crate::config::HealthTrackConfig;
use crate::handlers;
use crate::services::providers::{build_provider, TextProvider};
use crate::services::retrieval::KeywordRetriever;
use crate::services::{Database, Summarizer};
use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    bearer_auth::{bearer_auth_middleware, BearerAuthConfig},
    metrics::metrics_middleware,
    security_headers::security_headers_middleware,
    tracing::{make_request_span, request_id_middleware, REQUEST_ID_HEADER},
};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<HealthTrackConfig>,
    pub db: Database,
    pub summarizer: Summarizer,
    pub auth: BearerAuthConfig,
}

impl AsRef<BearerAuthConfig> for AppState {
    fn as_ref(&self) -> &BearerAuthConfig {
        &self.auth
    }
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    /// Build with the provider named in the configuration.
    pub async fn build(config: HealthTrackConfig) -> Result<Self, AppError> {
        let provider = build_provider(&config.llm).map_err(|e| {
            tracing::error!("Failed to initialise LLM provider: {}", e);
            AppError::ConfigError(anyhow::anyhow!("LLM provider: {}", e))
        })?;
        Self::build_with_provider(config, provider).await
    }

    pub async fn build_with_provider(
        config: HealthTrackConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let db = Database::new(&config.database.path, config.database.max_connections)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed to open database at {}: {}",
                    config.database.path.display(),
                    e
                );
                e
            })?;
        db.run_migrations().await?;

        let auth = BearerAuthConfig::new(config.security.api_token.clone());
        if !auth.is_enabled() {
            tracing::warn!("API_TOKEN not set; API endpoints are unauthenticated");
        }

        tracing::info!(
            provider = provider.name(),
            model = %config.llm.model,
            timezone = %config.user_timezone,
            "Summary provider ready"
        );

        let summarizer = Summarizer::new(
            provider,
            Duration::from_secs(config.llm.timeout_secs),
            config.llm.temperature,
        )
        .with_retrieval(Arc::new(KeywordRetriever), config.summary.top_k);

        let address = config.common.address();
        let state = AppState {
            config: Arc::new(config),
            db,
            summarizer,
            auth,
        };

        let app = build_router(state.clone());

        let listener = TcpListener::bind(&address).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn db(&self) -> &Database {
        &self.state.db
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/log", post(handlers::create_log))
        .route("/entries", get(handlers::list_entries))
        .route("/entries/:id", get(handlers::get_entry))
        .route("/summary", get(handlers::get_summary))
        .route_layer(from_fn_with_state(
            state.clone(),
            bearer_auth_middleware::<AppState>,
        ));

    let cors = cors_layer(&state.config.security.cors_origins);

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .route("/ui", get(handlers::ui_page))
        .merge(api)
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, request_id.clone()])
        .expose_headers([request_id]);

    if origins.is_empty() {
        tracing::warn!("CORS_ORIGINS not set; allowing any origin");
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(allowed))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
