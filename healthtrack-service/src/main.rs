use healthtrack_service::config::HealthTrackConfig;
use healthtrack_service::services::metrics::init_metrics;
use healthtrack_service::startup::Application;
use service_core::config::get_optional_env;
use service_core::observability::init_tracing;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize metrics recorder (must be before any metrics are recorded)
    init_metrics().map_err(|e| std::io::Error::other(e.to_string()))?;

    let otlp_endpoint = get_optional_env("OTLP_ENDPOINT");
    init_tracing("healthtrack-service", "info", otlp_endpoint.as_deref());

    let config = HealthTrackConfig::load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await
}
