//! Common test utilities for healthtrack-service integration tests.
#![allow(dead_code)]

use healthtrack_service::config::{
    DatabaseConfig, HealthTrackConfig, LlmConfig, SecurityConfig, SummaryConfig,
};
use healthtrack_service::services::providers::{MockTextProvider, TextProvider};
use healthtrack_service::services::metrics::init_metrics;
use healthtrack_service::services::Database;
use healthtrack_service::startup::Application;
use secrecy::Secret;
use serde_json::Value;
use service_core::config::Config as CoreConfig;
use std::sync::{Arc, Once};
use tempfile::TempDir;

pub const TEST_USER_ID: &str = "u1";
pub const TEST_TOKEN: &str = "test-api-token";

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,healthtrack_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub struct TestOptions {
    pub api_token: Option<String>,
    pub cors_origins: Vec<String>,
    pub provider: Arc<dyn TextProvider>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            api_token: None,
            cors_origins: Vec::new(),
            provider: Arc::new(MockTextProvider::new(true)),
        }
    }
}

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: Database,
    pub client: reqwest::Client,
    // Keeps the SQLite file alive for the lifetime of the app.
    _data_dir: TempDir,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    pub async fn spawn_with_token(token: &str) -> Self {
        Self::spawn_with(TestOptions {
            api_token: Some(token.to_string()),
            ..TestOptions::default()
        })
        .await
    }

    pub async fn spawn_with(options: TestOptions) -> Self {
        init_tracing();
        init_metrics().expect("Failed to install metrics recorder");

        let data_dir = tempfile::tempdir().expect("Failed to create temp dir");

        let config = HealthTrackConfig {
            common: CoreConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port for testing
            },
            database: DatabaseConfig {
                path: data_dir.path().join("health.db"),
                max_connections: 2,
            },
            security: SecurityConfig {
                api_token: options.api_token.map(Secret::new),
                cors_origins: options.cors_origins,
            },
            llm: LlmConfig::mock(),
            summary: SummaryConfig::default(),
            user_timezone: chrono_tz::UTC,
        };

        let app = Application::build_with_provider(config, options.provider)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = app.db().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            client,
            _data_dir: data_dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_log(&self, user_id: &str, message: &str) -> reqwest::Response {
        self.client
            .post(self.url("/log"))
            .json(&serde_json::json!({ "user_id": user_id, "message": message }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Log a message and return the stored entry, asserting it was created.
    pub async fn log_entry(&self, user_id: &str, message: &str) -> Value {
        let response = self.post_log(user_id, message).await;
        assert_eq!(response.status(), 201, "logging '{}' failed", message);
        response.json().await.expect("Failed to parse entry")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
