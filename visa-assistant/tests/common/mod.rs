#![allow(dead_code)]

use service_core::config::Config as CoreConfig;
use std::sync::Arc;
use visa_assistant::config::VisaAssistantConfig;
use visa_assistant::services::metrics::init_metrics;
use visa_assistant::services::providers::mock::MockTextProvider;
use visa_assistant::startup::Application;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub provider: Arc<MockTextProvider>,
    /// Client with its own cookie jar, i.e. one visitor.
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn(provider: MockTextProvider) -> Self {
        init_metrics();

        let common = CoreConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Random port for testing
        };
        let config = VisaAssistantConfig::from_lookup(common, |key| match key {
            "GEMINI_API_KEY" => Some("test-api-key".to_string()),
            _ => None,
        })
        .expect("Failed to build test configuration");

        let provider = Arc::new(provider);
        let app = Application::build_with_provider(config, provider.clone())
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = Self::visitor();

        // Wait for the server to accept connections
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
            provider,
            client,
        }
    }

    /// A fresh client with an empty cookie jar.
    pub fn visitor() -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to build HTTP client")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn ask(&self, client: &reqwest::Client, message: &str) -> reqwest::Response {
        client
            .post(self.url("/api/consultation/messages"))
            .json(&serde_json::json!({ "message": message }))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn snapshot(&self, client: &reqwest::Client) -> serde_json::Value {
        client
            .get(self.url("/api/consultation"))
            .send()
            .await
            .expect("Failed to execute request")
            .json()
            .await
            .expect("Failed to parse JSON")
    }
}
