use service_core::observability::init_tracing;
use visa_assistant::config::VisaAssistantConfig;
use visa_assistant::services::metrics::init_metrics;
use visa_assistant::startup::Application;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();

    let config = VisaAssistantConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::other(format!("Configuration error: {}", e))
    })?;

    init_tracing("visa-assistant", "info", config.otlp_endpoint.as_deref());
    init_metrics();

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        std::io::Error::other(format!("Startup error: {}", e))
    })?;

    application.run_until_stopped().await
}
