//! Application startup and lifecycle management.

use crate::config::{SessionSettings, VisaAssistantConfig};
use crate::handlers::consultation::{
    download_checklist, get_consultation, reset, send_message, summarize, toggle_item,
    toggle_theme,
};
use crate::handlers::health::{health_check, metrics_handler, readiness_check};
use crate::middleware::http_metrics_middleware;
use crate::services::providers::gemini::GeminiTextProvider;
use crate::services::providers::TextProvider;
use crate::services::ConversationService;
use axum::{
    body::Body,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    request_id_middleware, request_span, security_headers_middleware,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn TextProvider>,
    pub conversation: ConversationService,
}

impl AppState {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            conversation: ConversationService::new(provider.clone()),
            provider,
        }
    }
}

/// Build the HTTP router with sessions, tracing and metrics layers.
pub fn build_router(state: AppState, session: &SessionSettings) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(session.secure_cookie)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            session.inactivity_hours,
        )));

    let consultation = Router::new()
        .route("/", get(get_consultation))
        .route("/messages", post(send_message))
        .route("/summary", post(summarize))
        .route("/reset", post(reset))
        .route("/checklist/toggle", post(toggle_item))
        .route("/checklist.pdf", get(download_checklist))
        .route("/theme/toggle", post(toggle_theme))
        .layer(session_layer);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .nest("/api/consultation", consultation)
        .layer(from_fn(http_metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(request_span::<Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application backed by Gemini.
    pub async fn build(config: VisaAssistantConfig) -> Result<Self, AppError> {
        let provider = GeminiTextProvider::new(config.gemini_config()).map_err(|e| {
            tracing::error!("Failed to initialize Gemini provider: {}", e);
            AppError::ConfigError(anyhow::Error::new(e))
        })?;

        tracing::info!(
            model = %config.gemini.model,
            "Initialized Gemini text provider"
        );

        Self::build_with_provider(config, Arc::new(provider)).await
    }

    /// Build the application around any provider (tests use the mock).
    pub async fn build_with_provider(
        config: VisaAssistantConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let router = build_router(AppState::new(provider), &config.session);

        // Port 0 picks a random port for tests
        let addr: SocketAddr = config.common.bind_address().parse().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!(
                "Invalid bind address {}: {}",
                config.common.bind_address(),
                e
            ))
        })?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Visa assistant listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Serve until the process receives Ctrl+C or SIGTERM.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::metrics::{get_metrics, init_metrics};
    use crate::services::providers::mock::MockTextProvider;
    use crate::services::providers::ProviderError;
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn router() -> Router {
        let provider = Arc::new(MockTextProvider::new(true));
        build_router(AppState::new(provider), &SessionSettings::default())
    }

    #[tokio::test]
    async fn consultation_routes_issue_a_session_cookie() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/consultation/theme/toggle")
            .body(Body::empty())
            .unwrap();

        let response = router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn failed_first_question_still_issues_a_session_cookie() {
        let provider = Arc::new(
            MockTextProvider::new(true).with_responses([Err(ProviderError::RateLimited)]),
        );
        let router = build_router(AppState::new(provider), &SessionSettings::default());
        let request = Request::builder()
            .method("POST")
            .uri("/api/consultation/messages")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"message":"Do I need a transit visa?"}"#))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn health_route_has_no_session() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = router().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(!response.headers().contains_key(header::SET_COOKIE));
    }

    #[tokio::test]
    async fn malformed_message_body_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/consultation/messages")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"text":"hello"}"#))
            .unwrap();

        let response = router().oneshot(request).await.unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn requests_are_counted_by_route_template() {
        init_metrics();
        let request = Request::builder()
            .uri("/api/consultation/checklist.pdf")
            .body(Body::empty())
            .unwrap();

        router().oneshot(request).await.unwrap();

        assert!(get_metrics().contains("path=\"/api/consultation/checklist.pdf\""));
    }
}
