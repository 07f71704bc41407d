//! Metrics scrape and liveness endpoints.

use crate::metrics::Metrics;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

/// Liveness payload.  Independent of the chat connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    /// Unix time, seconds.
    pub timestamp: f64,
}

async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Response {
    metrics.touch_heartbeat();

    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("{e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
    })
}

pub fn router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(metrics)
}

/// Serve until the process exits.
pub async fn serve(metrics: Arc<Metrics>, port: u16) -> anyhow::Result<()> {
    let app = router(metrics);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Metrics: http://{}/metrics", addr);
    info!("Health check: http://{}/health", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dispatch::Status, metrics::GaugeName};
    use axum::body::{self, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_owned());
        let body = body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_exposition_text() {
        let metrics = Arc::new(Metrics::new().unwrap());
        metrics.increment_command("roll", Status::ValidationError);

        let (status, content_type, body) = get(router(metrics.clone()), "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(prometheus::TEXT_FORMAT));
        assert!(body.contains(
            r#"discord_bot_commands_total{command="roll",status="validation_error"} 1"#
        ));
        assert!(body.contains("discord_bot_heartbeat_timestamp_seconds"));
        assert!(metrics.snapshot().gauge(GaugeName::Heartbeat) > 0.0);
    }

    #[tokio::test]
    async fn health_endpoint() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let (status, _, body) = get(router(metrics), "/health").await;

        assert_eq!(status, StatusCode::OK);
        let health: HealthStatus = serde_json::from_str(&body).unwrap();
        assert_eq!(health.status, "healthy");
        assert!(health.timestamp > 0.0);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let (status, _, _) = get(router(metrics), "/test-crash").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
