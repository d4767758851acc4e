use crate::assets;
use crate::proxy::TraceBackend;
use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use gemini_dash::config::CollectorConfig;
use gemini_dash::report::{self, MetricsReport};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Clone)]
pub struct AppState {
    collector: Arc<CollectorConfig>,
    traces: TraceBackend,
}

impl AppState {
    pub fn new(collector: CollectorConfig, traces: TraceBackend) -> Self {
        Self {
            collector: Arc::new(collector),
            traces,
        }
    }
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn server_error(message: String) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": message })),
    )
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/test", get(test))
        .route("/api/metrics", get(api_metrics))
        .route("/api/services", get(api_services))
        .route("/api/traces", get(api_traces))
        .fallback(assets::static_handler)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"ok": true}))
}

async fn test() -> Json<serde_json::Value> {
    Json(serde_json::json!({"message": "Server is working"}))
}

async fn api_metrics(State(state): State<AppState>) -> Result<Json<MetricsReport>, ApiError> {
    let collector = Arc::clone(&state.collector);
    let result = tokio::task::spawn_blocking(move || report::build_report(&collector)).await;

    match result {
        Ok(Ok(report)) => Ok(Json(report)),
        Ok(Err(e)) => {
            tracing::error!("error reading metrics: {e}");
            Err(server_error(format!("Failed to read metrics: {e}")))
        }
        Err(e) => {
            tracing::error!("metrics task failed: {e}");
            Err(server_error(format!("Failed to read metrics: {e}")))
        }
    }
}

async fn api_services(State(state): State<AppState>) -> Response {
    forward(&state.traces, "/api/services", None).await
}

async fn api_traces(State(state): State<AppState>, RawQuery(query): RawQuery) -> Response {
    forward(&state.traces, "/api/traces", query.as_deref()).await
}

async fn forward(backend: &TraceBackend, path: &str, query: Option<&str>) -> Response {
    match backend.get(path, query).await {
        Ok(upstream) => {
            let content_type = upstream
                .content_type
                .unwrap_or_else(|| "application/json".to_string());
            ([(header::CONTENT_TYPE, content_type)], upstream.body).into_response()
        }
        Err(e) => {
            tracing::error!("Jaeger API error: {e}");
            server_error(format!("Failed to fetch from Jaeger: {e}")).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use std::path::Path;
    use tower::ServiceExt;

    const LOG: &str = "\
LogRecord #0
Timestamp: 2025-07-20 14:06:00 +0000 UTC
     -> event.name: Str(gemini_cli.tool_call)
     -> session.id: Str(abc123)
     -> success: Bool(true)
     -> function_name: Str(read_file)
";

    fn state_for(tmp_root: &Path, backend_url: &str) -> AppState {
        let collector = CollectorConfig {
            gemini_tmp_dir: Some(tmp_root.to_path_buf()),
            ..Default::default()
        };
        AppState::new(collector, TraceBackend::new(backend_url).unwrap())
    }

    async fn call(app: Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, content_type, body.to_vec())
    }

    fn json(body: &[u8]) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }

    /// Start a stand-in Jaeger that echoes the query string it received.
    async fn fake_jaeger() -> String {
        async fn services() -> Json<serde_json::Value> {
            Json(serde_json::json!({"data": ["gemini-cli"]}))
        }
        async fn traces(RawQuery(q): RawQuery) -> String {
            format!("{{\"query\":\"{}\"}}", q.unwrap_or_default())
        }
        let upstream = Router::new()
            .route("/api/services", get(services))
            .route("/api/traces", get(traces));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, upstream).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// An address nothing is listening on.
    async fn dead_backend() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn health_and_test_routes() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state_for(dir.path(), "http://127.0.0.1:9"));

        let (status, _, body) = call(app.clone(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body), serde_json::json!({"ok": true}));

        let (status, _, body) = call(app, "/test").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["message"], "Server is working");
    }

    #[tokio::test]
    async fn metrics_without_log_is_empty_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state_for(dir.path(), "http://127.0.0.1:9"));

        let (status, _, body) = call(app, "/api/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json(&body),
            serde_json::json!({"metrics": [], "message": "No collector log found"})
        );
    }

    #[tokio::test]
    async fn metrics_from_discovered_log() {
        let dir = tempfile::tempdir().unwrap();
        let otel = dir.path().join("a1b2c3").join("otel");
        std::fs::create_dir_all(&otel).unwrap();
        std::fs::write(otel.join("collector.log"), LOG).unwrap();
        let app = router(state_for(dir.path(), "http://127.0.0.1:9"));

        let (status, _, body) = call(app, "/api/metrics").await;
        assert_eq!(status, StatusCode::OK);
        let v = json(&body);
        assert_eq!(v["total"], 1);
        let m = &v["metrics"][0];
        assert_eq!(m["name"], "gemini_cli.tool.usage");
        assert_eq!(m["sessionId"], "abc123");
        assert_eq!(m["type"], "counter");
        assert_eq!(m["attributes"]["operation"], "read_file");
        assert_eq!(m["attributes"]["success"], "true");
        assert_eq!(m["attributes"]["duration_ms"], 0);
    }

    #[tokio::test]
    async fn proxies_services_and_traces_query() {
        let dir = tempfile::tempdir().unwrap();
        let backend = fake_jaeger().await;
        let app = router(state_for(dir.path(), &backend));

        let (status, content_type, body) = call(app.clone(), "/api/services").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/json"));
        assert_eq!(json(&body), serde_json::json!({"data": ["gemini-cli"]}));

        let (status, _, body) = call(app, "/api/traces?service=gemini-cli&limit=20").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["query"], "service=gemini-cli&limit=20");
    }

    #[tokio::test]
    async fn proxy_transport_error_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state_for(dir.path(), &dead_backend().await));

        let (status, _, body) = call(app, "/api/traces").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let error = json(&body)["error"].as_str().unwrap().to_string();
        assert!(error.starts_with("Failed to fetch from Jaeger: "), "{error}");
    }

    #[tokio::test]
    async fn serves_embedded_index() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(state_for(dir.path(), "http://127.0.0.1:9"));

        let (status, content_type, body) = call(app.clone(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert!(String::from_utf8(body).unwrap().contains("Gemini CLI"));

        let (status, content_type, _) = call(app.clone(), "/js/app.js").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().contains("javascript"));

        let (status, _, _) = call(app, "/nope.css").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
