//! HTTP routes and handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{
        header::{CONTENT_TYPE, USER_AGENT},
        HeaderMap, StatusCode,
    },
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use rc_04_report_ingestion::ReportIntake;
use report_telemetry::{encode_metrics, log_report_event};
use serde_json::Value;
use shared_types::{Report, ReportError, ReportRegistry};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::domain::config::GatewayConfig;
use crate::domain::origin::OriginPolicy;
use crate::middleware::{create_cors_layer, enforce_origin};

const COMPONENT: &str = "gateway";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ReportRegistry>,
    pub intake: Arc<dyn ReportIntake>,
}

/// Build the gateway router.
///
/// The origin allow-list guards only the report route; health and metrics
/// stay reachable for health checks and scrapers.
pub fn build_router(state: AppState, policy: Arc<OriginPolicy>, config: &GatewayConfig) -> Router {
    let reports = Router::new()
        .route("/reports/:type", post(create_report))
        .route_layer(from_fn_with_state(policy, enforce_origin));

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(create_cors_layer(&config.cors))
        .layer(DefaultBodyLimit::max(config.max_body_bytes));

    Router::new()
        .route("/healthz", get(health_check))
        .route("/metrics", get(metrics))
        .merge(reports)
        .layer(middleware)
        .with_state(state)
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn metrics() -> Response {
    match encode_metrics() {
        Ok(body) => ([(CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// `POST /reports/:type`
///
/// 404 for an unregistered type, 400 for a body that does not decode, 500
/// when intake fails, otherwise 204. Duplicates are successes.
async fn create_report(
    State(state): State<AppState>,
    Path(report_type): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if !state.registry.supports(&report_type) {
        return StatusCode::NOT_FOUND;
    }

    let reports = match decode_reports(&state.registry, &report_type, &body) {
        Ok(reports) => reports,
        Err(e) => {
            log_report_event!(debug, COMPONENT, "Malformed report rejected", report_type, error = %e);
            return StatusCode::BAD_REQUEST;
        }
    };

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    for report in reports {
        match state.intake.save_report(&report_type, report, user_agent).await {
            Ok(outcome) => {
                log_report_event!(debug, COMPONENT, "Report accepted", report_type, outcome = %outcome);
            }
            Err(e) => {
                log_report_event!(error, COMPONENT, "Report intake failed", report_type, error = %e);
                return StatusCode::INTERNAL_SERVER_ERROR;
            }
        }
    }

    StatusCode::NO_CONTENT
}

/// A single report object, or an array of them as batched by the Reporting
/// API. Any undecodable element rejects the whole body.
fn decode_reports(
    registry: &ReportRegistry,
    report_type: &str,
    body: &[u8],
) -> Result<Vec<Report>, ReportError> {
    match serde_json::from_slice::<Value>(body)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| registry.decode(report_type, item))
            .collect(),
        single => Ok(vec![registry.decode(report_type, single)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::config::CorsConfig;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use parking_lot::Mutex;
    use rc_04_report_ingestion::{IntakeError, IntakeOutcome};
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingIntake {
        calls: Mutex<Vec<(String, Report, String)>>,
        fail: bool,
    }

    impl RecordingIntake {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(String, Report, String)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl ReportIntake for RecordingIntake {
        async fn save_report(
            &self,
            report_type: &str,
            report: Report,
            user_agent: &str,
        ) -> Result<IntakeOutcome, IntakeError> {
            if self.fail {
                return Err(IntakeError::Report(ReportError::Serialization(
                    "backend down".into(),
                )));
            }
            self.calls
                .lock()
                .push((report_type.to_string(), report, user_agent.to_string()));
            Ok(IntakeOutcome::Stored)
        }
    }

    const CSP_BODY: &str = r#"{
        "type": "csp-violation",
        "url": "https://app.example.com/page",
        "body": {
            "documentURL": "https://app.example.com/page",
            "blockedURL": "https://cdn.evil.test/x.js",
            "effectiveDirective": "script-src-elem",
            "disposition": "enforce"
        }
    }"#;

    fn app_with(intake: Arc<RecordingIntake>, domains: &[&str], max_body_bytes: usize) -> Router {
        let state = AppState {
            registry: Arc::new(ReportRegistry::with_defaults()),
            intake,
        };
        let policy = Arc::new(OriginPolicy::from_domains(domains).unwrap());
        let config = GatewayConfig {
            max_body_bytes,
            cors: CorsConfig::default(),
            ..Default::default()
        };
        build_router(state, policy, &config)
    }

    fn app(intake: Arc<RecordingIntake>) -> Router {
        app_with(intake, &["*.example.com"], 64 * 1024)
    }

    fn post_request(uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/reports+json")
    }

    fn report_request(uri: &str, origin: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = post_request(uri).header(USER_AGENT, "Mozilla/5.0");
        if let Some(origin) = origin {
            builder = builder.header("origin", origin);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let response = app(Arc::default())
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        report_telemetry::register_metrics().unwrap();
        let response = app(Arc::default())
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get(CONTENT_TYPE).unwrap();
        assert!(content_type.to_str().unwrap().starts_with("text/plain"));
    }

    #[tokio::test]
    async fn test_single_report_accepted() {
        let intake = Arc::new(RecordingIntake::default());
        let response = app(intake.clone())
            .oneshot(report_request(
                "/reports/csp",
                Some("https://app.example.com"),
                CSP_BODY,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let calls = intake.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "csp");
        assert_eq!(calls[0].2, "Mozilla/5.0");
        match &calls[0].1 {
            Report::Csp(report) => {
                assert_eq!(report.body.blocked_url, "https://cdn.evil.test/x.js")
            }
        }
    }

    #[tokio::test]
    async fn test_report_array_accepted() {
        let intake = Arc::new(RecordingIntake::default());
        let body = format!("[{CSP_BODY}, {CSP_BODY}]");
        let response = app(intake.clone())
            .oneshot(report_request(
                "/reports/csp",
                Some("https://app.example.com"),
                &body,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(intake.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_user_agent_is_empty() {
        let intake = Arc::new(RecordingIntake::default());
        let request = post_request("/reports/csp")
            .header("origin", "https://app.example.com")
            .body(Body::from(CSP_BODY))
            .unwrap();
        let response = app(intake.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(intake.calls()[0].2, "");
    }

    #[tokio::test]
    async fn test_unknown_type_not_found() {
        let intake = Arc::new(RecordingIntake::default());
        let response = app(intake.clone())
            .oneshot(report_request(
                "/reports/nel",
                Some("https://app.example.com"),
                CSP_BODY,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(intake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_bad_request() {
        let intake = Arc::new(RecordingIntake::default());
        for body in ["", "{not json", "42", "[{}, 7]"] {
            let response = app(intake.clone())
                .oneshot(report_request(
                    "/reports/csp",
                    Some("https://app.example.com"),
                    body,
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        }
        assert!(intake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_intake_failure_is_server_error() {
        let intake = Arc::new(RecordingIntake::failing());
        let response = app(intake)
            .oneshot(report_request(
                "/reports/csp",
                Some("https://app.example.com"),
                CSP_BODY,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_missing_origin_bad_request() {
        let intake = Arc::new(RecordingIntake::default());
        let response = app(intake.clone())
            .oneshot(report_request("/reports/csp", None, CSP_BODY))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(intake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_disallowed_origin_forbidden() {
        let intake = Arc::new(RecordingIntake::default());
        for origin in ["https://example.com", "https://a.b.example.com", "https://evil.test"] {
            let response = app(intake.clone())
                .oneshot(report_request("/reports/csp", Some(origin), CSP_BODY))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "origin: {origin}");
        }
        assert!(intake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_referer_fallback_allowed() {
        let intake = Arc::new(RecordingIntake::default());
        let request = post_request("/reports/csp")
            .header("referer", "https://app.example.com/checkout?step=2")
            .body(Body::from(CSP_BODY))
            .unwrap();
        let response = app(intake.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_empty_allow_list_accepts_any_origin() {
        let intake = Arc::new(RecordingIntake::default());
        let response = app_with(intake.clone(), &[], 64 * 1024)
            .oneshot(report_request("/reports/csp", None, CSP_BODY))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(intake.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let intake = Arc::new(RecordingIntake::default());
        let response = app_with(intake.clone(), &[], 16)
            .oneshot(report_request("/reports/csp", None, CSP_BODY))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(intake.calls().is_empty());
    }

    #[tokio::test]
    async fn test_body_at_limit_accepted() {
        let intake = Arc::new(RecordingIntake::default());
        let response = app_with(intake.clone(), &[], CSP_BODY.len())
            .oneshot(report_request("/reports/csp", None, CSP_BODY))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app_with(intake.clone(), &[], CSP_BODY.len() - 1)
            .oneshot(report_request("/reports/csp", None, CSP_BODY))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(intake.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let request = Request::builder()
            .method("OPTIONS")
            .uri("/reports/csp")
            .header("origin", "https://app.example.com")
            .header("access-control-request-method", "POST")
            .body(Body::empty())
            .unwrap();
        let response = app(Arc::default()).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
