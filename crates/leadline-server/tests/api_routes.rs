use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use leadline_api::{sample_contact_payload, sample_lead_payload};
use leadline_crm::{
    BreakerConfig, CrmError, CrmErrorCode, CrmMode, LeadDispatcher, LeadSink, RecordingSink,
    SinkReceipt, CIRCUIT_OPEN_REASON,
};
use leadline_model::{ProductLine, Submission};
use leadline_server::{build_router, ApiConfig, AppState, RateLimitConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

fn mock_app(api: ApiConfig) -> (Router, AppState) {
    let state = AppState::new(api, LeadDispatcher::mock_only());
    (build_router(state.clone()), state)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let resp = app.clone().oneshot(req).await.expect("response");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = to_bytes(resp.into_body(), 1 << 20).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, headers, body)
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn quote_is_accepted_with_mock_receipt() {
    let (app, _) = mock_app(ApiConfig::default());
    let (status, headers, body) =
        send(&app, post_json("/v1/leads", &sample_lead_payload(ProductLine::Auto))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["kind"], "quote");
    assert_eq!(body["product"], "auto");
    assert_eq!(body["crm"]["mode"], "mock");
    let lead_id = body["lead_id"].as_str().expect("lead id");
    assert!(lead_id.starts_with("lead-"));
    assert_eq!(body["crm"]["record_id"], format!("mock-{lead_id}"));
    assert!(body.get("relay").is_none());
    assert!(headers.contains_key("x-request-id"));

    let (_, _, metrics) = send(&app, get("/metrics")).await;
    let text = metrics.as_str().expect("prometheus text");
    assert!(
        text.contains("leadline_leads_accepted_total{product=\"auto\",mode=\"mock\"} 1"),
        "{text}"
    );
}

#[tokio::test]
async fn product_path_overrides_and_must_agree_with_body() {
    let (app, _) = mock_app(ApiConfig::default());
    let mut payload = sample_lead_payload(ProductLine::Life);
    payload.as_object_mut().expect("object").remove("product");
    let (status, _, body) = send(&app, post_json("/v1/quotes/life", &payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["product"], "life");

    let (status, _, body) = send(
        &app,
        post_json("/v1/quotes/home", &sample_lead_payload(ProductLine::Life)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_failed");
}

#[tokio::test]
async fn unsupported_product_is_422() {
    let (app, _) = mock_app(ApiConfig::default());
    let payload = sample_lead_payload(ProductLine::Auto);
    let (status, _, body) = send(&app, post_json("/v1/quotes/pet", &payload)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "unsupported_product");
}

#[tokio::test]
async fn validation_errors_list_every_field_and_carry_request_id() {
    let (app, _) = mock_app(ApiConfig::default());
    let mut payload = sample_lead_payload(ProductLine::Auto);
    payload["contact"]["email"] = json!("not-an-email");
    payload["consent"]["tcpa"] = json!(false);
    let mut req = post_json("/v1/leads", &payload);
    req.headers_mut()
        .insert("x-request-id", "req-client-7".parse().expect("header"));
    let (status, headers, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_failed");
    assert_eq!(body["error"]["request_id"], "req-client-7");
    assert_eq!(headers["x-request-id"], "req-client-7");
    let fields: Vec<&str> = body["error"]["details"]["field_errors"]
        .as_array()
        .expect("field errors")
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"contact.email"), "{fields:?}");
    assert!(fields.contains(&"consent.tcpa"), "{fields:?}");
}

#[tokio::test]
async fn malformed_and_oversized_bodies_are_rejected() {
    let (app, _) = mock_app(ApiConfig::default());
    let req = Request::builder()
        .method(Method::POST)
        .uri("/v1/contact")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_json");

    let mut payload = sample_contact_payload();
    payload["message"] = json!("x".repeat(32 * 1024));
    let (status, _, body) = send(&app, post_json("/v1/contact", &payload)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "payload_too_large");
}

#[tokio::test]
async fn contact_message_is_accepted() {
    let (app, _) = mock_app(ApiConfig::default());
    let (status, _, body) = send(&app, post_json("/v1/contact", &sample_contact_payload())).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["kind"], "contact");
    assert!(body["lead_id"]
        .as_str()
        .is_some_and(|id| id.starts_with("contact-")));
    assert!(body.get("product").is_none());
}

#[tokio::test]
async fn honeypot_submissions_look_accepted_but_skip_the_crm() {
    let sink = Arc::new(RecordingSink::new());
    let dispatcher = LeadDispatcher::new(sink.clone(), CrmMode::Live, BreakerConfig::default());
    let state = AppState::new(ApiConfig::default(), dispatcher);
    let app = build_router(state);

    let mut payload = sample_lead_payload(ProductLine::Home);
    payload["website"] = json!("http://spam.example");
    let (status, _, body) = send(&app, post_json("/v1/leads", &payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["crm"]["mode"], "mock");
    assert_eq!(sink.calls().await, 0);
    let (_, _, metrics) = send(&app, get("/metrics")).await;
    let text = metrics.as_str().expect("prometheus text");
    assert!(text.contains("leadline_honeypot_total 1"), "{text}");
}

#[tokio::test]
async fn submissions_are_rate_limited_per_client() {
    let api = ApiConfig {
        rate_limit_per_ip: RateLimitConfig {
            capacity: 2.0,
            refill_per_sec: 0.01,
        },
        trust_forwarded_for: true,
        ..ApiConfig::default()
    };
    let (app, _) = mock_app(api);
    let payload = sample_contact_payload();
    let from = |ip: &str| {
        let mut req = post_json("/v1/contact", &payload);
        req.headers_mut()
            .insert("x-forwarded-for", ip.parse().expect("header"));
        req
    };
    for _ in 0..2 {
        let (status, _, _) = send(&app, from("203.0.113.7")).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, headers, body) = send(&app, from("203.0.113.7")).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["code"], "rate_limited");
    let retry_after: u64 = headers["retry-after"]
        .to_str()
        .expect("ascii")
        .parse()
        .expect("seconds");
    assert!(retry_after >= 1);

    let (status, _, _) = send(&app, from("198.51.100.2")).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn tiny_refill_rate_answers_429_with_a_bounded_retry_after() {
    let api = ApiConfig {
        rate_limit_per_ip: RateLimitConfig {
            capacity: 1.0,
            refill_per_sec: 1e-20,
        },
        ..ApiConfig::default()
    };
    let (app, _) = mock_app(api);
    let payload = sample_contact_payload();
    let (status, _, _) = send(&app, post_json("/v1/contact", &payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, headers, _) = send(&app, post_json("/v1/contact", &payload)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(headers["retry-after"], "86400");
}

#[tokio::test]
async fn step_validation_reports_only_the_requested_step() {
    let (app, _) = mock_app(ApiConfig::default());
    let mut lead = sample_lead_payload(ProductLine::Auto);
    lead["details"]["drivers"] = json!(0);
    let (status, _, body) = send(
        &app,
        post_json("/v1/leads/validate", &json!({"step": "contact", "lead": lead})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);

    let (status, _, body) = send(
        &app,
        post_json("/v1/leads/validate", &json!({"step": "details", "lead": lead})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["field_errors"][0]["field"], "details.drivers");

    let (status, _, body) = send(
        &app,
        post_json("/v1/leads/validate", &json!({"step": "payment", "lead": lead})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_failed");
}

#[tokio::test]
async fn crm_outage_falls_back_to_mock_in_auto_mode() {
    let sink = Arc::new(RecordingSink::new());
    sink.fail_always(CrmError::new(CrmErrorCode::Network, "connection refused"))
        .await;
    let dispatcher = LeadDispatcher::new(sink.clone(), CrmMode::Auto, BreakerConfig::default());
    let app = build_router(AppState::new(ApiConfig::default(), dispatcher));

    let (status, _, body) =
        send(&app, post_json("/v1/leads", &sample_lead_payload(ProductLine::Health))).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["crm"]["mode"], "mock");
    assert!(body["crm"]["fallback_reason"]
        .as_str()
        .is_some_and(|r| r.contains("connection refused")));

    let (_, _, metrics) = send(&app, get("/metrics")).await;
    let text = metrics.as_str().expect("prometheus text");
    assert!(text.contains("leadline_crm_fallback_total{reason=\"network\"} 1"), "{text}");
}

#[tokio::test]
async fn live_mode_surfaces_crm_failures_as_502() {
    let sink = Arc::new(RecordingSink::new());
    sink.fail_always(CrmError::new(CrmErrorCode::Auth, "invalid_grant"))
        .await;
    let dispatcher = LeadDispatcher::new(sink, CrmMode::Live, BreakerConfig::default());
    let app = build_router(AppState::new(ApiConfig::default(), dispatcher));
    let (status, _, body) = send(&app, post_json("/v1/contact", &sample_contact_payload())).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "upstream_unavailable");
}

#[derive(Default)]
struct StalledSink {
    calls: AtomicUsize,
}

#[async_trait]
impl LeadSink for StalledSink {
    fn sink_tag(&self) -> &'static str {
        "stalled"
    }

    async fn submit(&self, _submission: &Submission) -> Result<SinkReceipt, CrmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(SinkReceipt::live("never"))
    }
}

fn request_timeout(ms: u64) -> ApiConfig {
    ApiConfig {
        request_timeout: Duration::from_millis(ms),
        ..ApiConfig::default()
    }
}

#[tokio::test]
async fn slow_crm_times_out_with_504() {
    let dispatcher = LeadDispatcher::new(
        Arc::new(StalledSink::default()),
        CrmMode::Live,
        BreakerConfig::default(),
    );
    let app = build_router(AppState::new(request_timeout(50), dispatcher));
    let (status, _, body) = send(&app, post_json("/v1/contact", &sample_contact_payload())).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["code"], "timeout");
}

#[tokio::test]
async fn stalled_crm_in_auto_mode_falls_back_then_opens_the_circuit() {
    let sink = Arc::new(StalledSink::default());
    let breaker = BreakerConfig {
        failure_threshold: 2,
        open_duration: Duration::from_secs(60),
    };
    let dispatcher = LeadDispatcher::new(sink.clone(), CrmMode::Auto, breaker);
    let app = build_router(AppState::new(request_timeout(250), dispatcher));

    let mut reasons = Vec::new();
    for _ in 0..4 {
        let (status, _, body) =
            send(&app, post_json("/v1/leads", &sample_lead_payload(ProductLine::Auto))).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        assert_eq!(body["crm"]["mode"], "mock");
        reasons.push(body["crm"]["fallback_reason"].as_str().unwrap_or("").to_string());
    }
    assert!(reasons[0].starts_with("timeout"), "{reasons:?}");
    assert!(reasons[1].starts_with("timeout"), "{reasons:?}");
    assert_eq!(reasons[2], CIRCUIT_OPEN_REASON);
    assert_eq!(reasons[3], CIRCUIT_OPEN_REASON);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 2);

    let (_, _, metrics) = send(&app, get("/metrics")).await;
    let text = metrics.as_str().unwrap_or_default();
    assert!(text.contains("leadline_crm_fallback_total{reason=\"timeout\"} 2"), "{text}");
    assert!(text.contains("leadline_crm_fallback_total{reason=\"circuit_open\"} 2"), "{text}");
}

#[tokio::test]
async fn portal_summary_requires_configured_api_key() {
    let (app, _) = mock_app(ApiConfig::default());
    let (status, _, _) = send(&app, get("/v1/portal/summary")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let api = ApiConfig {
        portal_api_keys: vec!["agent-key".to_string()],
        ..ApiConfig::default()
    };
    let (app, _) = mock_app(api);
    let (status, _, body) = send(&app, get("/v1/portal/summary")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "unauthorized");

    send(&app, post_json("/v1/leads", &sample_lead_payload(ProductLine::Life))).await;
    send(&app, post_json("/v1/contact", &sample_contact_payload())).await;
    let req = Request::builder()
        .uri("/v1/portal/summary")
        .header("x-api-key", "agent-key")
        .body(Body::empty())
        .expect("request");
    let (status, _, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["leads_by_product"]["life"], 1);
    assert_eq!(body["leads_by_product"]["auto"], 0);
    assert_eq!(body["contact_messages"], 1);
    assert_eq!(body["mock_receipts"], 2);
    assert_eq!(body["crm_mode"], "mock");
    assert_eq!(body["billing"]["status"], "not_configured");
}

#[tokio::test]
async fn cors_preflight_only_echoes_allowed_origins() {
    let api = ApiConfig {
        cors_allowed_origins: vec!["https://www.example.com".to_string()],
        ..ApiConfig::default()
    };
    let (app, _) = mock_app(api);
    let preflight = |origin: &str| {
        Request::builder()
            .method(Method::OPTIONS)
            .uri("/v1/leads")
            .header("origin", origin)
            .body(Body::empty())
            .expect("request")
    };
    let (status, headers, _) = send(&app, preflight("https://www.example.com")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(
        headers["access-control-allow-origin"],
        "https://www.example.com"
    );
    assert_eq!(headers["access-control-allow-methods"], "POST,GET,OPTIONS");

    let (status, headers, _) = send(&app, preflight("https://evil.example")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!headers.contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn operational_endpoints_respond() {
    let (app, state) = mock_app(ApiConfig::default());
    let (status, _, body) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, _, body) = send(&app, get("/readyz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    state.accepting_requests.store(false, Ordering::Relaxed);
    let (status, _, body) = send(&app, get("/readyz")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "not_ready");

    let (status, _, body) = send(&app, get("/v1/version")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["api_version"], "v1");
    assert_eq!(body["crm_mode"], "mock");

    let (status, _, body) = send(&app, get("/v1/products")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["products"].as_array().map(Vec::len), Some(5));

    let (status, _, body) = send(&app, get("/v1/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"].get("/v1/leads").is_some());

    let (status, _, body) = send(&app, get("/v1/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");

    let (status, headers, body) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers["content-type"]
        .to_str()
        .is_ok_and(|v| v.starts_with("text/plain")));
    let text = body.as_str().expect("text");
    assert!(text.contains("leadline_http_requests_total{route=\"/healthz\""), "{text}");
}

#[tokio::test]
async fn invented_methods_do_not_grow_the_metrics_output() {
    let (app, _) = mock_app(ApiConfig::default());
    for i in 0..20 {
        let req = Request::builder()
            .method(Method::from_bytes(format!("X{i}").as_bytes()).expect("method"))
            .uri("/nope")
            .body(Body::empty())
            .expect("request");
        send(&app, req).await;
    }
    let (_, _, metrics) = send(&app, get("/metrics")).await;
    let text = metrics.as_str().unwrap_or_default();
    assert!(!text.contains("method=\"X1\""), "{text}");
    assert!(
        text.contains(
            "leadline_http_requests_total{route=\"unmatched\",method=\"other\",status=\"404\"} 20"
        ),
        "{text}"
    );
}
