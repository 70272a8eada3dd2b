// SPDX-License-Identifier: Apache-2.0

use crate::{CliError, OutputMode};
use leadline_api::sample_lead_payload;
use leadline_crm::validate_http_url;
use leadline_model::ProductLine;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

#[derive(Debug, Serialize)]
pub(crate) struct SmokeCheck {
    pub(crate) name: String,
    pub(crate) ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) status: Option<u16>,
    pub(crate) latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SmokeReport {
    pub(crate) base_url: String,
    pub(crate) ok: bool,
    pub(crate) checks: Vec<SmokeCheck>,
}

fn check(
    name: String,
    request: RequestBuilder,
    expected: StatusCode,
    verify: impl Fn(&Value) -> Result<(), String>,
) -> SmokeCheck {
    let started = Instant::now();
    let result = request.send();
    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let resp = match result {
        Ok(resp) => resp,
        Err(e) => {
            return SmokeCheck {
                name,
                ok: false,
                status: None,
                latency_ms,
                detail: Some(format!("request failed: {e}")),
            }
        }
    };
    let status = resp.status();
    let body: Value = resp.json().unwrap_or(Value::Null);
    let outcome = if status == expected {
        verify(&body)
    } else {
        Err(format!("expected {expected}, got {status}: {body}"))
    };
    SmokeCheck {
        name,
        ok: outcome.is_ok(),
        status: Some(status.as_u16()),
        latency_ms,
        detail: outcome.err(),
    }
}

fn expect_field(body: &Value, pointer: &str, expected: &Value) -> Result<(), String> {
    match body.pointer(pointer) {
        Some(actual) if actual == expected => Ok(()),
        other => Err(format!("{pointer}: expected {expected}, got {other:?}")),
    }
}

pub(crate) fn smoke_checks(
    client: &Client,
    base_url: &str,
    products: &[ProductLine],
) -> Vec<SmokeCheck> {
    let base = base_url.trim_end_matches('/');
    let mut checks = vec![
        check(
            "healthz".to_string(),
            client.get(format!("{base}/healthz")),
            StatusCode::OK,
            |_| Ok(()),
        ),
        check(
            "readyz".to_string(),
            client.get(format!("{base}/readyz")),
            StatusCode::OK,
            |body| expect_field(body, "/status", &json!("ready")),
        ),
    ];
    for product in products {
        let payload = sample_lead_payload(*product);
        checks.push(check(
            format!("quote:{product}"),
            client
                .post(format!("{base}/v1/quotes/{}", product.as_str()))
                .json(&payload),
            StatusCode::CREATED,
            |body| expect_field(body, "/status", &json!("accepted")),
        ));
    }
    let step_product = products.first().copied().unwrap_or(ProductLine::Auto);
    checks.push(check(
        "validate:contact".to_string(),
        client
            .post(format!("{base}/v1/leads/validate"))
            .json(&json!({"step": "contact", "lead": sample_lead_payload(step_product)})),
        StatusCode::OK,
        |body| expect_field(body, "/valid", &json!(true)),
    ));
    checks
}

pub(crate) fn run_smoke(
    base_url: &str,
    products: &[ProductLine],
    timeout: Duration,
    out: OutputMode,
) -> Result<(), CliError> {
    validate_http_url("--base-url", base_url).map_err(|e| CliError::usage(&e.message))?;
    let client = Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| CliError::internal(format!("http client: {e}")))?;
    let checks = smoke_checks(&client, base_url, products);
    let report = SmokeReport {
        base_url: base_url.to_string(),
        ok: checks.iter().all(|c| c.ok),
        checks,
    };
    let value = serde_json::to_value(&report).map_err(|e| CliError::internal(e.to_string()))?;
    out.emit(&value)?;
    if report.ok {
        return Ok(());
    }
    let failed: Vec<&str> = report
        .checks
        .iter()
        .filter(|c| !c.ok)
        .map(|c| c.name.as_str())
        .collect();
    Err(CliError::dependency(format!(
        "smoke failed: {}",
        failed.join(", ")
    )))
}
