// SPDX-License-Identifier: Apache-2.0

use assert_cmd::Command;
use leadline_crm::LeadDispatcher;
use leadline_server::{build_router, ApiConfig, AppState, RateLimitConfig};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::Path;
use tempfile::tempdir;

fn leadline() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_leadline"));
    cmd.env_remove("LEADLINE_CRM_MODE");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    let text = String::from_utf8(output.stdout.clone()).expect("utf8 stdout");
    serde_json::from_str(text.trim()).expect("json stdout")
}

fn stderr_json(output: &std::process::Output) -> Value {
    let text = String::from_utf8(output.stderr.clone()).expect("utf8 stderr");
    let line = text
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .expect("stderr line");
    serde_json::from_str(line).expect("json stderr")
}

fn write_sample(dir: &Path, product: &str) -> std::path::PathBuf {
    let output = leadline()
        .args(["--json", "sample", "--product", product])
        .output()
        .expect("run sample");
    assert!(output.status.success());
    let path = dir.join(format!("{product}.json"));
    std::fs::write(&path, &output.stdout).expect("write sample");
    path
}

#[test]
fn version_reports_crate_and_api_version() {
    let output = leadline().args(["--json", "version"]).output().expect("run");
    assert!(output.status.success());
    let body = stdout_json(&output);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["api_version"], "v1");
}

#[test]
fn unknown_flag_is_a_usage_error() {
    let output = leadline()
        .args(["--json", "--unknown-flag"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr_json(&output)["code"], "usage_error");
}

#[test]
fn unknown_product_is_a_usage_error() {
    let output = leadline()
        .args(["--json", "sample", "--product", "pet"])
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr_json(&output)["code"], "usage_error");
}

#[test]
fn samples_pass_validation_for_every_product() {
    let dir = tempdir().expect("tempdir");
    for product in ["auto", "home", "life", "health", "disability"] {
        let path = write_sample(dir.path(), product);
        let output = leadline()
            .args(["--json", "validate", "--file"])
            .arg(&path)
            .output()
            .expect("run validate");
        assert!(
            output.status.success(),
            "{product}: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let body = stdout_json(&output);
        assert_eq!(body["valid"], true);
        assert_eq!(body["product"], product);
    }
}

#[test]
fn invalid_payload_exits_with_validation_code_and_field_details() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("bad.json");
    std::fs::write(
        &path,
        r#"{"product":"auto","contact":{"email":"nope"},"consent":{"tcpa":true}}"#,
    )
    .expect("write");
    let output = leadline()
        .args(["--json", "validate", "--file"])
        .arg(&path)
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(3));
    let err = stderr_json(&output);
    assert_eq!(err["code"], "validation_failed");
    assert!(err["details"].get("contact.email").is_some(), "{err}");
    assert!(err["details"].get("consent.privacy_policy").is_some(), "{err}");
}

#[test]
fn crm_record_maps_the_lead() {
    let dir = tempdir().expect("tempdir");
    let path = write_sample(dir.path(), "home");
    let output = leadline()
        .args(["--json", "crm-record", "--file"])
        .arg(&path)
        .output()
        .expect("run");
    assert!(output.status.success());
    let body = stdout_json(&output);
    assert!(body["submission_id"]
        .as_str()
        .is_some_and(|id| id.starts_with("lead-")));
    assert_eq!(body["record"]["LastName"], "Rivera");
    assert_eq!(body["record"]["Email"], "jordan.rivera@example.com");
}

#[test]
fn contact_sample_round_trips_through_crm_record() {
    let dir = tempdir().expect("tempdir");
    let output = leadline()
        .args(["--json", "sample", "--contact"])
        .output()
        .expect("run");
    let path = dir.path().join("contact.json");
    std::fs::write(&path, &output.stdout).expect("write");
    let output = leadline()
        .args(["--json", "crm-record", "--contact", "--file"])
        .arg(&path)
        .output()
        .expect("run");
    assert!(output.status.success());
    let body = stdout_json(&output);
    assert!(body["submission_id"]
        .as_str()
        .is_some_and(|id| id.starts_with("contact-")));
}

#[test]
fn config_check_prints_redacted_summary() {
    let output = leadline()
        .args(["--json", "config", "check"])
        .env("LEADLINE_PORTAL_API_KEYS", "agent-secret-key")
        .output()
        .expect("run");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    assert!(!text.contains("agent-secret-key"));
    let body = stdout_json(&output);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["effective_crm_mode"], "mock");
}

#[test]
fn config_check_rejects_bad_values() {
    let output = leadline()
        .args(["--json", "config", "check"])
        .env("LEADLINE_CRM_MODE", "sometimes")
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(3));
    assert_eq!(stderr_json(&output)["code"], "config_invalid");
}

fn spawn_server() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    listener.set_nonblocking(true).expect("nonblocking");
    let addr = listener.local_addr().expect("addr");
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().expect("runtime");
        rt.block_on(async move {
            let api = ApiConfig {
                rate_limit_per_ip: RateLimitConfig {
                    capacity: 50.0,
                    refill_per_sec: 1.0,
                },
                ..ApiConfig::default()
            };
            let app = build_router(AppState::new(api, LeadDispatcher::mock_only()));
            let listener = tokio::net::TcpListener::from_std(listener).expect("listener");
            let _ = axum::serve(listener, app).await;
        });
    });
    addr
}

#[test]
fn smoke_passes_against_a_running_server() {
    let addr = spawn_server();
    let output = leadline()
        .args(["--json", "smoke", "--base-url"])
        .arg(format!("http://{addr}"))
        .output()
        .expect("run");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stdout)
    );
    let report = stdout_json(&output);
    assert_eq!(report["ok"], true);
    // healthz, readyz, five quotes, one step validation
    assert_eq!(report["checks"].as_array().map(Vec::len), Some(8));
}

#[test]
fn smoke_fails_with_dependency_exit_code_when_unreachable() {
    let port = {
        let probe = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        probe.local_addr().expect("addr").port()
    };
    let output = leadline()
        .args(["--json", "smoke", "--products", "auto", "--timeout-ms", "2000"])
        .arg("--base-url")
        .arg(format!("http://127.0.0.1:{port}"))
        .output()
        .expect("run");
    assert_eq!(output.status.code(), Some(4));
    assert_eq!(stdout_json(&output)["ok"], false);
    assert_eq!(stderr_json(&output)["code"], "dependency_failure");
}
