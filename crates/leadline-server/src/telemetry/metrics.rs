use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

pub const METRIC_PREFIX: &str = "leadline";
const LATENCY_WINDOW: usize = 1024;

#[derive(Default)]
pub struct RequestMetrics {
    counts: Mutex<HashMap<(String, String, u16), u64>>,
    latency_ns: Mutex<HashMap<String, VecDeque<u64>>>,
    leads_accepted: Mutex<BTreeMap<(String, String), u64>>,
    validation_failures: Mutex<BTreeMap<String, u64>>,
    crm_fallbacks: Mutex<BTreeMap<String, u64>>,
    pub rate_limited_total: AtomicU64,
    pub relay_failures_total: AtomicU64,
    pub honeypot_total: AtomicU64,
}

pub(crate) fn percentile_ns(values: &[u64], pct: f64) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let mut v = values.to_vec();
    v.sort_unstable();
    let idx = ((v.len() as f64 - 1.0) * pct).round() as usize;
    v[idx]
}

/// Known methods keep their name; anything else shares one series so
/// clients cannot mint new labels.
pub(crate) fn method_label(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "POST" => "POST",
        "OPTIONS" => "OPTIONS",
        "HEAD" => "HEAD",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "PATCH" => "PATCH",
        _ => "other",
    }
}

fn escape_label(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl RequestMetrics {
    pub async fn observe_request(&self, route: &str, method: &str, status: u16, latency: Duration) {
        let mut counts = self.counts.lock().await;
        *counts
            .entry((route.to_string(), method_label(method).to_string(), status))
            .or_insert(0) += 1;
        drop(counts);
        let mut latency_map = self.latency_ns.lock().await;
        let window = latency_map.entry(route.to_string()).or_default();
        window.push_back(latency.as_nanos() as u64);
        while window.len() > LATENCY_WINDOW {
            window.pop_front();
        }
    }

    /// `label` is the product line for quotes and `contact` for messages.
    pub async fn observe_accepted(&self, label: &str, mode: &str) {
        let mut accepted = self.leads_accepted.lock().await;
        *accepted
            .entry((label.to_string(), mode.to_string()))
            .or_insert(0) += 1;
    }

    pub async fn observe_validation_failure(&self, route: &str) {
        *self
            .validation_failures
            .lock()
            .await
            .entry(route.to_string())
            .or_insert(0) += 1;
    }

    pub async fn observe_fallback(&self, reason: &str) {
        *self
            .crm_fallbacks
            .lock()
            .await
            .entry(reason.to_string())
            .or_insert(0) += 1;
    }

    pub async fn accepted_snapshot(&self) -> BTreeMap<(String, String), u64> {
        self.leads_accepted.lock().await.clone()
    }

    pub async fn render_prometheus(&self) -> String {
        let mut body = String::new();

        let mut counts: Vec<_> = self
            .counts
            .lock()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        counts.sort();
        body.push_str(&format!("# TYPE {METRIC_PREFIX}_http_requests_total counter\n"));
        for ((route, method, status), n) in counts {
            let _ = writeln!(
                body,
                "{METRIC_PREFIX}_http_requests_total{{route=\"{}\",method=\"{}\",status=\"{status}\"}} {n}",
                escape_label(&route),
                escape_label(&method),
            );
        }

        let latency: BTreeMap<String, Vec<u64>> = self
            .latency_ns
            .lock()
            .await
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().copied().collect()))
            .collect();
        body.push_str(&format!(
            "# TYPE {METRIC_PREFIX}_http_request_latency_p95_seconds gauge\n"
        ));
        for (route, samples) in latency {
            let p95 = percentile_ns(&samples, 0.95) as f64 / 1_000_000_000.0;
            let _ = writeln!(
                body,
                "{METRIC_PREFIX}_http_request_latency_p95_seconds{{route=\"{}\"}} {p95:.6}",
                escape_label(&route)
            );
        }

        body.push_str(&format!("# TYPE {METRIC_PREFIX}_leads_accepted_total counter\n"));
        for ((product, mode), n) in self.leads_accepted.lock().await.iter() {
            let _ = writeln!(
                body,
                "{METRIC_PREFIX}_leads_accepted_total{{product=\"{}\",mode=\"{}\"}} {n}",
                escape_label(product),
                escape_label(mode)
            );
        }
        for (route, n) in self.validation_failures.lock().await.iter() {
            let _ = writeln!(
                body,
                "{METRIC_PREFIX}_validation_failures_total{{route=\"{}\"}} {n}",
                escape_label(route)
            );
        }
        for (reason, n) in self.crm_fallbacks.lock().await.iter() {
            let _ = writeln!(
                body,
                "{METRIC_PREFIX}_crm_fallback_total{{reason=\"{}\"}} {n}",
                escape_label(reason)
            );
        }
        let _ = writeln!(
            body,
            "{METRIC_PREFIX}_rate_limited_total {}",
            self.rate_limited_total.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            body,
            "{METRIC_PREFIX}_relay_failures_total {}",
            self.relay_failures_total.load(Ordering::Relaxed)
        );
        let _ = writeln!(
            body,
            "{METRIC_PREFIX}_honeypot_total {}",
            self.honeypot_total.load(Ordering::Relaxed)
        );
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_picks_nearest_rank() {
        assert_eq!(percentile_ns(&[], 0.95), 0);
        let samples: Vec<u64> = (1..=100).collect();
        assert_eq!(percentile_ns(&samples, 0.95), 95);
    }

    #[tokio::test]
    async fn renders_counters_with_labels() {
        let m = RequestMetrics::default();
        m.observe_request("/v1/leads", "POST", 201, Duration::from_millis(12))
            .await;
        m.observe_accepted("auto", "mock").await;
        m.observe_fallback("auth").await;
        m.rate_limited_total.fetch_add(2, Ordering::Relaxed);
        let text = m.render_prometheus().await;
        assert!(text.contains(
            "leadline_http_requests_total{route=\"/v1/leads\",method=\"POST\",status=\"201\"} 1"
        ));
        assert!(text.contains("leadline_leads_accepted_total{product=\"auto\",mode=\"mock\"} 1"));
        assert!(text.contains("leadline_crm_fallback_total{reason=\"auth\"} 1"));
        assert!(text.contains("leadline_rate_limited_total 2"));
        assert!(text.contains("leadline_http_request_latency_p95_seconds{route=\"/v1/leads\"}"));
    }

    #[tokio::test]
    async fn invented_methods_share_one_series() {
        let m = RequestMetrics::default();
        for i in 0..50 {
            m.observe_request("unmatched", &format!("X{i}"), 404, Duration::from_millis(1))
                .await;
        }
        m.observe_request("unmatched", "GET", 404, Duration::from_millis(1))
            .await;
        let text = m.render_prometheus().await;
        let series: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("leadline_http_requests_total{"))
            .collect();
        assert_eq!(series.len(), 2, "{series:?}");
        assert!(text.contains(
            "leadline_http_requests_total{route=\"unmatched\",method=\"other\",status=\"404\"} 50"
        ));
    }
}
