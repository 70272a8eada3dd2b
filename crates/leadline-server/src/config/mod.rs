use leadline_core::redact::mask_secret;
use leadline_crm::{CrmConfig, CrmMode, RelayConfig, RetryPolicy, Secret};
use serde_json::{json, Value};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const ENV_PREFIX: &str = "LEADLINE_";
/// One token per day; slower refill rates are indistinguishable from a ban.
pub const MIN_REFILL_PER_SEC: f64 = 1.0 / 86_400.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub capacity: f64,
    pub refill_per_sec: f64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            capacity: 5.0,
            refill_per_sec: 5.0 / 60.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub max_body_bytes: usize,
    pub request_timeout: Duration,
    pub rate_limit_per_ip: RateLimitConfig,
    pub rate_limit_max_clients: usize,
    pub trust_forwarded_for: bool,
    pub cors_allowed_origins: Vec<String>,
    pub enable_audit_log: bool,
    pub portal_api_keys: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 16 * 1024,
            request_timeout: Duration::from_secs(15),
            rate_limit_per_ip: RateLimitConfig::default(),
            rate_limit_max_clients: 10_000,
            trust_forwarded_for: false,
            cors_allowed_origins: Vec::new(),
            enable_audit_log: false,
            portal_api_keys: Vec::new(),
        }
    }
}

impl ApiConfig {
    /// Share of `request_timeout` the CRM call may use; the rest is left for
    /// the relay and for answering with a mock receipt.
    #[must_use]
    pub fn crm_deadline(&self) -> Duration {
        self.request_timeout.saturating_sub(self.request_timeout / 5)
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub api: ApiConfig,
    pub crm: CrmConfig,
    pub relay: RelayConfig,
    pub log_json: bool,
    pub shutdown_drain: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            api: ApiConfig::default(),
            crm: CrmConfig::default(),
            relay: RelayConfig::default(),
            log_json: true,
            shutdown_drain: Duration::from_secs(5),
        }
    }
}

/// Typed reads over a variable lookup; unset or blank variables fall back
/// to the default, malformed ones are errors.
pub struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(&format!("{ENV_PREFIX}{name}"))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn invalid(name: &str, expected: &str) -> ConfigError {
        ConfigError(format!("{ENV_PREFIX}{name} must be {expected}"))
    }

    pub fn string(&self, name: &str, default: &str) -> String {
        self.raw(name).unwrap_or_else(|| default.to_string())
    }

    pub fn optional(&self, name: &str) -> Option<String> {
        self.raw(name)
    }

    pub fn env_bool(&self, name: &str, default: bool) -> Result<bool, ConfigError> {
        match self.raw(name) {
            None => Ok(default),
            Some(v) => match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(Self::invalid(name, "a boolean")),
            },
        }
    }

    pub fn env_u64(&self, name: &str, default: u64) -> Result<u64, ConfigError> {
        self.raw(name).map_or(Ok(default), |v| {
            v.parse::<u64>()
                .map_err(|_| Self::invalid(name, "an unsigned integer"))
        })
    }

    pub fn env_usize(&self, name: &str, default: usize) -> Result<usize, ConfigError> {
        self.raw(name).map_or(Ok(default), |v| {
            v.parse::<usize>()
                .map_err(|_| Self::invalid(name, "an unsigned integer"))
        })
    }

    pub fn env_f64(&self, name: &str, default: f64) -> Result<f64, ConfigError> {
        self.raw(name).map_or(Ok(default), |v| {
            v.parse::<f64>()
                .ok()
                .filter(|x| x.is_finite())
                .ok_or_else(|| Self::invalid(name, "a number"))
        })
    }

    pub fn env_duration_ms(&self, name: &str, default: Duration) -> Result<Duration, ConfigError> {
        let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
        Ok(Duration::from_millis(self.env_u64(name, default_ms)?))
    }

    pub fn env_list(&self, name: &str) -> Vec<String> {
        self.raw(name)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    pub fn secret(&self, name: &str) -> Secret {
        Secret::new(self.raw(name).unwrap_or_default())
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let env = Env::new(lookup);
        let defaults = Self::default();
        let api_defaults = defaults.api;
        let crm_defaults = defaults.crm;

        let api = ApiConfig {
            max_body_bytes: env.env_usize("MAX_BODY_BYTES", api_defaults.max_body_bytes)?,
            request_timeout: env
                .env_duration_ms("REQUEST_TIMEOUT_MS", api_defaults.request_timeout)?,
            rate_limit_per_ip: RateLimitConfig {
                capacity: env.env_f64(
                    "RATE_LIMIT_CAPACITY",
                    api_defaults.rate_limit_per_ip.capacity,
                )?,
                refill_per_sec: env.env_f64(
                    "RATE_LIMIT_REFILL_PER_SEC",
                    api_defaults.rate_limit_per_ip.refill_per_sec,
                )?,
            },
            rate_limit_max_clients: env
                .env_usize("RATE_LIMIT_MAX_CLIENTS", api_defaults.rate_limit_max_clients)?,
            trust_forwarded_for: env.env_bool("TRUST_FORWARDED_FOR", false)?,
            cors_allowed_origins: env.env_list("CORS_ALLOWED_ORIGINS"),
            enable_audit_log: env.env_bool("ENABLE_AUDIT_LOG", false)?,
            portal_api_keys: env.env_list("PORTAL_API_KEYS"),
        };

        let mode = match env.optional("CRM_MODE") {
            Some(raw) => CrmMode::parse(&raw)
                .ok_or_else(|| ConfigError(format!("unknown {ENV_PREFIX}CRM_MODE `{raw}`")))?,
            None => crm_defaults.mode,
        };
        let breaker_failure_threshold = u32::try_from(env.env_u64(
            "CRM_BREAKER_FAILURE_THRESHOLD",
            u64::from(crm_defaults.breaker_failure_threshold),
        )?)
        .map_err(|_| ConfigError("crm breaker failure threshold is too large".to_string()))?;
        let crm = CrmConfig {
            mode,
            login_url: env.string("CRM_LOGIN_URL", &crm_defaults.login_url),
            client_id: env.string("CRM_CLIENT_ID", ""),
            client_secret: env.secret("CRM_CLIENT_SECRET"),
            username: env.string("CRM_USERNAME", ""),
            password: env.secret("CRM_PASSWORD"),
            security_token: env.secret("CRM_SECURITY_TOKEN"),
            api_version: env.string("CRM_API_VERSION", &crm_defaults.api_version),
            timeout: env.env_duration_ms("CRM_TIMEOUT_MS", crm_defaults.timeout)?,
            token_ttl: env.env_duration_ms("CRM_TOKEN_TTL_MS", crm_defaults.token_ttl)?,
            retry: RetryPolicy {
                max_attempts: env
                    .env_usize("CRM_RETRY_ATTEMPTS", crm_defaults.retry.max_attempts)?,
                base_backoff_ms: env
                    .env_u64("CRM_RETRY_BASE_MS", crm_defaults.retry.base_backoff_ms)?,
            },
            breaker_failure_threshold,
            breaker_open_duration: env
                .env_duration_ms("CRM_BREAKER_OPEN_MS", crm_defaults.breaker_open_duration)?,
        };

        let relay = RelayConfig {
            url: env.optional("RELAY_URL"),
            secret: env.optional("RELAY_SECRET").map(Secret::new),
            timeout: env.env_duration_ms("RELAY_TIMEOUT_MS", defaults.relay.timeout)?,
        };

        Ok(Self {
            bind: env.string("BIND", &defaults.bind),
            api,
            crm,
            relay,
            log_json: env.env_bool("LOG_JSON", defaults.log_json)?,
            shutdown_drain: env.env_duration_ms("SHUTDOWN_DRAIN_MS", defaults.shutdown_drain)?,
        })
    }

    #[must_use]
    pub fn redacted_summary(&self) -> Value {
        let masked_keys: Vec<String> = self
            .api
            .portal_api_keys
            .iter()
            .map(|k| mask_secret(k))
            .collect();
        json!({
            "bind": self.bind,
            "log_json": self.log_json,
            "shutdown_drain_ms": self.shutdown_drain.as_millis() as u64,
            "api": {
                "max_body_bytes": self.api.max_body_bytes,
                "request_timeout_ms": self.api.request_timeout.as_millis() as u64,
                "rate_limit_capacity": self.api.rate_limit_per_ip.capacity,
                "rate_limit_refill_per_sec": self.api.rate_limit_per_ip.refill_per_sec,
                "rate_limit_max_clients": self.api.rate_limit_max_clients,
                "trust_forwarded_for": self.api.trust_forwarded_for,
                "cors_allowed_origins": self.api.cors_allowed_origins,
                "enable_audit_log": self.api.enable_audit_log,
                "portal_enabled": !self.api.portal_api_keys.is_empty(),
                "portal_api_keys": masked_keys,
            },
            "crm": self.crm.redacted_summary(),
            "relay": self.relay.redacted_summary(),
        })
    }
}

pub fn validate_startup_config_contract(cfg: &ServerConfig) -> Result<(), ConfigError> {
    cfg.bind
        .parse::<SocketAddr>()
        .map_err(|e| ConfigError(format!("invalid bind address {}: {e}", cfg.bind)))?;
    let api = &cfg.api;
    if api.max_body_bytes == 0 {
        return Err(ConfigError("max body bytes must be > 0".to_string()));
    }
    if api.request_timeout.is_zero() {
        return Err(ConfigError("request timeout must be > 0".to_string()));
    }
    if api.rate_limit_per_ip.capacity < 1.0
        || api.rate_limit_per_ip.refill_per_sec < MIN_REFILL_PER_SEC
    {
        return Err(ConfigError(format!(
            "rate limit requires capacity >= 1 and refill >= {MIN_REFILL_PER_SEC}/s"
        )));
    }
    if api.rate_limit_max_clients == 0 {
        return Err(ConfigError("rate limit max clients must be > 0".to_string()));
    }
    if cfg.shutdown_drain > Duration::from_secs(120) {
        return Err(ConfigError("shutdown drain must be <= 120s".to_string()));
    }
    cfg.crm.validate().map_err(|e| ConfigError(e.to_string()))?;
    cfg.relay.validate().map_err(|e| ConfigError(e.to_string()))?;
    let crm_deadline = api.crm_deadline();
    if cfg.crm.effective_mode() != CrmMode::Mock && cfg.crm.call_budget() > crm_deadline {
        return Err(ConfigError(format!(
            "crm timeout x retry attempts plus backoff ({}ms) exceeds the crm share of the \
             request timeout ({}ms)",
            cfg.crm.call_budget().as_millis(),
            crm_deadline.as_millis()
        )));
    }
    if cfg.relay.url.is_some()
        && crm_deadline.saturating_add(cfg.relay.timeout) > api.request_timeout
    {
        return Err(ConfigError(format!(
            "relay timeout ({}ms) does not fit after the crm share of the request timeout \
             ({}ms of {}ms)",
            cfg.relay.timeout.as_millis(),
            crm_deadline.as_millis(),
            api.request_timeout.as_millis()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(move |name| map.get(name).cloned())
    }

    #[test]
    fn defaults_pass_the_startup_contract() {
        let cfg = load(&[]).expect("defaults");
        assert_eq!(cfg.api.max_body_bytes, 16 * 1024);
        assert_eq!(cfg.crm.effective_mode(), CrmMode::Mock);
        validate_startup_config_contract(&cfg).expect("valid");
    }

    #[test]
    fn reads_typed_variables() {
        let cfg = load(&[
            ("LEADLINE_BIND", "127.0.0.1:9000"),
            ("LEADLINE_RATE_LIMIT_CAPACITY", "10"),
            ("LEADLINE_TRUST_FORWARDED_FOR", "yes"),
            ("LEADLINE_CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            ("LEADLINE_CRM_MODE", "auto"),
            ("LEADLINE_CRM_RETRY_ATTEMPTS", "5"),
            ("LEADLINE_REQUEST_TIMEOUT_MS", "2500"),
        ])
        .expect("config");
        assert_eq!(cfg.bind, "127.0.0.1:9000");
        assert!((cfg.api.rate_limit_per_ip.capacity - 10.0).abs() < f64::EPSILON);
        assert!(cfg.api.trust_forwarded_for);
        assert_eq!(cfg.api.cors_allowed_origins.len(), 2);
        assert_eq!(cfg.crm.retry.max_attempts, 5);
        assert_eq!(cfg.api.request_timeout, Duration::from_millis(2500));
    }

    #[test]
    fn malformed_values_are_errors() {
        let err = load(&[("LEADLINE_MAX_BODY_BYTES", "lots")]).expect_err("bad number");
        assert!(err.0.contains("LEADLINE_MAX_BODY_BYTES"));
        let err = load(&[("LEADLINE_CRM_MODE", "sometimes")]).expect_err("bad mode");
        assert!(err.0.contains("CRM_MODE"));
        assert!(load(&[("LEADLINE_LOG_JSON", "maybe")]).is_err());
    }

    #[test]
    fn startup_contract_rejects_unusable_settings() {
        let live_without_credentials = load(&[("LEADLINE_CRM_MODE", "live")]).expect("config");
        assert!(validate_startup_config_contract(&live_without_credentials).is_err());

        let orphan_secret = load(&[("LEADLINE_RELAY_SECRET", "s")]).expect("config");
        let err = validate_startup_config_contract(&orphan_secret).expect_err("orphan secret");
        assert!(err.0.contains("relay url"));

        let bad_relay = load(&[("LEADLINE_RELAY_URL", "ftp://relay.example")]).expect("config");
        assert!(validate_startup_config_contract(&bad_relay).is_err());

        let zero_timeout = load(&[("LEADLINE_REQUEST_TIMEOUT_MS", "0")]).expect("config");
        assert!(validate_startup_config_contract(&zero_timeout).is_err());

        let bad_bind = load(&[("LEADLINE_BIND", "localhost")]).expect("config");
        assert!(validate_startup_config_contract(&bad_bind).is_err());
    }

    const CREDENTIALS: [(&str, &str); 5] = [
        ("LEADLINE_CRM_MODE", "auto"),
        ("LEADLINE_CRM_CLIENT_ID", "cid"),
        ("LEADLINE_CRM_CLIENT_SECRET", "csecret"),
        ("LEADLINE_CRM_USERNAME", "ops@example.com"),
        ("LEADLINE_CRM_PASSWORD", "hunter2"),
    ];

    #[test]
    fn crm_retry_budget_must_fit_inside_the_request_timeout() {
        let cfg = load(&CREDENTIALS).expect("config");
        assert_eq!(cfg.crm.effective_mode(), CrmMode::Auto);
        assert!(cfg.crm.call_budget() <= cfg.api.crm_deadline());
        validate_startup_config_contract(&cfg).expect("defaults fit");

        let mut vars = CREDENTIALS.to_vec();
        vars.push(("LEADLINE_CRM_TIMEOUT_MS", "10000"));
        let slow = load(&vars).expect("config");
        let err = validate_startup_config_contract(&slow).expect_err("budget overrun");
        assert!(err.0.contains("exceeds"), "{err}");

        let mut vars = CREDENTIALS.to_vec();
        vars.push(("LEADLINE_RELAY_URL", "https://hooks.example.com/x"));
        vars.push(("LEADLINE_RELAY_TIMEOUT_MS", "8000"));
        let slow_relay = load(&vars).expect("config");
        assert!(validate_startup_config_contract(&slow_relay).is_err());
    }

    #[test]
    fn startup_contract_rejects_vanishing_refill_rates() {
        let cfg = load(&[("LEADLINE_RATE_LIMIT_REFILL_PER_SEC", "1e-20")]).expect("config");
        let err = validate_startup_config_contract(&cfg).expect_err("refill too slow");
        assert!(err.0.contains("refill"), "{err}");
    }

    #[test]
    fn redacted_summary_hides_secrets() {
        let cfg = load(&[
            ("LEADLINE_CRM_CLIENT_SECRET", "very-secret-value"),
            ("LEADLINE_CRM_PASSWORD", "hunter2"),
            ("LEADLINE_PORTAL_API_KEYS", "portal-key-123"),
            ("LEADLINE_RELAY_URL", "https://hooks.example.com/x"),
            ("LEADLINE_RELAY_SECRET", "relay-secret"),
        ])
        .expect("config");
        let text = cfg.redacted_summary().to_string();
        for secret in ["very-secret-value", "hunter2", "portal-key-123", "relay-secret"] {
            assert!(!text.contains(secret), "{secret} leaked");
        }
        assert!(text.contains("hooks.example.com"));
    }
}
