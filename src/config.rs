// src/config.rs
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::providers::{binance, bybit, delta};
use crate::publishing::TelegramNotifier;
use crate::types::Exchange;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScannerConfig {
    #[serde(default = "d_poll_secs")]            pub poll_interval_secs: u64,
    #[serde(default = "d_threshold")]            pub divergence_threshold_pct: f64,
    #[serde(default = "d_lead_min")]             pub alert_lead_minutes: i64,
    #[serde(default = "d_timeout_secs")]         pub source_timeout_secs: u64,
    #[serde(default = "d_cache_ttl")]            pub cache_ttl_secs: u64,
    #[serde(default = "d_retention_h")]          pub alert_retention_hours: u64,
    #[serde(default)]                            pub sources: SourcesConfig,
    #[serde(default)]                            pub telegram: TelegramConfig,
    #[serde(default)]                            pub logging: LoggingConfig,
}
fn d_poll_secs() -> u64 { 60 }
fn d_threshold() -> f64 { 0.2 }
fn d_lead_min() -> i64 { 15 }
fn d_timeout_secs() -> u64 { 10 }
fn d_cache_ttl() -> u64 { 300 }
fn d_retention_h() -> u64 { 24 }
fn d_true() -> bool { true }

const MAX_CACHE_TTL_SECS: u64 = 86_400;
const MAX_RETENTION_HOURS: u64 = 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "d_true")]                 pub enabled: bool,
    #[serde(default)]                            pub url: Option<String>, // public endpoint when unset
}

impl Default for SourceConfig {
    fn default() -> Self { Self { enabled: true, url: None } }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub binance: SourceConfig,
    pub bybit: SourceConfig,
    pub delta: SourceConfig,
}

impl SourcesConfig {
    pub fn get(&self, exchange: Exchange) -> &SourceConfig {
        match exchange {
            Exchange::Binance => &self.binance,
            Exchange::Bybit => &self.bybit,
            Exchange::Delta => &self.delta,
        }
    }

    pub fn url(&self, exchange: Exchange) -> &str {
        let default = match exchange {
            Exchange::Binance => binance::DEFAULT_URL,
            Exchange::Bybit => bybit::DEFAULT_URL,
            Exchange::Delta => delta::DEFAULT_URL,
        };
        self.get(exchange).url.as_deref().unwrap_or(default)
    }

    pub fn enabled(&self) -> Vec<Exchange> {
        Exchange::ALL.into_iter().filter(|ex| self.get(*ex).enabled).collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: None,
            chat_id: None,
            api_url: TelegramNotifier::DEFAULT_API_URL.to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // pretty | compact | json
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { level: "info".into(), format: "pretty".into() } }
}

impl LoggingConfig {
    /// Install the global subscriber. `RUST_LOG` wins over `level`.
    pub fn init(&self) {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));
        let fmt = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
        match self.format.as_str() {
            "json" => fmt.json().init(),
            "compact" => fmt.compact().init(),
            _ => fmt.init(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: d_poll_secs(),
            divergence_threshold_pct: d_threshold(),
            alert_lead_minutes: d_lead_min(),
            source_timeout_secs: d_timeout_secs(),
            cache_ttl_secs: d_cache_ttl(),
            alert_retention_hours: d_retention_h(),
            sources: SourcesConfig::default(),
            telegram: TelegramConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid { field, reason: reason.to_string() })
}

#[inline]
pub fn secs(d: u64) -> Duration { Duration::from_secs(d) }

impl ScannerConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read `path` if given (defaults otherwise), then layer env overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(p) => Self::from_toml(&std::fs::read_to_string(p)?)?,
            None => Self::default(),
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Ok(chat) = std::env::var("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = Some(chat);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.divergence_threshold_pct.is_finite() && self.divergence_threshold_pct > 0.0) {
            return invalid("divergence_threshold_pct", "must be a positive percentage");
        }
        if self.alert_lead_minutes < 0 {
            return invalid("alert_lead_minutes", "must be >= 0");
        }
        if self.poll_interval_secs == 0 {
            return invalid("poll_interval_secs", "must be > 0");
        }
        if self.source_timeout_secs == 0 {
            return invalid("source_timeout_secs", "must be > 0");
        }
        if self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return invalid("cache_ttl_secs", "must be at most one day");
        }
        if self.alert_retention_hours > MAX_RETENTION_HOURS {
            return invalid("alert_retention_hours", "must be at most one year");
        }
        if self.sources.enabled().len() < 2 {
            return invalid("sources", "at least two sources must be enabled to compare rates");
        }
        for ex in self.sources.enabled() {
            if self.sources.url(ex).trim().is_empty() {
                return invalid("sources.url", "enabled source has an empty url");
            }
        }
        if self.telegram.enabled && (self.telegram.bot_token.is_none() || self.telegram.chat_id.is_none()) {
            return invalid("telegram", "enabled but bot_token or chat_id is missing");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration { secs(self.poll_interval_secs) }
    pub fn source_timeout(&self) -> Duration { secs(self.source_timeout_secs) }
    pub fn cache_ttl(&self) -> chrono::Duration { chrono::Duration::seconds(self.cache_ttl_secs as i64) }
    pub fn alert_retention(&self) -> chrono::Duration { chrono::Duration::hours(self.alert_retention_hours as i64) }
}
