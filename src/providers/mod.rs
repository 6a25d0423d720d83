// src/providers/mod.rs
use std::time::Duration;

use async_trait::async_trait;

use crate::types::Exchange;

pub mod binance;
pub mod bybit;
pub mod delta;
pub mod ingest;

pub use ingest::{ingest, ingest_batch, SkipReason};

#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Payload(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// How a venue encodes its funding rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateUnit {
    Fraction, // 0.0001 == 0.01%
    Percent,
}

/// Epoch unit of a venue's next-funding field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit { Seconds, Millis, Micros }

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitConvention {
    pub rate: RateUnit,
    pub time: TimeUnit,
}

/// Source-specific key/value data for one symbol, prior to any validation.
/// Numeric fields are kept as raw JSON since venues mix numbers and strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub symbol: Option<String>,
    pub rate: Option<serde_json::Value>,
    pub next_funding: Option<serde_json::Value>,
}

#[async_trait]
pub trait RateSource: Send + Sync {
    fn exchange(&self) -> Exchange;
    fn convention(&self) -> UnitConvention;
    /// Pull every perpetual the venue lists. One call per cycle.
    async fn fetch(&self) -> Result<Vec<RawRecord>, ProviderError>;
}

/// Build the shared HTTP client used by every adapter.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("fundarb/", env!("CARGO_PKG_VERSION")))
        .gzip(true)
        .build()?;
    Ok(client)
}

pub(crate) async fn get_json(http: &reqwest::Client, url: &str) -> Result<serde_json::Value, ProviderError> {
    let resp = http.get(url).header("Accept", "application/json").send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(ProviderError::Status(status.as_u16()));
    }
    let body = resp.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ProviderError::Payload(e.to_string()))
}

/// Pull an optional string field out of a JSON object.
pub(crate) fn str_field(obj: &serde_json::Value, key: &str) -> Option<String> {
    obj.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Pull an optional field, treating JSON `null` as absent.
pub(crate) fn raw_field(obj: &serde_json::Value, key: &str) -> Option<serde_json::Value> {
    obj.get(key).filter(|v| !v.is_null()).cloned()
}

/// One adapter per enabled source, sharing a single HTTP client.
pub fn build_sources(cfg: &crate::config::ScannerConfig) -> Result<Vec<std::sync::Arc<dyn RateSource>>, ProviderError> {
    use std::sync::Arc;
    let http = http_client(cfg.source_timeout())?;
    let sources = cfg
        .sources
        .enabled()
        .into_iter()
        .map(|ex| {
            let url = cfg.sources.url(ex);
            let src: Arc<dyn RateSource> = match ex {
                Exchange::Binance => Arc::new(binance::BinanceSource::new(http.clone(), url)),
                Exchange::Bybit => Arc::new(bybit::BybitSource::new(http.clone(), url)),
                Exchange::Delta => Arc::new(delta::DeltaSource::new(http.clone(), url)),
            };
            src
        })
        .collect();
    Ok(sources)
}
