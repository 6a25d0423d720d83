// src/providers/delta.rs
use super::{get_json, raw_field, str_field, ProviderError, RateSource, RateUnit, RawRecord, TimeUnit, UnitConvention};
use crate::types::Exchange;

pub const DEFAULT_URL: &str = "https://api.india.delta.exchange/v2/tickers?contract_types=perpetual_futures";

/// Delta Exchange India perpetual tickers. `funding_rate` is already a
/// percentage; tickers are quoted against USD (e.g. `BTCUSD`).
pub struct DeltaSource {
    pub http: reqwest::Client,
    pub url: String,
}

impl DeltaSource {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self { Self { http, url: url.into() } }
}

pub(crate) fn parse(body: &serde_json::Value) -> Result<Vec<RawRecord>, ProviderError> {
    if body.get("success").and_then(|s| s.as_bool()) == Some(false) {
        return Err(ProviderError::Payload(format!("error response: {}", body.get("error").unwrap_or(&serde_json::Value::Null))));
    }
    let list = body
        .get("result")
        .and_then(|l| l.as_array())
        .ok_or_else(|| ProviderError::Payload("missing result".into()))?;
    Ok(list
        .iter()
        .map(|it| RawRecord {
            symbol: str_field(it, "symbol"),
            rate: raw_field(it, "funding_rate"),
            // epoch micros when present; most tickers omit it
            next_funding: raw_field(it, "next_funding_realization"),
        })
        .collect())
}

#[async_trait::async_trait]
impl RateSource for DeltaSource {
    fn exchange(&self) -> Exchange { Exchange::Delta }

    fn convention(&self) -> UnitConvention {
        UnitConvention { rate: RateUnit::Percent, time: TimeUnit::Micros }
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, ProviderError> {
        let body = get_json(&self.http, &self.url).await?;
        parse(&body)
    }
}
