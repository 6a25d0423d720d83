// src/providers/binance.rs
use super::{get_json, raw_field, str_field, ProviderError, RateSource, RateUnit, RawRecord, TimeUnit, UnitConvention};
use crate::types::Exchange;

pub const DEFAULT_URL: &str = "https://fapi.binance.com/fapi/v1/premiumIndex";

/// USDⓈ-M futures premium index: one object per symbol, fractional
/// `lastFundingRate` strings and millisecond `nextFundingTime`.
pub struct BinanceSource {
    pub http: reqwest::Client,
    pub url: String,
}

impl BinanceSource {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self { Self { http, url: url.into() } }
}

pub(crate) fn parse(body: &serde_json::Value) -> Result<Vec<RawRecord>, ProviderError> {
    let items = body
        .as_array()
        .ok_or_else(|| ProviderError::Payload("expected a JSON array".into()))?;
    Ok(items
        .iter()
        .map(|it| RawRecord {
            symbol: str_field(it, "symbol"),
            rate: raw_field(it, "lastFundingRate"),
            next_funding: raw_field(it, "nextFundingTime"),
        })
        .collect())
}

#[async_trait::async_trait]
impl RateSource for BinanceSource {
    fn exchange(&self) -> Exchange { Exchange::Binance }

    fn convention(&self) -> UnitConvention {
        UnitConvention { rate: RateUnit::Fraction, time: TimeUnit::Millis }
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, ProviderError> {
        let body = get_json(&self.http, &self.url).await?;
        parse(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_premium_index_rows() {
        let body = json!([
            {"symbol": "BTCUSDT", "markPrice": "64000.1", "lastFundingRate": "0.00010000", "nextFundingTime": 1700000000000i64},
            {"symbol": "BTCUSDT_240628", "lastFundingRate": "", "nextFundingTime": 0}
        ]);
        let rows = parse(&body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].symbol.as_deref(), Some("BTCUSDT"));
        assert_eq!(rows[0].rate, Some(json!("0.00010000")));
        assert_eq!(rows[1].next_funding, Some(json!(0)));
    }

    #[test]
    fn object_body_is_a_payload_error() {
        let err = parse(&json!({"code": -1121, "msg": "Invalid symbol."})).unwrap_err();
        assert!(matches!(err, ProviderError::Payload(_)));
    }
}
