// src/providers/bybit.rs
use super::{get_json, raw_field, str_field, ProviderError, RateSource, RateUnit, RawRecord, TimeUnit, UnitConvention};
use crate::types::Exchange;

pub const DEFAULT_URL: &str = "https://api.bybit.com/v5/market/tickers?category=linear";

/// v5 linear tickers. Everything is string-encoded; `fundingRate` is a
/// fraction and is empty for contracts without funding.
pub struct BybitSource {
    pub http: reqwest::Client,
    pub url: String,
}

impl BybitSource {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self { Self { http, url: url.into() } }
}

pub(crate) fn parse(body: &serde_json::Value) -> Result<Vec<RawRecord>, ProviderError> {
    match body.get("retCode").and_then(|c| c.as_i64()) {
        Some(0) | None => {}
        Some(code) => {
            let msg = body.get("retMsg").and_then(|m| m.as_str()).unwrap_or_default();
            return Err(ProviderError::Payload(format!("retCode {code}: {msg}")));
        }
    }
    let list = body
        .pointer("/result/list")
        .and_then(|l| l.as_array())
        .ok_or_else(|| ProviderError::Payload("missing result.list".into()))?;
    Ok(list
        .iter()
        .map(|it| RawRecord {
            symbol: str_field(it, "symbol"),
            rate: raw_field(it, "fundingRate"),
            next_funding: raw_field(it, "nextFundingTime"),
        })
        .collect())
}

#[async_trait::async_trait]
impl RateSource for BybitSource {
    fn exchange(&self) -> Exchange { Exchange::Bybit }

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
    fn maps_ticker_list() {
        let body = json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": {"category": "linear", "list": [
                {"symbol": "ETHUSDT", "fundingRate": "-0.00005", "nextFundingTime": "1700000000000"},
                {"symbol": "ETH-27JUN25", "fundingRate": "", "nextFundingTime": "0"}
            ]}
        });
        let rows = parse(&body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].next_funding, Some(json!("1700000000000")));
        assert_eq!(rows[1].rate, Some(json!("")));
    }

    #[test]
    fn non_zero_ret_code_fails_the_source() {
        let err = parse(&json!({"retCode": 10001, "retMsg": "params error", "result": {}})).unwrap_err();
        assert!(err.to_string().contains("10001"));
    }
}
