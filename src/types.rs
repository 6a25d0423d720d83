// src/types.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Venues we pull funding from. Declaration order is the fixed exchange
/// ordering used for tie-breaks and for picking the funding instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange { Binance, Bybit, Delta }

impl Exchange {
    pub const ALL: [Exchange; 3] = [Exchange::Binance, Exchange::Bybit, Exchange::Delta];

    pub fn name(&self) -> &'static str {
        match self {
            Exchange::Binance => "Binance",
            Exchange::Bybit => "Bybit",
            Exchange::Delta => "Delta",
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

impl std::str::FromStr for Exchange {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binance" => Ok(Exchange::Binance),
            "bybit" => Ok(Exchange::Bybit),
            "delta" => Ok(Exchange::Delta),
            other => Err(format!("unknown exchange '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub exchange: Exchange,
    pub instrument: String,                       // canonical key, e.g. "BTCUSDT"
    pub rate_pct: f64,                            // percent per interval (0.01 = 0.01%)
    pub next_funding_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArbitrageCandidate {
    pub instrument: String,
    pub long_exchange: Exchange,
    pub short_exchange: Exchange,
    pub divergence_pct: f64,                      // magnitude, never signed
    pub next_funding_at: Option<DateTime<Utc>>,
}

impl ArbitrageCandidate {
    pub fn strategy(&self) -> String {
        format!("LONG {}, SHORT {}", self.long_exchange, self.short_exchange)
    }

    /// Identity of the funding event this candidate realizes on, if known.
    pub fn alert_key(&self) -> Option<AlertKey> {
        self.next_funding_at.map(|at| AlertKey { instrument: self.instrument.clone(), next_funding_at: at })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlertKey {
    pub instrument: String,
    pub next_funding_at: DateTime<Utc>,
}

/// One display row per candidate, handed to whatever renders the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpportunityRow {
    pub instrument: String,
    pub rates: BTreeMap<Exchange, Option<f64>>,   // every configured exchange, null when unreported
    pub divergence_pct: f64,                      // rounded to 4 decimals
    pub strategy: String,
    pub countdown: String,
    pub minutes_to_funding: i64,
}

#[inline]
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let f = 10f64.powi(decimals);
    (x * f).round() / f
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_ordering_is_declaration_order() {
        let mut v = vec![Exchange::Delta, Exchange::Binance, Exchange::Bybit];
        v.sort();
        assert_eq!(v, Exchange::ALL.to_vec());
    }

    #[test]
    fn exchange_parses_case_insensitively() {
        assert_eq!("BYBIT".parse::<Exchange>(), Ok(Exchange::Bybit));
        assert!("okx".parse::<Exchange>().is_err());
    }

    #[test]
    fn strategy_text_names_both_legs() {
        let c = ArbitrageCandidate {
            instrument: "BTCUSDT".into(),
            long_exchange: Exchange::Bybit,
            short_exchange: Exchange::Binance,
            divergence_pct: 0.25,
            next_funding_at: None,
        };
        assert_eq!(c.strategy(), "LONG Bybit, SHORT Binance");
        assert!(c.alert_key().is_none());
    }

    #[test]
    fn rounding_to_four_places() {
        assert_eq!(round_to(0.123456, 4), 0.1235);
        assert_eq!(round_to(-0.00004, 4), -0.0);
    }
}
