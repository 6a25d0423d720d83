// src/snapshot.rs
use std::collections::BTreeMap;

use crate::types::{Exchange, RateRecord};

/// All records for one canonical instrument in one cycle, keyed by venue.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentSnapshot {
    pub instrument: String,
    pub records: BTreeMap<Exchange, RateRecord>,
}

impl InstrumentSnapshot {
    pub fn rate(&self, exchange: Exchange) -> Option<f64> {
        self.records.get(&exchange).map(|r| r.rate_pct)
    }
}

/// Group every source's records by instrument over the union of symbols seen
/// this cycle, keeping only instruments quoted by at least two venues.
///
/// If one venue lists two tickers that canonicalize to the same key the
/// later one wins; the result does not depend on the order of `batches`.
pub fn merge<'a, I>(batches: I) -> BTreeMap<String, InstrumentSnapshot>
where
    I: IntoIterator<Item = &'a [RateRecord]>,
{
    let mut grouped: BTreeMap<String, BTreeMap<Exchange, RateRecord>> = BTreeMap::new();
    for batch in batches {
        for rec in batch {
            grouped
                .entry(rec.instrument.clone())
                .or_default()
                .insert(rec.exchange, rec.clone());
        }
    }
    grouped
        .into_iter()
        .filter(|(_, records)| records.len() >= 2)
        .map(|(instrument, records)| (instrument.clone(), InstrumentSnapshot { instrument, records }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rec(ex: Exchange, sym: &str, rate: f64) -> RateRecord {
        RateRecord { exchange: ex, instrument: sym.into(), rate_pct: rate, next_funding_at: None, fetched_at: Utc::now() }
    }

    #[test]
    fn single_source_instruments_are_dropped() {
        let a = vec![rec(Exchange::Binance, "BTCUSDT", 0.01), rec(Exchange::Binance, "ONLYBN", 0.5)];
        let b = vec![rec(Exchange::Bybit, "BTCUSDT", 0.02), rec(Exchange::Bybit, "ONLYBY", 0.4)];
        let c = vec![rec(Exchange::Delta, "ONLYBY", 0.1)];
        let out = merge([a.as_slice(), b.as_slice(), c.as_slice()]);
        let keys: Vec<_> = out.keys().cloned().collect();
        assert_eq!(keys, ["BTCUSDT", "ONLYBY"]);
        assert_eq!(out["ONLYBY"].rate(Exchange::Delta), Some(0.1));
        assert_eq!(out["BTCUSDT"].rate(Exchange::Delta), None);
    }

    #[test]
    fn grouping_is_order_independent() {
        let a = vec![rec(Exchange::Binance, "ETHUSDT", 0.01)];
        let b = vec![rec(Exchange::Bybit, "ETHUSDT", 0.03)];
        let c = vec![rec(Exchange::Delta, "ETHUSDT", -0.02)];
        let fwd = merge([a.as_slice(), b.as_slice(), c.as_slice()]);
        let rev = merge([c.as_slice(), b.as_slice(), a.as_slice()]);
        assert_eq!(fwd, rev);
        assert_eq!(fwd["ETHUSDT"].records.len(), 3);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let none: [&[RateRecord]; 0] = [];
        assert!(merge(none).is_empty());
    }
}
