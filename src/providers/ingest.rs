// src/providers/ingest.rs
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use super::{RateUnit, RawRecord, TimeUnit, UnitConvention};
use crate::symbols::canonicalize;
use crate::types::{Exchange, RateRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingSymbol,
    MissingRate,
    InvalidRate,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MissingSymbol => "missing_symbol",
            SkipReason::MissingRate => "missing_rate",
            SkipReason::InvalidRate => "invalid_rate",
        }
    }
}

/// Numbers come either as JSON numbers or as decimal strings; an empty
/// string means the venue has no active funding for the symbol.
fn parse_number(v: &Value) -> Result<f64, SkipReason> {
    let x = match v {
        Value::Number(n) => n.as_f64().ok_or(SkipReason::InvalidRate)?,
        Value::String(s) if s.trim().is_empty() => return Err(SkipReason::MissingRate),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| SkipReason::InvalidRate)?,
        Value::Null => return Err(SkipReason::MissingRate),
        _ => return Err(SkipReason::InvalidRate),
    };
    if x.is_finite() { Ok(x) } else { Err(SkipReason::InvalidRate) }
}

pub fn to_percent(rate: f64, unit: RateUnit) -> f64 {
    match unit {
        RateUnit::Fraction => rate * 100.0,
        RateUnit::Percent => rate,
    }
}

/// Epoch value in the venue's unit -> instant. Zero and garbage are "unknown".
pub fn parse_instant(v: &Value, unit: TimeUnit) -> Option<DateTime<Utc>> {
    let raw: i64 = match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    if raw <= 0 {
        return None;
    }
    let ts = match unit {
        TimeUnit::Seconds => Utc.timestamp_opt(raw, 0),
        TimeUnit::Millis => Utc.timestamp_millis_opt(raw),
        TimeUnit::Micros => return DateTime::<Utc>::from_timestamp_micros(raw),
    };
    ts.single()
}

/// One raw record -> zero or one canonical record.
pub fn ingest(
    exchange: Exchange,
    conv: UnitConvention,
    raw: &RawRecord,
    fetched_at: DateTime<Utc>,
) -> Result<RateRecord, SkipReason> {
    let symbol = raw
        .symbol
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SkipReason::MissingSymbol)?;
    let rate = parse_number(raw.rate.as_ref().ok_or(SkipReason::MissingRate)?)?;
    let next_funding_at = raw.next_funding.as_ref().and_then(|v| parse_instant(v, conv.time));

    Ok(RateRecord {
        exchange,
        instrument: canonicalize(exchange, symbol).into_key(),
        rate_pct: to_percent(rate, conv.rate),
        next_funding_at,
        fetched_at,
    })
}

/// Ingest a whole batch; malformed siblings are dropped one by one.
pub fn ingest_batch(
    exchange: Exchange,
    conv: UnitConvention,
    raws: &[RawRecord],
    fetched_at: DateTime<Utc>,
) -> Vec<RateRecord> {
    let mut out = Vec::with_capacity(raws.len());
    for raw in raws {
        match ingest(exchange, conv, raw, fetched_at) {
            Ok(rec) => out.push(rec),
            Err(reason) => {
                tracing::trace!(%exchange, symbol = ?raw.symbol, reason = reason.as_str(), "record skipped");
                crate::metrics::record_skipped(reason.as_str());
            }
        }
    }
    out
}
