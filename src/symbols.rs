// src/symbols.rs
use phf::phf_map;

use crate::types::Exchange;

// Native quote suffix -> canonical quote suffix. Canonical keys use the
// USDT-margined spelling so Binance/Bybit tickers join as-is.
static BINANCE_SUFFIXES: phf::Map<&'static str, &'static str> = phf_map! {
    "USDT" => "USDT",
};
static BYBIT_SUFFIXES: phf::Map<&'static str, &'static str> = phf_map! {
    "USDT" => "USDT",
};
static DELTA_SUFFIXES: phf::Map<&'static str, &'static str> = phf_map! {
    "USD" => "USDT",
};

fn suffixes(exchange: Exchange) -> &'static phf::Map<&'static str, &'static str> {
    match exchange {
        Exchange::Binance => &BINANCE_SUFFIXES,
        Exchange::Bybit => &BYBIT_SUFFIXES,
        Exchange::Delta => &DELTA_SUFFIXES,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolMatch {
    /// Known quote suffix, rewritten to the canonical spelling.
    Rewritten(String),
    /// Unknown suffix; the ticker is used as the key unchanged.
    PassThrough(String),
}

impl SymbolMatch {
    pub fn key(&self) -> &str {
        match self {
            SymbolMatch::Rewritten(k) | SymbolMatch::PassThrough(k) => k,
        }
    }
    pub fn into_key(self) -> String {
        match self {
            SymbolMatch::Rewritten(k) | SymbolMatch::PassThrough(k) => k,
        }
    }
    pub fn is_recognized(&self) -> bool { matches!(self, SymbolMatch::Rewritten(_)) }
}

/// Map a venue ticker to its canonical instrument key.
///
/// The longest known suffix wins and a suffix never consumes the whole ticker,
/// so `"USDT"` alone is passed through rather than mapped to an empty base.
pub fn canonicalize(exchange: Exchange, ticker: &str) -> SymbolMatch {
    let best = suffixes(exchange)
        .entries()
        .map(|(native, canonical)| (*native, *canonical))
        .filter(|&(native, _)| ticker.len() > native.len() && ticker.ends_with(native))
        .max_by_key(|&(native, _)| native.len());

    match best {
        Some((native, canonical)) => {
            let base = &ticker[..ticker.len() - native.len()];
            SymbolMatch::Rewritten(format!("{base}{canonical}"))
        }
        None => SymbolMatch::PassThrough(ticker.to_string()),
    }
}
