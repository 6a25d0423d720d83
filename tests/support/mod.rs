#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;

use fundarb::arbitrage::ArbitrageSelector;
use fundarb::cache::SourceCache;
use fundarb::dedup::AlertDeduplicator;
use fundarb::providers::{ProviderError, RateSource, RateUnit, RawRecord, TimeUnit, UnitConvention};
use fundarb::publishing::Notifier;
use fundarb::scanner::Scanner;
use fundarb::types::Exchange;

pub enum Script {
    Records(Vec<RawRecord>),
    Unavailable,
    Hang,
}

/// In-memory source replaying a fixed answer and counting calls.
pub struct ScriptedSource {
    pub exchange: Exchange,
    pub convention: UnitConvention,
    pub script: Script,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub fn new(exchange: Exchange, script: Script) -> Self {
        let convention = match exchange {
            Exchange::Delta => UnitConvention { rate: RateUnit::Percent, time: TimeUnit::Micros },
            _ => UnitConvention { rate: RateUnit::Fraction, time: TimeUnit::Millis },
        };
        Self { exchange, convention, script, calls: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}

#[async_trait::async_trait]
impl RateSource for ScriptedSource {
    fn exchange(&self) -> Exchange { self.exchange }
    fn convention(&self) -> UnitConvention { self.convention }
    async fn fetch(&self) -> Result<Vec<RawRecord>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Records(r) => Ok(r.clone()),
            Script::Unavailable => Err(ProviderError::Status(503)),
            Script::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Vec::new())
            }
        }
    }
}

/// Raw record with a string rate in the venue's own unit.
pub fn raw(symbol: &str, rate: &str, next_funding_ms: Option<DateTime<Utc>>) -> RawRecord {
    RawRecord {
        symbol: Some(symbol.to_string()),
        rate: Some(json!(rate)),
        next_funding: next_funding_ms.map(|t| json!(t.timestamp_millis())),
    }
}

/// Thread-safe message collector for notification assertions.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> { self.messages.lock().expect("lock messages").clone() }
    pub fn len(&self) -> usize { self.messages.lock().expect("lock messages").len() }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) {
        self.messages.lock().expect("lock messages").push(text.to_string());
    }
}

pub fn scanner(
    sources: Vec<Arc<dyn RateSource>>,
    threshold_pct: f64,
    lead_minutes: i64,
) -> (Scanner<RecordingNotifier>, RecordingNotifier) {
    let notifier = RecordingNotifier::default();
    let s = Scanner::new(
        sources,
        notifier.clone(),
        ArbitrageSelector::new(threshold_pct).expect("positive threshold"),
        AlertDeduplicator::new(lead_minutes, chrono::Duration::hours(24)),
        SourceCache::disabled(),
        Duration::from_millis(200),
    );
    (s, notifier)
}
