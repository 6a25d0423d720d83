// src/cache.rs
use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::types::{Exchange, RateRecord};

/// Last good record set per source, reused until it is `ttl` old.
/// A zero TTL disables reuse entirely.
#[derive(Debug)]
pub struct SourceCache {
    ttl: Duration,
    entries: HashMap<Exchange, (DateTime<Utc>, Vec<RateRecord>)>,
}

impl SourceCache {
    pub fn new(ttl: Duration) -> Self { Self { ttl, entries: HashMap::new() } }

    pub fn disabled() -> Self { Self::new(Duration::zero()) }

    pub fn ttl(&self) -> Duration { self.ttl }

    pub fn get(&self, exchange: Exchange, now: DateTime<Utc>) -> Option<&[RateRecord]> {
        if self.ttl <= Duration::zero() {
            return None;
        }
        let (stored_at, records) = self.entries.get(&exchange)?;
        (now - *stored_at < self.ttl).then_some(records.as_slice())
    }

    pub fn put(&mut self, exchange: Exchange, now: DateTime<Utc>, records: Vec<RateRecord>) {
        if self.ttl > Duration::zero() {
            self.entries.insert(exchange, (now, records));
        }
    }
}
