// src/dedup.rs
use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use crate::types::AlertKey;

/// Remembers which funding events were already announced.
///
/// A key moves from unseen to notified at most once. Keys are ordered by
/// funding instant so expired ones can be swept off the front; a key is only
/// dropped once its funding instant is `retention` in the past, and a key
/// already that old counts as notified and can never fire.
#[derive(Debug)]
pub struct AlertDeduplicator {
    lead_minutes: i64,
    retention: Duration,
    notified: BTreeSet<(DateTime<Utc>, String)>,
}

impl AlertDeduplicator {
    pub fn new(lead_minutes: i64, retention: Duration) -> Self {
        Self { lead_minutes, retention, notified: BTreeSet::new() }
    }

    pub fn contains(&self, key: &AlertKey) -> bool {
        self.notified.contains(&(key.next_funding_at, key.instrument.clone()))
    }

    /// Record the transition if this observation should notify. Returns
    /// `true` exactly once per key, and only inside the lead window.
    pub fn try_fire(&mut self, key: &AlertKey, minutes_to_funding: i64, now: DateTime<Utc>) -> bool {
        if minutes_to_funding > self.lead_minutes || key.next_funding_at < self.cutoff(now) {
            return false;
        }
        self.notified.insert((key.next_funding_at, key.instrument.clone()))
    }

    /// Oldest funding instant still tracked as of `now`.
    fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.retention).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Drop keys whose funding instant is older than the retention window.
    pub fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = self.cutoff(now);
        let keep = self.notified.split_off(&(cutoff, String::new()));
        let evicted = self.notified.len();
        self.notified = keep;
        evicted
    }

    pub fn len(&self) -> usize { self.notified.len() }

    pub fn is_empty(&self) -> bool { self.notified.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn key(sym: &str, at: DateTime<Utc>) -> AlertKey { AlertKey { instrument: sym.into(), next_funding_at: at } }

    fn at(h: u32) -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 3, 1, h, 0, 0).unwrap() }

    #[test]
    fn fires_once_per_key() {
        let mut d = AlertDeduplicator::new(15, Duration::hours(24));
        let k = key("BTCUSDT", at(8));
        assert!(d.try_fire(&k, 10, at(7)));
        for m in [9, 5, 0, -2] {
            assert!(!d.try_fire(&k, m, at(7)));
        }
        assert!(d.contains(&k));
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn outside_lead_window_stays_unseen() {
        let mut d = AlertDeduplicator::new(15, Duration::hours(24));
        let k = key("BTCUSDT", at(8));
        assert!(!d.try_fire(&k, 16, at(7)));
        assert!(!d.contains(&k));
        assert!(d.try_fire(&k, 15, at(7)));
    }

    #[test]
    fn overdue_still_counts_as_imminent() {
        let mut d = AlertDeduplicator::new(0, Duration::hours(24));
        assert!(d.try_fire(&key("ETHUSDT", at(8)), -1, at(9)));
    }

    #[test]
    fn distinct_funding_instants_are_distinct_events() {
        let mut d = AlertDeduplicator::new(15, Duration::hours(24));
        assert!(d.try_fire(&key("BTCUSDT", at(8)), 5, at(7)));
        assert!(d.try_fire(&key("BTCUSDT", at(16)), 5, at(7)));
        assert!(d.try_fire(&key("ETHUSDT", at(8)), 5, at(7)));
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn keys_older_than_retention_never_fire() {
        let mut d = AlertDeduplicator::new(15, Duration::hours(24));
        let stale = key("BTCUSDT", at(8) - Duration::hours(30));
        for _ in 0..3 {
            assert!(!d.try_fire(&stale, -1800, at(8)));
            d.evict_expired(at(8));
        }
        assert!(d.is_empty());
    }

    #[test]
    fn eviction_only_drops_keys_past_retention() {
        let mut d = AlertDeduplicator::new(15, Duration::hours(24));
        d.try_fire(&key("BTCUSDT", at(0)), 0, at(16));
        d.try_fire(&key("ETHUSDT", at(8)), 0, at(16));
        d.try_fire(&key("SOLUSDT", at(16)), 0, at(16));
        assert_eq!(d.len(), 3);

        assert_eq!(d.evict_expired(at(23)), 0);
        assert_eq!(d.evict_expired(at(0) + Duration::hours(24) + Duration::minutes(1)), 1);
        assert!(!d.contains(&key("BTCUSDT", at(0))));
        assert!(d.contains(&key("ETHUSDT", at(8))));
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn huge_retention_does_not_overflow() {
        let mut d = AlertDeduplicator::new(15, Duration::MAX);
        assert!(d.try_fire(&key("BTCUSDT", at(8)), 5, at(7)));
        assert_eq!(d.evict_expired(at(9)), 0);
    }
}
