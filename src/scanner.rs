// src/scanner.rs
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::join_all;
use ordered_float::OrderedFloat;
use tokio::time::MissedTickBehavior;

use crate::arbitrage::ArbitrageSelector;
use crate::cache::SourceCache;
use crate::config::{ConfigError, ScannerConfig};
use crate::dedup::AlertDeduplicator;
use crate::funding::countdown;
use crate::providers::{ingest_batch, ProviderError, RateSource};
use crate::publishing::{alert_message, Notifier};
use crate::snapshot::merge;
use crate::types::{round_to, Exchange, OpportunityRow, RateRecord};

/// What one cycle saw and produced.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub rows: Vec<OpportunityRow>,
    pub failed_sources: Vec<Exchange>,
    pub records: usize,
    pub compared: usize, // instruments quoted by two or more venues
    pub alerts_sent: usize,
}

pub struct Scanner<N>
where
    N: Notifier,
{
    sources: Vec<Arc<dyn RateSource>>,
    notifier: N,
    selector: ArbitrageSelector,
    source_timeout: Duration,
    cache: SourceCache,
    dedup: AlertDeduplicator,
}

impl<N> Scanner<N>
where
    N: Notifier,
{
    pub fn new(
        sources: Vec<Arc<dyn RateSource>>,
        notifier: N,
        selector: ArbitrageSelector,
        dedup: AlertDeduplicator,
        cache: SourceCache,
        source_timeout: Duration,
    ) -> Self {
        Self { sources, notifier, selector, source_timeout, cache, dedup }
    }

    pub fn from_config(cfg: &ScannerConfig, sources: Vec<Arc<dyn RateSource>>, notifier: N) -> Result<Self, ConfigError> {
        cfg.validate()?;
        let selector = ArbitrageSelector::new(cfg.divergence_threshold_pct)
            .map_err(|e| ConfigError::Invalid { field: "divergence_threshold_pct", reason: e.to_string() })?;
        Ok(Self::new(
            sources,
            notifier,
            selector,
            AlertDeduplicator::new(cfg.alert_lead_minutes, cfg.alert_retention()),
            SourceCache::new(cfg.cache_ttl()),
            cfg.source_timeout(),
        ))
    }

    pub fn exchanges(&self) -> Vec<Exchange> {
        let mut v: Vec<Exchange> = self.sources.iter().map(|s| s.exchange()).collect();
        v.sort();
        v.dedup();
        v
    }

    pub fn dedup(&self) -> &AlertDeduplicator { &self.dedup }

    /// Fetch every source concurrently, each under its own timeout. A failing
    /// source contributes an empty batch and never affects its siblings.
    async fn collect(&mut self, now: DateTime<Utc>) -> (Vec<Vec<RateRecord>>, Vec<Exchange>) {
        let mut batches = Vec::with_capacity(self.sources.len());
        let mut to_fetch = Vec::new();
        for src in &self.sources {
            match self.cache.get(src.exchange(), now) {
                Some(cached) => {
                    tracing::debug!(exchange = %src.exchange(), records = cached.len(), ttl_secs = self.cache.ttl().num_seconds(), "using cached rates");
                    batches.push(cached.to_vec());
                }
                None => to_fetch.push(Arc::clone(src)),
            }
        }

        let timeout = self.source_timeout;
        let futs = to_fetch.iter().map(|src| async move {
            let res = match tokio::time::timeout(timeout, src.fetch()).await {
                Ok(r) => r,
                Err(_) => Err(ProviderError::Timeout(timeout)),
            };
            (src, res)
        });
        let results = join_all(futs).await;

        let mut failed = Vec::new();
        for (src, res) in results {
            let exchange = src.exchange();
            match res {
                Ok(raws) => {
                    let recs = ingest_batch(exchange, src.convention(), &raws, now);
                    tracing::debug!(%exchange, raw = raws.len(), kept = recs.len(), "source fetched");
                    self.cache.put(exchange, now, recs.clone());
                    batches.push(recs);
                }
                Err(err) => {
                    tracing::warn!(%exchange, error = %err, "source unavailable, skipping this cycle");
                    crate::metrics::record_source_failure(exchange.name());
                    failed.push(exchange);
                }
            }
        }
        failed.sort();
        (batches, failed)
    }

    /// Run one full cycle as of `now`: fetch, normalize, merge, select,
    /// gate alerts, and return the rows sorted by divergence.
    pub async fn tick_at(&mut self, now: DateTime<Utc>) -> CycleReport {
        let started = Instant::now();
        let (batches, failed_sources) = self.collect(now).await;
        let records = batches.iter().map(Vec::len).sum();
        let snapshots = merge(batches.iter().map(Vec::as_slice));
        let exchanges = self.exchanges();

        let mut rows = Vec::new();
        let mut alerts_sent = 0;
        for snap in snapshots.values() {
            let Some(cand) = self.selector.select(snap) else { continue };
            let cd = countdown(cand.next_funding_at, now);

            if let Some(key) = cand.alert_key() {
                if self.dedup.try_fire(&key, cd.minutes, now) {
                    tracing::info!(instrument = %cand.instrument, minutes = cd.minutes, divergence = cand.divergence_pct, "funding alert");
                    self.notifier.notify(&alert_message(&cand, cd.minutes)).await;
                    crate::metrics::record_alert_sent();
                    alerts_sent += 1;
                }
            }

            rows.push(OpportunityRow {
                rates: exchanges.iter().map(|ex| (*ex, snap.rate(*ex))).collect(),
                divergence_pct: round_to(cand.divergence_pct, 4),
                strategy: cand.strategy(),
                countdown: cd.label,
                minutes_to_funding: cd.minutes,
                instrument: cand.instrument,
            });
        }
        rows.sort_by(|a, b| {
            OrderedFloat(b.divergence_pct)
                .cmp(&OrderedFloat(a.divergence_pct))
                .then_with(|| a.instrument.cmp(&b.instrument))
        });

        let evicted = self.dedup.evict_expired(now);
        if evicted > 0 {
            tracing::debug!(evicted, remaining = self.dedup.len(), "expired alert keys dropped");
        }

        let report = CycleReport { compared: snapshots.len(), records, alerts_sent, failed_sources, rows };
        crate::metrics::record_cycle(started.elapsed().as_secs_f64());
        tracing::info!(
            sources = self.sources.len(),
            failed = report.failed_sources.len(),
            records = report.records,
            compared = report.compared,
            candidates = report.rows.len(),
            alerts = report.alerts_sent,
            "cycle complete"
        );
        report
    }

    pub async fn tick_once(&mut self) -> CycleReport { self.tick_at(Utc::now()).await }

    /// Repeat `tick_once` every `interval` until `shutdown` resolves. Shutdown
    /// is only observed between cycles.
    pub async fn run<F, C>(&mut self, interval: Duration, shutdown: F, mut on_cycle: C)
    where
        F: Future<Output = ()>,
        C: FnMut(&CycleReport),
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    tracing::info!("shutdown requested, stopping scanner");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.tick_once().await;
                    on_cycle(&report);
                }
            }
        }
    }
}
