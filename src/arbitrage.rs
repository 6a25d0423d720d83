// src/arbitrage.rs
use smallvec::SmallVec;

use crate::snapshot::InstrumentSnapshot;
use crate::types::{ArbitrageCandidate, Exchange};

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("divergence threshold must be a positive percentage, got {0}")]
pub struct InvalidThreshold(pub f64);

#[inline]
pub fn divergence(a: f64, b: f64) -> f64 { (a - b).abs() }

/// Picks the single widest-diverging venue pair per instrument.
#[derive(Debug, Clone, Copy)]
pub struct ArbitrageSelector {
    threshold_pct: f64,
}

impl ArbitrageSelector {
    pub fn new(threshold_pct: f64) -> Result<Self, InvalidThreshold> {
        if threshold_pct.is_finite() && threshold_pct > 0.0 {
            Ok(Self { threshold_pct })
        } else {
            Err(InvalidThreshold(threshold_pct))
        }
    }

    /// Exhaustive pairwise scan in exchange order. Ties keep the first pair
    /// encountered; a divergence equal to the threshold qualifies.
    pub fn select(&self, snap: &InstrumentSnapshot) -> Option<ArbitrageCandidate> {
        let rates: SmallVec<[(Exchange, f64); 4]> =
            snap.records.iter().map(|(ex, r)| (*ex, r.rate_pct)).collect();

        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..rates.len() {
            for j in (i + 1)..rates.len() {
                let d = divergence(rates[i].1, rates[j].1);
                if best.map_or(true, |(_, _, bd)| d > bd) {
                    best = Some((i, j, d));
                }
            }
        }

        let (i, j, diff) = best?;
        if diff < self.threshold_pct {
            return None;
        }
        // long where funding is cheaper, short where it is richer
        let (long, short) = if rates[i].1 <= rates[j].1 { (rates[i].0, rates[j].0) } else { (rates[j].0, rates[i].0) };

        Some(ArbitrageCandidate {
            instrument: snap.instrument.clone(),
            long_exchange: long,
            short_exchange: short,
            divergence_pct: diff,
            next_funding_at: snap.records.values().find_map(|r| r.next_funding_at),
        })
    }
}
