// src/metrics.rs
//! Prometheus counters, compiled in with the `metrics` feature. Without it
//! every recorder is a no-op so call sites stay unconditional.

#[cfg(feature = "metrics")]
mod prom {
    use once_cell::sync::Lazy;
    use prometheus::{register_histogram, register_int_counter, register_int_counter_vec, Histogram, IntCounter, IntCounterVec};

    pub static CYCLES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
        register_int_counter!("fundarb_cycles_total", "Scan cycles completed").unwrap()
    });

    pub static SOURCE_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
        register_int_counter_vec!(
            "fundarb_source_failures_total", "Source fetches that failed or timed out", &["exchange"]
        ).unwrap()
    });

    pub static RECORDS_SKIPPED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
        register_int_counter_vec!(
            "fundarb_records_skipped_total", "Raw records dropped at ingestion", &["reason"] // missing_symbol|missing_rate|invalid_rate
        ).unwrap()
    });

    pub static ALERTS_SENT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
        register_int_counter!("fundarb_alerts_sent_total", "Funding alerts handed to the notifier").unwrap()
    });

    pub static CYCLE_SECONDS: Lazy<Histogram> = Lazy::new(|| {
        register_histogram!(
            "fundarb_cycle_seconds",
            "Wall time of one scan cycle",
            vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0]
        ).unwrap()
    });
}

#[inline]
pub fn record_cycle(_secs: f64) {
    #[cfg(feature = "metrics")]
    {
        prom::CYCLES_TOTAL.inc();
        prom::CYCLE_SECONDS.observe(_secs);
    }
}

#[inline]
pub fn record_source_failure(_exchange: &str) {
    #[cfg(feature = "metrics")]
    prom::SOURCE_FAILURES_TOTAL.with_label_values(&[_exchange]).inc();
}

#[inline]
pub fn record_skipped(_reason: &str) {
    #[cfg(feature = "metrics")]
    prom::RECORDS_SKIPPED_TOTAL.with_label_values(&[_reason]).inc();
}

#[inline]
pub fn record_alert_sent() {
    #[cfg(feature = "metrics")]
    prom::ALERTS_SENT_TOTAL.inc();
}

/// Text exposition of the default registry; `None` without the feature.
pub fn render() -> Option<String> {
    #[cfg(feature = "metrics")]
    {
        use prometheus::Encoder;
        let mut buf = Vec::new();
        prometheus::TextEncoder::new().encode(&prometheus::gather(), &mut buf).ok()?;
        String::from_utf8(buf).ok()
    }
    #[cfg(not(feature = "metrics"))]
    {
        None
    }
}
