// src/bin/source_probe.rs
use chrono::Utc;
use clap::Parser;

use fundarb::config::ScannerConfig;
use fundarb::providers::{build_sources, ingest_batch};
use fundarb::types::Exchange;

/// Fetch one venue and print its normalized funding records.
#[derive(Debug, Parser)]
struct Args {
    /// binance | bybit | delta
    exchange: Exchange,
    /// Only print instruments containing this text
    #[arg(long)]
    filter: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut cfg = ScannerConfig::default();
    for ex in Exchange::ALL {
        let src = match ex {
            Exchange::Binance => &mut cfg.sources.binance,
            Exchange::Bybit => &mut cfg.sources.bybit,
            Exchange::Delta => &mut cfg.sources.delta,
        };
        src.enabled = ex == args.exchange;
    }

    let src = build_sources(&cfg)?.pop().ok_or_else(|| anyhow::anyhow!("no source for {}", args.exchange))?;
    let raws = src.fetch().await?;
    let now = Utc::now();
    let recs = ingest_batch(src.exchange(), src.convention(), &raws, now);
    for r in recs.iter().filter(|r| args.filter.as_deref().map_or(true, |f| r.instrument.contains(f))) {
        let next = r.next_funding_at.map(|t| t.to_rfc3339()).unwrap_or_else(|| "-".into());
        println!("{} {} rate={:.4}% next={}", r.exchange, r.instrument, r.rate_pct, next);
    }
    println!("{} -> {} raw, {} usable", args.exchange, raws.len(), recs.len());
    Ok(())
}
