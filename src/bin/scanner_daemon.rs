// src/bin/scanner_daemon.rs
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;

use fundarb::config::ScannerConfig;
use fundarb::providers::build_sources;
use fundarb::publishing::{render_table, LogNotifier, Notifier, TelegramNotifier, TEST_MESSAGE};
use fundarb::scanner::{CycleReport, Scanner};

#[derive(Debug, Parser)]
#[command(name = "scanner_daemon", about = "Cross-exchange funding rate arbitrage scanner")]
struct Args {
    /// TOML config file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Minimum divergence to report, in percent
    #[arg(long)]
    threshold: Option<f64>,
    /// Notify this many minutes (or fewer) before funding
    #[arg(long)]
    lead_minutes: Option<i64>,
    /// Seconds between cycles
    #[arg(long)]
    interval: Option<u64>,
    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
    /// Print rows as JSON instead of a table
    #[arg(long)]
    json: bool,
    /// Send a connectivity message through the notifier and exit
    #[arg(long)]
    test_notify: bool,
}

fn build_notifier(cfg: &ScannerConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    let tg = &cfg.telegram;
    match (tg.enabled, tg.bot_token.as_deref(), tg.chat_id.as_deref()) {
        (true, Some(token), Some(chat)) => {
            let n = TelegramNotifier::new(&tg.api_url, token, chat, fundarb::config::secs(tg.timeout_secs))
                .context("building telegram client")?;
            Ok(Arc::new(n))
        }
        _ => Ok(Arc::new(LogNotifier)),
    }
}

fn print_report(report: &CycleReport, exchanges: &[fundarb::types::Exchange], json: bool) {
    if json {
        match serde_json::to_string(&report.rows) {
            Ok(s) => println!("{s}"),
            Err(e) => tracing::warn!("encoding rows failed: {e}"),
        }
    } else {
        println!("{}\n", render_table(&report.rows, exchanges, Utc::now()));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut cfg = ScannerConfig::load(args.config.as_deref()).context("loading config")?;
    if let Some(t) = args.threshold { cfg.divergence_threshold_pct = t; }
    if let Some(m) = args.lead_minutes { cfg.alert_lead_minutes = m; }
    if let Some(i) = args.interval { cfg.poll_interval_secs = i; }
    cfg.logging.init();
    cfg.validate()?;

    let notifier = build_notifier(&cfg)?;
    if args.test_notify {
        notifier.notify(TEST_MESSAGE).await;
        tracing::info!("test notification dispatched");
        return Ok(());
    }

    let sources = build_sources(&cfg).context("building sources")?;
    let mut scanner = Scanner::from_config(&cfg, sources, notifier)?;
    let exchanges = scanner.exchanges();
    tracing::info!(
        exchanges = ?exchanges,
        threshold_pct = cfg.divergence_threshold_pct,
        lead_minutes = cfg.alert_lead_minutes,
        interval_secs = cfg.poll_interval_secs,
        "scanner starting"
    );

    if args.once {
        let report = scanner.tick_once().await;
        print_report(&report, &exchanges, args.json);
        return Ok(());
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("ctrl-c handler failed: {e}");
            std::future::pending::<()>().await;
        }
    };
    scanner
        .run(cfg.poll_interval(), shutdown, |report| print_report(report, &exchanges, args.json))
        .await;

    if let Some(text) = fundarb::metrics::render() {
        tracing::info!("final metrics\n{text}");
    }
    Ok(())
}
