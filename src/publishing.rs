// src/publishing.rs
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;

use crate::types::{ArbitrageCandidate, Exchange, OpportunityRow};

pub const TEST_MESSAGE: &str = "✅ Telegram connected. Funding scanner alerts are live.";

/// Best-effort text sink. Delivery failures never surface to the caller.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn notify(&self, text: &str);
}

#[async_trait::async_trait]
impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    async fn notify(&self, text: &str) { (**self).notify(text).await }
}

/// Writes alerts to the log instead of a chat. Used when no chat is configured.
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) {
        tracing::info!(target: "fundarb::alert", "{text}");
    }
}

pub struct TelegramNotifier {
    http: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub const DEFAULT_API_URL: &'static str = "https://api.telegram.org";

    pub fn new(api_url: &str, bot_token: &str, chat_id: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: format!("{}/bot{}/sendMessage", api_url.trim_end_matches('/'), bot_token),
            chat_id: chat_id.into(),
        })
    }

    async fn send(&self, text: &str) -> Result<(), reqwest::Error> {
        let payload = json!({ "chat_id": self.chat_id, "text": text, "parse_mode": "HTML" });
        self.http.post(&self.endpoint).json(&payload).send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) {
        match self.send(text).await {
            Ok(()) => tracing::debug!(chat_id = %self.chat_id, "telegram message delivered"),
            // the bot token is part of the URL, so log the status only
            Err(e) => tracing::warn!(status = ?e.status(), timeout = e.is_timeout(), "telegram delivery failed"),
        }
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Telegram (HTML) body announcing an imminent funding event.
pub fn alert_message(c: &ArbitrageCandidate, minutes_to_funding: i64) -> String {
    format!(
        "🚨 <b>Funding Arbitrage Alert</b>\n\n\
         <b>{}</b>\n\
         LONG <b>{}</b>\n\
         SHORT <b>{}</b>\n\
         Diff: <b>{:.2}%</b>\n\
         Funding in <b>{} min</b>",
        escape_html(&c.instrument),
        c.long_exchange,
        c.short_exchange,
        c.divergence_pct,
        minutes_to_funding,
    )
}

/// Fixed-width text table of opportunity rows, widest divergence first.
pub fn render_table(rows: &[OpportunityRow], exchanges: &[Exchange], now: DateTime<Utc>) -> String {
    let mut out = String::new();
    if rows.is_empty() {
        out.push_str("No strong arbitrage opportunities.\n");
    } else {
        out.push_str(&format!("{:<16}", "Symbol"));
        for ex in exchanges {
            out.push_str(&format!("{:>14}", format!("{ex} (%)")));
        }
        out.push_str(&format!("{:>16}  {:<28}{}\n", "Difference (%)", "Strategy", "Next Funding"));
        for row in rows {
            out.push_str(&format!("{:<16}", row.instrument));
            for ex in exchanges {
                let cell = match row.rates.get(ex).copied().flatten() {
                    Some(r) => format!("{r:.4}"),
                    None => "-".to_string(),
                };
                out.push_str(&format!("{cell:>14}"));
            }
            out.push_str(&format!("{:>16.4}  {:<28}{}\n", row.divergence_pct, row.strategy, row.countdown));
        }
    }
    out.push_str(&now.format("Updated %d %b %Y %H:%M:%S UTC").to_string());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Exchange;

    #[test]
    fn alert_names_legs_and_rounds_divergence() {
        let c = ArbitrageCandidate {
            instrument: "BTCUSDT".into(),
            long_exchange: Exchange::Bybit,
            short_exchange: Exchange::Binance,
            divergence_pct: 0.25499,
            next_funding_at: None,
        };
        let msg = alert_message(&c, 10);
        assert!(msg.contains("<b>BTCUSDT</b>"));
        assert!(msg.contains("LONG <b>Bybit</b>"));
        assert!(msg.contains("SHORT <b>Binance</b>"));
        assert!(msg.contains("Diff: <b>0.25%</b>"));
        assert!(msg.ends_with("Funding in <b>10 min</b>"));
    }

    #[test]
    fn instrument_is_html_escaped() {
        assert_eq!(escape_html("A<B>&C"), "A&lt;B&gt;&amp;C");
    }

    #[test]
    fn endpoint_joins_token() {
        let n = TelegramNotifier::new("http://localhost:9/", "123:abc", "42", Duration::from_secs(1)).unwrap();
        assert_eq!(n.endpoint, "http://localhost:9/bot123:abc/sendMessage");
    }

    #[test]
    fn table_shows_missing_rates_and_caption() {
        use chrono::TimeZone;
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 7, 50, 0).unwrap();
        let row = OpportunityRow {
            instrument: "BTCUSDT".into(),
            rates: [(Exchange::Binance, Some(0.3)), (Exchange::Bybit, Some(0.05)), (Exchange::Delta, None)].into_iter().collect(),
            divergence_pct: 0.25,
            strategy: "LONG Bybit, SHORT Binance".into(),
            countdown: "0h 10m".into(),
            minutes_to_funding: 10,
        };
        let out = render_table(&[row], &Exchange::ALL, now);
        let line = out.lines().nth(1).unwrap();
        assert!(line.starts_with("BTCUSDT"));
        assert!(line.contains("0.3000") && line.contains("0.0500") && line.contains(" -"));
        assert!(line.contains("LONG Bybit, SHORT Binance") && line.ends_with("0h 10m"));
        assert!(out.ends_with("Updated 01 Mar 2024 07:50:00 UTC"));
    }

    #[test]
    fn empty_table_says_so() {
        let out = render_table(&[], &Exchange::ALL, Utc::now());
        assert!(out.starts_with("No strong arbitrage opportunities."));
    }
}
