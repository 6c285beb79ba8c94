//! Wallet-keyed points ledger
//!
//! The ledger owns each wallet's cumulative points. Reads and writes are
//! best-effort: there is no retry and no transaction, and the game keeps
//! running on its local counters whatever the ledger does.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::sim::LedgerRecord;

/// Failures talking to a points ledger
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Ledger backend is not available")]
    Unavailable,
    #[error("Ledger request failed: {0}")]
    Transport(String),
    #[error("Ledger returned HTTP {0}")]
    Status(u16),
    #[error("Ledger entry could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A ledger record as stored, stamped with its write time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(flatten)]
    pub record: LedgerRecord,
    /// Unix timestamp (ms) of the write
    #[serde(default)]
    pub timestamp: f64,
}

/// Remote points storage keyed by wallet address
#[allow(async_fn_in_trait)]
pub trait PointsLedger {
    /// Current record for `wallet`, `None` for a wallet the ledger has never seen
    async fn fetch(&self, wallet: &str) -> Result<Option<LedgerRecord>, LedgerError>;

    /// Overwrite the record for `wallet`
    async fn store(
        &self,
        wallet: &str,
        record: &LedgerRecord,
        timestamp_ms: f64,
    ) -> Result<(), LedgerError>;
}

/// Read a wallet's record, treating absence and failure as a new wallet
pub async fn fetch_or_default<L: PointsLedger>(ledger: &L, wallet: &str) -> LedgerRecord {
    match ledger.fetch(wallet).await {
        Ok(Some(record)) => {
            log::info!(
                "Loaded ledger for {}: {} points",
                short_address(wallet),
                record.total_points
            );
            record
        }
        Ok(None) => {
            log::info!("No ledger entry for {}, starting fresh", short_address(wallet));
            LedgerRecord::default()
        }
        Err(e) => {
            log::warn!("Ledger read failed for {}: {}", short_address(wallet), e);
            LedgerRecord::default()
        }
    }
}

/// Write a record, logging instead of failing
///
/// Returns whether the write went through.
pub async fn store_logged<L: PointsLedger>(
    ledger: &L,
    wallet: &str,
    record: &LedgerRecord,
    timestamp_ms: f64,
) -> bool {
    match ledger.store(wallet, record, timestamp_ms).await {
        Ok(()) => {
            log::info!(
                "Ledger synced for {}: {} points",
                short_address(wallet),
                record.total_points
            );
            true
        }
        Err(e) => {
            log::warn!("Ledger write failed for {}: {}", short_address(wallet), e);
            false
        }
    }
}

/// Abbreviate a wallet address for logs and status text
pub fn short_address(wallet: &str) -> String {
    let chars: Vec<char> = wallet.chars().collect();
    if chars.len() <= 10 {
        return wallet.to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}…{}", head, tail)
}

/// In-memory ledger for tests and native runs
#[derive(Debug, Default)]
pub struct MemoryLedger {
    entries: RefCell<HashMap<String, LedgerEntry>>,
    offline: Cell<bool>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable backend: every call fails
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    pub fn entry(&self, wallet: &str) -> Option<LedgerEntry> {
        self.entries.borrow().get(wallet).copied()
    }
}

impl PointsLedger for MemoryLedger {
    async fn fetch(&self, wallet: &str) -> Result<Option<LedgerRecord>, LedgerError> {
        if self.offline.get() {
            return Err(LedgerError::Unavailable);
        }
        Ok(self.entries.borrow().get(wallet).map(|e| e.record))
    }

    async fn store(
        &self,
        wallet: &str,
        record: &LedgerRecord,
        timestamp_ms: f64,
    ) -> Result<(), LedgerError> {
        if self.offline.get() {
            return Err(LedgerError::Unavailable);
        }
        self.entries.borrow_mut().insert(
            wallet.to_string(),
            LedgerEntry {
                record: *record,
                timestamp: timestamp_ms,
            },
        );
        Ok(())
    }
}

/// Ledger kept in this browser's LocalStorage, one JSON entry per wallet
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct BrowserLedger;

#[cfg(target_arch = "wasm32")]
impl BrowserLedger {
    const KEY_PREFIX: &'static str = "onetaptoolate_points_";

    fn key(wallet: &str) -> String {
        format!("{}{}", Self::KEY_PREFIX, wallet)
    }
}

#[cfg(target_arch = "wasm32")]
impl PointsLedger for BrowserLedger {
    async fn fetch(&self, wallet: &str) -> Result<Option<LedgerRecord>, LedgerError> {
        use super::WebStorage;

        if WebStorage::storage().is_none() {
            return Err(LedgerError::Unavailable);
        }
        match WebStorage::get_raw(&Self::key(wallet)) {
            Some(json) => {
                let entry: LedgerEntry = serde_json::from_str(&json)?;
                Ok(Some(entry.record))
            }
            None => Ok(None),
        }
    }

    async fn store(
        &self,
        wallet: &str,
        record: &LedgerRecord,
        timestamp_ms: f64,
    ) -> Result<(), LedgerError> {
        use super::WebStorage;

        let entry = LedgerEntry {
            record: *record,
            timestamp: timestamp_ms,
        };
        let json = serde_json::to_string(&entry)?;
        WebStorage::set_raw(&Self::key(wallet), &json)
            .map_err(|e| LedgerError::Transport(e.to_string()))
    }
}

/// Ledger behind an HTTP endpoint: `GET`/`PUT {endpoint}/{wallet}` with JSON bodies
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct HttpLedger {
    endpoint: String,
}

#[cfg(target_arch = "wasm32")]
impl HttpLedger {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, wallet: &str) -> String {
        format!(
            "{}/{}",
            self.endpoint,
            crate::platform::encode_uri_component(wallet)
        )
    }

    async fn send(
        &self,
        method: &str,
        url: &str,
        body: Option<String>,
    ) -> Result<web_sys::Response, LedgerError> {
        use wasm_bindgen::JsCast;
        use wasm_bindgen_futures::JsFuture;

        let transport = |e: wasm_bindgen::JsValue| LedgerError::Transport(format!("{:?}", e));

        let opts = web_sys::RequestInit::new();
        opts.set_method(method);
        opts.set_mode(web_sys::RequestMode::Cors);
        if let Some(body) = body {
            let headers = web_sys::Headers::new().map_err(transport)?;
            headers
                .set("Content-Type", "application/json")
                .map_err(transport)?;
            opts.set_headers(&headers);
            opts.set_body(&wasm_bindgen::JsValue::from_str(&body));
        }

        let request = web_sys::Request::new_with_str_and_init(url, &opts).map_err(transport)?;
        let window = web_sys::window().ok_or(LedgerError::Unavailable)?;
        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(transport)?;
        response.dyn_into::<web_sys::Response>().map_err(transport)
    }
}

#[cfg(target_arch = "wasm32")]
impl PointsLedger for HttpLedger {
    async fn fetch(&self, wallet: &str) -> Result<Option<LedgerRecord>, LedgerError> {
        use wasm_bindgen_futures::JsFuture;

        let response = self.send("GET", &self.url(wallet), None).await?;
        if response.status() == 404 {
            return Ok(None);
        }
        if !response.ok() {
            return Err(LedgerError::Status(response.status()));
        }

        let transport = |e: wasm_bindgen::JsValue| LedgerError::Transport(format!("{:?}", e));
        let text = JsFuture::from(response.text().map_err(transport)?)
            .await
            .map_err(transport)?;
        let body = text.as_string().unwrap_or_default();
        if body.trim().is_empty() || body.trim() == "null" {
            return Ok(None);
        }
        let entry: LedgerEntry = serde_json::from_str(&body)?;
        Ok(Some(entry.record))
    }

    async fn store(
        &self,
        wallet: &str,
        record: &LedgerRecord,
        timestamp_ms: f64,
    ) -> Result<(), LedgerError> {
        let entry = LedgerEntry {
            record: *record,
            timestamp: timestamp_ms,
        };
        let body = serde_json::to_string(&entry)?;
        let response = self.send("PUT", &self.url(wallet), Some(body)).await?;
        if !response.ok() {
            return Err(LedgerError::Status(response.status()));
        }
        Ok(())
    }
}

/// The ledger a browser session talks to, picked from settings
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub enum WebLedger {
    Http(HttpLedger),
    Browser(BrowserLedger),
}

#[cfg(target_arch = "wasm32")]
impl WebLedger {
    /// Remote endpoint when configured, this browser's LocalStorage otherwise
    pub fn from_settings(settings: &crate::settings::Settings) -> Self {
        match settings.ledger_endpoint() {
            Some(endpoint) => {
                log::info!("Using remote points ledger at {}", endpoint);
                WebLedger::Http(HttpLedger::new(endpoint))
            }
            None => WebLedger::Browser(BrowserLedger),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl PointsLedger for WebLedger {
    async fn fetch(&self, wallet: &str) -> Result<Option<LedgerRecord>, LedgerError> {
        match self {
            WebLedger::Http(ledger) => ledger.fetch(wallet).await,
            WebLedger::Browser(ledger) => ledger.fetch(wallet).await,
        }
    }

    async fn store(
        &self,
        wallet: &str,
        record: &LedgerRecord,
        timestamp_ms: f64,
    ) -> Result<(), LedgerError> {
        match self {
            WebLedger::Http(ledger) => ledger.store(wallet, record, timestamp_ms).await,
            WebLedger::Browser(ledger) => ledger.store(wallet, record, timestamp_ms).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::PointsBreakdown;

    fn record(total: u64) -> LedgerRecord {
        LedgerRecord {
            total_points: total,
            breakdown: PointsBreakdown {
                perfect_hits: total,
                combo_bonus: 0,
                speed_bonus: 0,
            },
        }
    }

    #[test]
    fn test_unknown_wallet_reads_as_zero() {
        let ledger = MemoryLedger::new();
        let fetched = pollster::block_on(fetch_or_default(&ledger, "wallet-a"));
        assert_eq!(fetched, LedgerRecord::default());
    }

    #[test]
    fn test_store_then_fetch() {
        let ledger = MemoryLedger::new();
        assert!(pollster::block_on(store_logged(&ledger, "wallet-a", &record(25), 1000.0)));
        let fetched = pollster::block_on(fetch_or_default(&ledger, "wallet-a"));
        assert_eq!(fetched.total_points, 25);
        assert_eq!(ledger.entry("wallet-a").map(|e| e.timestamp), Some(1000.0));
    }

    #[test]
    fn test_offline_ledger_degrades() {
        let ledger = MemoryLedger::new();
        pollster::block_on(store_logged(&ledger, "wallet-a", &record(5), 1.0));
        ledger.set_offline(true);

        assert!(!pollster::block_on(store_logged(&ledger, "wallet-a", &record(99), 2.0)));
        assert_eq!(
            pollster::block_on(fetch_or_default(&ledger, "wallet-a")),
            LedgerRecord::default()
        );

        ledger.set_offline(false);
        assert_eq!(ledger.entry("wallet-a").map(|e| e.record.total_points), Some(5));
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = LedgerEntry {
            record: record(12),
            timestamp: 1700000000000.0,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["totalPoints"], 12);
        assert_eq!(json["breakdown"]["perfectHits"], 12);
        assert_eq!(json["timestamp"], 1700000000000.0);
    }

    #[test]
    fn test_short_address() {
        assert_eq!(short_address("abc"), "abc");
        assert_eq!(
            short_address("7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU"),
            "7xKX…gAsU"
        );
    }
}
