//! Exchange-rate source contract and the per-session rate feed.
//!
//! A [`RateSource`] makes exactly one attempt per call. [`RateFeed`] tracks the
//! outcome as an explicit `Pending -> Ready | Failed` state machine and always
//! ends up holding a usable table: a failed fetch installs
//! [`ExchangeRateTable::fallback`] and raises a non-blocking notice.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::RateSourceConfig;
use crate::currency::{effective_rate, ExchangeRateTable};
use crate::error::EmiError;
use crate::types::Currency;
use crate::EmiResult;

/// Notice shown while the fallback table is active.
pub const FETCH_FAILED_NOTICE: &str = "Failed to load exchange rates. Using default values.";

// ---------------------------------------------------------------------------
// Source contract
// ---------------------------------------------------------------------------

#[async_trait]
pub trait RateSource: Send + Sync {
    /// One fetch attempt, no retries.
    async fn fetch_rates(&self) -> EmiResult<ExchangeRateTable>;
}

/// Live rates over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRateSource {
    client: Client,
    endpoint: Url,
}

impl HttpRateSource {
    pub fn new(config: &RateSourceConfig) -> EmiResult<Self> {
        config.validate()?;
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| EmiError::Config(format!("invalid endpoint '{}': {e}", config.endpoint)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_rates(&self) -> EmiResult<ExchangeRateTable> {
        tracing::debug!(endpoint = %self.endpoint, "fetching exchange rates");

        let response = self.client.get(self.endpoint.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(EmiError::RateFetch(format!(
                "GET {} returned {status}",
                self.endpoint
            )));
        }

        let body = response.text().await?;
        let table = parse_rates_payload(&body)?;
        tracing::debug!(currencies = table.len(), "exchange rates loaded");
        Ok(table)
    }
}

/// Serves a fixed table; used for offline sessions.
#[derive(Debug, Clone)]
pub struct StaticRateSource {
    table: ExchangeRateTable,
}

impl StaticRateSource {
    pub fn new(table: ExchangeRateTable) -> Self {
        Self { table }
    }

    pub fn fallback() -> Self {
        Self::new(ExchangeRateTable::fallback())
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn fetch_rates(&self) -> EmiResult<ExchangeRateTable> {
        Ok(self.table.clone())
    }
}

// ---------------------------------------------------------------------------
// Payload parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RatesPayload {
    #[serde(default)]
    result: Option<String>,
    #[serde(default, rename = "error-type")]
    error_type: Option<String>,
    #[serde(default, alias = "base")]
    base_code: Option<String>,
    #[serde(default)]
    rates: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    time_last_update_unix: Option<i64>,
}

/// Parse an upstream body of the form
/// `{"result": "success", "base_code": "USD", "rates": {"EUR": 0.92, ...}}`.
///
/// Only `rates` is required. Every rate must be a positive finite number.
pub fn parse_rates_payload(body: &str) -> EmiResult<ExchangeRateTable> {
    let payload: RatesPayload =
        serde_json::from_str(body).map_err(|e| EmiError::MalformedRates(e.to_string()))?;

    if payload.result.as_deref() == Some("error") {
        let kind = payload.error_type.as_deref().unwrap_or("unknown");
        return Err(EmiError::MalformedRates(format!("upstream reported error: {kind}")));
    }

    if let Some(base) = payload.base_code.as_deref() {
        if base != "USD" {
            return Err(EmiError::MalformedRates(format!(
                "expected base USD, got {base}"
            )));
        }
    }

    let raw = payload
        .rates
        .ok_or_else(|| EmiError::MalformedRates("missing 'rates' object".into()))?;
    if raw.is_empty() {
        return Err(EmiError::MalformedRates("'rates' object is empty".into()));
    }

    let mut rates = BTreeMap::new();
    for (code, value) in raw {
        let rate = value
            .as_f64()
            .filter(|r| r.is_finite() && *r > 0.0)
            .ok_or_else(|| EmiError::MalformedRates(format!("invalid rate for {code}: {value}")))?;
        rates.insert(code, rate);
    }

    let updated_at = payload
        .time_last_update_unix
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    Ok(ExchangeRateTable::live(rates, updated_at))
}

// ---------------------------------------------------------------------------
// Feed state machine
// ---------------------------------------------------------------------------

/// Observable state of the latest fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FeedStatus {
    /// A fetch is outstanding (or none has started yet).
    Pending,
    /// Live rates are installed.
    Ready,
    /// The fetch failed and the fallback table is installed.
    Failed { notice: String },
}

/// Identifies one refresh. Only the most recently issued ticket can complete.
#[derive(Debug, PartialEq, Eq)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone)]
pub struct RateFeed {
    status: FeedStatus,
    table: Option<ExchangeRateTable>,
    latest: u64,
}

impl Default for RateFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl RateFeed {
    pub fn new() -> Self {
        Self {
            status: FeedStatus::Pending,
            table: None,
            latest: 0,
        }
    }

    /// Enter `Pending`. The current table, if any, stays readable until the
    /// refresh completes.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.latest += 1;
        self.status = FeedStatus::Pending;
        RefreshTicket(self.latest)
    }

    /// Apply a fetch outcome. Returns false when a newer refresh has started
    /// since `ticket` was issued; the outcome is then dropped.
    pub fn complete(&mut self, ticket: RefreshTicket, outcome: EmiResult<ExchangeRateTable>) -> bool {
        if ticket.0 != self.latest {
            tracing::warn!(
                ticket = ticket.0,
                latest = self.latest,
                "dropping stale exchange-rate response"
            );
            return false;
        }

        match outcome {
            Ok(table) => {
                self.table = Some(table);
                self.status = FeedStatus::Ready;
            }
            Err(e) => {
                tracing::warn!(error = %e, "exchange-rate fetch failed; using fallback rates");
                self.table = Some(ExchangeRateTable::fallback());
                self.status = FeedStatus::Failed {
                    notice: FETCH_FAILED_NOTICE.to_string(),
                };
            }
        }
        true
    }

    /// Run one complete fetch against `source`. Never fails: errors land in
    /// [`FeedStatus::Failed`] with the fallback table installed.
    pub async fn refresh(&mut self, source: &dyn RateSource) -> &FeedStatus {
        let ticket = self.begin_refresh();
        let outcome = source.fetch_rates().await;
        self.complete(ticket, outcome);
        &self.status
    }

    pub fn status(&self) -> &FeedStatus {
        &self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == FeedStatus::Pending
    }

    /// User-visible error notice, if the last fetch failed.
    pub fn notice(&self) -> Option<&str> {
        match &self.status {
            FeedStatus::Failed { notice } => Some(notice),
            _ => None,
        }
    }

    pub fn table(&self) -> Option<&ExchangeRateTable> {
        self.table.as_ref()
    }

    /// Multiplier for `currency` under the current table.
    pub fn rate(&self, currency: Currency) -> f64 {
        effective_rate(currency, self.table())
    }
}
