use crate::{
    dedup::TradeDeduplicator,
    error::DataError,
    model::{BookSummary, DeribitResponse, IndexPrice, InstrumentKind, PublicTrade, Stats24h, TradesPage},
};
use chrono::{DateTime, TimeDelta, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default Deribit public REST API base url.
pub const DERIBIT_BASE_URL: &str = "https://www.deribit.com/api/v2";

/// Retrieval settings for [`DeribitClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub base_url: String,
    /// Delay applied before every request attempt.
    pub request_spacing: Duration,
    /// Pause between consecutive trade chunks.
    pub chunk_pause: Duration,
    pub max_retries: u32,
    pub timeout: Duration,
    pub hours_back: u32,
    pub chunk_hours: u32,
    /// Trades requested per chunk.
    pub page_size: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DERIBIT_BASE_URL.to_string(),
            request_spacing: Duration::from_millis(200),
            chunk_pause: Duration::from_millis(300),
            max_retries: 3,
            timeout: Duration::from_secs(30),
            hours_back: 24,
            chunk_hours: 4,
            page_size: 1000,
        }
    }
}

/// Inclusive epoch millisecond window of one trade chunk.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct TimeWindow {
    pub start_ms: i64,
    pub end_ms: i64,
}

/// Split `hours_back` hours before `end` into `chunk_hours` windows, newest first.
///
/// The oldest window is truncated so the windows cover exactly `hours_back`.
pub fn chunk_windows(end: DateTime<Utc>, hours_back: u32, chunk_hours: u32) -> Vec<TimeWindow> {
    let chunk_hours = chunk_hours.max(1);
    let total_chunks = hours_back.div_ceil(chunk_hours);

    (0..total_chunks)
        .map(|chunk| {
            let newest_offset = chunk * chunk_hours;
            let oldest_offset = ((chunk + 1) * chunk_hours).min(hours_back);
            TimeWindow {
                start_ms: (end - TimeDelta::hours(i64::from(oldest_offset))).timestamp_millis(),
                end_ms: (end - TimeDelta::hours(i64::from(newest_offset))).timestamp_millis(),
            }
        })
        .collect()
}

/// Rate limited, retrying Deribit public REST client.
#[derive(Debug, Clone)]
pub struct DeribitClient {
    http: Client,
    config: FetchConfig,
}

impl DeribitClient {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Current index price, eg/ `btc_usd`.
    pub async fn fetch_index_price(&self, currency: &str) -> Result<f64, DataError> {
        let index_name = format!("{}_usd", currency.to_lowercase());
        let url = self.endpoint("public/get_index_price", &[("index_name", index_name)])?;

        self.fetch_with_retry::<IndexPrice>(url)
            .await
            .map(|index| index.index_price)
    }

    /// Book summary rows for every instrument of `kind`.
    pub async fn fetch_book_summary(
        &self,
        currency: &str,
        kind: InstrumentKind,
    ) -> Result<Vec<BookSummary>, DataError> {
        let url = self.endpoint(
            "public/get_book_summary_by_currency",
            &[
                ("currency", currency.to_string()),
                ("kind", kind.to_string()),
            ],
        )?;

        self.fetch_with_retry(url).await
    }

    /// 24h high, low & last of the perpetual future.
    pub async fn fetch_24h_stats(&self, currency: &str) -> Result<Stats24h, DataError> {
        self.fetch_book_summary(currency, InstrumentKind::Future)
            .await
            .map(|summaries| Stats24h::from_futures_summaries(&summaries))
    }

    /// Complete trade tape of `kind` over the configured lookback, fetched in time chunks.
    ///
    /// A failed chunk is logged and skipped. Only a tape where every chunk failed is an error.
    pub async fn fetch_trades(
        &self,
        currency: &str,
        kind: InstrumentKind,
    ) -> Result<Vec<PublicTrade>, DataError> {
        let windows = chunk_windows(Utc::now(), self.config.hours_back, self.config.chunk_hours);
        let mut tape = TradeTape::new(currency, kind, windows.len());

        info!(
            %currency,
            %kind,
            hours_back = self.config.hours_back,
            chunk_hours = self.config.chunk_hours,
            total_chunks = tape.total_chunks,
            "fetching trade tape"
        );

        for (index, window) in windows.into_iter().enumerate() {
            let url = self.endpoint(
                "public/get_last_trades_by_currency_and_time",
                &[
                    ("currency", currency.to_string()),
                    ("kind", kind.to_string()),
                    ("start_timestamp", window.start_ms.to_string()),
                    ("end_timestamp", window.end_ms.to_string()),
                    ("count", self.config.page_size.to_string()),
                    ("sorting", "desc".to_string()),
                ],
            )?;

            tape.record(index, self.fetch_with_retry::<TradesPage>(url).await);

            if index + 1 < tape.total_chunks {
                tokio::time::sleep(self.config.chunk_pause).await;
            }
        }

        tape.finish()
    }

    fn endpoint(&self, method: &str, params: &[(&str, String)]) -> Result<Url, DataError> {
        let base = self.config.base_url.trim_end_matches('/');
        Url::parse_with_params(&format!("{base}/{method}"), params).map_err(DataError::from)
    }

    /// GET `url` with request spacing, exponential backoff on HTTP 429 and a fixed 1s pause on
    /// other transient failures. Non-transient failures & the final attempt's error propagate.
    async fn fetch_with_retry<T>(&self, url: Url) -> Result<T, DataError>
    where
        T: DeserializeOwned,
    {
        let max_retries = self.config.max_retries.max(1);

        for attempt in 0..max_retries {
            tokio::time::sleep(self.config.request_spacing).await;

            match self.get_once(&url).await {
                Ok(result) => return Ok(result),
                Err(DataError::RateLimited(_)) => {
                    let backoff = Duration::from_secs(2_u64.pow(attempt));
                    warn!(%url, attempt = attempt + 1, ?backoff, "rate limited, backing off");
                    tokio::time::sleep(backoff).await;
                }
                Err(error) if error.is_transient() && attempt + 1 < max_retries => {
                    warn!(%url, attempt = attempt + 1, %error, "request attempt failed, retrying");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                Err(error) => return Err(error),
            }
        }

        Err(DataError::RetriesExhausted {
            attempts: max_retries,
            url: url.to_string(),
        })
    }

    async fn get_once<T>(&self, url: &Url) -> Result<T, DataError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .http
            .get(url.clone())
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(DataError::RateLimited(url.to_string()));
        }
        if !status.is_success() {
            return Err(DataError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<DeribitResponse<T>>()
            .await
            .map(|envelope| envelope.result)
            .map_err(DataError::from)
    }
}

/// Trade tape assembled from time chunk pages, tolerating individual chunk failures.
#[derive(Debug)]
struct TradeTape<'a> {
    currency: &'a str,
    kind: InstrumentKind,
    total_chunks: usize,
    dedup: TradeDeduplicator,
    failed_chunks: usize,
    last_error: Option<DataError>,
}

impl<'a> TradeTape<'a> {
    fn new(currency: &'a str, kind: InstrumentKind, total_chunks: usize) -> Self {
        Self {
            currency,
            kind,
            total_chunks,
            dedup: TradeDeduplicator::new(),
            failed_chunks: 0,
            last_error: None,
        }
    }

    fn record(&mut self, index: usize, page: Result<TradesPage, DataError>) {
        let (currency, kind) = (self.currency, self.kind);

        let page = match page {
            Ok(page) => page,
            Err(error) => {
                warn!(%currency, %kind, chunk = index + 1, %error, "trade chunk failed, skipping");
                self.failed_chunks += 1;
                self.last_error = Some(error);
                return;
            }
        };

        if page.has_more {
            warn!(
                %currency,
                %kind,
                chunk = index + 1,
                "trade chunk has more data than one page, consider smaller chunks"
            );
        }

        let fetched = page.trades.len();
        let unique = self.dedup.extend_page(page.trades);
        debug!(
            %currency,
            %kind,
            chunk = index + 1,
            total_chunks = self.total_chunks,
            fetched,
            unique,
            "fetched trade chunk"
        );
    }

    fn finish(self) -> Result<Vec<PublicTrade>, DataError> {
        let (currency, kind) = (self.currency, self.kind);

        if self.failed_chunks == self.total_chunks {
            if let Some(error) = self.last_error {
                return Err(error);
            }
        }

        let coverage_hours = self
            .dedup
            .time_range_ms()
            .map(|(oldest, newest)| (newest - oldest) as f64 / 3_600_000.0)
            .unwrap_or_default();

        info!(
            %currency,
            %kind,
            unique_trades = self.dedup.len(),
            duplicates = self.dedup.duplicates(),
            skipped_missing_id = self.dedup.skipped_missing_id(),
            failed_chunks = self.failed_chunks,
            coverage_hours,
            "trade tape complete"
        );

        Ok(self.dedup.into_trades())
    }
}
