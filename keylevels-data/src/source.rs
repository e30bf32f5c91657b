use crate::{
    deribit::DeribitClient,
    error::DataError,
    model::{BookSummary, InstrumentKind, PublicTrade, Stats24h},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use smol_str::SmolStr;
use tracing::{error, info, warn};

/// Provider of the raw market data inputs required for one key level analysis.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn index_price(&self, currency: &str) -> Result<f64, DataError>;

    async fn stats_24h(&self, currency: &str) -> Result<Stats24h, DataError>;

    async fn option_summaries(&self, currency: &str) -> Result<Vec<BookSummary>, DataError>;

    async fn trades(
        &self,
        currency: &str,
        kind: InstrumentKind,
    ) -> Result<Vec<PublicTrade>, DataError>;
}

#[async_trait]
impl MarketDataSource for DeribitClient {
    async fn index_price(&self, currency: &str) -> Result<f64, DataError> {
        self.fetch_index_price(currency).await
    }

    async fn stats_24h(&self, currency: &str) -> Result<Stats24h, DataError> {
        self.fetch_24h_stats(currency).await
    }

    async fn option_summaries(&self, currency: &str) -> Result<Vec<BookSummary>, DataError> {
        self.fetch_book_summary(currency, InstrumentKind::Option).await
    }

    async fn trades(
        &self,
        currency: &str,
        kind: InstrumentKind,
    ) -> Result<Vec<PublicTrade>, DataError> {
        self.fetch_trades(currency, kind).await
    }
}

/// Batch of raw market data for one currency, captured at `fetched_at`.
#[derive(Clone, PartialEq, Debug)]
pub struct MarketSnapshot {
    pub currency: SmolStr,
    pub spot_price: f64,
    pub stats_24h: Stats24h,
    pub option_summaries: Vec<BookSummary>,
    pub futures_trades: Vec<PublicTrade>,
    pub options_trades: Vec<PublicTrade>,
    pub fetched_at: DateTime<Utc>,
}

/// Concurrently fetch every input of a [`MarketSnapshot`].
///
/// All fetches run to completion. A missing or non-positive spot price aborts the snapshot,
/// any other failed fetch is logged and substituted with its empty default.
pub async fn fetch_snapshot<Source>(
    source: &Source,
    currency: &str,
) -> Result<MarketSnapshot, DataError>
where
    Source: MarketDataSource + ?Sized,
{
    let (spot, stats_24h, option_summaries, futures_trades, options_trades) = tokio::join!(
        source.index_price(currency),
        source.stats_24h(currency),
        source.option_summaries(currency),
        source.trades(currency, InstrumentKind::Future),
        source.trades(currency, InstrumentKind::Option),
    );

    let spot_price = match spot {
        Ok(price) if price.is_finite() && price > 0.0 => price,
        Ok(price) => {
            error!(%currency, price, "invalid spot price");
            return Err(DataError::MissingSpot(currency.to_string()));
        }
        Err(error) => {
            error!(%currency, %error, "failed to fetch spot price");
            return Err(DataError::MissingSpot(currency.to_string()));
        }
    };

    let snapshot = MarketSnapshot {
        currency: SmolStr::new(currency),
        spot_price,
        stats_24h: or_default(stats_24h, currency, "24h stats"),
        option_summaries: or_default(option_summaries, currency, "option summaries"),
        futures_trades: or_default(futures_trades, currency, "futures trades"),
        options_trades: or_default(options_trades, currency, "options trades"),
        fetched_at: Utc::now(),
    };

    info!(
        %currency,
        spot_price,
        instruments = snapshot.option_summaries.len(),
        futures_trades = snapshot.futures_trades.len(),
        options_trades = snapshot.options_trades.len(),
        "market snapshot fetched"
    );

    Ok(snapshot)
}

fn or_default<T>(result: Result<T, DataError>, currency: &str, input: &str) -> T
where
    T: Default,
{
    result.unwrap_or_else(|error| {
        warn!(%currency, input, %error, "fetch failed, continuing with empty input");
        T::default()
    })
}
