use crate::instrument::{InstrumentName, InstrumentParseError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deribit HTTP response envelope, `{"jsonrpc": "2.0", "result": ..}`.
///
/// See docs: <https://docs.deribit.com/#json-rpc>
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct DeribitResponse<T> {
    pub result: T,
}

/// Deribit instrument kind query parameter.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Future,
    Option,
}

impl InstrumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstrumentKind::Future => "future",
            InstrumentKind::Option => "option",
        }
    }
}

impl fmt::Display for InstrumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Deribit `public/get_index_price` result.
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct IndexPrice {
    pub index_price: f64,
}

/// Deribit `public/get_book_summary_by_currency` row.
///
/// See docs: <https://docs.deribit.com/#public-get_book_summary_by_currency>
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct BookSummary {
    pub instrument_name: String,
    #[serde(default, deserialize_with = "de_null_as_default")]
    pub open_interest: f64,
    #[serde(default, deserialize_with = "de_null_as_default")]
    pub volume: f64,
    #[serde(default)]
    pub mark_iv: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub last: Option<f64>,
}

impl BookSummary {
    /// Parse the [`InstrumentName`] of an option summary row.
    pub fn option_name(&self) -> Result<InstrumentName, InstrumentParseError> {
        self.instrument_name.parse()
    }

    pub fn is_perpetual(&self) -> bool {
        self.instrument_name.ends_with("-PERPETUAL")
    }
}

/// Aggressor direction of a Deribit public trade.
///
/// Anything other than `"buy"` is treated as a sell.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    #[default]
    #[serde(other)]
    Sell,
}

impl Direction {
    pub fn is_buy(&self) -> bool {
        matches!(self, Direction::Buy)
    }

    /// +1 for buys, -1 for sells.
    pub fn sign(&self) -> f64 {
        if self.is_buy() { 1.0 } else { -1.0 }
    }
}

/// Deribit public trade.
///
/// See docs: <https://docs.deribit.com/#public-get_last_trades_by_currency_and_time>
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct PublicTrade {
    #[serde(default, deserialize_with = "de_opt_trade_id")]
    pub trade_id: Option<String>,
    #[serde(default)]
    pub instrument_name: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub direction: Direction,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub index_price: Option<f64>,
    #[serde(default)]
    pub iv: Option<f64>,
}

/// Deribit `public/get_last_trades_by_currency_and_time` result page.
#[derive(Clone, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct TradesPage {
    #[serde(default)]
    pub trades: Vec<PublicTrade>,
    #[serde(default)]
    pub has_more: bool,
}

/// Rolling 24h statistics of the perpetual future.
#[derive(Clone, Copy, PartialEq, Debug, Default, Deserialize, Serialize)]
pub struct Stats24h {
    pub high_24h: f64,
    pub low_24h: f64,
    pub last_price: f64,
}

impl Stats24h {
    /// Extract the `-PERPETUAL` row from a futures book summary, zeros if absent.
    pub fn from_futures_summaries(summaries: &[BookSummary]) -> Self {
        summaries
            .iter()
            .find(|summary| summary.is_perpetual())
            .map(|perpetual| Self {
                high_24h: perpetual.high.unwrap_or_default(),
                low_24h: perpetual.low.unwrap_or_default(),
                last_price: perpetual.last.unwrap_or_default(),
            })
            .unwrap_or_default()
    }
}

/// Deserialize a nullable value, substituting `T::default()` for `null`.
fn de_null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::de::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Deserialize a trade id that may be a string or an integer, empty ids become `None`.
fn de_opt_trade_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTradeId {
        Text(String),
        Number(u64),
    }

    let value: Option<RawTradeId> = Option::deserialize(deserializer)?;
    Ok(match value {
        Some(RawTradeId::Text(raw)) if raw.trim().is_empty() => None,
        Some(RawTradeId::Text(raw)) => Some(raw),
        Some(RawTradeId::Number(raw)) => Some(raw.to_string()),
        None => None,
    })
}
