use chrono::{DateTime, Utc};
use derive_more::Display;
use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use keylevels_data::{
    instrument::{InstrumentName, InstrumentParseError, OptionKind, Strike},
    model::{BookSummary, PublicTrade, Stats24h},
    source::MarketSnapshot,
};
use serde::{Deserialize, Serialize, ser::SerializeMap};
use smol_str::SmolStr;
use std::ops::{Index, IndexMut};

/// Named price levels in insertion order. Re-inserting a name overrides its price in place.
pub type LevelMap = IndexMap<SmolStr, f64>;

/// Per-strike aggregation in first-seen strike order.
pub type StrikeMap<T> = IndexMap<Strike, T, FnvBuildHasher>;

/// Expiry bucket an instrument or trade is assigned to.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
pub enum Timeframe {
    #[display("Current")]
    Current,
    #[display("0DTE")]
    ZeroDte,
    #[display("1W")]
    OneWeek,
    #[display("1M")]
    OneMonth,
}

impl Timeframe {
    /// Every timeframe, in reporting order.
    pub const ALL: [Timeframe; 4] = [
        Timeframe::Current,
        Timeframe::ZeroDte,
        Timeframe::OneWeek,
        Timeframe::OneMonth,
    ];

    pub fn index(self) -> usize {
        match self {
            Timeframe::Current => 0,
            Timeframe::ZeroDte => 1,
            Timeframe::OneWeek => 2,
            Timeframe::OneMonth => 3,
        }
    }

    /// Suffix appended to per-timeframe level names. The current expiry carries none.
    pub fn label_suffix(self) -> &'static str {
        match self {
            Timeframe::Current => "",
            Timeframe::ZeroDte => " 0DTE",
            Timeframe::OneWeek => " 1W",
            Timeframe::OneMonth => " 1M",
        }
    }
}

/// Fixed-size map holding one `T` per [`Timeframe`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeframeMap<T>([T; 4]);

impl<T> TimeframeMap<T> {
    pub fn from_fn<F>(mut f: F) -> Self
    where
        F: FnMut(Timeframe) -> T,
    {
        Self(std::array::from_fn(|index| f(Timeframe::ALL[index])))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Timeframe, &T)> {
        Timeframe::ALL.into_iter().zip(self.0.iter())
    }

    pub fn map<U, F>(&self, mut f: F) -> TimeframeMap<U>
    where
        F: FnMut(Timeframe, &T) -> U,
    {
        TimeframeMap::from_fn(|timeframe| f(timeframe, &self[timeframe]))
    }
}

impl<T> Index<Timeframe> for TimeframeMap<T> {
    type Output = T;

    fn index(&self, timeframe: Timeframe) -> &Self::Output {
        &self.0[timeframe.index()]
    }
}

impl<T> IndexMut<Timeframe> for TimeframeMap<T> {
    fn index_mut(&mut self, timeframe: Timeframe) -> &mut Self::Output {
        &mut self.0[timeframe.index()]
    }
}

impl<T> Serialize for TimeframeMap<T>
where
    T: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(Timeframe::ALL.len()))?;
        for (timeframe, value) in self.iter() {
            map.serialize_entry(&timeframe.to_string(), value)?;
        }
        map.end()
    }
}

/// Option instrument with open interest, parsed from a book summary row.
#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    pub name: InstrumentName,
    pub open_interest: f64,
    /// Mark implied volatility in percent.
    pub mark_iv: Option<f64>,
    pub volume: f64,
}

impl Instrument {
    pub fn strike(&self) -> f64 {
        self.name.strike.to_f64()
    }

    pub fn kind(&self) -> OptionKind {
        self.name.kind
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.name.expiry()
    }
}

impl TryFrom<&BookSummary> for Instrument {
    type Error = InstrumentParseError;

    fn try_from(summary: &BookSummary) -> Result<Self, Self::Error> {
        Ok(Self {
            name: summary.option_name()?,
            open_interest: summary.open_interest,
            mark_iv: summary.mark_iv,
            volume: summary.volume,
        })
    }
}

/// Ranked output level.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct KeyLevel {
    pub name: SmolStr,
    pub price: f64,
    /// Signed percentage distance from spot, `(price - spot) / spot * 100`.
    pub distance_pct: f64,
    /// Confidence score in `[0, 1]`.
    pub confidence: f64,
}

impl KeyLevel {
    pub fn to_record(&self) -> KeyLevelRecord {
        KeyLevelRecord {
            name: self.name.clone(),
            value: self.price,
            distance_to_spot: format!("{:.2}%", self.distance_pct),
            confidence: self.confidence,
        }
    }
}

/// Export shape of a [`KeyLevel`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct KeyLevelRecord {
    pub name: SmolStr,
    pub value: f64,
    pub distance_to_spot: String,
    pub confidence: f64,
}

/// Summary statistics describing one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub currency: SmolStr,
    pub spot_price: f64,
    pub put_call_ratios: TimeframeMap<f64>,
    pub iv: TimeframeMap<f64>,
    pub band_pct: TimeframeMap<f64>,
    pub instruments_per_timeframe: TimeframeMap<usize>,
    pub options_trades_per_timeframe: TimeframeMap<usize>,
    /// Option summary rows with a parseable instrument name.
    pub instruments_analyzed: usize,
    pub instruments_unparseable: usize,
    pub futures_trades: usize,
    pub options_trades: usize,
    pub options_notional: f64,
}

/// Batch inputs of one analysis run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineInputs<'a> {
    pub currency: &'a str,
    pub spot_price: f64,
    pub stats_24h: Stats24h,
    pub option_summaries: &'a [BookSummary],
    pub futures_trades: &'a [PublicTrade],
    pub options_trades: &'a [PublicTrade],
}

impl<'a> From<&'a MarketSnapshot> for EngineInputs<'a> {
    fn from(snapshot: &'a MarketSnapshot) -> Self {
        Self {
            currency: snapshot.currency.as_str(),
            spot_price: snapshot.spot_price,
            stats_24h: snapshot.stats_24h,
            option_summaries: &snapshot.option_summaries,
            futures_trades: &snapshot.futures_trades,
            options_trades: &snapshot.options_trades,
        }
    }
}

/// Select the first item holding the maximum key. Later items only win on a strictly greater key.
pub fn first_max_by_key<T, K, F>(items: impl IntoIterator<Item = T>, mut key: F) -> Option<T>
where
    K: PartialOrd,
    F: FnMut(&T) -> K,
{
    let mut best: Option<(T, K)> = None;

    for item in items {
        let candidate = key(&item);
        let replace = match &best {
            None => true,
            Some((_, best_key)) => candidate > *best_key,
        };
        if replace {
            best = Some((item, candidate));
        }
    }

    best.map(|(item, _)| item)
}
