use crate::model::PublicTrade;
use indexmap::IndexMap;

/// Merges overlapping trade pages into a unique set keyed by trade id.
///
/// The first sighting of a trade id wins; later duplicates are dropped. Trades without an id are
/// skipped since they cannot be deduplicated. First-sighting insertion order is preserved.
#[derive(Debug, Clone, Default)]
pub struct TradeDeduplicator {
    trades: IndexMap<String, PublicTrade>,
    skipped_missing_id: usize,
    duplicates: usize,
}

impl TradeDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a page of trades, returning the number of previously unseen trades.
    pub fn extend_page<Iter>(&mut self, page: Iter) -> usize
    where
        Iter: IntoIterator<Item = PublicTrade>,
    {
        let before = self.trades.len();

        for trade in page {
            let Some(trade_id) = trade.trade_id.clone() else {
                self.skipped_missing_id += 1;
                continue;
            };

            match self.trades.entry(trade_id) {
                indexmap::map::Entry::Occupied(_) => self.duplicates += 1,
                indexmap::map::Entry::Vacant(entry) => {
                    entry.insert(trade);
                }
            }
        }

        self.trades.len() - before
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }

    /// Number of trades dropped because they carried no usable trade id.
    pub fn skipped_missing_id(&self) -> usize {
        self.skipped_missing_id
    }

    /// Number of repeat sightings dropped.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Oldest and newest timestamps (epoch ms) across the unique trade set.
    pub fn time_range_ms(&self) -> Option<(i64, i64)> {
        let mut timestamps = self.trades.values().map(|trade| trade.timestamp);
        let first = timestamps.next()?;
        Some(timestamps.fold((first, first), |(min, max), ts| (min.min(ts), max.max(ts))))
    }

    pub fn into_trades(self) -> Vec<PublicTrade> {
        self.trades.into_values().collect()
    }
}
