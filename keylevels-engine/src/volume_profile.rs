use crate::types::first_max_by_key;
use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use keylevels_data::model::PublicTrade;

/// Round a traded price to its profile bucket: nearest 10 above 1000, otherwise nearest 0.1.
/// Halves round to even.
pub fn price_bucket(price: f64) -> f64 {
    if price > 1000.0 {
        (price / 10.0).round_ties_even() * 10.0
    } else {
        (price * 10.0).round_ties_even() / 10.0
    }
}

/// Traded amount per price bucket, in first-seen bucket order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VolumeProfile {
    /// Keyed by bucket price in tenths so buckets hash exactly.
    buckets: IndexMap<i64, f64, FnvBuildHasher>,
}

impl VolumeProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a futures trade. Trades without positive price & amount are ignored.
    pub fn ingest(&mut self, trade: &PublicTrade) -> bool {
        match (trade.price, trade.amount) {
            (Some(price), Some(amount)) if price > 0.0 && amount > 0.0 => {
                let key = (price_bucket(price) * 10.0).round() as i64;
                *self.buckets.entry(key).or_insert(0.0) += amount;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// High volume level: the bucket price with the most traded amount, first seen on ties.
    pub fn high_volume_level(&self) -> Option<(f64, f64)> {
        first_max_by_key(&self.buckets, |(_, amount)| **amount)
            .map(|(key, amount)| (*key as f64 / 10.0, *amount))
    }
}

impl<'a> FromIterator<&'a PublicTrade> for VolumeProfile {
    fn from_iter<Iter>(trades: Iter) -> Self
    where
        Iter: IntoIterator<Item = &'a PublicTrade>,
    {
        let mut profile = Self::new();
        trades.into_iter().for_each(|trade| {
            profile.ingest(trade);
        });
        profile
    }
}
