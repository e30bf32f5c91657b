use crate::{
    config::EngineConfig,
    types::{KeyLevel, LevelMap},
};
use smol_str::SmolStr;

/// Signed percentage distance of `price` from `spot`.
pub fn distance_pct(price: f64, spot: f64) -> f64 {
    (price - spot) / spot * 100.0
}

/// Scale a base confidence down linearly with distance from spot, never below 10% of base.
pub fn confidence(base: f64, distance_pct: f64) -> f64 {
    let distance_factor = (1.0 - distance_pct.abs() / 100.0).max(0.1);
    (base * distance_factor).min(1.0)
}

/// Merges named level maps and ranks them by proximity to spot.
#[derive(Debug, Clone)]
pub struct LevelComposer<'a> {
    spot: f64,
    config: &'a EngineConfig,
    levels: LevelMap,
}

impl<'a> LevelComposer<'a> {
    pub fn new(spot: f64, config: &'a EngineConfig) -> Self {
        Self {
            spot,
            config,
            levels: LevelMap::new(),
        }
    }

    /// Merge levels. A name already present keeps its position and takes the new price.
    pub fn merge<Iter>(&mut self, levels: Iter) -> &mut Self
    where
        Iter: IntoIterator<Item = (SmolStr, f64)>,
    {
        self.levels.extend(levels);
        self
    }

    pub fn levels(&self) -> &LevelMap {
        &self.levels
    }

    /// Positive priced levels scored & sorted by ascending absolute distance from spot.
    /// Equal distances keep merge order.
    pub fn compose(&self) -> Vec<KeyLevel> {
        let mut key_levels = self
            .levels
            .iter()
            .filter(|(_, price)| **price > 0.0 && price.is_finite())
            .map(|(name, price)| {
                let distance_pct = distance_pct(*price, self.spot);
                KeyLevel {
                    name: name.clone(),
                    price: *price,
                    distance_pct,
                    confidence: confidence(self.config.base_confidence(name), distance_pct),
                }
            })
            .collect::<Vec<_>>();

        key_levels.sort_by(|a, b| a.distance_pct.abs().total_cmp(&b.distance_pct.abs()));
        key_levels
    }
}
