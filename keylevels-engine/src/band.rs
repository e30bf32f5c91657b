use crate::config::EngineConfig;
use itertools::Itertools;
use keylevels_data::instrument::Strike;

/// Band widening applied for longer dated expiries.
pub fn time_factor(days_to_expiry: f64) -> f64 {
    if days_to_expiry <= 1.0 {
        1.0
    } else if days_to_expiry <= 7.0 {
        1.2
    } else {
        (1.0 + (days_to_expiry - 7.0) / 20.0).min(2.0)
    }
}

/// Dynamic strike band (percent of spot) for an ATM IV and representative days to expiry.
pub fn band_pct(iv_pct: f64, days_to_expiry: f64, config: &EngineConfig) -> f64 {
    let base = (iv_pct * config.band_iv_multiplier)
        .min(config.band_ceiling_pct)
        .max(config.band_floor_pct);

    (base * time_factor(days_to_expiry)).max(config.band_floor_pct)
}

/// Selects the strikes nearest spot on each side within a percentage band.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BandFilter {
    pub spot: f64,
    pub band_pct: f64,
    pub max_strikes: usize,
}

impl BandFilter {
    pub fn new(spot: f64, band_pct: f64, max_strikes: usize) -> Self {
        Self {
            spot,
            band_pct,
            max_strikes,
        }
    }

    pub fn upper_bound(&self) -> f64 {
        self.spot * (1.0 + self.band_pct / 100.0)
    }

    pub fn lower_bound(&self) -> f64 {
        self.spot * (1.0 - self.band_pct / 100.0)
    }

    /// Strikes in `(spot, upper_bound]`, ascending, capped at `max_strikes`.
    pub fn calls<T, Iter>(&self, strikes: Iter) -> Vec<(Strike, T)>
    where
        Iter: IntoIterator<Item = (Strike, T)>,
    {
        let upper = self.upper_bound();
        strikes
            .into_iter()
            .filter(|(strike, _)| {
                let strike = strike.to_f64();
                strike > self.spot && strike <= upper
            })
            .sorted_by(|(a, _), (b, _)| a.cmp(b))
            .take(self.max_strikes)
            .collect()
    }

    /// Strikes in `[lower_bound, spot)`, descending, capped at `max_strikes`.
    pub fn puts<T, Iter>(&self, strikes: Iter) -> Vec<(Strike, T)>
    where
        Iter: IntoIterator<Item = (Strike, T)>,
    {
        let lower = self.lower_bound();
        strikes
            .into_iter()
            .filter(|(strike, _)| {
                let strike = strike.to_f64();
                strike < self.spot && strike >= lower
            })
            .sorted_by(|(a, _), (b, _)| b.cmp(a))
            .take(self.max_strikes)
            .collect()
    }
}
