use crate::{
    label,
    types::{Timeframe, TimeframeMap},
};
use fnv::FnvHashMap;
use smol_str::SmolStr;

/// Tunable constants of the key level engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Relative strike distance from spot within which an option counts as at-the-money.
    pub atm_window: f64,
    /// ATM implied volatility (percent) used when a timeframe has no usable quotes.
    pub fallback_iv: f64,
    pub band_floor_pct: f64,
    pub band_ceiling_pct: f64,
    pub band_iv_multiplier: f64,
    /// Days to expiry assumed for each timeframe when sizing its strike band.
    pub representative_days: TimeframeMap<f64>,
    /// Maximum strikes per side kept after band filtering.
    pub max_strikes: usize,
    /// Time constant (hours) of the exponential decay applied to trade flow.
    pub flow_decay_hours: f64,
    /// Moneyness multiplier & floor of the gamma wall weighting.
    pub gamma_decay: f64,
    pub gamma_floor: f64,
    pub base_confidence: FnvHashMap<SmolStr, f64>,
    pub default_confidence: f64,
}

impl EngineConfig {
    pub fn base_confidence(&self, name: &str) -> f64 {
        self.base_confidence
            .get(name)
            .copied()
            .unwrap_or(self.default_confidence)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        let base_confidence = [
            (label::ONE_DAY_MAX, 0.8),
            (label::ONE_DAY_MIN, 0.7),
            (label::HVL, 0.6),
            ("Call Resistance", 0.5),
            ("Put Support", 0.4),
            ("Call Resistance 0DTE", 0.7),
            ("Put Support 0DTE", 0.8),
            ("Call Resistance 1W", 0.5),
            ("Put Support 1W", 0.4),
            ("Call Resistance 1M", 0.4),
            ("Put Support 1M", 0.1),
            (label::GAMMA_WALL_SHORT, 0.6),
            (label::GAMMA_WALL_LONG, 0.6),
            (label::HVS, 0.5),
            (label::MAX_PAIN_FLOW, 0.4),
            (label::CALL_FLOW_RESISTANCE, 0.4),
            (label::PUT_FLOW_SUPPORT, 0.4),
            (label::VWAS, 0.3),
        ]
        .into_iter()
        .map(|(name, confidence)| (SmolStr::new(name), confidence))
        .collect();

        Self {
            atm_window: 0.05,
            fallback_iv: 50.0,
            band_floor_pct: 10.0,
            band_ceiling_pct: 50.0,
            band_iv_multiplier: 0.3,
            representative_days: TimeframeMap::from_fn(|timeframe| match timeframe {
                Timeframe::Current => 7.0,
                Timeframe::ZeroDte => 0.1,
                Timeframe::OneWeek => 7.0,
                Timeframe::OneMonth => 30.0,
            }),
            max_strikes: 10,
            flow_decay_hours: 12.0,
            gamma_decay: 5.0,
            gamma_floor: 0.1,
            base_confidence,
            default_confidence: 0.3,
        }
    }
}
