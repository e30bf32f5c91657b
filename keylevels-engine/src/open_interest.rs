use crate::{
    band::BandFilter,
    config::EngineConfig,
    label,
    types::{Instrument, LevelMap, StrikeMap, Timeframe, first_max_by_key},
};
use keylevels_data::instrument::{OptionKind, Strike};
use smol_str::SmolStr;

/// Open interest summed per strike, calls & puts held separately.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrikeOpenInterest {
    pub calls: StrikeMap<f64>,
    pub puts: StrikeMap<f64>,
}

impl StrikeOpenInterest {
    /// Add an instrument's open interest. Instruments without positive open interest are ignored.
    pub fn insert(&mut self, instrument: &Instrument) {
        if !(instrument.open_interest > 0.0) {
            return;
        }

        let side = match instrument.kind() {
            OptionKind::Call => &mut self.calls,
            OptionKind::Put => &mut self.puts,
        };

        *side.entry(instrument.name.strike).or_insert(0.0) += instrument.open_interest;
    }

    /// Band filter the per-strike totals and derive the timeframe's levels.
    pub fn analyse(&self, timeframe: Timeframe, filter: &BandFilter) -> OpenInterestLevels {
        let calls = filter.calls(self.calls.iter().map(|(strike, oi)| (*strike, *oi)));
        let puts = filter.puts(self.puts.iter().map(|(strike, oi)| (*strike, *oi)));

        let call_oi = calls.iter().map(|(_, oi)| oi).sum::<f64>();
        let put_oi = puts.iter().map(|(_, oi)| oi).sum::<f64>();

        OpenInterestLevels {
            timeframe,
            call_resistance: first_max_by_key(calls.iter(), |(_, oi)| *oi).map(|(strike, _)| *strike),
            put_support: first_max_by_key(puts.iter(), |(_, oi)| *oi).map(|(strike, _)| *strike),
            call_strikes: calls.len(),
            put_strikes: puts.len(),
            call_oi,
            put_oi,
        }
    }
}

/// Levels & ratios derived from one timeframe's band filtered open interest.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenInterestLevels {
    pub timeframe: Timeframe,
    /// Filtered call strike with the largest open interest, first encountered on ties.
    pub call_resistance: Option<Strike>,
    /// Filtered put strike with the largest open interest, first encountered on ties.
    pub put_support: Option<Strike>,
    pub call_strikes: usize,
    pub put_strikes: usize,
    pub call_oi: f64,
    pub put_oi: f64,
}

impl OpenInterestLevels {
    /// Put/call open interest ratio of the filtered strikes, 0 without call open interest.
    pub fn put_call_ratio(&self) -> f64 {
        if self.call_oi > 0.0 {
            self.put_oi / self.call_oi
        } else {
            0.0
        }
    }

    pub fn levels(&self) -> LevelMap {
        let mut levels = LevelMap::new();
        if let Some(strike) = self.call_resistance {
            levels.insert(label::call_resistance(self.timeframe), strike.to_f64());
        }
        if let Some(strike) = self.put_support {
            levels.insert(label::put_support(self.timeframe), strike.to_f64());
        }
        levels
    }
}

/// Strike with the largest absolute net gamma weighted open interest.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GammaWall {
    pub strike: Strike,
    /// Calls contribute positively, puts negatively.
    pub net_gamma: f64,
}

impl GammaWall {
    /// Locate the gamma wall of a set of (typically 0DTE) instruments.
    ///
    /// Each instrument with positive open interest contributes
    /// `max(gamma_floor, 1 - gamma_decay * |spot - strike| / spot) * oi`.
    pub fn locate<'a, Iter>(instruments: Iter, spot: f64, config: &EngineConfig) -> Option<Self>
    where
        Iter: IntoIterator<Item = &'a Instrument>,
    {
        let mut net_gamma = StrikeMap::<f64>::default();

        for instrument in instruments {
            if !(instrument.open_interest > 0.0) {
                continue;
            }

            let moneyness = (spot - instrument.strike()).abs() / spot;
            let weight = (1.0 - moneyness * config.gamma_decay).max(config.gamma_floor);
            let contribution = match instrument.kind() {
                OptionKind::Call => weight * instrument.open_interest,
                OptionKind::Put => -weight * instrument.open_interest,
            };

            *net_gamma.entry(instrument.name.strike).or_insert(0.0) += contribution;
        }

        first_max_by_key(net_gamma, |(_, gamma)| gamma.abs())
            .map(|(strike, net_gamma)| Self { strike, net_gamma })
    }

    pub fn label(&self) -> SmolStr {
        if self.net_gamma < 0.0 {
            SmolStr::new_static(label::GAMMA_WALL_SHORT)
        } else {
            SmolStr::new_static(label::GAMMA_WALL_LONG)
        }
    }
}
