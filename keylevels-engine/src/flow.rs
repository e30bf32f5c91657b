use crate::{
    delta::DeltaEstimator,
    label,
    types::{LevelMap, StrikeMap, first_max_by_key},
};
use chrono::{DateTime, Utc};
use keylevels_data::{
    instrument::{OptionKind, Strike},
    model::PublicTrade,
};
use smol_str::SmolStr;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Notional flow accumulated at one strike.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct StrikeFlow {
    pub total_notional: f64,
    /// Signed delta exposure, buys positive.
    pub net_flow: f64,
    /// `net_flow` with each trade decayed by its age.
    pub weighted_flow: f64,
    pub call_notional: f64,
    pub put_notional: f64,
}

/// Replays an options trade tape into per-strike, delta adjusted, time decayed notional flow.
#[derive(Debug, Clone)]
pub struct FlowAnalyzer<Delta> {
    spot: f64,
    now_ms: i64,
    decay_hours: f64,
    delta: Delta,
    strikes: StrikeMap<StrikeFlow>,
    total_notional: f64,
    skipped: usize,
}

impl<Delta> FlowAnalyzer<Delta>
where
    Delta: DeltaEstimator,
{
    pub fn new(spot: f64, now: DateTime<Utc>, decay_hours: f64, delta: Delta) -> Self {
        Self {
            spot,
            now_ms: now.timestamp_millis(),
            decay_hours,
            delta,
            strikes: StrikeMap::default(),
            total_notional: 0.0,
            skipped: 0,
        }
    }

    /// Accumulate one trade. Returns false if the trade was discarded.
    pub fn ingest(&mut self, trade: &PublicTrade) -> bool {
        let Some((strike, kind)) = trade.instrument_name.as_deref().and_then(parse_flow_leg) else {
            self.skipped += 1;
            return false;
        };

        let (amount, price) = match (trade.amount, trade.price) {
            (Some(amount), Some(price)) if amount > 0.0 && price > 0.0 => (amount, price),
            _ => {
                self.skipped += 1;
                return false;
            }
        };

        let notional = amount * price * self.spot;
        let hours_ago = (self.now_ms - trade.timestamp) as f64 / MILLIS_PER_HOUR;
        let time_weight = (-hours_ago / self.decay_hours).exp();
        let delta_exposure = notional * self.delta.delta(self.spot, strike.to_f64(), kind);
        let signed_exposure = delta_exposure * trade.direction.sign();

        let flow = self.strikes.entry(strike).or_default();
        flow.total_notional += notional;
        flow.net_flow += signed_exposure;
        flow.weighted_flow += signed_exposure * time_weight;
        match kind {
            OptionKind::Call => flow.call_notional += notional,
            OptionKind::Put => flow.put_notional += notional,
        }

        self.total_notional += notional;
        true
    }

    pub fn strikes(&self) -> &StrikeMap<StrikeFlow> {
        &self.strikes
    }

    pub fn total_notional(&self) -> f64 {
        self.total_notional
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Highest volume strike: largest total notional.
    pub fn highest_volume_strike(&self) -> Option<Strike> {
        first_max_by_key(&self.strikes, |(_, flow)| flow.total_notional).map(|(strike, _)| *strike)
    }

    /// Strike with the most balanced two-sided activity, larger total notional breaking ties.
    pub fn max_pain_flow(&self) -> Option<Strike> {
        let balanced = self
            .strikes
            .iter()
            .filter(|(_, flow)| flow.call_notional > 0.0 && flow.put_notional > 0.0)
            .map(|(strike, flow)| {
                let ratio = flow.call_notional.min(flow.put_notional)
                    / flow.call_notional.max(flow.put_notional);
                (*strike, ratio, flow.total_notional)
            });

        first_max_by_key(balanced, |(_, ratio, total)| (*ratio, *total)).map(|(strike, ..)| strike)
    }

    /// Call dominated strike above spot with the largest time weighted flow.
    pub fn call_flow_resistance(&self) -> Option<Strike> {
        let candidates = self.strikes.iter().filter(|(strike, flow)| {
            strike.to_f64() > self.spot && flow.call_notional > flow.put_notional
        });

        first_max_by_key(candidates, |(_, flow)| flow.weighted_flow).map(|(strike, _)| *strike)
    }

    /// Put dominated strike below spot with the largest absolute time weighted flow.
    pub fn put_flow_support(&self) -> Option<Strike> {
        let candidates = self.strikes.iter().filter(|(strike, flow)| {
            strike.to_f64() < self.spot && flow.put_notional > flow.call_notional
        });

        first_max_by_key(candidates, |(_, flow)| flow.weighted_flow.abs()).map(|(strike, _)| *strike)
    }

    /// Volume weighted average strike, `None` without any notional.
    pub fn volume_weighted_average_strike(&self) -> Option<f64> {
        if !(self.total_notional > 0.0) {
            return None;
        }

        let weighted = self
            .strikes
            .iter()
            .map(|(strike, flow)| strike.to_f64() * flow.total_notional)
            .sum::<f64>();

        Some(weighted / self.total_notional)
    }

    pub fn levels(&self) -> LevelMap {
        let strike_levels = [
            (label::HVS, self.highest_volume_strike()),
            (label::MAX_PAIN_FLOW, self.max_pain_flow()),
            (label::CALL_FLOW_RESISTANCE, self.call_flow_resistance()),
            (label::PUT_FLOW_SUPPORT, self.put_flow_support()),
        ];

        let mut levels = strike_levels
            .into_iter()
            .filter_map(|(name, strike)| Some((SmolStr::new_static(name), strike?.to_f64())))
            .collect::<LevelMap>();

        if let Some(vwas) = self.volume_weighted_average_strike() {
            levels.insert(SmolStr::new_static(label::VWAS), vwas);
        }

        levels
    }
}

/// Extract the strike & side of an option trade name. Requires at least 4 `-` separated parts,
/// any side other than `C` is treated as a put.
fn parse_flow_leg(instrument_name: &str) -> Option<(Strike, OptionKind)> {
    let mut parts = instrument_name.split('-');
    let (_currency, _expiry) = (parts.next()?, parts.next()?);
    let strike = parts.next()?.parse::<Strike>().ok()?;
    let kind = match parts.next()? {
        "C" => OptionKind::Call,
        _ => OptionKind::Put,
    };

    Some((strike, kind))
}
