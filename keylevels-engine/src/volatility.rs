use crate::{config::EngineConfig, types::Instrument};

/// Average at-the-money mark implied volatility (percent).
///
/// Only instruments whose strike lies strictly within `config.atm_window` of spot and whose mark
/// IV is positive contribute. Falls back to `config.fallback_iv` when none do.
pub fn atm_iv<'a, Iter>(instruments: Iter, spot: f64, config: &EngineConfig) -> f64
where
    Iter: IntoIterator<Item = &'a Instrument>,
{
    let (sum, count) = instruments
        .into_iter()
        .filter(|instrument| (instrument.strike() - spot).abs() / spot < config.atm_window)
        .filter_map(|instrument| instrument.mark_iv.filter(|iv| *iv > 0.0))
        .fold((0.0, 0_usize), |(sum, count), iv| (sum + iv, count + 1));

    if count > 0 {
        sum / count as f64
    } else {
        config.fallback_iv
    }
}
