use crate::{
    band::{BandFilter, band_pct},
    classify::InstrumentClassifier,
    compose::LevelComposer,
    config::EngineConfig,
    delta::LinearMoneynessDelta,
    error::EngineError,
    flow::FlowAnalyzer,
    label,
    open_interest::{GammaWall, StrikeOpenInterest},
    types::{EngineInputs, Instrument, KeyLevel, LevelMap, Metadata, Timeframe, TimeframeMap},
    volatility::atm_iv,
    volume_profile::VolumeProfile,
};
use chrono::{DateTime, Utc};
use keylevels_data::instrument::InstrumentName;
use smol_str::SmolStr;
use tracing::{debug, info};

/// Ranked key levels & run metadata for one currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub levels: Vec<KeyLevel>,
    pub metadata: Metadata,
}

/// Derive ranked key levels from one batch snapshot, relative to `now`.
///
/// Pure over its inputs: identical inputs, config & `now` produce identical output. Only an
/// unusable spot price is an error, malformed records are dropped individually.
pub fn analyze(
    inputs: &EngineInputs<'_>,
    config: &EngineConfig,
    now: DateTime<Utc>,
) -> Result<Analysis, EngineError> {
    let spot = EngineError::check_spot(inputs.currency, inputs.spot_price)?;
    let classifier = InstrumentClassifier::new(now);

    // Option instruments bucketed by expiry
    let instruments = inputs
        .option_summaries
        .iter()
        .filter_map(|summary| Instrument::try_from(summary).ok())
        .collect::<Vec<_>>();

    let unparseable = inputs.option_summaries.len() - instruments.len();
    debug!(
        currency = inputs.currency,
        parsed = instruments.len(),
        unparseable,
        "parsed option instruments"
    );

    let mut buckets = TimeframeMap::<Vec<&Instrument>>::default();
    for instrument in &instruments {
        buckets[classifier.classify(instrument.expiry())].push(instrument);
    }

    // Open interest levels per timeframe
    let iv = buckets.map(|_, bucket| atm_iv(bucket.iter().copied(), spot, config));
    let bands = iv.map(|timeframe, atm| band_pct(*atm, config.representative_days[timeframe], config));

    let mut option_levels = LevelMap::new();
    let mut put_call_ratios = TimeframeMap::<f64>::default();

    for timeframe in Timeframe::ALL {
        let mut open_interest = StrikeOpenInterest::default();
        buckets[timeframe]
            .iter()
            .for_each(|instrument| open_interest.insert(instrument));

        let filter = BandFilter::new(spot, bands[timeframe], config.max_strikes);
        let oi_levels = open_interest.analyse(timeframe, &filter);

        debug!(
            currency = inputs.currency,
            %timeframe,
            iv = iv[timeframe],
            band_pct = bands[timeframe],
            call_strikes = oi_levels.call_strikes,
            put_strikes = oi_levels.put_strikes,
            "open interest levels"
        );

        put_call_ratios[timeframe] = oi_levels.put_call_ratio();
        option_levels.extend(oi_levels.levels());
    }

    if let Some(wall) = GammaWall::locate(buckets[Timeframe::ZeroDte].iter().copied(), spot, config) {
        option_levels.insert(wall.label(), wall.strike.to_f64());
    }

    // Options trade flow
    let mut flow = FlowAnalyzer::new(spot, now, config.flow_decay_hours, LinearMoneynessDelta::default());
    let mut options_trades_per_timeframe = TimeframeMap::<usize>::default();

    for trade in inputs.options_trades {
        flow.ingest(trade);

        if let Some(name) = trade
            .instrument_name
            .as_deref()
            .and_then(|name| name.parse::<InstrumentName>().ok())
        {
            options_trades_per_timeframe[classifier.classify(name.expiry())] += 1;
        }
    }

    // Futures volume profile
    let profile = inputs.futures_trades.iter().collect::<VolumeProfile>();

    let mut composer = LevelComposer::new(spot, config);
    composer.merge(
        [
            (label::ONE_DAY_MAX, inputs.stats_24h.high_24h),
            (label::ONE_DAY_MIN, inputs.stats_24h.low_24h),
        ]
        .into_iter()
        .filter(|(_, price)| *price > 0.0)
        .map(|(name, price)| (SmolStr::new_static(name), price)),
    );
    composer.merge(
        profile
            .high_volume_level()
            .map(|(price, _)| (SmolStr::new_static(label::HVL), price)),
    );
    composer.merge(option_levels);
    composer.merge(flow.levels());

    let levels = composer.compose();

    let metadata = Metadata {
        currency: SmolStr::new(inputs.currency),
        spot_price: spot,
        put_call_ratios,
        iv,
        band_pct: bands,
        instruments_per_timeframe: buckets.map(|_, bucket| bucket.len()),
        options_trades_per_timeframe,
        instruments_analyzed: instruments.len(),
        instruments_unparseable: unparseable,
        futures_trades: inputs.futures_trades.len(),
        options_trades: inputs.options_trades.len(),
        options_notional: flow.total_notional(),
    };

    info!(
        currency = inputs.currency,
        spot,
        levels = levels.len(),
        flow_strikes = flow.strikes().len(),
        flow_skipped = flow.skipped(),
        profile_buckets = profile.len(),
        "key levels generated"
    );

    Ok(Analysis { levels, metadata })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keylevels_data::model::{BookSummary, Direction, PublicTrade, Stats24h};

    // Monday 2025-01-06 12:00 UTC, coming Friday 2025-01-10
    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-06T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn summary(name: &str, open_interest: f64, mark_iv: f64) -> BookSummary {
        BookSummary {
            instrument_name: name.to_string(),
            open_interest,
            mark_iv: Some(mark_iv),
            ..BookSummary::default()
        }
    }

    fn option_trade(id: &str, name: &str, amount: f64, price: f64, direction: Direction) -> PublicTrade {
        PublicTrade {
            trade_id: Some(id.to_string()),
            instrument_name: Some(name.to_string()),
            price: Some(price),
            amount: Some(amount),
            direction,
            timestamp: now().timestamp_millis() - 3_600_000,
            ..PublicTrade::default()
        }
    }

    fn futures_trade(id: &str, price: f64, amount: f64) -> PublicTrade {
        PublicTrade {
            trade_id: Some(id.to_string()),
            instrument_name: Some("BTC-PERPETUAL".to_string()),
            price: Some(price),
            amount: Some(amount),
            direction: Direction::Buy,
            timestamp: now().timestamp_millis(),
            ..PublicTrade::default()
        }
    }

    fn level<'a>(analysis: &'a Analysis, name: &str) -> Option<&'a KeyLevel> {
        analysis.levels.iter().find(|level| level.name == name)
    }

    #[test]
    fn test_analyze_missing_spot() {
        let inputs = EngineInputs {
            currency: "BTC",
            spot_price: 0.0,
            stats_24h: Stats24h::default(),
            option_summaries: &[],
            futures_trades: &[],
            options_trades: &[],
        };

        assert!(matches!(
            analyze(&inputs, &EngineConfig::default(), now()),
            Err(EngineError::MissingSpotPrice { .. })
        ));
    }

    #[test]
    fn test_analyze_empty_inputs() {
        let inputs = EngineInputs {
            currency: "ETH",
            spot_price: 3_000.0,
            stats_24h: Stats24h::default(),
            option_summaries: &[],
            futures_trades: &[],
            options_trades: &[],
        };

        let actual = analyze(&inputs, &EngineConfig::default(), now()).unwrap();

        assert!(actual.levels.is_empty());
        assert_eq!(actual.metadata.iv, TimeframeMap::from_fn(|_| 50.0));
        assert_eq!(actual.metadata.put_call_ratios, TimeframeMap::default());
        assert_eq!(actual.metadata.options_notional, 0.0);
    }

    #[test]
    fn test_analyze_counts_only_parsed_instruments() {
        let option_summaries = vec![
            summary("BTC-PERPETUAL", 1_000.0, 0.0),
            summary("BTC-31FOO25-85000-P", 1_000.0, 60.0),
        ];

        let inputs = EngineInputs {
            currency: "BTC",
            spot_price: 100_000.0,
            stats_24h: Stats24h::default(),
            option_summaries: &option_summaries,
            futures_trades: &[],
            options_trades: &[],
        };

        let metadata = analyze(&inputs, &EngineConfig::default(), now()).unwrap().metadata;

        assert_eq!(metadata.instruments_analyzed, 0);
        assert_eq!(metadata.instruments_unparseable, 2);
        assert_eq!(metadata.instruments_per_timeframe, TimeframeMap::default());
    }

    #[test]
    fn test_analyze_single_call_scenario() {
        let option_summaries = vec![summary("BTC-10JAN25-50000-C", 100.0, 50.0)];
        let options_trades = vec![option_trade(
            "1",
            "BTC-10JAN25-50000-C",
            10.0,
            0.05,
            Direction::Buy,
        )];

        let inputs = EngineInputs {
            currency: "BTC",
            spot_price: 48_000.0,
            stats_24h: Stats24h::default(),
            option_summaries: &option_summaries,
            futures_trades: &[],
            options_trades: &options_trades,
        };

        let actual = analyze(&inputs, &EngineConfig::default(), now()).unwrap();

        let call_resistance = level(&actual, "Call Resistance").unwrap();
        assert_eq!(call_resistance.price, 50_000.0);
        assert!((call_resistance.distance_pct - 4.166_666_666_666_667).abs() < 1e-9);
        assert!((call_resistance.confidence - 0.5 * (1.0 - 0.041_666_666_666_666_67)).abs() < 1e-9);

        assert_eq!(level(&actual, "HVS").map(|level| level.price), Some(50_000.0));
        assert_eq!(level(&actual, "VWAS").map(|level| level.price), Some(50_000.0));
        assert!(level(&actual, "Put Support").is_none());
        assert_eq!(actual.metadata.put_call_ratios[Timeframe::Current], 0.0);
        assert_eq!(actual.metadata.instruments_per_timeframe[Timeframe::Current], 1);
        assert_eq!(actual.metadata.options_trades_per_timeframe[Timeframe::Current], 1);
        assert_eq!(actual.metadata.options_notional, 10.0 * 0.05 * 48_000.0);
    }

    #[test]
    fn test_analyze_full_snapshot() {
        let option_summaries = vec![
            // 0DTE, settles 2025-01-07 08:00
            summary("BTC-7JAN25-100000-P", 500.0, 55.0),
            summary("BTC-7JAN25-102000-C", 200.0, 52.0),
            // Current, coming Friday
            summary("BTC-10JAN25-105000-C", 300.0, 60.0),
            summary("BTC-10JAN25-95000-P", 400.0, 58.0),
            // 1W
            summary("BTC-17JAN25-110000-C", 150.0, 62.0),
            summary("BTC-17JAN25-90000-P", 250.0, 64.0),
            // 1M
            summary("BTC-31JAN25-120000-C", 80.0, 65.0),
            summary("BTC-31JAN25-85000-P", 40.0, 66.0),
            // unparseable rows are dropped
            summary("BTC-PERPETUAL", 1_000.0, 0.0),
            summary("BTC-31FOO25-85000-P", 1_000.0, 60.0),
        ];

        let options_trades = vec![
            option_trade("a", "BTC-10JAN25-105000-C", 20.0, 0.01, Direction::Buy),
            option_trade("b", "BTC-10JAN25-95000-P", 30.0, 0.01, Direction::Sell),
            option_trade("c", "BTC-7JAN25-100000-P", 1.0, 0.01, Direction::Buy),
        ];

        let futures_trades = vec![
            futures_trade("f1", 99_501.0, 5.0),
            futures_trade("f2", 99_499.0, 5.0),
            futures_trade("f3", 100_800.0, 3.0),
        ];

        let inputs = EngineInputs {
            currency: "BTC",
            spot_price: 100_000.0,
            stats_24h: Stats24h {
                high_24h: 101_500.0,
                low_24h: 98_200.0,
                last_price: 100_050.0,
            },
            option_summaries: &option_summaries,
            futures_trades: &futures_trades,
            options_trades: &options_trades,
        };

        let config = EngineConfig::default();
        let actual = analyze(&inputs, &config, now()).unwrap();

        let price_of = |name: &str| level(&actual, name).map(|level| level.price);

        assert_eq!(price_of("1D Max"), Some(101_500.0));
        assert_eq!(price_of("1D Min"), Some(98_200.0));
        assert_eq!(price_of("HVL"), Some(99_500.0));
        assert_eq!(price_of("Call Resistance 0DTE"), Some(102_000.0));
        assert_eq!(price_of("Put Support 0DTE"), None);
        assert_eq!(price_of("Call Resistance"), Some(105_000.0));
        assert_eq!(price_of("Put Support"), Some(95_000.0));
        assert_eq!(price_of("Call Resistance 1W"), Some(110_000.0));
        assert_eq!(price_of("Put Support 1W"), Some(90_000.0));
        assert_eq!(price_of("Call Resistance 1M"), Some(120_000.0));
        assert_eq!(price_of("Put Support 1M"), Some(85_000.0));
        assert_eq!(price_of("Gamma Wall (Short Gamma)"), Some(100_000.0));
        assert_eq!(price_of("HVS"), Some(95_000.0));
        assert_eq!(price_of("Call Flow Resistance"), Some(105_000.0));
        assert_eq!(price_of("Put Flow Support"), Some(95_000.0));

        // sorted by absolute distance, confidence bounded
        assert!(actual.levels.windows(2).all(|pair| {
            pair[0].distance_pct.abs() <= pair[1].distance_pct.abs()
        }));
        assert!(actual.levels.iter().all(|level| (0.0..=1.0).contains(&level.confidence)));
        assert!(actual.levels.iter().all(|level| {
            let expected = (level.price - 100_000.0) / 100_000.0 * 100.0;
            (level.distance_pct - expected).abs() < 1e-9
        }));

        let metadata = &actual.metadata;
        assert_eq!(metadata.instruments_analyzed, 8);
        assert_eq!(metadata.instruments_unparseable, 2);
        assert_eq!(metadata.futures_trades, 3);
        assert_eq!(metadata.options_trades, 3);
        assert_eq!(
            metadata.instruments_per_timeframe,
            TimeframeMap::from_fn(|_| 2)
        );
        assert_eq!(metadata.options_trades_per_timeframe[Timeframe::Current], 2);
        assert_eq!(metadata.options_trades_per_timeframe[Timeframe::ZeroDte], 1);
        assert!((metadata.put_call_ratios[Timeframe::Current] - 400.0 / 300.0).abs() < 1e-12);
        assert_eq!(metadata.put_call_ratios[Timeframe::ZeroDte], 0.0);
        assert!((metadata.iv[Timeframe::ZeroDte] - 53.5).abs() < 1e-12);
        assert_eq!(metadata.iv[Timeframe::OneMonth], 50.0);

        // deterministic for identical inputs & now
        assert_eq!(analyze(&inputs, &config, now()).unwrap(), actual);
    }
}
