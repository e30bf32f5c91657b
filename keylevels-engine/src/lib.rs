//! # Keylevels-Engine
//! Synchronous analytics engine turning one batch of Deribit option summaries and trade tapes
//! into ranked key price levels.
//!
//! Pipeline, leaves first:
//! * [`InstrumentClassifier`](classify::InstrumentClassifier): bucket expiries into
//!   [`Timeframe`](types::Timeframe)s.
//! * [`atm_iv`](volatility::atm_iv) & [`BandFilter`](band::BandFilter): per timeframe ATM IV
//!   driving a dynamic strike band.
//! * [`StrikeOpenInterest`](open_interest::StrikeOpenInterest): call resistance, put support,
//!   put/call ratio & the 0DTE [`GammaWall`](open_interest::GammaWall).
//! * [`FlowAnalyzer`](flow::FlowAnalyzer): delta adjusted, time decayed trade flow levels.
//! * [`VolumeProfile`](volume_profile::VolumeProfile): futures high volume level.
//! * [`LevelComposer`](compose::LevelComposer): merge, score & rank.

/// All [`Error`](std::error::Error)s generated in Keylevels-Engine.
pub mod error;

/// Core engine types: [`Timeframe`](types::Timeframe), [`TimeframeMap`](types::TimeframeMap),
/// [`KeyLevel`](types::KeyLevel) & run [`Metadata`](types::Metadata).
pub mod types;

/// Level names.
pub mod label;

/// Tunable engine constants.
pub mod config;

pub mod classify;
pub mod volatility;
pub mod band;
pub mod open_interest;
pub mod delta;
pub mod flow;
pub mod volume_profile;
pub mod compose;

/// End to end key level analysis of one snapshot.
pub mod analysis;

pub use analysis::{Analysis, analyze};
pub use config::EngineConfig;
pub use error::EngineError;
pub use types::{EngineInputs, KeyLevel, KeyLevelRecord, Metadata, Timeframe, TimeframeMap};
