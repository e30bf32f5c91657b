//! # Keylevels-Data
//! Retrieval layer for Deribit options & futures market data used by the key level engine.
//!
//! * **Instrument**: parse Deribit option names (eg/ `BTC-27DEC24-50000-C`) into typed
//!   [`InstrumentName`](instrument::InstrumentName)s with exact decimal strikes.
//! * **Model**: normalised wire models for book summaries, public trades and index prices.
//! * **Dedup**: merge overlapping, time-chunked trade pages into a unique trade set.
//! * **Deribit**: rate limited, retrying REST client with timestamp based trade pagination.
//! * **Source**: [`MarketDataSource`](source::MarketDataSource) abstraction and a concurrent
//!   [`fetch_snapshot`](source::fetch_snapshot) that joins every independent fetch.

/// All [`Error`](std::error::Error)s generated in Keylevels-Data.
pub mod error;

/// Deribit option instrument name parsing.
pub mod instrument;

/// Deribit REST wire models.
pub mod model;

/// Trade id based deduplication of chunked trade pages.
pub mod dedup;

/// Deribit REST client.
pub mod deribit;

/// [`MarketDataSource`](source::MarketDataSource) trait & concurrent snapshot retrieval.
pub mod source;
