use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use derive_more::{Display, From};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Hour of day (UTC) at which Deribit options settle.
pub const SETTLEMENT_HOUR_UTC: u32 = 8;

/// Errors generated when parsing a Deribit option instrument name.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize, Error)]
pub enum InstrumentParseError {
    #[error("expected 4 '-' separated parts, found {0}")]
    PartCount(usize),

    #[error("invalid expiry date: {0}")]
    Expiry(String),

    #[error("invalid strike: {0}")]
    Strike(String),

    #[error("invalid option kind: {0}")]
    Kind(String),
}

/// Call or put.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    #[display("C")]
    Call,
    #[display("P")]
    Put,
}

impl FromStr for OptionKind {
    type Err = InstrumentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" => Ok(OptionKind::Call),
            "P" => Ok(OptionKind::Put),
            other => Err(InstrumentParseError::Kind(other.to_string())),
        }
    }
}

/// Exact option strike price.
///
/// Held as a [`Decimal`] so strikes can key per-strike aggregations without float hashing.
#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Deserialize,
    Serialize,
    Display,
    From,
)]
pub struct Strike(pub Decimal);

impl Strike {
    pub fn to_f64(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }
}

impl FromStr for Strike {
    type Err = InstrumentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let strike = Decimal::from_str(s)
            .map_err(|error| InstrumentParseError::Strike(format!("{s}: {error}")))?;

        if strike <= Decimal::ZERO {
            return Err(InstrumentParseError::Strike(format!("{s}: must be positive")));
        }

        Ok(Self(strike))
    }
}

/// Parsed Deribit option instrument name, eg/ `BTC-27DEC24-50000-C`.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct InstrumentName {
    pub currency: SmolStr,
    pub expiry_date: NaiveDate,
    pub strike: Strike,
    pub kind: OptionKind,
}

impl InstrumentName {
    /// Settlement instant of this option: 08:00 UTC on the expiry date.
    pub fn expiry(&self) -> DateTime<Utc> {
        let settlement = NaiveTime::from_hms_opt(SETTLEMENT_HOUR_UTC, 0, 0).unwrap_or_default();
        self.expiry_date.and_time(settlement).and_utc()
    }

    /// Deribit formatted expiry segment, eg/ `5JAN25`.
    pub fn expiry_code(&self) -> SmolStr {
        SmolStr::new(self.expiry_date.format("%-d%b%y").to_string().to_uppercase())
    }
}

impl FromStr for InstrumentName {
    type Err = InstrumentParseError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let parts = name.split('-').collect::<Vec<_>>();
        let [currency, expiry, strike, kind] = parts.as_slice() else {
            return Err(InstrumentParseError::PartCount(parts.len()));
        };

        let expiry_date = NaiveDate::parse_from_str(expiry, "%d%b%y")
            .map_err(|error| InstrumentParseError::Expiry(format!("{expiry}: {error}")))?;

        Ok(Self {
            currency: SmolStr::new(currency),
            expiry_date,
            strike: strike.parse()?,
            kind: kind.parse()?,
        })
    }
}

impl fmt::Display for InstrumentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.currency,
            self.expiry_code(),
            self.strike,
            self.kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_instrument_name() {
        struct TestCase {
            input: &'static str,
            expected: Result<InstrumentName, InstrumentParseError>,
        }

        let tests = vec![
            TestCase {
                // TC0: valid call
                input: "BTC-27DEC24-50000-C",
                expected: Ok(InstrumentName {
                    currency: SmolStr::new("BTC"),
                    expiry_date: NaiveDate::from_ymd_opt(2024, 12, 27).unwrap(),
                    strike: Strike(dec!(50000)),
                    kind: OptionKind::Call,
                }),
            },
            TestCase {
                // TC1: valid put w/ single digit day
                input: "ETH-5JAN25-3200-P",
                expected: Ok(InstrumentName {
                    currency: SmolStr::new("ETH"),
                    expiry_date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
                    strike: Strike(dec!(3200)),
                    kind: OptionKind::Put,
                }),
            },
            TestCase {
                // TC2: perpetual future has too few parts
                input: "BTC-PERPETUAL",
                expected: Err(InstrumentParseError::PartCount(2)),
            },
            TestCase {
                // TC3: unknown option kind
                input: "BTC-27DEC24-50000-X",
                expected: Err(InstrumentParseError::Kind("X".to_string())),
            },
            TestCase {
                // TC4: too many parts
                input: "BTC-27DEC24-50000-C-1",
                expected: Err(InstrumentParseError::PartCount(5)),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.parse::<InstrumentName>();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_parse_instrument_name_rejects_malformed_segments() {
        let inputs = [
            "BTC-32DEC24-50000-C",
            "BTC-27FOO24-50000-C",
            "BTC-27DEC24-abc-C",
            "BTC-27DEC24-0-P",
            "BTC-27DEC24--50000-P",
        ];

        for (index, input) in inputs.into_iter().enumerate() {
            assert!(input.parse::<InstrumentName>().is_err(), "TC{} failed", index);
        }
    }

    #[test]
    fn test_instrument_name_display_round_trips() {
        for (index, input) in ["BTC-27DEC24-50000-C", "ETH-5JAN25-3200-P", "BTC-1MAR25-97500-P"]
            .into_iter()
            .enumerate()
        {
            let parsed = input.parse::<InstrumentName>().unwrap();
            assert_eq!(parsed.to_string(), input, "TC{} failed", index);
            assert_eq!(parsed.to_string().parse::<InstrumentName>().unwrap(), parsed);
        }
    }

    #[test]
    fn test_instrument_name_expiry_is_settlement_hour() {
        let name = "BTC-27DEC24-50000-C".parse::<InstrumentName>().unwrap();
        assert_eq!(
            name.expiry(),
            DateTime::parse_from_rfc3339("2024-12-27T08:00:00Z")
                .unwrap()
                .with_timezone(&Utc)
        );
    }
}
