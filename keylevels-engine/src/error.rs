use smol_str::SmolStr;
use thiserror::Error;

/// All errors generated in `keylevels-engine`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("missing or invalid spot price for {currency}: {spot}")]
    MissingSpotPrice { currency: SmolStr, spot: f64 },
}

impl EngineError {
    /// Validate a spot price, every distance & moneyness computation divides by it.
    pub fn check_spot(currency: &str, spot: f64) -> Result<f64, Self> {
        if spot.is_finite() && spot > 0.0 {
            Ok(spot)
        } else {
            Err(Self::MissingSpotPrice {
                currency: SmolStr::new(currency),
                spot,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_spot() {
        struct TestCase {
            input: f64,
            expected: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: positive spot
                input: 100_000.0,
                expected: true,
            },
            TestCase {
                // TC1: zero spot
                input: 0.0,
                expected: false,
            },
            TestCase {
                // TC2: negative spot
                input: -1.0,
                expected: false,
            },
            TestCase {
                // TC3: NaN spot
                input: f64::NAN,
                expected: false,
            },
            TestCase {
                // TC4: infinite spot
                input: f64::INFINITY,
                expected: false,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = EngineError::check_spot("BTC", test.input).is_ok();
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }
}
