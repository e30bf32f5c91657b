use crate::types::Timeframe;
use smol_str::{SmolStr, format_smolstr};

pub const ONE_DAY_MAX: &str = "1D Max";
pub const ONE_DAY_MIN: &str = "1D Min";
pub const HVL: &str = "HVL";
pub const CALL_RESISTANCE: &str = "Call Resistance";
pub const PUT_SUPPORT: &str = "Put Support";
pub const GAMMA_WALL_SHORT: &str = "Gamma Wall (Short Gamma)";
pub const GAMMA_WALL_LONG: &str = "Gamma Wall (Long Gamma)";
pub const HVS: &str = "HVS";
pub const MAX_PAIN_FLOW: &str = "Max Pain Flow";
pub const CALL_FLOW_RESISTANCE: &str = "Call Flow Resistance";
pub const PUT_FLOW_SUPPORT: &str = "Put Flow Support";
pub const VWAS: &str = "VWAS";

/// eg/ `Call Resistance`, `Call Resistance 0DTE`.
pub fn call_resistance(timeframe: Timeframe) -> SmolStr {
    format_smolstr!("{CALL_RESISTANCE}{}", timeframe.label_suffix())
}

/// eg/ `Put Support`, `Put Support 1M`.
pub fn put_support(timeframe: Timeframe) -> SmolStr {
    format_smolstr!("{PUT_SUPPORT}{}", timeframe.label_suffix())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_labels() {
        struct TestCase {
            input: Timeframe,
            expected: (&'static str, &'static str),
        }

        let tests = vec![
            TestCase {
                // TC0: current expiry carries no suffix
                input: Timeframe::Current,
                expected: ("Call Resistance", "Put Support"),
            },
            TestCase {
                // TC1
                input: Timeframe::ZeroDte,
                expected: ("Call Resistance 0DTE", "Put Support 0DTE"),
            },
            TestCase {
                // TC2
                input: Timeframe::OneWeek,
                expected: ("Call Resistance 1W", "Put Support 1W"),
            },
            TestCase {
                // TC3
                input: Timeframe::OneMonth,
                expected: ("Call Resistance 1M", "Put Support 1M"),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = (call_resistance(test.input), put_support(test.input));
            assert_eq!(actual.0, test.expected.0, "TC{} failed", index);
            assert_eq!(actual.1, test.expected.1, "TC{} failed", index);
        }
    }
}
