use keylevels_data::instrument::OptionKind;

/// Estimates the delta magnitude of an option for flow weighting.
pub trait DeltaEstimator {
    /// Delta magnitude in `[0, 1]`. Direction of exposure is applied by the caller.
    fn delta(&self, spot: f64, strike: f64, kind: OptionKind) -> f64;
}

/// Linear moneyness approximation, `0.5 ± slope * (spot / strike - 1)` clamped to
/// `[floor, cap]`. Calls gain delta as spot rises above strike, puts as it falls below.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LinearMoneynessDelta {
    pub slope: f64,
    pub floor: f64,
    pub cap: f64,
}

impl Default for LinearMoneynessDelta {
    fn default() -> Self {
        Self {
            slope: 0.4,
            floor: 0.05,
            cap: 0.95,
        }
    }
}

impl DeltaEstimator for LinearMoneynessDelta {
    fn delta(&self, spot: f64, strike: f64, kind: OptionKind) -> f64 {
        let moneyness = spot / strike - 1.0;
        let raw = match kind {
            OptionKind::Call => 0.5 + self.slope * moneyness,
            OptionKind::Put => 0.5 - self.slope * moneyness,
        };
        raw.min(self.cap).max(self.floor)
    }
}
