use crate::types::Timeframe;
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

/// Rule that assigned an expiry to its [`Timeframe`]. Rules are evaluated in declaration order
/// and the first match wins.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ClassifyRule {
    /// Settles within the next 24 hours.
    ZeroDte,
    /// Settles on the coming Friday (a week out when today is Friday).
    NextFriday,
    /// 5 to 12 whole days out.
    OneWeek,
    /// 20 to 40 whole days out.
    OneMonth,
    /// Nothing else matched, treated as the current expiry.
    Default,
}

impl ClassifyRule {
    pub fn timeframe(self) -> Timeframe {
        match self {
            ClassifyRule::ZeroDte => Timeframe::ZeroDte,
            ClassifyRule::NextFriday | ClassifyRule::Default => Timeframe::Current,
            ClassifyRule::OneWeek => Timeframe::OneWeek,
            ClassifyRule::OneMonth => Timeframe::OneMonth,
        }
    }
}

/// Buckets settlement instants relative to a fixed `now`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct InstrumentClassifier {
    now: DateTime<Utc>,
    next_friday: NaiveDate,
}

impl InstrumentClassifier {
    pub fn new(now: DateTime<Utc>) -> Self {
        let weekday = i64::from(now.weekday().num_days_from_monday());
        let days_until_friday = match (4 - weekday).rem_euclid(7) {
            0 => 7,
            days => days,
        };

        Self {
            now,
            next_friday: (now + TimeDelta::days(days_until_friday)).date_naive(),
        }
    }

    /// Determine the first rule matching an expiry settling at `expiry`.
    ///
    /// 0DTE is measured to the settlement instant, whole days to midnight of the expiry date.
    pub fn rule(&self, expiry: DateTime<Utc>) -> ClassifyRule {
        let until_expiry = expiry - self.now;
        let expiry_midnight = expiry.date_naive().and_time(NaiveTime::MIN).and_utc();
        let whole_days = (expiry_midnight - self.now)
            .num_seconds()
            .div_euclid(SECONDS_PER_DAY);

        if until_expiry > TimeDelta::zero() && until_expiry <= TimeDelta::hours(24) {
            ClassifyRule::ZeroDte
        } else if expiry.date_naive() == self.next_friday {
            ClassifyRule::NextFriday
        } else if (5..=12).contains(&whole_days) {
            ClassifyRule::OneWeek
        } else if (20..=40).contains(&whole_days) {
            ClassifyRule::OneMonth
        } else {
            ClassifyRule::Default
        }
    }

    pub fn classify(&self, expiry: DateTime<Utc>) -> Timeframe {
        self.rule(expiry).timeframe()
    }
}
