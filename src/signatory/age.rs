//! Relative signing age in plain English
//!
//! Buckets elapsed time into minutes, hours, days or years and renders it the
//! way the roster shows it: "a minute ago", "3 hours ago", "2 years ago".

use std::fmt;

/// Milliseconds in one minute
pub const MINUTE_MS: i64 = 60_000;

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 1_440;
const DAYS_PER_YEAR: i64 = 365;
const MINUTES_PER_YEAR: i64 = MINUTES_PER_DAY * DAYS_PER_YEAR;

/// Unit an age is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeUnit {
    Minute,
    Hour,
    Day,
    Year,
}

impl AgeUnit {
    /// Singular form with its article ("an hour")
    pub fn singular(self) -> &'static str {
        match self {
            AgeUnit::Minute => "a minute",
            AgeUnit::Hour => "an hour",
            AgeUnit::Day => "a day",
            AgeUnit::Year => "a year",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            AgeUnit::Minute => "minutes",
            AgeUnit::Hour => "hours",
            AgeUnit::Day => "days",
            AgeUnit::Year => "years",
        }
    }
}

/// Elapsed time between a signature and "now", bucketed to one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Age {
    pub unit: AgeUnit,
    pub count: i64,
}

impl Age {
    /// Bucket the time elapsed from `signed_at_ms` to `now_ms`.
    ///
    /// Signatures stamped in the future (clock skew) land in the minute
    /// bucket with a non-positive count and render as "a minute ago".
    pub fn between(signed_at_ms: i64, now_ms: i64) -> Self {
        let minutes = (now_ms - signed_at_ms).div_euclid(MINUTE_MS);

        if minutes < MINUTES_PER_HOUR {
            Age { unit: AgeUnit::Minute, count: minutes }
        } else if minutes < MINUTES_PER_DAY {
            Age { unit: AgeUnit::Hour, count: minutes / MINUTES_PER_HOUR }
        } else if minutes < MINUTES_PER_YEAR {
            Age { unit: AgeUnit::Day, count: minutes / MINUTES_PER_DAY }
        } else {
            let days = minutes / MINUTES_PER_DAY;
            Age { unit: AgeUnit::Year, count: days / DAYS_PER_YEAR }
        }
    }
}

impl fmt::Display for Age {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // zero reads as "a minute ago", never "0 minutes ago"
        if self.count <= 1 {
            write!(f, "{} ago", self.unit.singular())
        } else {
            write!(f, "{} {} ago", self.count, self.unit.plural())
        }
    }
}

/// Render the age of a signature relative to `now_ms`
pub fn display_age(signed_at_ms: i64, now_ms: i64) -> String {
    Age::between(signed_at_ms, now_ms).to_string()
}
