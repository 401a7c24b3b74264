//! Durations normalized to a count of days
//!
//! Months are fixed at 30 days and years at 365 days. Calendar-aware arithmetic is not
//! attempted; a duration is a magnitude in one unit, comparable to any other duration
//! through its day count.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Unit a duration was constructed with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl DurationUnit {
    pub const ALL: [DurationUnit; 7] = [
        DurationUnit::Seconds,
        DurationUnit::Minutes,
        DurationUnit::Hours,
        DurationUnit::Days,
        DurationUnit::Weeks,
        DurationUnit::Months,
        DurationUnit::Years,
    ];

    /// Plural keyword for this unit
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
            Self::Weeks => "weeks",
            Self::Months => "months",
            Self::Years => "years",
        }
    }

    /// Convert a magnitude in this unit to days.
    ///
    /// Sub-day units divide rather than multiply by a reciprocal so that exact
    /// multiples (1440 minutes, 24 hours) land on whole days.
    fn to_days(self, magnitude: f64) -> f64 {
        match self {
            Self::Seconds => magnitude / 86_400.0,
            Self::Minutes => magnitude / 1_440.0,
            Self::Hours => magnitude / 24.0,
            Self::Days => magnitude,
            Self::Weeks => magnitude * 7.0,
            Self::Months => magnitude * 30.0,
            Self::Years => magnitude * 365.0,
        }
    }

    fn to_millis(self, magnitude: f64) -> f64 {
        match self {
            Self::Seconds => magnitude * 1_000.0,
            Self::Minutes => magnitude * 60_000.0,
            Self::Hours => magnitude * 3_600_000.0,
            other => other.to_days(magnitude) * 86_400_000.0,
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a unit keyword is not recognized
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown duration unit '{0}'")]
pub struct UnknownDurationUnit(pub String);

impl FromStr for DurationUnit {
    type Err = UnknownDurationUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.to_ascii_lowercase().as_str() {
            "second" | "seconds" => Self::Seconds,
            "minute" | "minutes" => Self::Minutes,
            "hour" | "hours" => Self::Hours,
            "day" | "days" => Self::Days,
            "week" | "weeks" => Self::Weeks,
            "month" | "months" => Self::Months,
            "year" | "years" => Self::Years,
            _ => return Err(UnknownDurationUnit(s.to_string())),
        };
        Ok(unit)
    }
}

/// An immutable span of time.
///
/// Equality and ordering look only at the normalized day count, so
/// `Duration::minutes(1440.0) == Duration::days(1.0)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Duration {
    magnitude: f64,
    unit: DurationUnit,
}

impl Duration {
    pub const fn from_unit(unit: DurationUnit, magnitude: f64) -> Self {
        Self { magnitude, unit }
    }

    pub const fn seconds(magnitude: f64) -> Self {
        Self::from_unit(DurationUnit::Seconds, magnitude)
    }

    pub const fn minutes(magnitude: f64) -> Self {
        Self::from_unit(DurationUnit::Minutes, magnitude)
    }

    pub const fn hours(magnitude: f64) -> Self {
        Self::from_unit(DurationUnit::Hours, magnitude)
    }

    pub const fn days(magnitude: f64) -> Self {
        Self::from_unit(DurationUnit::Days, magnitude)
    }

    pub const fn weeks(magnitude: f64) -> Self {
        Self::from_unit(DurationUnit::Weeks, magnitude)
    }

    pub const fn months(magnitude: f64) -> Self {
        Self::from_unit(DurationUnit::Months, magnitude)
    }

    pub const fn years(magnitude: f64) -> Self {
        Self::from_unit(DurationUnit::Years, magnitude)
    }

    /// Magnitude in the constructing unit
    pub const fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Unit the duration was constructed with
    pub const fn unit(&self) -> DurationUnit {
        self.unit
    }

    /// Length of the duration in days
    pub fn in_days(&self) -> f64 {
        self.unit.to_days(self.magnitude)
    }

    pub fn in_millis(&self) -> f64 {
        self.unit.to_millis(self.magnitude)
    }

    /// Duration with a non-negative magnitude, same unit
    pub fn abs(&self) -> Self {
        Self::from_unit(self.unit, self.magnitude.abs())
    }

    /// Convert to a chrono delta, rounded to the millisecond.
    ///
    /// Returns `None` for non-finite magnitudes or spans chrono cannot represent.
    pub fn to_time_delta(&self) -> Option<TimeDelta> {
        let millis = self.in_millis().round();
        if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
            return None;
        }
        TimeDelta::try_milliseconds(millis as i64)
    }
}

impl PartialEq for Duration {
    fn eq(&self, other: &Self) -> bool {
        self.in_days() == other.in_days()
    }
}

impl PartialOrd for Duration {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.in_days().partial_cmp(&other.in_days())
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.magnitude.fract() == 0.0 && self.magnitude.abs() < 1e15 {
            write!(f, "{} {}", self.magnitude as i64, self.unit)
        } else {
            write!(f, "{} {}", self.magnitude, self.unit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(Duration::minutes(1440.0), Duration::days(1.0))]
    #[case(Duration::seconds(86_400.0), Duration::days(1.0))]
    #[case(Duration::hours(24.0), Duration::days(1.0))]
    #[case(Duration::weeks(1.0), Duration::days(7.0))]
    #[case(Duration::months(1.0), Duration::days(30.0))]
    #[case(Duration::years(1.0), Duration::days(365.0))]
    #[case(Duration::minutes(60.0), Duration::hours(1.0))]
    fn test_equivalent_durations(#[case] a: Duration, #[case] b: Duration) {
        assert_eq!(a.in_days(), b.in_days());
        assert_eq!(a, b);
    }

    #[rstest]
    #[case(Duration::months(30.0), 900.0)]
    #[case(Duration::years(3.0), 1095.0)]
    #[case(Duration::weeks(30.0), 210.0)]
    #[case(Duration::days(-2.0), -2.0)]
    fn test_in_days(#[case] duration: Duration, #[case] days: f64) {
        assert_eq!(duration.in_days(), days);
    }

    #[test]
    fn test_unit_and_magnitude_preserved() {
        let d = Duration::months(30.0);
        assert_eq!(d.unit(), DurationUnit::Months);
        assert_eq!(d.magnitude(), 30.0);
        assert_eq!(d.to_string(), "30 months");
    }

    #[test]
    fn test_ordering_by_day_count() {
        assert!(Duration::weeks(2.0) > Duration::days(13.0));
        assert!(Duration::hours(12.0) < Duration::days(1.0));
    }

    #[test]
    fn test_time_delta() {
        assert_eq!(Duration::days(1.0).to_time_delta(), Some(TimeDelta::days(1)));
        assert_eq!(Duration::seconds(1.5).to_time_delta(), Some(TimeDelta::milliseconds(1500)));
        assert_eq!(Duration::days(f64::NAN).to_time_delta(), None);
    }

    #[rstest]
    #[case("day", DurationUnit::Days)]
    #[case("MONTHS", DurationUnit::Months)]
    #[case("Year", DurationUnit::Years)]
    fn test_unit_from_str(#[case] input: &str, #[case] unit: DurationUnit) {
        assert_eq!(input.parse::<DurationUnit>(), Ok(unit));
    }

    #[test]
    fn test_unknown_unit() {
        let err = "fortnight".parse::<DurationUnit>().unwrap_err();
        assert_eq!(err.to_string(), "unknown duration unit 'fortnight'");
    }

    proptest! {
        #[test]
        fn prop_in_days_scales_with_magnitude(m in -10_000i32..10_000) {
            let m = f64::from(m);
            prop_assert_eq!(Duration::weeks(m).in_days(), m * 7.0);
            prop_assert_eq!(Duration::years(m).in_days(), m * 365.0);
            prop_assert_eq!(Duration::hours(m * 24.0).in_days(), m);
        }
    }
}
