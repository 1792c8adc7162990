/// Calendar-day policy and the clock that supplies "today"
///
/// Streak decisions compare calendar days, never instants. This module owns
/// the conversion from a wall-clock instant to a day so that the rule is
/// explicit and can be swapped out in tests.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

use crate::domain::DomainError;

/// Where a calendar day starts and ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayBoundary {
    /// Days roll over at midnight UTC
    #[default]
    Utc,
    /// Days roll over at midnight in a fixed offset, in seconds east of UTC
    FixedOffset(i32),
}

impl DayBoundary {
    /// Largest accepted offset magnitude (23:59)
    const MAX_OFFSET_SECS: i32 = 23 * 3600 + 59 * 60;

    /// Build a boundary from an offset in seconds east of UTC
    pub fn from_offset_secs(secs: i32) -> Result<Self, DomainError> {
        if secs.abs() > Self::MAX_OFFSET_SECS {
            return Err(DomainError::InvalidDate(format!(
                "UTC offset out of range: {} seconds",
                secs
            )));
        }
        if secs == 0 {
            Ok(DayBoundary::Utc)
        } else {
            Ok(DayBoundary::FixedOffset(secs))
        }
    }

    /// The calendar day that `instant` falls on under this policy
    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        match self {
            DayBoundary::Utc => instant.date_naive(),
            DayBoundary::FixedOffset(secs) => match FixedOffset::east_opt(*secs) {
                Some(offset) => instant.with_timezone(&offset).date_naive(),
                None => instant.date_naive(),
            },
        }
    }
}

impl FromStr for DayBoundary {
    type Err = DomainError;

    /// Accepts `utc`, `Z`, or an offset like `+02:00`, `-0530`, `+9`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("utc") || s == "Z" || s.is_empty() {
            return Ok(DayBoundary::Utc);
        }

        let invalid = || DomainError::InvalidDate(format!("Invalid UTC offset '{}'", s));

        let (sign, rest) = match s.as_bytes()[0] {
            b'+' => (1, &s[1..]),
            b'-' => (-1, &s[1..]),
            _ => return Err(invalid()),
        };
        if !rest.is_ascii() {
            return Err(invalid());
        }

        let (hours, minutes) = if let Some((h, m)) = rest.split_once(':') {
            (h, m)
        } else if rest.len() == 4 {
            rest.split_at(2)
        } else {
            (rest, "0")
        };

        let hours: i32 = hours.parse().map_err(|_| invalid())?;
        let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
        if !(0..60).contains(&minutes) || !(0..24).contains(&hours) {
            return Err(invalid());
        }

        Self::from_offset_secs(sign * (hours * 3600 + minutes * 60))
    }
}

impl fmt::Display for DayBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayBoundary::Utc => write!(f, "UTC"),
            DayBoundary::FixedOffset(secs) => {
                let sign = if *secs < 0 { '-' } else { '+' };
                let abs = secs.abs();
                write!(f, "{}{:02}:{:02}", sign, abs / 3600, (abs % 3600) / 60)
            }
        }
    }
}

/// Source of the current calendar day
pub trait Clock: Send + Sync {
    /// Today's date under the clock's day boundary
    fn today(&self) -> NaiveDate;
}

/// Wall-clock time truncated with a [`DayBoundary`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock {
    boundary: DayBoundary,
}

impl SystemClock {
    pub fn new(boundary: DayBoundary) -> Self {
        Self { boundary }
    }

    pub fn boundary(&self) -> DayBoundary {
        self.boundary
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        self.boundary.date_of(Utc::now())
    }
}

/// A clock pinned to a settable date
///
/// Clones share the same date, so a test can keep a handle and move time
/// forward while a controller holds another.
#[derive(Debug, Clone)]
pub struct FixedClock {
    today: Arc<Mutex<NaiveDate>>,
}

impl FixedClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today: Arc::new(Mutex::new(today)),
        }
    }

    pub fn set(&self, today: NaiveDate) {
        let mut guard = self.today.lock().unwrap_or_else(|e| e.into_inner());
        *guard = today;
    }

    /// Move the pinned date by `days` (negative moves backwards)
    pub fn advance_days(&self, days: i64) {
        let mut guard = self.today.lock().unwrap_or_else(|e| e.into_inner());
        *guard += Duration::days(days);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_utc_boundary() {
        let instant = Utc.with_ymd_and_hms(2025, 6, 15, 23, 30, 0).unwrap();
        assert_eq!(DayBoundary::Utc.date_of(instant), date("2025-06-15"));
    }

    #[test]
    fn test_offset_boundary_crosses_midnight() {
        let instant = Utc.with_ymd_and_hms(2025, 6, 15, 23, 30, 0).unwrap();
        let east = DayBoundary::from_offset_secs(2 * 3600).unwrap();
        let west = DayBoundary::from_offset_secs(-5 * 3600).unwrap();

        assert_eq!(east.date_of(instant), date("2025-06-16"));
        assert_eq!(west.date_of(instant), date("2025-06-15"));
    }

    #[test]
    fn test_parse_offsets() {
        assert_eq!("utc".parse::<DayBoundary>().unwrap(), DayBoundary::Utc);
        assert_eq!("+00:00".parse::<DayBoundary>().unwrap(), DayBoundary::Utc);
        assert_eq!(
            "+02:00".parse::<DayBoundary>().unwrap(),
            DayBoundary::FixedOffset(7200)
        );
        assert_eq!(
            "-0530".parse::<DayBoundary>().unwrap(),
            DayBoundary::FixedOffset(-(5 * 3600 + 30 * 60))
        );
        assert_eq!(
            "+9".parse::<DayBoundary>().unwrap(),
            DayBoundary::FixedOffset(9 * 3600)
        );

        assert!("02:00".parse::<DayBoundary>().is_err());
        assert!("+25:00".parse::<DayBoundary>().is_err());
        assert!("+01:75".parse::<DayBoundary>().is_err());
    }

    #[test]
    fn test_parse_rejects_non_ascii_offsets() {
        assert!("+1é1".parse::<DayBoundary>().is_err());
        assert!("-é".parse::<DayBoundary>().is_err());
        assert!("+٠٢:٠٠".parse::<DayBoundary>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(DayBoundary::Utc.to_string(), "UTC");
        assert_eq!(DayBoundary::FixedOffset(-19800).to_string(), "-05:30");
    }

    #[test]
    fn test_fixed_clock_shared_between_clones() {
        let clock = FixedClock::new(date("2025-06-15"));
        let handle = clock.clone();

        handle.advance_days(1);
        assert_eq!(clock.today(), date("2025-06-16"));

        handle.set(date("2025-01-01"));
        assert_eq!(clock.today(), date("2025-01-01"));
    }
}
