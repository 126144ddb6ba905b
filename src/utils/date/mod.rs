// Date utility functions
// Injected clock, day boundaries and sentinel instants

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

/// Lower bound used for "unbounded" query windows.
pub fn datetime_min() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

/// Upper bound used for "unbounded" query windows and undated entries.
pub fn datetime_max() -> DateTime<Utc> {
    // 5000-01-01T00:00:00Z
    DateTime::from_timestamp(95_617_584_000, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Source of "now" and of the time zone used for day arithmetic.
///
/// The pipeline never reads system time directly; it asks the clock, so a
/// rebuild can be replayed at any instant in any zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clock {
    now: DateTime<Utc>,
    zone: Tz,
}

impl Clock {
    /// Clock frozen at `now`.
    pub fn fixed(now: DateTime<Utc>, zone: Tz) -> Self {
        Self { now, zone }
    }

    /// Clock reading the system time once, at construction.
    pub fn system(zone: Tz) -> Self {
        Self::fixed(Utc::now(), zone)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Calendar day of `instant` in the clock's zone.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.zone).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.day_of(self.now)
    }

    /// First instant of `day` in the clock's zone.
    ///
    /// Days whose local midnight falls into a DST gap start at the first
    /// valid local time; midnight UTC is the last resort.
    pub fn start_of_day(&self, day: NaiveDate) -> DateTime<Utc> {
        let midnight = day.and_time(NaiveTime::MIN);
        match self.zone.from_local_datetime(&midnight).earliest() {
            Some(local) => local.with_timezone(&Utc),
            None => (1..=3)
                .filter_map(|hour| {
                    self.zone
                        .from_local_datetime(&(midnight + Duration::hours(hour)))
                        .earliest()
                })
                .map(|local| local.with_timezone(&Utc))
                .next()
                .unwrap_or_else(|| midnight.and_utc()),
        }
    }

    pub fn start_of_today(&self) -> DateTime<Utc> {
        self.start_of_day(self.today())
    }

    pub fn start_of_tomorrow(&self) -> DateTime<Utc> {
        self.start_of_day(self.today() + Duration::days(1))
    }

    /// Whole minutes from now to `instant`; negative for the past.
    pub fn minutes_to(&self, instant: DateTime<Utc>) -> i64 {
        (instant - self.now).num_minutes()
    }

    pub fn is_today(&self, instant: DateTime<Utc>) -> bool {
        self.day_of(instant) == self.today()
    }
}

pub fn is_same_day(clock: &Clock, first: DateTime<Utc>, second: DateTime<Utc>) -> bool {
    clock.day_of(first) == clock.day_of(second)
}

/// Instant at UTC midnight of `date`, the way providers store all-day events.
pub fn utc_midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn clock_at(rfc3339: &str, zone: Tz) -> Clock {
        let now = DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc);
        Clock::fixed(now, zone)
    }

    #[test]
    fn test_today_uses_clock_zone() {
        // 23:30 UTC on the 10th is already the 11th in Tokyo
        let utc = clock_at("2024-03-10T23:30:00Z", Tz::UTC);
        let tokyo = clock_at("2024-03-10T23:30:00Z", chrono_tz::Asia::Tokyo);

        assert_eq!(utc.today(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
        assert_eq!(tokyo.today(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    }

    #[test]
    fn test_start_of_day_in_zone() {
        let clock = clock_at("2024-06-01T12:00:00Z", chrono_tz::Europe::Berlin);
        let start = clock.start_of_today();

        // Berlin is UTC+2 in summer
        assert_eq!(start.to_rfc3339(), "2024-05-31T22:00:00+00:00");
        assert_eq!(clock.day_of(start), clock.today());
    }

    #[test]
    fn test_start_of_day_in_dst_gap() {
        // Santiago skips midnight when DST starts on 2023-09-03
        let clock = clock_at("2023-09-03T12:00:00Z", chrono_tz::America::Santiago);
        let start = clock.start_of_day(NaiveDate::from_ymd_opt(2023, 9, 3).unwrap());
        let local = start.with_timezone(&chrono_tz::America::Santiago);

        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2023, 9, 3).unwrap());
        assert_eq!(local.hour(), 1);
    }

    #[test]
    fn test_minutes_to() {
        let clock = clock_at("2024-01-01T10:00:00Z", Tz::UTC);
        assert_eq!(clock.minutes_to(clock.now() + Duration::minutes(90)), 90);
        assert_eq!(clock.minutes_to(clock.now() - Duration::hours(2)), -120);
    }

    #[test]
    fn test_sentinels_are_ordered() {
        assert!(datetime_min() < datetime_max());
        let clock = clock_at("2024-01-01T10:00:00Z", chrono_tz::Pacific::Kiritimati);
        assert!(clock.day_of(datetime_max()) > clock.today());
    }

    #[test]
    fn test_is_same_day() {
        let clock = clock_at("2024-01-01T10:00:00Z", Tz::UTC);
        let morning = clock.start_of_today() + Duration::hours(1);
        let evening = clock.start_of_today() + Duration::hours(23);
        assert!(is_same_day(&clock, morning, evening));
        assert!(!is_same_day(&clock, morning, clock.start_of_tomorrow()));
    }
}
