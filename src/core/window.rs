//! Export window resolution.
//!
//! The export always covers the previous calendar day in local time:
//! the half-open interval `[yesterday 00:00:00.000, today 00:00:00.000)`,
//! expressed as epoch milliseconds.

use chrono::{DateTime, Days, Local, LocalResult, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

/// Half-open time interval `[start, end)` in epoch milliseconds.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use devgraph_export::core::TimeWindow;
///
/// let now = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();
/// let window = TimeWindow::previous_day(&now);
/// assert_eq!(window.end - window.start, 86_400_000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive lower bound (epoch ms).
    pub start: i64,
    /// Exclusive upper bound (epoch ms).
    pub end: i64,
}

impl TimeWindow {
    /// Creates a window from explicit bounds.
    #[must_use]
    pub const fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Resolves the previous calendar day relative to `now` in `now`'s zone.
    ///
    /// `end` is the most recent midnight at or before `now` and `start` is
    /// the midnight of the day before. On days without a DST transition the
    /// two are exactly 24 hours apart.
    #[must_use]
    pub fn previous_day<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);

        Self {
            start: midnight_millis(&tz, yesterday),
            end: midnight_millis(&tz, today),
        }
    }

    /// Resolves the previous calendar day from the given clock.
    #[must_use]
    pub fn from_clock<C: Clock + ?Sized>(clock: &C) -> Self {
        Self::previous_day(&clock.now())
    }

    /// Returns true if `timestamp` falls inside `[start, end)`.
    #[must_use]
    pub const fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    /// Window length in milliseconds.
    #[must_use]
    pub const fn duration_ms(&self) -> i64 {
        self.end - self.start
    }
}

/// Epoch milliseconds of local midnight on `date`.
///
/// Ambiguous midnights (clocks falling back) take the earlier instant; a
/// skipped midnight (clocks springing forward) takes the first valid instant
/// after it.
fn midnight_millis<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    let mut local = date.and_time(NaiveTime::MIN);
    // Transitions never skip more than a couple of hours.
    for _ in 0..4 {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                return dt.timestamp_millis();
            }
            LocalResult::None => local += chrono::Duration::minutes(30),
        }
    }
    local.and_utc().timestamp_millis()
}

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Current local time.
    fn now(&self) -> DateTime<Local>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock frozen at a fixed instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, NaiveDateTime, Utc};
    use proptest::prelude::*;
    use test_case::test_case;

    const HOUR_MS: i64 = 3_600_000;

    fn naive(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn utc_ms(year: i32, month: u32, day: u32, hour: u32) -> i64 {
        naive(year, month, day, hour).and_utc().timestamp_millis()
    }

    /// Zone that shifts by one hour at local midnight. With `SPRING` it moves
    /// from -05:00 to -04:00 on 2024-03-10, so 00:00..01:00 never happens;
    /// otherwise it moves from -04:00 to -05:00 on 2024-11-03 and
    /// 00:00..01:00 happens twice.
    #[derive(Debug, Clone, Copy)]
    struct ShiftZone<const SPRING: bool>;

    impl<const SPRING: bool> ShiftZone<SPRING> {
        fn rules() -> (NaiveDateTime, FixedOffset, FixedOffset) {
            let east = FixedOffset::east_opt(-4 * 3600).unwrap();
            let west = FixedOffset::east_opt(-5 * 3600).unwrap();
            if SPRING {
                (naive(2024, 3, 10, 5), west, east)
            } else {
                (naive(2024, 11, 3, 5), east, west)
            }
        }
    }

    impl<const SPRING: bool> TimeZone for ShiftZone<SPRING> {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            Self
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let (switch, before, after) = Self::rules();
            let as_utc = |offset: FixedOffset| {
                *local - chrono::Duration::seconds(i64::from(offset.local_minus_utc()))
            };
            match (as_utc(before) < switch, as_utc(after) >= switch) {
                (true, true) => LocalResult::Ambiguous(before, after),
                (true, false) => LocalResult::Single(before),
                (false, true) => LocalResult::Single(after),
                (false, false) => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            let (switch, before, after) = Self::rules();
            if *utc < switch { before } else { after }
        }
    }

    #[test]
    fn test_previous_day_utc() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();
        let window = TimeWindow::previous_day(&now);

        assert_eq!(window.start, 1_710_374_400_000);
        assert_eq!(window.end, 1_710_460_800_000);
    }

    #[test]
    fn test_previous_day_local() {
        let now = Local.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();
        let window = TimeWindow::from_clock(&FixedClock(now));

        let start = Local.with_ymd_and_hms(2024, 3, 14, 0, 0, 0).unwrap();
        let end = Local.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert_eq!(window.start, start.timestamp_millis());
        assert_eq!(window.end, end.timestamp_millis());
    }

    #[test_case(0, 0, 0 ; "exactly midnight")]
    #[test_case(0, 0, 1 ; "one second past midnight")]
    #[test_case(23, 59, 59 ; "end of day")]
    fn test_window_ends_at_todays_midnight(hour: u32, min: u32, sec: u32) {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, hour, min, sec).unwrap();
        let window = TimeWindow::previous_day(&now);
        assert_eq!(window.end, 1_710_460_800_000);
        assert_eq!(window.duration_ms(), 86_400_000);
    }

    #[test]
    fn test_offset_zone_uses_local_midnight() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2024, 3, 15, 1, 0, 0).unwrap();
        let window = TimeWindow::previous_day(&now);

        // 2024-03-15T00:00+02:00 == 2024-03-14T22:00Z
        assert_eq!(window.end, 1_710_453_600_000);
        assert_eq!(window.start, 1_710_367_200_000);
    }

    #[test]
    fn test_month_and_year_boundaries() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let window = TimeWindow::previous_day(&now);
        let start = Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(window.start, start.timestamp_millis());

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let window = TimeWindow::previous_day(&now);
        let start = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        assert_eq!(window.start, start.timestamp_millis());
    }

    #[test]
    fn test_spring_forward_day_is_23_hours() {
        // 2024-03-11 14:30 local (-04:00)
        let now = ShiftZone::<true>.from_utc_datetime(&naive(2024, 3, 11, 18));
        let window = TimeWindow::previous_day(&now);

        // Midnight on the 10th does not exist; 01:00 (-04:00) is the first valid instant.
        assert_eq!(window.start, utc_ms(2024, 3, 10, 5));
        assert_eq!(window.end, utc_ms(2024, 3, 11, 4));
        assert_eq!(window.duration_ms(), 23 * HOUR_MS);
    }

    #[test]
    fn test_skipped_midnight_resolves_to_first_valid_time() {
        // 2024-03-10 14:00 local (-04:00)
        let now = ShiftZone::<true>.from_utc_datetime(&naive(2024, 3, 10, 18));
        let window = TimeWindow::previous_day(&now);

        let end = ShiftZone::<true>.timestamp_millis_opt(window.end).unwrap();
        assert_eq!(end.naive_local(), naive(2024, 3, 10, 1));
        assert_eq!(window.start, utc_ms(2024, 3, 9, 5));
    }

    #[test]
    fn test_fall_back_day_is_25_hours() {
        // 2024-11-04 12:00 local (-05:00)
        let now = ShiftZone::<false>.from_utc_datetime(&naive(2024, 11, 4, 17));
        let window = TimeWindow::previous_day(&now);

        // Midnight on the 3rd happens at -04:00 and again at -05:00; the first one wins.
        assert_eq!(window.start, utc_ms(2024, 11, 3, 4));
        assert_eq!(window.end, utc_ms(2024, 11, 4, 5));
        assert_eq!(window.duration_ms(), 25 * HOUR_MS);

        let start = ShiftZone::<false>.timestamp_millis_opt(window.start).unwrap();
        assert_eq!(start.naive_local(), naive(2024, 11, 3, 0));
    }

    #[test]
    fn test_contains_is_half_open() {
        let window = TimeWindow::new(100, 200);
        assert!(window.contains(100));
        assert!(window.contains(199));
        assert!(!window.contains(200));
        assert!(!window.contains(99));
    }

    proptest! {
        #[test]
        fn prop_window_is_previous_utc_day(secs in 0i64..4_000_000_000) {
            let now = Utc.timestamp_opt(secs, 0).unwrap();
            let window = TimeWindow::previous_day(&now);
            let now_ms = now.timestamp_millis();

            prop_assert_eq!(window.duration_ms(), 86_400_000);
            prop_assert_eq!(window.end % 86_400_000, 0);
            prop_assert!(window.end <= now_ms);
            prop_assert!(now_ms - window.end < 86_400_000);
        }
    }
}
