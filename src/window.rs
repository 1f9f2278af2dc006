/// Window module for period handling
///
/// Turns a period selector and a "now" instant into inclusive wall-clock
/// bounds in now's time zone, and parses `--at` anchors ('2025',
/// '2025-03', '2025-03-15') for wraps of past periods.
use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

use crate::stats::Period;

pub const DEFAULT_WEEKLY_DAYS: i64 = 7;

/// Bounds of one period, both ends inclusive, in local wall-clock time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodWindow {
    /// Window key used in report names (e.g. "2026", "2026-10", "2026-10-16")
    pub key: String,
    pub period: Period,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl PeriodWindow {
    pub fn for_period<Tz: TimeZone>(period: Period, now: &DateTime<Tz>) -> Self {
        Self::with_weekly_days(period, now, DEFAULT_WEEKLY_DAYS)
    }

    /// Weekly looks back `weekly_days` of elapsed time from now; monthly and
    /// yearly cover the calendar month / year containing now.
    pub fn with_weekly_days<Tz: TimeZone>(
        period: Period,
        now: &DateTime<Tz>,
        weekly_days: i64,
    ) -> Self {
        let local_now = now.naive_local();
        let today = local_now.date();

        match period {
            Period::Weekly => PeriodWindow {
                key: today.format("%Y-%m-%d").to_string(),
                period,
                start: weekly_start(now, weekly_days),
                end: local_now,
            },
            Period::Monthly => {
                let (first, last) = month_bounds(today);
                PeriodWindow {
                    key: today.format("%Y-%m").to_string(),
                    period,
                    start: start_of_day(first),
                    end: end_of_day(last),
                }
            }
            Period::Yearly => {
                let (first, last) = year_bounds(today);
                PeriodWindow {
                    key: today.format("%Y").to_string(),
                    period,
                    start: start_of_day(first),
                    end: end_of_day(last),
                }
            }
        }
    }

    pub fn contains(&self, local: NaiveDateTime) -> bool {
        self.start <= local && local <= self.end
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.end.date()
    }

    /// Number of calendar days in the window's month (monthly windows)
    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }
}

/// Parse an `--at` anchor into the date the wrap should be computed for.
///
/// Supported formats:
/// - "2025" → Dec 31, 2025
/// - "2025-03" → last day of March 2025
/// - "2025-03-15" → that day
pub fn parse_anchor(anchor: &str) -> Result<NaiveDate> {
    let anchor = anchor.trim();

    // Try year: "YYYY"
    if let Ok(year) = anchor.parse::<i32>() {
        if (1970..=2099).contains(&year) {
            return NaiveDate::from_ymd_opt(year, 12, 31)
                .ok_or_else(|| anyhow!("Invalid year: {}", year));
        }
    }

    // Try day: "YYYY-MM-DD"
    if let Ok(date) = NaiveDate::parse_from_str(anchor, "%Y-%m-%d") {
        return Ok(date);
    }

    // Try month: "YYYY-MM"
    if let Some((year_str, month_str)) = anchor.split_once('-') {
        if let (Ok(year), Ok(month)) = (year_str.parse::<i32>(), month_str.parse::<u32>()) {
            if (1970..=2099).contains(&year) && (1..=12).contains(&month) {
                let first = NaiveDate::from_ymd_opt(year, month, 1)
                    .ok_or_else(|| anyhow!("Invalid month: {}-{:02}", year, month))?;
                return Ok(month_bounds(first).1);
            }
        }
    }

    Err(anyhow!(
        "Invalid anchor format: '{}'. Expected: '2025', '2025-03' or '2025-03-15'",
        anchor
    ))
}

/// Local time `days` × 24h before `now`. Spans beyond chrono's range clamp to
/// the earliest representable time.
fn weekly_start<Tz: TimeZone>(now: &DateTime<Tz>, days: i64) -> NaiveDateTime {
    Duration::try_days(days)
        .and_then(|span| now.clone().checked_sub_signed(span))
        .map(|start| start.naive_local())
        .unwrap_or(NaiveDateTime::MIN)
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// 23:59:59.999 of the given date
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    start_of_day(date) + Duration::milliseconds(86_400_000 - 1)
}

fn month_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_day(1).unwrap_or(date);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date);
    (first, last)
}

fn year_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = date.with_ordinal(1).unwrap_or(date);
    let last = NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date);
    (first, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_weekly_window() {
        let ws = PeriodWindow::for_period(Period::Weekly, &now());
        assert_eq!(ws.key, "2026-10-16");
        assert_eq!(ws.start, at(2026, 10, 9, 12, 0, 0));
        assert_eq!(ws.end, at(2026, 10, 16, 12, 0, 0));
        assert!(ws.contains(ws.start));
        assert!(ws.contains(ws.end));
        assert!(!ws.contains(ws.end + Duration::milliseconds(1)));
    }

    #[test]
    fn test_monthly_window() {
        let ws = PeriodWindow::for_period(Period::Monthly, &now());
        assert_eq!(ws.key, "2026-10");
        assert_eq!(ws.start, at(2026, 10, 1, 0, 0, 0));
        assert_eq!(ws.end, at(2026, 10, 31, 23, 59, 59) + Duration::milliseconds(999));
        assert_eq!(ws.days_in_month(), 31);
    }

    #[test]
    fn test_monthly_window_february() {
        let feb = Utc.with_ymd_and_hms(2028, 2, 10, 9, 0, 0).unwrap();
        let ws = PeriodWindow::for_period(Period::Monthly, &feb);
        assert_eq!(ws.last_day(), NaiveDate::from_ymd_opt(2028, 2, 29).unwrap());
        assert_eq!(ws.days_in_month(), 29);
    }

    #[test]
    fn test_monthly_window_december() {
        let dec = Utc.with_ymd_and_hms(2026, 12, 3, 9, 0, 0).unwrap();
        let ws = PeriodWindow::for_period(Period::Monthly, &dec);
        assert_eq!(ws.first_day(), NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
        assert_eq!(ws.last_day(), NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[test]
    fn test_yearly_window() {
        let ws = PeriodWindow::for_period(Period::Yearly, &now());
        assert_eq!(ws.key, "2026");
        assert_eq!(ws.start, at(2026, 1, 1, 0, 0, 0));
        assert_eq!(ws.last_day(), NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[test]
    fn test_window_uses_now_time_zone() {
        // 02:00 UTC on Oct 1 is still Sep 30 in UTC-5
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 9, 30, 21, 0, 0).unwrap();
        let ws = PeriodWindow::for_period(Period::Monthly, &now);
        assert_eq!(ws.key, "2026-09");
        assert_eq!(ws.days_in_month(), 30);
    }

    #[test]
    fn test_custom_weekly_days() {
        let ws = PeriodWindow::with_weekly_days(Period::Weekly, &now(), 14);
        assert_eq!(ws.start, at(2026, 10, 2, 12, 0, 0));
    }

    /// UTC-5, moving to UTC-4 at 2026-03-08 07:00 UTC (02:00 local)
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        fn switch_utc() -> NaiveDateTime {
            at(2026, 3, 8, 7, 0, 0)
        }

        fn standard() -> FixedOffset {
            FixedOffset::west_opt(5 * 3600).unwrap()
        }

        fn daylight() -> FixedOffset {
            FixedOffset::west_opt(4 * 3600).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, _local: &NaiveDate) -> LocalResult<FixedOffset> {
            LocalResult::Single(Self::standard())
        }

        // Tests never use local times inside the skipped hour
        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            if *local < at(2026, 3, 8, 2, 0, 0) {
                LocalResult::Single(Self::standard())
            } else {
                LocalResult::Single(Self::daylight())
            }
        }

        fn offset_from_utc_date(&self, _utc: &NaiveDate) -> FixedOffset {
            Self::standard()
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch_utc() {
                Self::standard()
            } else {
                Self::daylight()
            }
        }
    }

    #[test]
    fn test_weekly_window_across_dst_change() {
        // Noon EDT on Mar 10 is 16:00 UTC; a week earlier is 16:00 UTC on
        // Mar 3, which was 11:00 EST
        let now = SpringForward.from_utc_datetime(&at(2026, 3, 10, 16, 0, 0));
        let ws = PeriodWindow::for_period(Period::Weekly, &now);
        assert_eq!(ws.end, at(2026, 3, 10, 12, 0, 0));
        assert_eq!(ws.start, at(2026, 3, 3, 11, 0, 0));
    }

    #[test]
    fn test_weekly_days_out_of_range_clamps() {
        for days in [1_000_000_000_000, i64::MAX, 200_000_000] {
            let ws = PeriodWindow::with_weekly_days(Period::Weekly, &now(), days);
            assert_eq!(ws.start, NaiveDateTime::MIN);
            assert_eq!(ws.end, at(2026, 10, 16, 12, 0, 0));
            assert!(ws.contains(at(1970, 1, 1, 0, 0, 0)));
        }
    }

    #[test]
    fn test_parse_anchor() {
        assert_eq!(
            parse_anchor("2025").unwrap(),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
        );
        assert_eq!(
            parse_anchor("2025-02").unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert_eq!(
            parse_anchor(" 2025-03-15 ").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_invalid_anchor() {
        assert!(parse_anchor("invalid").is_err());
        assert!(parse_anchor("2025-13").is_err());
        assert!(parse_anchor("2025-02-30").is_err());
    }
}
