use chrono::{DateTime, Local, NaiveDate, Utc};

/// Format an entry timestamp in local time.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

/// "Oct 5"
pub fn short_date(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

/// "Oct 5, 2026"
pub fn long_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// "October 2026"
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_labels() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 5).unwrap();
        assert_eq!(short_date(date), "Oct 5");
        assert_eq!(long_date(date), "Oct 5, 2026");
        assert_eq!(month_label(date), "October 2026");
    }
}
