use chrono::{Datelike, Duration, NaiveDate, Utc, Weekday};
use chrono_tz::Tz;

/// Return the current date in the given timezone.
///
/// Scheduling decisions ("is this shift in the future?") are made against
/// store-local wall-clock dates, not UTC.
pub fn today_in(timezone: Tz) -> NaiveDate {
    Utc::now().with_timezone(&timezone).date_naive()
}

/// Monday of the week containing `date`.
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

pub fn is_monday(date: NaiveDate) -> bool {
    date.weekday() == Weekday::Mon
}

/// Day index within a Monday-aligned week: 0 = Monday .. 6 = Sunday.
pub fn day_index(date: NaiveDate) -> i16 {
    date.weekday().num_days_from_monday() as i16
}

/// The seven civil dates of the week starting at `week_start`.
pub fn week_dates(week_start: NaiveDate) -> [NaiveDate; 7] {
    std::array::from_fn(|offset| week_start + Duration::days(offset as i64))
}

/// Sunday of the week starting at `week_start`.
pub fn week_end(week_start: NaiveDate) -> NaiveDate {
    week_start + Duration::days(6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monday_of_rewinds_to_week_start() {
        // 2025-01-09 is a Thursday
        let thursday = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(monday_of(thursday), monday);
        assert_eq!(monday_of(monday), monday);
    }

    #[test]
    fn day_index_spans_monday_to_sunday() {
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        assert_eq!(day_index(monday), 0);
        assert_eq!(day_index(week_end(monday)), 6);
    }

    #[test]
    fn week_dates_are_consecutive() {
        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let dates = week_dates(monday);
        assert_eq!(dates[0], monday);
        assert_eq!(dates[6], NaiveDate::from_ymd_opt(2025, 1, 12).unwrap());
        assert!(is_monday(dates[0]));
        assert!(!is_monday(dates[3]));
    }
}
