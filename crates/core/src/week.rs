//! Week calendar.
//!
//! Every component buckets articles and prices with the same convention:
//! a week is the seven days anchored on the Sunday on or before a date.
//! The direction predictor additionally labels rows by Friday-anchored
//! weeks when resampling daily bars.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Returns the Sunday on or before `date`.
#[must_use]
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_sunday();
    date - Duration::days(i64::from(offset))
}

/// Returns the Saturday at the end of the week containing `date`.
#[must_use]
pub fn week_end(date: NaiveDate) -> NaiveDate {
    week_start(date) + Duration::days(6)
}

/// Formats the week bucket of `date` as `YYYY-MM-DD`.
#[must_use]
pub fn week_label(date: NaiveDate) -> String {
    week_start(date).format("%Y-%m-%d").to_string()
}

/// Returns the Friday on or after `date`.
#[must_use]
pub fn friday_anchor(date: NaiveDate) -> NaiveDate {
    let weekday = date.weekday().num_days_from_monday();
    let friday = Weekday::Fri.num_days_from_monday();
    let offset = (friday + 7 - weekday) % 7;
    date + Duration::days(i64::from(offset))
}

/// Returns the first Friday strictly after `date`.
#[must_use]
pub fn next_friday(date: NaiveDate) -> NaiveDate {
    let anchored = friday_anchor(date);
    if anchored == date {
        anchored + Duration::days(7)
    } else {
        anchored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn saturday_maps_to_previous_sunday() {
        assert_eq!(week_start(date(2025, 6, 7)), date(2025, 6, 1));
    }

    #[test]
    fn sunday_maps_to_itself() {
        assert_eq!(week_start(date(2025, 6, 8)), date(2025, 6, 8));
    }

    #[test]
    fn week_start_is_always_sunday_within_seven_days() {
        let mut day = date(2024, 1, 1);
        for _ in 0..400 {
            let start = week_start(day);
            assert_eq!(start.weekday(), Weekday::Sun);
            let gap = (day - start).num_days();
            assert!((0..=6).contains(&gap), "gap was {gap} for {day}");
            day += Duration::days(1);
        }
    }

    #[test]
    fn week_end_is_saturday_of_same_bucket() {
        let end = week_end(date(2025, 6, 11));
        assert_eq!(end, date(2025, 6, 14));
        assert_eq!(end.weekday(), Weekday::Sat);
    }

    #[test]
    fn week_label_formats_sunday() {
        assert_eq!(week_label(date(2025, 6, 7)), "2025-06-01");
    }

    #[test]
    fn friday_anchor_is_identity_on_friday() {
        let friday = date(2025, 6, 6);
        assert_eq!(friday.weekday(), Weekday::Fri);
        assert_eq!(friday_anchor(friday), friday);
    }

    #[test]
    fn friday_anchor_moves_forward_otherwise() {
        assert_eq!(friday_anchor(date(2025, 6, 9)), date(2025, 6, 13));
        assert_eq!(friday_anchor(date(2025, 6, 7)), date(2025, 6, 13));
    }

    #[test]
    fn next_friday_is_strictly_after() {
        let friday = date(2025, 6, 6);
        assert_eq!(next_friday(friday), date(2025, 6, 13));
        assert_eq!(next_friday(date(2025, 6, 9)), date(2025, 6, 13));
    }
}
