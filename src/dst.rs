/**
 * Daylight saving time window calculator and correction decision
 *
 * U.S. rule: DST begins the second Sunday of March and ends the first
 * Sunday of November, both at 02:00 local clock time. The transitions are
 * found by walking the calendar, so no platform timezone database is
 * consulted and the module is testable in isolation.
 */

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Local clock time at which both DST transitions take effect.
const CHANGE_HOUR: u32 = 2;

/// DST transition instants for a single year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DstWindow {
    pub year: i32,
    pub begin: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// Clock shift to apply to a camera timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DstAdjustment {
    /// Deployment spanned the fall-back transition; the uncorrected camera
    /// clock reads one hour ahead of true local time after it.
    SubtractHour,
    /// Deployment spanned the spring-forward transition; the camera clock
    /// reads one hour behind after it.
    AddHour,
    None,
}

impl DstWindow {
    /// Compute the DST window for the given year.
    ///
    /// Starts at March 1 and advances a day at a time to a Sunday, then
    /// adds a week to land on the second Sunday of March; the end anchor is
    /// the first Sunday of November.
    pub fn for_year(year: i32) -> Self {
        let march_first = NaiveDate::from_ymd_opt(year, 3, 1).expect("valid calendar date");
        let november_first = NaiveDate::from_ymd_opt(year, 11, 1).expect("valid calendar date");
        let change_time = NaiveTime::from_hms_opt(CHANGE_HOUR, 0, 0).expect("valid clock time");

        let begin_anchor = sunday_on_or_after(march_first) + Duration::days(7);
        let end_anchor = sunday_on_or_after(november_first);

        Self {
            year,
            begin: begin_anchor.and_time(change_time),
            end: end_anchor.and_time(change_time),
        }
    }
}

fn sunday_on_or_after(mut day: NaiveDate) -> NaiveDate {
    while day.weekday() != Weekday::Sun {
        day += Duration::days(1);
    }
    day
}

/// Decide the clock shift for a capture timestamp given the deployment
/// bracket (placed/checked dates, compared at midnight).
///
/// The fall-back branch takes precedence over spring-forward.
pub fn adjustment_for(
    capture: NaiveDateTime,
    placed: NaiveDate,
    checked: NaiveDate,
    window: &DstWindow,
) -> DstAdjustment {
    let placed = placed.and_time(NaiveTime::MIN);
    let checked = checked.and_time(NaiveTime::MIN);

    if capture > window.end && placed < window.end && checked > window.end {
        DstAdjustment::SubtractHour
    } else if capture > window.begin && placed < window.begin && checked > window.begin {
        DstAdjustment::AddHour
    } else {
        DstAdjustment::None
    }
}

/// Correct a camera timestamp for a DST transition spanned by the
/// deployment window.
///
/// The window is recomputed from the capture year on every call, so a batch
/// of files spanning a year boundary gets each year's own transitions.
pub fn corrected_capture_time(
    capture: NaiveDateTime,
    placed: NaiveDate,
    checked: NaiveDate,
) -> NaiveDateTime {
    let window = DstWindow::for_year(capture.year());
    match adjustment_for(capture, placed, checked, &window) {
        DstAdjustment::SubtractHour => capture - Duration::hours(1),
        DstAdjustment::AddHour => capture + Duration::hours(1),
        DstAdjustment::None => capture,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn datetime(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn window_2024_matches_known_transitions() {
        let window = DstWindow::for_year(2024);
        assert_eq!(window.begin, datetime(2024, 3, 10, 2, 0));
        assert_eq!(window.end, datetime(2024, 11, 3, 2, 0));
    }

    #[test]
    fn window_handles_march_first_falling_on_sunday() {
        // March 1, 2020 was itself a Sunday; the second Sunday is March 8.
        let window = DstWindow::for_year(2020);
        assert_eq!(window.begin, datetime(2020, 3, 8, 2, 0));
        assert_eq!(window.end, datetime(2020, 11, 1, 2, 0));
    }

    #[test]
    fn begin_is_second_march_sunday_and_end_is_first_november_sunday() {
        for year in 2010..=2035 {
            let window = DstWindow::for_year(year);
            assert_eq!(window.begin.weekday(), Weekday::Sun, "year {}", year);
            assert_eq!(window.begin.month(), 3);
            // Second Sunday can only land on the 8th through the 14th.
            assert!((8..=14).contains(&window.begin.day()), "year {}", year);
            assert_eq!(window.end.weekday(), Weekday::Sun, "year {}", year);
            assert_eq!(window.end.month(), 11);
            assert!((1..=7).contains(&window.end.day()), "year {}", year);
        }
    }

    #[test]
    fn deployment_inside_window_needs_no_adjustment() {
        let capture = datetime(2024, 6, 15, 14, 30);
        let corrected = corrected_capture_time(capture, date(2024, 5, 1), date(2024, 7, 1));
        assert_eq!(corrected, capture);
    }

    #[test]
    fn spring_forward_adds_an_hour() {
        let corrected = corrected_capture_time(
            datetime(2024, 3, 12, 6, 0),
            date(2024, 2, 1),
            date(2024, 3, 15),
        );
        assert_eq!(corrected, datetime(2024, 3, 12, 7, 0));
    }

    #[test]
    fn fall_back_subtracts_an_hour() {
        let corrected = corrected_capture_time(
            datetime(2024, 11, 5, 6, 0),
            date(2024, 10, 1),
            date(2024, 11, 10),
        );
        assert_eq!(corrected, datetime(2024, 11, 5, 5, 0));
    }

    #[test]
    fn capture_before_either_transition_is_untouched() {
        let capture = datetime(2024, 2, 20, 8, 0);
        let corrected = corrected_capture_time(capture, date(2024, 2, 1), date(2024, 3, 15));
        assert_eq!(corrected, capture);
    }

    #[test]
    fn fall_back_takes_precedence_when_both_transitions_are_bracketed() {
        // A deployment long enough to span the whole DST period satisfies
        // both branch conditions for a December capture; the end-of-DST
        // shift must win.
        let window = DstWindow::for_year(2024);
        let capture = datetime(2024, 12, 1, 12, 0);
        let placed = date(2024, 2, 1);
        let checked = date(2024, 12, 15);
        assert_eq!(
            adjustment_for(capture, placed, checked, &window),
            DstAdjustment::SubtractHour
        );
        assert_eq!(
            corrected_capture_time(capture, placed, checked),
            datetime(2024, 12, 1, 11, 0)
        );
    }

    #[test]
    fn window_is_recomputed_per_capture_year() {
        // Same bracket, captures in different years: each gets its own window.
        let placed = date(2023, 10, 20);
        let checked = date(2024, 3, 20);
        let fall_capture = datetime(2023, 11, 10, 6, 0);
        let spring_capture = datetime(2024, 3, 12, 6, 0);
        assert_eq!(
            corrected_capture_time(fall_capture, placed, checked),
            datetime(2023, 11, 10, 5, 0)
        );
        assert_eq!(
            corrected_capture_time(spring_capture, placed, checked),
            datetime(2024, 3, 12, 7, 0)
        );
    }
}
