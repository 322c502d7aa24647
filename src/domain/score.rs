/// Weekly continuity score
///
/// The score is the number of SUCCESS days across the unbroken run of
/// qualifying weeks that ends at the current week. It is a day count, not a
/// week count.

use chrono::{Datelike, Duration, NaiveDate};

use crate::domain::{Activity, ActivityStatus, Frequency};

/// Monday of the week containing `today`, clamped to the earliest
/// representable date
pub fn week_start(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_signed(Duration::days(today.weekday().num_days_from_monday() as i64))
        .unwrap_or(NaiveDate::MIN)
}

/// Compute the continuity score of a habit
///
/// `activities` must be sorted ascending by day. The current week always
/// counts. Every earlier week counts only if it has at least `frequency`
/// SUCCESS or MINIMUM days; the first week that falls short ends the streak
/// and contributes nothing. NOT_DONE entries are ignored entirely.
pub fn calculate_score(activities: &[Activity], frequency: Frequency, today: NaiveDate) -> u32 {
    let threshold = frequency.get() as u32;
    let mut window_start = week_start(today);
    let mut total = 0;

    let mut logged = activities
        .iter()
        .rev()
        .filter(|a| a.status != ActivityStatus::NotDone)
        .peekable();

    while let Some(activity) = logged.next_if(|a| a.logged_date >= window_start) {
        if activity.status == ActivityStatus::Success {
            total += 1;
        }
    }

    // Each pass either consumes at least one activity or ends the streak,
    // since an empty week never reaches a threshold of 1 or more.
    loop {
        // No earlier week exists before the calendar runs out
        let Some(previous) = window_start.checked_sub_signed(Duration::days(7)) else {
            return total;
        };
        window_start = previous;

        let mut weekly_count = 0;
        let mut weekly_successes = 0;
        while let Some(activity) = logged.next_if(|a| a.logged_date >= window_start) {
            weekly_count += 1;
            if activity.status == ActivityStatus::Success {
                weekly_successes += 1;
            }
        }

        if weekly_count < threshold {
            return total;
        }
        total += weekly_successes;
    }
}
