/// Continuity score through the public API
use habit_share::*;
use chrono::NaiveDate;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn habit_log(entries: &[(u32, u32, ActivityStatus)]) -> Vec<Activity> {
    let habit_id = HabitId::from_string("u_h");
    entries
        .iter()
        .map(|(m, d, status)| Activity::new(habit_id.clone(), day(2024, *m, *d), *status))
        .collect()
}

#[test]
fn test_frequency_three_scenario() {
    use ActivityStatus::*;
    let activities = habit_log(&[
        (1, 2, Success),
        (1, 8, Success),
        (1, 10, Success),
        (1, 12, Minimum),
        (1, 15, Success),
        (1, 16, Success),
    ]);

    let score = calculate_score(&activities, Frequency::new(3).unwrap(), day(2024, 1, 17));
    assert_eq!(score, 4);
}

#[test]
fn test_score_counts_days_not_weeks() {
    use ActivityStatus::*;
    // Three full qualifying weeks at frequency 1, two successes each
    let activities = habit_log(&[
        (1, 1, Success),
        (1, 2, Success),
        (1, 8, Success),
        (1, 9, Success),
        (1, 15, Success),
        (1, 16, Success),
    ]);

    let score = calculate_score(&activities, Frequency::new(1).unwrap(), day(2024, 1, 17));
    assert_eq!(score, 6);
}

#[test]
fn test_failing_week_contributes_nothing() {
    use ActivityStatus::*;
    let activities = habit_log(&[(1, 8, Success), (1, 9, Success), (1, 16, Success)]);

    let score = calculate_score(&activities, Frequency::new(3).unwrap(), day(2024, 1, 17));
    assert_eq!(score, 1);
}

#[test]
fn test_week_start_on_sunday() {
    assert_eq!(week_start(day(2024, 1, 14)), day(2024, 1, 8));
}
