/// Streak decisions on concrete calendar scenarios
use chrono::NaiveDate;
use zenith_habits::*;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn test_yesterday_extends() {
    let outcome = decide_completion(5, Some(date("2025-06-14")), date("2025-06-15"));
    assert_eq!(
        outcome,
        CompletionOutcome::StreakExtended(StreakChange {
            new_streak: 6,
            new_date: date("2025-06-15"),
        })
    );
}

#[test]
fn test_never_completed_starts_at_one() {
    let outcome = decide_completion(12, None, date("2025-06-20"));
    assert_eq!(outcome.kind(), CompletionKind::FirstCompletion);
    assert_eq!(outcome.change().unwrap().new_streak, 1);
}

#[test]
fn test_two_day_gap_resets() {
    let outcome = decide_completion(2, Some(date("2025-06-13")), date("2025-06-15"));
    assert_eq!(outcome.kind(), CompletionKind::StreakReset);
    assert_eq!(outcome.change().unwrap().new_streak, 1);
    assert_eq!(outcome.change().unwrap().new_date, date("2025-06-15"));
}

#[test]
fn test_same_day_writes_nothing() {
    let outcome = decide_completion(3, Some(date("2025-06-15")), date("2025-06-15"));
    assert_eq!(outcome, CompletionOutcome::AlreadyCompletedToday);
    assert!(!outcome.requires_write());
    assert_eq!(outcome.notice().level, NoticeLevel::Info);
}

#[test]
fn test_month_and_year_rollover_extend() {
    let outcome = decide_completion(30, Some(date("2025-06-30")), date("2025-07-01"));
    assert_eq!(outcome.kind(), CompletionKind::StreakExtended);

    let outcome = decide_completion(1, Some(date("2024-12-31")), date("2025-01-01"));
    assert_eq!(outcome.change().unwrap().new_streak, 2);
}

#[test]
fn test_future_last_date_resets() {
    let outcome = decide_completion(4, Some(date("2025-06-16")), date("2025-06-15"));
    assert_eq!(outcome.kind(), CompletionKind::StreakReset);
}

#[test]
fn test_day_boundary_decides_the_day() {
    let instant = chrono::DateTime::parse_from_rfc3339("2025-06-14T23:30:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);

    assert_eq!(DayBoundary::Utc.date_of(instant), date("2025-06-14"));
    let east: DayBoundary = "+02:00".parse().unwrap();
    assert_eq!(east.date_of(instant), date("2025-06-15"));
}
