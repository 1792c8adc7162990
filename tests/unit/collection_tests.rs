/// Habit collection behaviour against the in-memory store
use std::sync::Arc;

use chrono::NaiveDate;
use zenith_habits::*;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn collection(today: &str) -> (HabitCollection<MemoryStorage, FixedClock>, Arc<MemoryStorage>, FixedClock) {
    let store = Arc::new(MemoryStorage::new());
    let clock = FixedClock::new(date(today));
    let collection = HabitCollection::new(UserId::new(), store.clone(), Arc::new(clock.clone()));
    (collection, store, clock)
}

#[tokio::test]
async fn test_blank_names_never_reach_the_store() {
    let (mut habits, store, _) = collection("2025-06-15");

    for name in ["", "   "] {
        let result = habits.add(name).await;
        assert!(matches!(result, Err(CollectionError::Validation(_))));
    }

    assert_eq!(habits.len(), 0);
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn test_daily_completions_build_a_streak() {
    let (mut habits, _, clock) = collection("2025-06-10");
    habits.add("Meditate").await.unwrap();
    let id = habits.habits()[0].id.clone();

    for _ in 0..3 {
        habits.complete(&id).await.unwrap();
        clock.advance_days(1);
    }
    assert_eq!(habits.get(&id).unwrap().streak, 3);

    // Skip a day
    clock.advance_days(1);
    let notice = habits.complete(&id).await.unwrap().unwrap();
    assert_eq!(notice.kind, NoticeKind::Reset);
    assert_eq!(habits.get(&id).unwrap().streak, 1);
    assert_eq!(habits.get(&id).unwrap().last_completed_date, Some(date("2025-06-14")));
}

#[tokio::test]
async fn test_repeat_completion_is_idempotent() {
    let (mut habits, store, _) = collection("2025-06-15");
    habits.add("Read").await.unwrap();
    let id = habits.habits()[0].id.clone();

    habits.complete(&id).await.unwrap();
    let writes = store.write_count();
    let before = habits.get(&id).unwrap().clone();

    let notice = habits.complete(&id).await.unwrap().unwrap();
    assert_eq!(notice.kind, NoticeKind::AlreadyDone);
    assert_eq!(store.write_count(), writes);
    assert_eq!(habits.get(&id).unwrap(), &before);
}

#[tokio::test]
async fn test_failed_write_leaves_state_alone() {
    let (mut habits, store, _) = collection("2025-06-15");
    habits.add("Read").await.unwrap();
    let id = habits.habits()[0].id.clone();

    store.set_fail_writes(true);
    let notice = habits.dispatch(Intent::Complete(id.clone())).await.unwrap();
    assert!(notice.is_error());
    assert_eq!(habits.get(&id).unwrap().streak, 0);

    let notice = habits.dispatch(Intent::Delete(id.clone())).await.unwrap();
    assert!(notice.is_error());
    assert_eq!(habits.len(), 1);
}

#[tokio::test]
async fn test_unknown_id_is_a_no_op() {
    let (mut habits, store, _) = collection("2025-06-15");
    habits.add("Read").await.unwrap();
    let writes = store.write_count();

    assert!(habits.delete(&HabitId::new()).await.unwrap().is_none());
    assert!(habits.complete(&HabitId::new()).await.unwrap().is_none());
    assert_eq!(habits.len(), 1);
    assert_eq!(store.write_count(), writes);
}
