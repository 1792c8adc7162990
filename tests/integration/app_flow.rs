/// End-to-end application flow on a SQLite database
use std::sync::Arc;

use chrono::NaiveDate;
use tempfile::NamedTempFile;
use zenith_habits::*;

type SqliteApp = HabitTrackerApp<SqliteStorage, LocalAuthGateway<SqliteStorage>, FixedClock>;

fn app_at(path: std::path::PathBuf, clock: &FixedClock) -> SqliteApp {
    let storage = Arc::new(SqliteStorage::new(path).expect("Failed to create storage"));
    let auth = LocalAuthGateway::new(storage.clone());
    HabitTrackerApp::new(storage, auth, Arc::new(clock.clone()))
}

#[tokio::test]
async fn test_streak_persists_across_restarts() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let path = temp_file.path().to_path_buf();
    let clock = FixedClock::new(NaiveDate::from_ymd_opt(2025, 6, 14).unwrap());

    let id = {
        let mut app = app_at(path.clone(), &clock);
        app.sign_up("ada@example.com", "secret1").await.unwrap();
        app.add("Journal").await.unwrap();
        let id = app.habits().unwrap()[0].id.clone();
        app.complete(&id).await.unwrap();
        id
    };

    clock.advance_days(1);
    let mut app = app_at(path, &clock);
    let notices = app.sign_in("Ada@Example.com", "secret1").await.unwrap();
    assert_eq!(notices[1].message, "Loaded 1 habit.");

    let notice = app.complete(&id).await.unwrap().unwrap();
    assert_eq!(notice.kind, NoticeKind::Extended);
    assert_eq!(notice.message, "Streak increased to 2! Keep it up!");

    let habit = &app.habits().unwrap()[0];
    assert_eq!(habit.streak, 2);
    assert_eq!(habit.last_completed_date, NaiveDate::from_ymd_opt(2025, 6, 15));
}

#[tokio::test]
async fn test_password_recovery_flow() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let clock = FixedClock::new(NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
    let storage = Arc::new(SqliteStorage::new(temp_file.path().to_path_buf()).unwrap());

    let mut gateway = LocalAuthGateway::new(storage.clone());
    gateway.sign_up("ada@example.com", "secret1").await.unwrap();
    gateway.sign_out().await;
    let token = gateway
        .request_password_reset("ada@example.com")
        .await
        .unwrap()
        .expect("registered email gets a token");

    let mut app = HabitTrackerApp::new(storage, gateway, Arc::new(clock));
    app.recover(&token).await.unwrap();
    assert!(matches!(app.add("Read").await, Err(AppError::RecoveryPending)));

    app.update_password("another1", "another1").await.unwrap();
    app.sign_out().await;

    assert!(app.sign_in("ada@example.com", "secret1").await.is_err());
    assert!(app.sign_in("ada@example.com", "another1").await.is_ok());
}
