/// SQLite storage against a database file on disk
use chrono::{Duration, NaiveDate, Utc};
use tempfile::NamedTempFile;
use zenith_habits::*;

#[tokio::test]
async fn test_habits_survive_reopen() {
    let temp_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = temp_file.path().to_path_buf();
    let owner = UserId::new();

    let created = {
        let storage = SqliteStorage::new(db_path.clone()).expect("Failed to create storage");
        let habit = storage
            .create(NewHabit::new(owner.clone(), "Stretch").unwrap())
            .await
            .unwrap();
        storage
            .update(
                &owner,
                &habit.id,
                HabitChanges::completion(1, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()),
            )
            .await
            .unwrap()
    };

    let storage = SqliteStorage::new(db_path).expect("Failed to reopen storage");
    let habits = storage.list(&owner).await.unwrap();
    assert_eq!(habits, vec![created]);
}

#[tokio::test]
async fn test_owners_are_isolated() {
    let storage = SqliteStorage::in_memory().unwrap();
    let ada = UserId::new();
    let bob = UserId::new();

    let habit = storage.create(NewHabit::new(ada.clone(), "Read").unwrap()).await.unwrap();

    assert!(storage.list(&bob).await.unwrap().is_empty());
    assert!(matches!(
        storage.delete(&bob, &habit.id).await,
        Err(StorageError::HabitNotFound { .. })
    ));
    assert_eq!(storage.list(&ada).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_reset_tokens_are_single_use() {
    let storage = SqliteStorage::in_memory().unwrap();
    let now = Utc::now();
    let account = Account {
        id: UserId::new(),
        email: "ada@example.com".to_string(),
        password_hash: "hash".to_string(),
        created_at: now,
    };
    storage.insert_account(&account).await.unwrap();

    let token = ResetToken {
        token: "tok".to_string(),
        user_id: account.id.clone(),
        expires_at: now + Duration::minutes(5),
    };
    storage.insert_reset_token(&token).await.unwrap();

    assert_eq!(storage.take_reset_token("tok", now).await.unwrap(), Some(account.id.clone()));
    assert_eq!(storage.take_reset_token("tok", now).await.unwrap(), None);
}
