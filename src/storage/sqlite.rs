/// SQLite implementation of the storage traits
///
/// This module provides the concrete SQLite implementation for storing
/// habits and accounts. It handles all SQL queries and data conversion.
/// Statements run synchronously while the connection mutex is held; the
/// async trait methods are thin wrappers around them.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::{Account, Habit, HabitChanges, HabitId, NewHabit, ResetToken, UserId};
use crate::storage::{migrations, AccountStore, HabitStore, StorageError};

const HABIT_COLUMNS: &str =
    "id, owner_id, name, streak, last_completed_date, created_at, updated_at";

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, created_at";

/// SQLite-based storage implementation
///
/// This struct holds a connection to the SQLite database and implements
/// both `HabitStore` and `AccountStore`.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    ///
    /// This opens the database file and runs any necessary migrations
    /// to ensure the schema is up to date.
    pub fn new(db_path: PathBuf) -> Result<Self, StorageError> {
        let conn = Connection::open(&db_path)
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;

        let storage = Self::with_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(storage)
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Connection(format!("Failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute("PRAGMA foreign_keys = ON", [])
            .map_err(|e| StorageError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        migrations::initialize_database(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Connection("Connection lock poisoned".to_string()))
    }

    /// Habits for one owner, newest first
    pub fn list_habits(&self, owner: &UserId) -> Result<Vec<Habit>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM habits WHERE owner_id = ?1 ORDER BY created_at DESC, rowid DESC",
            HABIT_COLUMNS
        ))?;

        let habit_iter = stmt.query_map(params![owner.to_string()], habit_from_row)?;

        let mut habits = Vec::new();
        for habit in habit_iter {
            habits.push(habit?);
        }

        Ok(habits)
    }

    /// Get one habit, scoped to its owner
    pub fn get_habit(&self, owner: &UserId, id: &HabitId) -> Result<Habit, StorageError> {
        let conn = self.conn()?;
        Self::get_habit_with(&conn, owner, id)
    }

    fn get_habit_with(conn: &Connection, owner: &UserId, id: &HabitId) -> Result<Habit, StorageError> {
        let result = conn.query_row(
            &format!(
                "SELECT {} FROM habits WHERE id = ?1 AND owner_id = ?2",
                HABIT_COLUMNS
            ),
            params![id.to_string(), owner.to_string()],
            habit_from_row,
        );

        match result {
            Ok(habit) => Ok(habit),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(StorageError::HabitNotFound {
                habit_id: id.to_string(),
            }),
            Err(e) => Err(StorageError::Query(e)),
        }
    }

    /// Insert a new habit, assigning its ID and timestamps
    pub fn create_habit(&self, new_habit: NewHabit) -> Result<Habit, StorageError> {
        let habit = new_habit.into_habit(HabitId::new(), now());

        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO habits ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                HABIT_COLUMNS
            ),
            params![
                habit.id.to_string(),
                habit.owner_id.to_string(),
                habit.name,
                habit.streak,
                habit.last_completed_date.map(|d| d.to_string()),
                timestamp(&habit.created_at),
                timestamp(&habit.updated_at),
            ],
        )?;

        tracing::debug!("Created habit: {} ({})", habit.name, habit.id);
        Ok(habit)
    }

    /// Apply changes to a habit owned by `owner`
    pub fn update_habit(
        &self,
        owner: &UserId,
        id: &HabitId,
        changes: &HabitChanges,
    ) -> Result<Habit, StorageError> {
        let conn = self.conn()?;
        let mut habit = Self::get_habit_with(&conn, owner, id)?;
        habit.apply(changes, now());

        let rows_affected = conn.execute(
            "UPDATE habits SET
                name = ?3,
                streak = ?4,
                last_completed_date = ?5,
                updated_at = ?6
             WHERE id = ?1 AND owner_id = ?2",
            params![
                habit.id.to_string(),
                habit.owner_id.to_string(),
                habit.name,
                habit.streak,
                habit.last_completed_date.map(|d| d.to_string()),
                timestamp(&habit.updated_at),
            ],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: id.to_string(),
            });
        }

        tracing::debug!(
            "Updated habit: {} ({}), streak {}",
            habit.name,
            habit.id,
            habit.streak
        );
        Ok(habit)
    }

    /// Permanently delete a habit owned by `owner`
    pub fn delete_habit(&self, owner: &UserId, id: &HabitId) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let rows_affected = conn.execute(
            "DELETE FROM habits WHERE id = ?1 AND owner_id = ?2",
            params![id.to_string(), owner.to_string()],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::HabitNotFound {
                habit_id: id.to_string(),
            });
        }

        tracing::debug!("Deleted habit: {}", id);
        Ok(())
    }

    pub fn insert_account_row(&self, account: &Account) -> Result<(), StorageError> {
        let conn = self.conn()?;

        let exists: Option<String> = conn
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![account.email],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StorageError::DuplicateAccount {
                email: account.email.clone(),
            });
        }

        conn.execute(
            &format!(
                "INSERT INTO users ({}) VALUES (?1, ?2, ?3, ?4)",
                ACCOUNT_COLUMNS
            ),
            params![
                account.id.to_string(),
                account.email,
                account.password_hash,
                timestamp(&account.created_at),
            ],
        )?;

        tracing::debug!("Created account: {}", account.id);
        Ok(())
    }

    pub fn account_by_email(&self, email: &str) -> Result<Option<Account>, StorageError> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?1", ACCOUNT_COLUMNS),
                params![email],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    pub fn account_by_id(&self, id: &UserId) -> Result<Option<Account>, StorageError> {
        let conn = self.conn()?;
        let account = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?1", ACCOUNT_COLUMNS),
                params![id.to_string()],
                account_from_row,
            )
            .optional()?;
        Ok(account)
    }

    pub fn update_password(&self, id: &UserId, hash: &str) -> Result<(), StorageError> {
        let conn = self.conn()?;
        let rows_affected = conn.execute(
            "UPDATE users SET password_hash = ?2 WHERE id = ?1",
            params![id.to_string(), hash],
        )?;

        if rows_affected == 0 {
            return Err(StorageError::AccountNotFound {
                user_id: id.to_string(),
            });
        }

        tracing::debug!("Updated password for account: {}", id);
        Ok(())
    }

    pub fn insert_reset(&self, token: &ResetToken) -> Result<(), StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO password_resets (token, user_id, expires_at, used) VALUES (?1, ?2, ?3, 0)",
            params![
                token.token,
                token.user_id.to_string(),
                timestamp(&token.expires_at),
            ],
        )?;
        Ok(())
    }

    pub fn take_reset(&self, token: &str, now: DateTime<Utc>) -> Result<Option<UserId>, StorageError> {
        let conn = self.conn()?;

        let row: Option<(String, String, bool)> = conn
            .query_row(
                "SELECT user_id, expires_at, used FROM password_resets WHERE token = ?1",
                params![token],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let (user_id, expires_at, used) = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let expires_at = parse_timestamp(&expires_at)
            .map_err(|_| StorageError::Corrupt(format!("bad reset expiry for token {}", token)))?;
        if used || now >= expires_at {
            return Ok(None);
        }

        conn.execute(
            "UPDATE password_resets SET used = 1 WHERE token = ?1",
            params![token],
        )?;

        let user_id = UserId::from_string(&user_id)
            .map_err(|_| StorageError::Corrupt(format!("bad user id for token {}", token)))?;
        Ok(Some(user_id))
    }
}

#[async_trait]
impl HabitStore for SqliteStorage {
    async fn list(&self, owner: &UserId) -> Result<Vec<Habit>, StorageError> {
        self.list_habits(owner)
    }

    async fn create(&self, habit: NewHabit) -> Result<Habit, StorageError> {
        self.create_habit(habit)
    }

    async fn update(
        &self,
        owner: &UserId,
        id: &HabitId,
        changes: HabitChanges,
    ) -> Result<Habit, StorageError> {
        self.update_habit(owner, id, &changes)
    }

    async fn delete(&self, owner: &UserId, id: &HabitId) -> Result<(), StorageError> {
        self.delete_habit(owner, id)
    }
}

#[async_trait]
impl AccountStore for SqliteStorage {
    async fn insert_account(&self, account: &Account) -> Result<(), StorageError> {
        self.insert_account_row(account)
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StorageError> {
        self.account_by_email(email)
    }

    async fn find_account(&self, id: &UserId) -> Result<Option<Account>, StorageError> {
        self.account_by_id(id)
    }

    async fn set_password(&self, id: &UserId, hash: &str) -> Result<(), StorageError> {
        self.update_password(id, hash)
    }

    async fn insert_reset_token(&self, token: &ResetToken) -> Result<(), StorageError> {
        self.insert_reset(token)
    }

    async fn take_reset_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, StorageError> {
        self.take_reset(token, now)
    }
}

/// Current time at the precision the database keeps
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    Ok(DateTime::parse_from_rfc3339(s)?.with_timezone(&Utc))
}

fn invalid_column(index: usize, what: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(index, what.to_string(), rusqlite::types::Type::Text)
}

fn habit_from_row(row: &Row<'_>) -> rusqlite::Result<Habit> {
    let id_str: String = row.get(0)?;
    let id = HabitId::from_string(&id_str).map_err(|_| invalid_column(0, "Invalid UUID"))?;

    let owner_str: String = row.get(1)?;
    let owner_id = UserId::from_string(&owner_str).map_err(|_| invalid_column(1, "Invalid UUID"))?;

    let last_completed_str: Option<String> = row.get(4)?;
    let last_completed_date = match last_completed_str {
        Some(s) => Some(
            NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| invalid_column(4, "Invalid date"))?,
        ),
        None => None,
    };

    let created_at_str: String = row.get(5)?;
    let created_at =
        parse_timestamp(&created_at_str).map_err(|_| invalid_column(5, "Invalid datetime"))?;

    let updated_at_str: String = row.get(6)?;
    let updated_at =
        parse_timestamp(&updated_at_str).map_err(|_| invalid_column(6, "Invalid datetime"))?;

    Ok(Habit {
        id,
        owner_id,
        name: row.get(2)?,
        streak: row.get(3)?,
        last_completed_date,
        created_at,
        updated_at,
    })
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    let id_str: String = row.get(0)?;
    let id = UserId::from_string(&id_str).map_err(|_| invalid_column(0, "Invalid UUID"))?;

    let created_at_str: String = row.get(3)?;
    let created_at =
        parse_timestamp(&created_at_str).map_err(|_| invalid_column(3, "Invalid datetime"))?;

    Ok(Account {
        id,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        created_at,
    })
}
