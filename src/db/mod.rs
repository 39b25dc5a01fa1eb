use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;

use crate::error::{Error, Result};
use crate::models::{
    NewTask, NewUser, PageRequest, Status, Task, TaskChanges, TaskPage, TaskQuery, TaskSort, User,
    UserChanges, UserPage,
};

/// Version stamped into `config.schema_version` once `migrate` has run.
pub const SCHEMA_VERSION: i32 = 1;

const TASK_COLUMNS: &str = "id, title, description, status, assignee_id, created_at, updated_at";
const USER_COLUMNS: &str = "id, name, email, created_at, updated_at";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(Database { conn })
    }

    /// Create the parent directory, open, and migrate in one go.
    pub fn open_and_migrate(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::open(path)?;
        db.migrate()?;
        Ok(db)
    }

    /// Create the schema tables if they don't exist, then run any pending version-gated migrations.
    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS users (
                id         INTEGER PRIMARY KEY,
                name       TEXT NOT NULL,
                email      TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id          INTEGER PRIMARY KEY,
                title       TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status      TEXT NOT NULL DEFAULT 'TODO',
                assignee_id INTEGER REFERENCES users(id) ON DELETE SET NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks(status);
            CREATE INDEX IF NOT EXISTS idx_tasks_assignee ON tasks(assignee_id);
            ",
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO config (key, value) VALUES ('schema_version', '0')",
            [],
        )?;

        run_migrations(&self.conn)
    }

    // -- Config --

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM config WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Insert two example tasks when the task table is empty. Returns how many were added.
    pub fn seed_sample_tasks(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(0);
        }
        let first = NewTask::new("First task", Some("Description of the first task"))?;
        let second = NewTask::new("Second task", Some("Description of the second task"))?;
        self.insert_task(&first)?;
        let done = self.insert_task(&second)?;
        self.set_task_status(done.id, Status::Done)?;
        Ok(2)
    }

    // -- Tasks --

    pub fn insert_task(&self, task: &NewTask) -> Result<Task> {
        let now = timestamp(Utc::now());
        self.conn.execute(
            "INSERT INTO tasks (title, description, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![task.title, task.description, Status::Todo.as_str(), now],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(task_id = id, "task created");
        self.require_task(id)
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let task = self
            .conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id],
                row_to_task,
            )
            .optional()?;
        Ok(task)
    }

    /// Like `get_task`, but a missing row is an error.
    pub fn require_task(&self, id: i64) -> Result<Task> {
        self.get_task(id)?.ok_or_else(Error::task_not_found)
    }

    pub fn list_tasks(&self, query: &TaskQuery, page: PageRequest) -> Result<TaskPage> {
        let direction = if query.ascending { "ASC" } else { "DESC" };
        let order_key = match query.sort {
            TaskSort::CreatedAt => "created_at".to_string(),
            TaskSort::Title => "title".to_string(),
            TaskSort::Status => status_rank_sql(),
        };
        let status = query.status.map(|s| s.as_str());

        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE ?1 IS NULL OR status = ?1",
            params![status],
            |row| row.get(0),
        )?;

        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE ?1 IS NULL OR status = ?1
             ORDER BY {order_key} {direction}, id ASC
             LIMIT ?2 OFFSET ?3"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let limit = i64::try_from(page.page_size).unwrap_or(i64::MAX);
        let offset = i64::try_from(page.offset()).unwrap_or(i64::MAX);
        let rows = stmt.query_map(
            params![status, limit, offset],
            row_to_task,
        )?;
        let tasks = rows.collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(TaskPage::new(tasks, total as usize, page))
    }

    /// Case-insensitive substring search over title and description, in id order.
    pub fn search_tasks(&self, keyword: &str, page: PageRequest) -> Result<TaskPage> {
        let needle = keyword.to_lowercase();
        let matches: Vec<Task> = self
            .all_tasks()?
            .into_iter()
            .filter(|t| {
                t.title.to_lowercase().contains(&needle)
                    || t.description.to_lowercase().contains(&needle)
            })
            .collect();
        let total = matches.len();
        Ok(TaskPage::new(page.slice(matches), total, page))
    }

    pub fn update_task(&self, id: i64, changes: &TaskChanges) -> Result<Task> {
        let task = self.require_task(id)?;
        if changes.is_empty() {
            return Ok(task);
        }
        let title = changes.title.as_deref().unwrap_or(&task.title);
        let description = changes.description.as_deref().unwrap_or(&task.description);
        self.conn.execute(
            "UPDATE tasks SET title = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            params![title, description, timestamp(Utc::now()), id],
        )?;
        self.require_task(id)
    }

    pub fn set_task_status(&self, id: i64, status: Status) -> Result<Task> {
        let changed = self.conn.execute(
            "UPDATE tasks SET status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), timestamp(Utc::now()), id],
        )?;
        if changed == 0 {
            return Err(Error::task_not_found());
        }
        self.require_task(id)
    }

    /// Point a task at a user, or clear the assignment with `None`.
    pub fn assign_task(&self, id: i64, user_id: Option<i64>) -> Result<Task> {
        self.require_task(id)?;
        if let Some(uid) = user_id {
            self.require_user(uid)?;
        }
        self.conn.execute(
            "UPDATE tasks SET assignee_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![user_id, timestamp(Utc::now()), id],
        )?;
        self.require_task(id)
    }

    pub fn delete_task(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        if deleted == 0 {
            return Err(Error::task_not_found());
        }
        tracing::debug!(task_id = id, "task deleted");
        Ok(())
    }

    pub fn tasks_for_user(&self, user_id: i64) -> Result<Vec<Task>> {
        self.require_user(user_id)?;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE assignee_id = ?1 ORDER BY id ASC"
        ))?;
        let rows = stmt.query_map(params![user_id], row_to_task)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn all_tasks(&self) -> Result<Vec<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id ASC"))?;
        let rows = stmt.query_map([], row_to_task)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // -- Users --

    pub fn insert_user(&self, user: &NewUser) -> Result<User> {
        self.ensure_email_free(&user.email, None)?;
        let now = timestamp(Utc::now());
        self.conn.execute(
            "INSERT INTO users (name, email, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![user.name, user.email, now],
        )?;
        let id = self.conn.last_insert_rowid();
        tracing::debug!(user_id = id, "user created");
        self.require_user(id)
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn require_user(&self, id: i64) -> Result<User> {
        self.get_user(id)?.ok_or_else(Error::user_not_found)
    }

    /// Users ordered by name, ignoring case. Equal names keep id order.
    pub fn list_users(&self, page: PageRequest) -> Result<UserPage> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC"))?;
        let rows = stmt.query_map([], row_to_user)?;
        let mut users = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        users.sort_by_cached_key(|u| u.name.to_lowercase());
        let total = users.len();
        Ok(UserPage::new(page.slice(users), total, page))
    }

    pub fn update_user(&self, id: i64, changes: &UserChanges) -> Result<User> {
        let user = self.require_user(id)?;
        if changes.is_empty() {
            return Ok(user);
        }
        if let Some(email) = changes.email.as_deref() {
            self.ensure_email_free(email, Some(id))?;
        }
        let name = changes.name.as_deref().unwrap_or(&user.name);
        let email = changes.email.as_deref().unwrap_or(&user.email);
        self.conn.execute(
            "UPDATE users SET name = ?1, email = ?2, updated_at = ?3 WHERE id = ?4",
            params![name, email, timestamp(Utc::now()), id],
        )?;
        self.require_user(id)
    }

    /// Remove a user and unassign every task that pointed at them.
    pub fn delete_user(&self, id: i64) -> Result<()> {
        self.require_user(id)?;
        let tx = self.conn.unchecked_transaction()?;
        let unassigned = tx.execute(
            "UPDATE tasks SET assignee_id = NULL, updated_at = ?1 WHERE assignee_id = ?2",
            params![timestamp(Utc::now()), id],
        )?;
        tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        tx.commit()?;
        tracing::debug!(user_id = id, unassigned, "user deleted");
        Ok(())
    }

    fn ensure_email_free(&self, email: &str, except: Option<i64>) -> Result<()> {
        let owner: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM users WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;
        match owner {
            Some(owner) if Some(owner) != except => {
                Err(Error::Conflict("Email already in use".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Read the current schema version from the config table.
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM config WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    match value {
        Some(v) => v
            .parse::<i32>()
            .map_err(|e| Error::validation(format!("invalid schema_version value: {e}"))),
        None => Ok(0),
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO config (key, value) VALUES ('schema_version', ?1)",
        params![version.to_string()],
    )?;
    Ok(())
}

/// Bring an existing database up to `SCHEMA_VERSION`.
///
/// Version 1 is the baseline created by `migrate()`; later versions add
/// `if version < N` blocks here, each wrapped in its own transaction.
fn run_migrations(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;
    if version < SCHEMA_VERSION {
        tracing::info!(from = version, to = SCHEMA_VERSION, "migrating schema");
        set_schema_version(conn, SCHEMA_VERSION)?;
    }
    Ok(())
}

/// `CASE` expression mapping the status column to its workflow rank.
fn status_rank_sql() -> String {
    let arms: String = Status::ALL
        .iter()
        .map(|s| format!(" WHEN '{}' THEN {}", s.as_str(), s.rank()))
        .collect();
    format!("CASE status{arms} ELSE 99 END")
}

/// Fixed-width RFC 3339 so text ordering in SQL matches time ordering.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let status: String = row.get(3)?;
    let created: String = row.get(5)?;
    let updated: String = row.get(6)?;
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        status: Status::parse(&status).unwrap_or(Status::Todo),
        assignee_id: row.get(4)?,
        created_at: parse_timestamp(&created),
        updated_at: parse_timestamp(&updated),
    })
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let created: String = row.get(3)?;
    let updated: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        created_at: parse_timestamp(&created),
        updated_at: parse_timestamp(&updated),
    })
}
