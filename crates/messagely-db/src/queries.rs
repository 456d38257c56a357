use crate::Database;
use crate::models::{CorrespondenceRow, MessageDetailRow, MessageRow, UserRow, UserSummaryRow};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row};
use uuid::Uuid;

impl Database {
    // -- Users --

    /// Insert a new user. Returns false when the username is already taken,
    /// leaving the existing row untouched.
    pub fn create_user(&self, user: &UserRow) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password, first_name, last_name, phone, join_at, last_login_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    user.username,
                    user.password,
                    user.first_name,
                    user.last_name,
                    user.phone,
                    user.join_at,
                    user.last_login_at,
                ],
            );

            match inserted {
                Ok(_) => Ok(true),
                Err(rusqlite::Error::SqliteFailure(e, _)) if is_duplicate_key(e.extended_code) => {
                    Ok(false)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_password_hash(&self, username: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT password FROM users WHERE username = ?1",
                [username],
                |row| row.get(0),
            )
            .optional()
        })
    }

    /// Stamp `last_login_at`. Unknown usernames update nothing and are not an error.
    pub fn touch_login(&self, username: &str, at: DateTime<Utc>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET last_login_at = ?1 WHERE username = ?2",
                rusqlite::params![at, username],
            )?;
            Ok(())
        })
    }

    pub fn list_users(&self) -> Result<Vec<UserSummaryRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT username, first_name, last_name, phone FROM users ORDER BY username",
            )?;

            let rows = stmt
                .query_map([], |row| summary_at(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, message: &MessageRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, from_username, to_username, body, sent_at, read_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    message.id,
                    message.from_username,
                    message.to_username,
                    message.body,
                    message.sent_at,
                    message.read_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_message_detail(&self, id: Uuid) -> Result<Option<MessageDetailRow>> {
        self.with_conn(|conn| query_message_detail(conn, id))
    }

    /// Set `read_at`, overwriting any earlier value. Returns false if no
    /// message has this id.
    pub fn mark_read(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET read_at = ?1 WHERE id = ?2",
                rusqlite::params![at, id],
            )?;
            Ok(changed > 0)
        })
    }

    /// Messages sent by `username`, each joined with its recipient.
    pub fn get_messages_from(&self, username: &str) -> Result<Vec<CorrespondenceRow>> {
        self.with_conn(|conn| {
            query_correspondence(
                conn,
                "SELECT m.id, m.body, m.sent_at, m.read_at,
                        u.username, u.first_name, u.last_name, u.phone
                 FROM messages m
                 JOIN users u ON u.username = m.to_username
                 WHERE m.from_username = ?1
                 ORDER BY m.sent_at",
                username,
            )
        })
    }

    /// Messages addressed to `username`, each joined with its sender.
    pub fn get_messages_to(&self, username: &str) -> Result<Vec<CorrespondenceRow>> {
        self.with_conn(|conn| {
            query_correspondence(
                conn,
                "SELECT m.id, m.body, m.sent_at, m.read_at,
                        u.username, u.first_name, u.last_name, u.phone
                 FROM messages m
                 JOIN users u ON u.username = m.from_username
                 WHERE m.to_username = ?1
                 ORDER BY m.sent_at",
                username,
            )
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT username, password, first_name, last_name, phone, join_at, last_login_at
         FROM users WHERE username = ?1",
    )?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                username: row.get(0)?,
                password: row.get(1)?,
                first_name: row.get(2)?,
                last_name: row.get(3)?,
                phone: row.get(4)?,
                join_at: row.get(5)?,
                last_login_at: row.get(6)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_message_detail(conn: &Connection, id: Uuid) -> Result<Option<MessageDetailRow>> {
    // Summaries come from the live user rows, so profile edits show up here
    let mut stmt = conn.prepare(
        "SELECT m.id, m.body, m.sent_at, m.read_at,
                f.username, f.first_name, f.last_name, f.phone,
                t.username, t.first_name, t.last_name, t.phone
         FROM messages m
         JOIN users f ON f.username = m.from_username
         JOIN users t ON t.username = m.to_username
         WHERE m.id = ?1",
    )?;

    let row = stmt
        .query_row([id], |row| {
            Ok(MessageDetailRow {
                id: row.get(0)?,
                body: row.get(1)?,
                sent_at: row.get(2)?,
                read_at: row.get(3)?,
                from_user: summary_at(row, 4)?,
                to_user: summary_at(row, 8)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_correspondence(
    conn: &Connection,
    sql: &str,
    username: &str,
) -> Result<Vec<CorrespondenceRow>> {
    let mut stmt = conn.prepare(sql)?;

    let rows = stmt
        .query_map([username], |row| {
            Ok(CorrespondenceRow {
                id: row.get(0)?,
                body: row.get(1)?,
                sent_at: row.get(2)?,
                read_at: row.get(3)?,
                other: summary_at(row, 4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn is_duplicate_key(code: std::ffi::c_int) -> bool {
    code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        || code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
}

/// Read four consecutive summary columns starting at `start`.
fn summary_at(row: &Row<'_>, start: usize) -> rusqlite::Result<UserSummaryRow> {
    Ok(UserSummaryRow {
        username: row.get(start)?,
        first_name: row.get(start + 1)?,
        last_name: row.get(start + 2)?,
        phone: row.get(start + 3)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
