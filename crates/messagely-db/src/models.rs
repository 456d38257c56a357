//! Database row types — these map directly to SQLite rows.
//! Distinct from messagely-types API models to keep the DB layer independent.

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub struct UserRow {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub join_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

/// Columns of `users` that other users may see.
pub struct UserSummaryRow {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

pub struct MessageRow {
    pub id: Uuid,
    pub from_username: String,
    pub to_username: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// A message joined with both its sender and recipient.
pub struct MessageDetailRow {
    pub id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub from_user: UserSummaryRow,
    pub to_user: UserSummaryRow,
}

/// A message joined with the party on the other side: the recipient for
/// an outbox listing, the sender for an inbox listing.
pub struct CorrespondenceRow {
    pub id: Uuid,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub other: UserSummaryRow,
}
