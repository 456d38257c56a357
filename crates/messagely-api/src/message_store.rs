use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use messagely_db::Database;
use messagely_db::models::{MessageRow, UserSummaryRow};
use messagely_types::models::{
    MessageDetail, NewMessage, ReadReceipt, ReceivedMessage, SentMessage, UserSummary,
};

use crate::error::ApiError;

/// Direct messages between two users.
pub struct MessageStore {
    db: Arc<Database>,
}

impl MessageStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a message from `from` to `to`. The recipient is not looked up
    /// first; an unknown `to` is refused by the schema's foreign key.
    pub fn create(&self, from: &str, to: &str, body: &str) -> Result<NewMessage, ApiError> {
        let row = MessageRow {
            id: Uuid::new_v4(),
            from_username: from.to_string(),
            to_username: to.to_string(),
            body: body.to_string(),
            sent_at: Utc::now(),
            read_at: None,
        };

        self.db.insert_message(&row)?;

        Ok(NewMessage {
            id: row.id,
            from_username: row.from_username,
            to_username: row.to_username,
            body: row.body,
            sent_at: row.sent_at,
        })
    }

    pub fn get(&self, id: Uuid) -> Result<MessageDetail, ApiError> {
        let row = self
            .db
            .get_message_detail(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Message {}", id)))?;

        Ok(MessageDetail {
            id: row.id,
            body: row.body,
            sent_at: row.sent_at,
            read_at: row.read_at,
            from_user: summary(row.from_user),
            to_user: summary(row.to_user),
        })
    }

    /// Stamp `read_at` with the current time. Calling again re-stamps it.
    pub fn mark_read(&self, id: Uuid) -> Result<ReadReceipt, ApiError> {
        let read_at = Utc::now();
        if !self.db.mark_read(id, read_at)? {
            return Err(ApiError::NotFound(format!("Message {}", id)));
        }

        Ok(ReadReceipt { id, read_at })
    }

    pub fn list_sent_by(&self, username: &str) -> Result<Vec<SentMessage>, ApiError> {
        let rows = self.db.get_messages_from(username)?;
        Ok(rows
            .into_iter()
            .map(|row| SentMessage {
                id: row.id,
                body: row.body,
                sent_at: row.sent_at,
                read_at: row.read_at,
                to_user: summary(row.other),
            })
            .collect())
    }

    pub fn list_received_by(&self, username: &str) -> Result<Vec<ReceivedMessage>, ApiError> {
        let rows = self.db.get_messages_to(username)?;
        Ok(rows
            .into_iter()
            .map(|row| ReceivedMessage {
                id: row.id,
                body: row.body,
                sent_at: row.sent_at,
                read_at: row.read_at,
                from_user: summary(row.other),
            })
            .collect())
    }
}

fn summary(row: UserSummaryRow) -> UserSummary {
    UserSummary {
        username: row.username,
        first_name: row.first_name,
        last_name: row.last_name,
        phone: row.phone,
    }
}
