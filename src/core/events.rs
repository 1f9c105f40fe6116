use std::fmt;
use std::fmt::{Display, Formatter};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::utils::date::serializer;

// ActivityKind defines type of catalog change announced on the activity log
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum ActivityKind {
    BookAdded,
    BookBorrowed,
    BookReturned,
    UserRegistered,
}

// ActivityEvent is a timestamped, free-text notification. It is consumed live
// by subscribers and never stored.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub event_id: String,
    pub kind: ActivityKind,
    pub key: String,
    pub message: String,
    #[serde(with = "serializer")]
    pub created_at: NaiveDateTime,
}

impl ActivityEvent {
    pub fn book_added(book_id: &str, title: &str) -> Self {
        Self::build(ActivityKind::BookAdded, book_id, format!("book added: {} ({})", title, book_id))
    }

    pub fn book_borrowed(book_id: &str, title: &str, username: &str) -> Self {
        Self::build(ActivityKind::BookBorrowed, book_id, format!("{} borrowed {} ({})", username, title, book_id))
    }

    pub fn book_returned(book_id: &str, title: &str, username: &str) -> Self {
        Self::build(ActivityKind::BookReturned, book_id, format!("{} returned {} ({})", username, title, book_id))
    }

    pub fn user_registered(username: &str) -> Self {
        Self::build(ActivityKind::UserRegistered, username, format!("user registered: {}", username))
    }

    fn build(kind: ActivityKind, key: &str, message: String) -> ActivityEvent {
        ActivityEvent {
            event_id: Uuid::new_v4().to_string(),
            kind,
            key: key.to_string(),
            message,
            created_at: Utc::now().naive_utc(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Display for ActivityEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.created_at.format("%H:%M:%S"), self.message)
    }
}
