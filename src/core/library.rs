use std::fmt;
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum LibraryError {
    BookNotFound {
        message: String,
    },
    // Raised for unknown usernames and for credential mismatches alike, so the
    // message must never say which of the two fields was wrong.
    UserNotFound {
        message: String,
    },
    DuplicateId {
        message: String,
    },
    AccessDenied {
        message: String,
        reason_code: Option<String>,
    },
    MalformedRequest {
        message: String,
        request_id: Option<String>,
    },
    SearchTimeout {
        message: String,
        request_id: Option<String>,
    },
    Serialization {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
    },
}

impl LibraryError {
    pub fn book_not_found(message: &str) -> LibraryError {
        LibraryError::BookNotFound { message: message.to_string() }
    }

    pub fn user_not_found(message: &str) -> LibraryError {
        LibraryError::UserNotFound { message: message.to_string() }
    }

    pub fn duplicate_id(message: &str) -> LibraryError {
        LibraryError::DuplicateId { message: message.to_string() }
    }

    pub fn access_denied(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::AccessDenied { message: message.to_string(), reason_code }
    }

    pub fn malformed_request(message: &str, request_id: Option<String>) -> LibraryError {
        LibraryError::MalformedRequest { message: message.to_string(), request_id }
    }

    pub fn search_timeout(message: &str, request_id: Option<String>) -> LibraryError {
        LibraryError::SearchTimeout { message: message.to_string(), request_id }
    }

    pub fn serialization(message: &str) -> LibraryError {
        LibraryError::Serialization { message: message.to_string() }
    }

    pub fn runtime(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Runtime { message: message.to_string(), reason_code }
    }

    pub fn retryable(&self) -> bool {
        match self {
            LibraryError::BookNotFound { .. } => { false }
            LibraryError::UserNotFound { .. } => { false }
            LibraryError::DuplicateId { .. } => { false }
            LibraryError::AccessDenied { .. } => { false }
            LibraryError::MalformedRequest { .. } => { false }
            LibraryError::SearchTimeout { .. } => { true }
            LibraryError::Serialization { .. } => { false }
            LibraryError::Runtime { .. } => { true }
        }
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::serialization(
            format!("serde json parsing {:?}", err).as_str())
    }
}

impl Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::BookNotFound { message } => {
                write!(f, "{}", message)
            }
            LibraryError::UserNotFound { message } => {
                write!(f, "{}", message)
            }
            LibraryError::DuplicateId { message } => {
                write!(f, "{}", message)
            }
            LibraryError::AccessDenied { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
            LibraryError::MalformedRequest { message, request_id } => {
                write!(f, "{} {:?}", message, request_id)
            }
            LibraryError::SearchTimeout { message, request_id } => {
                write!(f, "{} {:?}", message, request_id)
            }
            LibraryError::Serialization { message } => {
                write!(f, "{}", message)
            }
            LibraryError::Runtime { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
        }
    }
}

impl std::error::Error for LibraryError {}

/// A specialized Result type for catalog, search and activity operations.
pub type LibraryResult<T> = Result<T, LibraryError>;

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum BookStatus {
    Available,
    Loaned,
    Reserved,
}

impl Display for BookStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            BookStatus::Available => write!(f, "Available"),
            BookStatus::Loaned => write!(f, "Loaned"),
            BookStatus::Reserved => write!(f, "Reserved"),
        }
    }
}
