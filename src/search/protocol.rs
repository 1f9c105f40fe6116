use std::fmt;
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;
use crate::core::library::{LibraryError, LibraryResult};

// SnapshotEntry is an owned copy of the searchable part of one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub id: String,
    pub title: String,
    pub author: String,
}

impl SnapshotEntry {
    pub fn new(id: &str, title: &str, author: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
        }
    }
}

impl Display for SnapshotEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} by {}", self.title, self.author)
    }
}

fn new_request_id() -> String {
    Uuid::new_v4().to_string()
}

// SearchRequest carries everything the worker needs. Snapshot and keyword are
// optional so that a request decoded from outside the process can still be
// answered with a MalformedRequest instead of being dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default = "new_request_id")]
    pub request_id: String,
    pub snapshot: Option<Vec<SnapshotEntry>>,
    pub keyword: Option<String>,
}

impl SearchRequest {
    pub fn new(snapshot: Vec<SnapshotEntry>, keyword: &str) -> Self {
        Self {
            request_id: new_request_id(),
            snapshot: Some(snapshot),
            keyword: Some(keyword.to_string()),
        }
    }

    pub fn from_json(json: &str) -> LibraryResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub(crate) fn into_parts(self) -> Result<(Vec<SnapshotEntry>, String), String> {
        match (self.snapshot, self.keyword) {
            (Some(snapshot), Some(keyword)) => Ok((snapshot, keyword)),
            (None, Some(_)) => Err("missing snapshot".to_string()),
            (Some(_), None) => Err("missing keyword".to_string()),
            (None, None) => Err("missing snapshot and keyword".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SearchFault {
    Malformed(String),
    Internal(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub request_id: String,
    pub matches: Vec<SnapshotEntry>,
    pub error: Option<SearchFault>,
}

impl SearchResponse {
    pub fn matched(request_id: &str, matches: Vec<SnapshotEntry>) -> Self {
        Self { request_id: request_id.to_string(), matches, error: None }
    }

    pub fn failed(request_id: &str, fault: SearchFault) -> Self {
        Self { request_id: request_id.to_string(), matches: vec![], error: Some(fault) }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn into_result(self) -> LibraryResult<Vec<SnapshotEntry>> {
        match self.error {
            None => Ok(self.matches),
            Some(SearchFault::Malformed(reason)) => Err(LibraryError::malformed_request(
                format!("malformed search request: {}", reason).as_str(), Some(self.request_id))),
            Some(SearchFault::Internal(reason)) => Err(LibraryError::runtime(
                format!("search failed: {}", reason).as_str(), Some(self.request_id))),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum WorkerState {
    Idle,
    Matching,
    Stopped,
}

impl Display for WorkerState {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            WorkerState::Idle => write!(f, "Idle"),
            WorkerState::Matching => write!(f, "Matching"),
            WorkerState::Stopped => write!(f, "Stopped"),
        }
    }
}

/// Messages accepted by the search worker inbox.
pub(crate) enum WorkerCommand {
    Search {
        request: SearchRequest,
        reply: oneshot::Sender<SearchResponse>,
    },
    Shutdown {
        ack: oneshot::Sender<()>,
    },
}
