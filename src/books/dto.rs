use serde::{Deserialize, Serialize};
use crate::books::Book;
use crate::core::domain::Identifiable;
use crate::core::library::BookStatus;
use crate::search::protocol::SnapshotEntry;

// BookDto is the catalog record for a single book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDto {
    pub book_id: String,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub pages: u32,
    pub genre: String,
    pub summary: Option<String>,
    pub book_status: BookStatus,
    pub borrow_count: u32,
}

impl BookDto {
    pub fn new(book_id: &str, title: &str, author: &str) -> BookDto {
        BookDto {
            book_id: book_id.to_string(),
            title: title.to_string(),
            author: author.to_string(),
            isbn: "".to_string(),
            pages: 0,
            genre: "".to_string(),
            summary: None,
            book_status: BookStatus::Available,
            borrow_count: 0,
        }
    }

    pub fn with_details(mut self, isbn: &str, pages: u32, genre: &str, summary: Option<&str>) -> Self {
        self.isbn = isbn.to_string();
        self.pages = pages;
        self.genre = genre.to_string();
        self.summary = summary.map(str::to_string);
        self
    }
}

impl Identifiable for BookDto {
    fn id(&self) -> String {
        self.book_id.to_string()
    }
}

impl Book for BookDto {
    fn status(&self) -> BookStatus {
        self.book_status
    }
}

impl From<&BookDto> for SnapshotEntry {
    fn from(other: &BookDto) -> Self {
        SnapshotEntry::new(other.book_id.as_str(), other.title.as_str(), other.author.as_str())
    }
}
