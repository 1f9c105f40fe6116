pub mod service;

use async_trait::async_trait;
use crate::books::dto::BookDto;
use crate::core::library::{BookStatus, LibraryResult};
use crate::search::protocol::SnapshotEntry;
use crate::users::dto::UserDto;

// BorrowOutcome separates "could not lend it right now" from real failures.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BorrowOutcome {
    Borrowed,
    Unavailable(BookStatus),
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ReturnOutcome {
    Returned,
    NotBorrowed,
}

/// Owner of all book and user records. Mutations take `&mut self`: the store
/// has exactly one owner and hands out copies, never references.
#[async_trait]
pub trait CatalogStore: Sync + Send {
    async fn add_book(&mut self, book: BookDto) -> LibraryResult<()>;
    async fn borrow_book(&mut self, username: &str, book_id: &str) -> LibraryResult<BorrowOutcome>;
    async fn return_book(&mut self, username: &str, book_id: &str) -> LibraryResult<ReturnOutcome>;
    async fn register_user(&mut self, username: &str, password: &str, is_admin: bool);
    fn login(&self, username: &str, password: &str) -> LibraryResult<UserDto>;
    fn search_by_title(&self, keyword: &str) -> Vec<BookDto>;
    fn snapshot(&self) -> Vec<SnapshotEntry>;
    fn find_book_by_id(&self, id: &str) -> LibraryResult<BookDto>;
    fn find_user(&self, username: &str) -> LibraryResult<UserDto>;
    fn list_books(&self) -> Vec<BookDto>;
    fn authors(&self) -> Vec<String>;
    fn book_count(&self) -> usize;
}
