use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use crate::books::Book;
use crate::books::dto::BookDto;
use crate::catalog::domain::{BorrowOutcome, CatalogStore, ReturnOutcome};
use crate::core::domain::Configuration;
use crate::core::library::{BookStatus, LibraryError, LibraryResult};
use crate::core::logger::Logger;
use crate::search::protocol::SnapshotEntry;
use crate::users::User;
use crate::users::dto::UserDto;

pub struct CatalogStoreImpl {
    books: Vec<BookDto>,
    index: HashMap<String, usize>,
    authors: Vec<String>,
    users: Vec<UserDto>,
    save_latency: Duration,
    shutdown: CancellationToken,
    logger: Arc<dyn Logger>,
}

impl CatalogStoreImpl {
    pub fn new(config: &Configuration, logger: Arc<dyn Logger>, shutdown: CancellationToken) -> Self {
        Self {
            books: vec![],
            index: HashMap::new(),
            authors: vec![],
            users: vec![],
            save_latency: config.save_latency,
            shutdown,
            logger,
        }
    }

    // Stands in for a storage round trip. Shutdown cuts the wait short; the
    // in-memory change has already been applied either way.
    async fn save(&self, what: &str) {
        tokio::select! {
            _ = tokio::time::sleep(self.save_latency) => {
                self.logger.log(format!("saved {}", what).as_str());
            }
            _ = self.shutdown.cancelled() => {
                self.logger.log(format!("save of {} cut short by shutdown", what).as_str());
            }
        }
    }

    fn book_index(&self, book_id: &str) -> LibraryResult<usize> {
        self.index.get(book_id).copied().ok_or_else(||
            LibraryError::book_not_found(format!("book {} not found", book_id).as_str()))
    }

    // Duplicate usernames are possible; the first registration wins here.
    fn user_index(&self, username: &str) -> LibraryResult<usize> {
        self.users.iter().position(|u| u.username == username).ok_or_else(||
            LibraryError::user_not_found(format!("user {} not found", username).as_str()))
    }
}

#[async_trait]
impl CatalogStore for CatalogStoreImpl {
    async fn add_book(&mut self, mut book: BookDto) -> LibraryResult<()> {
        if self.index.contains_key(book.book_id.as_str()) {
            self.logger.log(format!("rejected duplicate book id {}", book.book_id).as_str());
            return Err(LibraryError::duplicate_id(
                format!("book with id {} already exists", book.book_id).as_str()));
        }
        // a new record has no holder, so it cannot start out on loan
        if book.book_status == BookStatus::Loaned {
            self.logger.log(format!("book {} added as Loaned without a holder, made Available", book.book_id).as_str());
            book.book_status = BookStatus::Available;
        }
        book.borrow_count = 0;
        if !self.authors.contains(&book.author) {
            self.authors.push(book.author.to_string());
        }
        let book_id = book.book_id.to_string();
        self.index.insert(book_id.to_string(), self.books.len());
        self.books.push(book);
        self.save(format!("book {}", book_id).as_str()).await;
        self.logger.log(format!("book {} added", book_id).as_str());
        Ok(())
    }

    async fn borrow_book(&mut self, username: &str, book_id: &str) -> LibraryResult<BorrowOutcome> {
        let book_idx = self.book_index(book_id)?;
        let user_idx = self.user_index(username)?;
        let status = self.books[book_idx].status();
        if status != BookStatus::Available {
            self.logger.log(format!("book {} is {}, not lent to {}", book_id, status, username).as_str());
            return Ok(BorrowOutcome::Unavailable(status));
        }

        let book = &mut self.books[book_idx];
        book.book_status = BookStatus::Loaned;
        book.borrow_count += 1;
        self.users[user_idx].borrowed_books.push(book_id.to_string());

        self.save(format!("loan of {} to {}", book_id, username).as_str()).await;
        self.logger.log(format!("{} borrowed {}", username, book_id).as_str());
        Ok(BorrowOutcome::Borrowed)
    }

    async fn return_book(&mut self, username: &str, book_id: &str) -> LibraryResult<ReturnOutcome> {
        let book_idx = self.book_index(book_id)?;
        let user_idx = self.user_index(username)?;
        let user = &mut self.users[user_idx];
        if self.books[book_idx].status() != BookStatus::Loaned || !user.has_borrowed(book_id) {
            self.logger.log(format!("book {} is not on loan to {}", book_id, username).as_str());
            return Ok(ReturnOutcome::NotBorrowed);
        }

        if let Some(pos) = user.borrowed_books.iter().position(|b| b == book_id) {
            user.borrowed_books.remove(pos);
        }
        self.books[book_idx].book_status = BookStatus::Available;

        self.save(format!("return of {} by {}", book_id, username).as_str()).await;
        self.logger.log(format!("{} returned {}", username, book_id).as_str());
        Ok(ReturnOutcome::Returned)
    }

    async fn register_user(&mut self, username: &str, password: &str, is_admin: bool) {
        self.users.push(UserDto::new(username, password, is_admin));
        self.save(format!("user {}", username).as_str()).await;
        self.logger.log(format!("user {} registered", username).as_str());
    }

    fn login(&self, username: &str, password: &str) -> LibraryResult<UserDto> {
        self.users.iter()
            .find(|u| u.matches(username, password))
            .cloned()
            .ok_or_else(|| LibraryError::user_not_found("invalid username or password"))
    }

    fn search_by_title(&self, keyword: &str) -> Vec<BookDto> {
        self.books.iter().filter(|b| b.title.contains(keyword)).cloned().collect()
    }

    fn snapshot(&self) -> Vec<SnapshotEntry> {
        self.books.iter().map(SnapshotEntry::from).collect()
    }

    fn find_book_by_id(&self, id: &str) -> LibraryResult<BookDto> {
        self.book_index(id).map(|idx| self.books[idx].clone())
    }

    fn find_user(&self, username: &str) -> LibraryResult<UserDto> {
        self.user_index(username).map(|idx| self.users[idx].clone())
    }

    fn list_books(&self) -> Vec<BookDto> {
        self.books.clone()
    }

    fn authors(&self) -> Vec<String> {
        self.authors.clone()
    }

    fn book_count(&self) -> usize {
        self.books.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio_util::sync::CancellationToken;
    use crate::books::dto::BookDto;
    use crate::catalog::domain::{BorrowOutcome, CatalogStore, ReturnOutcome};
    use crate::catalog::factory;
    use crate::core::domain::Configuration;
    use crate::core::library::{BookStatus, LibraryError};
    use crate::core::logger::{Logger, MemoryLogger};
    use crate::search::protocol::SnapshotEntry;

    fn config() -> Configuration {
        Configuration::new("test").with_save_latency(Duration::from_millis(1))
    }

    fn store_with(logger: &MemoryLogger) -> Box<dyn CatalogStore> {
        let shared: Arc<dyn Logger> = Arc::new(logger.clone());
        factory::create_catalog_store(&config(), shared, CancellationToken::new())
    }

    async fn seeded() -> Box<dyn CatalogStore> {
        let mut store = store_with(&MemoryLogger::new());
        store.add_book(BookDto::new("1", "1984", "George Orwell")).await.expect("should add book");
        store.add_book(BookDto::new("2", "Atomic Habits", "James Clear")).await.expect("should add book");
        store.register_user("alice", "pw", false).await;
        store
    }

    #[tokio::test]
    async fn test_should_add_distinct_books() {
        let mut store = store_with(&MemoryLogger::new());
        for id in ["a", "b", "c", "d"] {
            store.add_book(BookDto::new(id, "title", "author")).await.expect("should add book");
        }
        assert_eq!(4, store.book_count());
        assert_eq!(vec!["author".to_string()], store.authors());
    }

    #[tokio::test]
    async fn test_should_reject_duplicate_id() {
        let logger = MemoryLogger::new();
        let mut store = store_with(&logger);
        store.add_book(BookDto::new("1", "1984", "George Orwell")).await.expect("should add book");

        let res = store.add_book(BookDto::new("1", "Other", "Someone Else")).await;
        assert!(matches!(res, Err(LibraryError::DuplicateId { .. })));
        assert_eq!(1, store.book_count());
        let kept = store.find_book_by_id("1").expect("should find book");
        assert_eq!("1984", kept.title.as_str());
        assert_eq!(vec!["George Orwell".to_string()], store.authors());
        assert!(logger.contains("rejected duplicate book id 1"));
    }

    #[tokio::test]
    async fn test_should_borrow_available_book() {
        let mut store = seeded().await;
        let outcome = store.borrow_book("alice", "1").await.expect("should borrow");
        assert_eq!(BorrowOutcome::Borrowed, outcome);

        let book = store.find_book_by_id("1").expect("should find book");
        assert_eq!(BookStatus::Loaned, book.book_status);
        assert_eq!(1, book.borrow_count);
        assert_eq!(vec!["1".to_string()], store.find_user("alice").expect("user").borrowed_books);
    }

    #[tokio::test]
    async fn test_should_report_unavailable_on_second_borrow() {
        let mut store = seeded().await;
        store.borrow_book("alice", "1").await.expect("should borrow");

        let outcome = store.borrow_book("alice", "1").await.expect("not an error");
        assert_eq!(BorrowOutcome::Unavailable(BookStatus::Loaned), outcome);

        let book = store.find_book_by_id("1").expect("should find book");
        assert_eq!(1, book.borrow_count);
        assert_eq!(vec!["1".to_string()], store.find_user("alice").expect("user").borrowed_books);
    }

    #[tokio::test]
    async fn test_should_report_reserved_book() {
        let mut store = store_with(&MemoryLogger::new());
        let mut book = BookDto::new("9", "Dune", "Frank Herbert");
        book.book_status = BookStatus::Reserved;
        store.add_book(book).await.expect("should add book");
        store.register_user("alice", "pw", false).await;
        let outcome = store.borrow_book("alice", "9").await.expect("not an error");
        assert_eq!(BorrowOutcome::Unavailable(BookStatus::Reserved), outcome);
    }

    #[tokio::test]
    async fn test_should_not_add_book_already_on_loan() {
        let logger = MemoryLogger::new();
        let mut store = store_with(&logger);
        store.register_user("alice", "pw", false).await;
        let mut book = BookDto::new("5", "Brave New World", "Aldous Huxley");
        book.book_status = BookStatus::Loaned;
        book.borrow_count = 7;
        store.add_book(book).await.expect("should add book");

        let kept = store.find_book_by_id("5").expect("should find book");
        assert_eq!(BookStatus::Available, kept.book_status);
        assert_eq!(0, kept.borrow_count);
        assert!(logger.contains("made Available"));

        assert_eq!(BorrowOutcome::Borrowed, store.borrow_book("alice", "5").await.expect("should borrow"));
        assert_eq!(1, store.find_book_by_id("5").expect("book").borrow_count);
        assert_eq!(ReturnOutcome::Returned, store.return_book("alice", "5").await.expect("should return"));
    }

    #[tokio::test]
    async fn test_should_fail_borrow_of_unknown_book() {
        let mut store = seeded().await;
        let before = store.list_books();
        let res = store.borrow_book("alice", "404").await;
        assert!(matches!(res, Err(LibraryError::BookNotFound { .. })));
        assert_eq!(before, store.list_books());
        assert!(store.find_user("alice").expect("user").borrowed_books.is_empty());
    }

    #[tokio::test]
    async fn test_should_fail_borrow_for_unknown_user() {
        let mut store = seeded().await;
        let res = store.borrow_book("mallory", "1").await;
        assert!(matches!(res, Err(LibraryError::UserNotFound { .. })));
        assert_eq!(BookStatus::Available, store.find_book_by_id("1").expect("book").book_status);
    }

    #[tokio::test]
    async fn test_should_return_borrowed_book() {
        let mut store = seeded().await;
        store.register_user("bob", "pw", false).await;
        store.borrow_book("alice", "1").await.expect("should borrow");

        assert_eq!(ReturnOutcome::NotBorrowed, store.return_book("bob", "1").await.expect("not an error"));
        assert_eq!(ReturnOutcome::NotBorrowed, store.return_book("alice", "2").await.expect("not an error"));
        assert_eq!(ReturnOutcome::Returned, store.return_book("alice", "1").await.expect("should return"));

        let book = store.find_book_by_id("1").expect("book");
        assert_eq!(BookStatus::Available, book.book_status);
        assert_eq!(1, book.borrow_count);
        assert!(store.find_user("alice").expect("user").borrowed_books.is_empty());

        assert_eq!(BorrowOutcome::Borrowed, store.borrow_book("bob", "1").await.expect("should borrow"));
        assert_eq!(2, store.find_book_by_id("1").expect("book").borrow_count);
    }

    #[tokio::test]
    async fn test_should_login() {
        let mut store = seeded().await;
        store.register_user("admin", "secret", true).await;

        let user = store.login("admin", "secret").expect("should login");
        assert!(user.is_admin);
        let res = store.login("admin", "wrong");
        assert!(matches!(res, Err(LibraryError::UserNotFound { .. })));
        let unknown = store.login("nobody", "secret");
        assert_eq!(res.err().map(|e| e.to_string()), unknown.err().map(|e| e.to_string()));
    }

    #[tokio::test]
    async fn test_should_allow_duplicate_usernames() {
        let mut store = store_with(&MemoryLogger::new());
        store.register_user("alice", "one", false).await;
        store.register_user("alice", "two", true).await;
        assert!(!store.login("alice", "one").expect("first").is_admin);
        assert!(store.login("alice", "two").expect("second").is_admin);
    }

    #[tokio::test]
    async fn test_should_search_by_title() {
        let store = seeded().await;
        let res = store.search_by_title("19");
        assert_eq!(1, res.len());
        assert_eq!("1", res[0].book_id.as_str());
        assert_eq!(2, store.search_by_title("").len());
        assert!(store.search_by_title("atomic").is_empty());
    }

    #[tokio::test]
    async fn test_should_snapshot_in_insertion_order() {
        let mut store = seeded().await;
        store.add_book(BookDto::new("0", "Zero", "Nobody")).await.expect("should add book");
        let snapshot = store.snapshot();
        assert_eq!(vec![
            SnapshotEntry::new("1", "1984", "George Orwell"),
            SnapshotEntry::new("2", "Atomic Habits", "James Clear"),
            SnapshotEntry::new("0", "Zero", "Nobody"),
        ], snapshot);
    }

    #[tokio::test]
    async fn test_should_await_save_latency() {
        let shared: Arc<dyn Logger> = Arc::new(MemoryLogger::new());
        let config = Configuration::new("test").with_save_latency(Duration::from_millis(40));
        let mut store = factory::create_catalog_store(&config, shared, CancellationToken::new());
        let started = Instant::now();
        store.add_book(BookDto::new("1", "1984", "George Orwell")).await.expect("should add book");
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_should_cut_save_short_on_shutdown() {
        let logger = MemoryLogger::new();
        let shared: Arc<dyn Logger> = Arc::new(logger.clone());
        let token = CancellationToken::new();
        let config = Configuration::new("test").with_save_latency(Duration::from_secs(30));
        let mut store = factory::create_catalog_store(&config, shared, token.clone());
        token.cancel();

        let started = Instant::now();
        store.add_book(BookDto::new("1", "1984", "George Orwell")).await.expect("should add book");
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(1, store.book_count());
        assert!(logger.contains("cut short by shutdown"));
    }
}
