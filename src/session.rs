use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use crate::books::dto::BookDto;
use crate::catalog::domain::{BorrowOutcome, CatalogStore, ReturnOutcome};
use crate::catalog::factory;
use crate::core::domain::Configuration;
use crate::core::events::ActivityEvent;
use crate::core::library::{LibraryError, LibraryResult};
use crate::core::logger::Logger;
use crate::gateway::activity::{ActivityLog, ActivitySubscription};
use crate::gateway::events::EventPublisher;
use crate::search::protocol::SnapshotEntry;
use crate::search::worker::{PendingSearch, SearchWorker};
use crate::users::dto::UserDto;

/// Single caller of the catalog store, search worker and activity log. Every
/// collaborator is constructed here and released by `shutdown`.
pub struct Session {
    store: Box<dyn CatalogStore>,
    worker: SearchWorker,
    activity: ActivityLog,
    shutdown: CancellationToken,
    logger: Arc<dyn Logger>,
    current_user: Option<UserDto>,
}

impl Session {
    pub async fn start(config: &Configuration, logger: Arc<dyn Logger>) -> LibraryResult<Self> {
        let shutdown = CancellationToken::new();
        let store = factory::create_catalog_store(config, logger.clone(), shutdown.clone());
        Self::start_with_store(config, store, shutdown, logger).await
    }

    pub async fn start_with_store(config: &Configuration, store: Box<dyn CatalogStore>,
                                  shutdown: CancellationToken, logger: Arc<dyn Logger>) -> LibraryResult<Self> {
        let worker = SearchWorker::start(config, logger.clone()).await?;
        logger.log(format!("session started for branch {}", config.branch_id).as_str());
        Ok(Self {
            store,
            worker,
            activity: ActivityLog::new(config.activity_capacity),
            shutdown,
            logger,
            current_user: None,
        })
    }

    /// Cancels in-flight simulated storage waits. Safe to trigger from another
    /// task, e.g. a ctrl-c handler.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn current_user(&self) -> Option<&UserDto> {
        self.current_user.as_ref()
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    pub fn worker(&self) -> &SearchWorker {
        &self.worker
    }

    pub fn subscribe_activity(&self) -> ActivitySubscription {
        self.activity.subscribe()
    }

    pub async fn register(&mut self, username: &str, password: &str, is_admin: bool) {
        self.store.register_user(username, password, is_admin).await;
        self.activity.publish(ActivityEvent::user_registered(username));
    }

    pub fn login(&mut self, username: &str, password: &str) -> LibraryResult<UserDto> {
        let user = self.store.login(username, password)?;
        self.current_user = Some(user.clone());
        Ok(user)
    }

    pub fn logout(&mut self) {
        self.current_user = None;
    }

    pub async fn add_book(&mut self, book: BookDto) -> LibraryResult<()> {
        match self.current_user.as_ref() {
            Some(user) if user.is_admin => {}
            Some(user) => {
                return Err(LibraryError::access_denied(
                    format!("{} may not add books", user.username).as_str(), Some("admin_only".to_string())));
            }
            None => return Err(not_logged_in()),
        }
        let event = ActivityEvent::book_added(book.book_id.as_str(), book.title.as_str());
        self.store.add_book(book).await?;
        self.activity.publish(event);
        Ok(())
    }

    pub async fn borrow_book(&mut self, book_id: &str) -> LibraryResult<BorrowOutcome> {
        let username = self.username()?;
        let outcome = self.store.borrow_book(username.as_str(), book_id).await?;
        if outcome == BorrowOutcome::Borrowed {
            let book = self.store.find_book_by_id(book_id)?;
            self.activity.publish(ActivityEvent::book_borrowed(book_id, book.title.as_str(), username.as_str()));
            self.refresh_current_user();
        }
        Ok(outcome)
    }

    pub async fn return_book(&mut self, book_id: &str) -> LibraryResult<ReturnOutcome> {
        let username = self.username()?;
        let outcome = self.store.return_book(username.as_str(), book_id).await?;
        if outcome == ReturnOutcome::Returned {
            let book = self.store.find_book_by_id(book_id)?;
            self.activity.publish(ActivityEvent::book_returned(book_id, book.title.as_str(), username.as_str()));
            self.refresh_current_user();
        }
        Ok(outcome)
    }

    /// Hands a fresh snapshot to the search worker and returns without waiting.
    pub async fn begin_search(&self, keyword: &str) -> LibraryResult<PendingSearch> {
        self.worker.begin_search(self.store.snapshot(), keyword).await
    }

    pub async fn await_search_result(&self, pending: PendingSearch) -> LibraryResult<Vec<SnapshotEntry>> {
        self.worker.await_search_result(pending).await
    }

    pub async fn search(&self, keyword: &str) -> LibraryResult<Vec<SnapshotEntry>> {
        let pending = self.begin_search(keyword).await?;
        self.await_search_result(pending).await
    }

    pub fn search_local(&self, keyword: &str) -> Vec<BookDto> {
        self.store.search_by_title(keyword)
    }

    /// Stops the worker (answering anything still queued), closes the activity
    /// log and releases pending simulated saves. Repeated calls are no-ops.
    pub async fn shutdown(&mut self) -> LibraryResult<()> {
        let stopped = self.worker.shutdown().await;
        self.activity.close();
        self.shutdown.cancel();
        self.logger.log("session shut down");
        stopped
    }

    fn username(&self) -> LibraryResult<String> {
        self.current_user.as_ref().map(|u| u.username.to_string()).ok_or_else(not_logged_in)
    }

    // Only the loan list is refreshed. The identity matched at login stays put:
    // with duplicate usernames `find_user` may return a different record.
    fn refresh_current_user(&mut self) {
        let username = match self.current_user.as_ref() {
            Some(user) => user.username.to_string(),
            None => return,
        };
        if let Ok(fresh) = self.store.find_user(username.as_str()) {
            if let Some(user) = self.current_user.as_mut() {
                user.borrowed_books = fresh.borrowed_books;
            }
        }
    }
}

fn not_logged_in() -> LibraryError {
    LibraryError::access_denied("log in first", Some("not_logged_in".to_string()))
}
