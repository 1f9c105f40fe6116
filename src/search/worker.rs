use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use crate::core::domain::Configuration;
use crate::core::library::{LibraryError, LibraryResult};
use crate::core::logger::Logger;
use crate::search::engine::{match_titles, Matcher};
use crate::search::protocol::{SearchFault, SearchRequest, SearchResponse, SnapshotEntry, WorkerCommand, WorkerState};

/// Handle to a search request that has been queued on the worker. The reply
/// arrives on a oneshot owned by this handle.
#[derive(Debug)]
pub struct PendingSearch {
    request_id: String,
    reply_rx: oneshot::Receiver<SearchResponse>,
    reply_timeout: Duration,
}

impl PendingSearch {
    pub fn request_id(&self) -> &str {
        self.request_id.as_str()
    }

    /// Waits at most the configured search timeout for the worker's reply.
    pub async fn wait(self) -> LibraryResult<SearchResponse> {
        match timeout(self.reply_timeout, self.reply_rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(LibraryError::runtime(
                "search worker dropped the request without replying", Some(self.request_id))),
            Err(_) => Err(LibraryError::search_timeout(
                format!("no search reply within {:?}", self.reply_timeout).as_str(), Some(self.request_id))),
        }
    }
}

/// Owner-side handle of the long-running search worker task.
pub struct SearchWorker {
    cmd_tx: mpsc::Sender<WorkerCommand>,
    state_rx: watch::Receiver<WorkerState>,
    reply_timeout: Duration,
    task: Option<JoinHandle<()>>,
    logger: Arc<dyn Logger>,
}

impl SearchWorker {
    pub async fn start(config: &Configuration, logger: Arc<dyn Logger>) -> LibraryResult<Self> {
        Self::start_with_matcher(config, logger, match_titles).await
    }

    /// Spawns the worker and waits for it to hand back its inbox before
    /// returning, so the first request can never race the startup.
    pub async fn start_with_matcher(config: &Configuration, logger: Arc<dyn Logger>,
                                    matcher: Matcher) -> LibraryResult<Self> {
        let (ready_tx, ready_rx) = oneshot::channel::<mpsc::Sender<WorkerCommand>>();
        let (state_tx, state_rx) = watch::channel(WorkerState::Idle);
        let capacity = config.request_capacity.max(1);

        let task_logger = logger.clone();
        let task = tokio::spawn(async move {
            worker_loop(capacity, matcher, state_tx, task_logger, ready_tx).await;
        });

        let cmd_tx = await_readiness(ready_rx, config.search_timeout, &task).await?;
        logger.log("search worker ready");

        Ok(Self {
            cmd_tx,
            state_rx,
            reply_timeout: config.search_timeout,
            task: Some(task),
            logger,
        })
    }

    pub fn state(&self) -> WorkerState {
        *self.state_rx.borrow()
    }

    pub async fn begin_search(&self, snapshot: Vec<SnapshotEntry>, keyword: &str) -> LibraryResult<PendingSearch> {
        self.submit(SearchRequest::new(snapshot, keyword)).await
    }

    /// Queues a raw request. Enqueueing is bounded by the same timeout as the
    /// reply so a wedged worker with a full inbox cannot hang the caller.
    pub async fn submit(&self, request: SearchRequest) -> LibraryResult<PendingSearch> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request_id = request.request_id.clone();
        let cmd = WorkerCommand::Search { request, reply: reply_tx };
        match timeout(self.reply_timeout, self.cmd_tx.send(cmd)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                return Err(LibraryError::runtime("search worker is not running", Some(request_id)));
            }
            Err(_) => {
                return Err(LibraryError::search_timeout("search worker inbox is full", Some(request_id)));
            }
        }
        Ok(PendingSearch { request_id, reply_rx, reply_timeout: self.reply_timeout })
    }

    pub async fn await_search_result(&self, pending: PendingSearch) -> LibraryResult<Vec<SnapshotEntry>> {
        pending.wait().await?.into_result()
    }

    pub async fn search(&self, snapshot: Vec<SnapshotEntry>, keyword: &str) -> LibraryResult<Vec<SnapshotEntry>> {
        let pending = self.begin_search(snapshot, keyword).await?;
        self.await_search_result(pending).await
    }

    /// Stops the worker. The shutdown message queues behind any request already
    /// sent, so those are answered before the worker acknowledges. Calling it
    /// again after a successful shutdown is a no-op.
    pub async fn shutdown(&mut self) -> LibraryResult<()> {
        let task = match self.task.take() {
            Some(task) => task,
            None => return Ok(()),
        };
        let (ack_tx, ack_rx) = oneshot::channel();
        let cmd_tx = self.cmd_tx.clone();
        let acknowledged = timeout(self.reply_timeout, async move {
            if cmd_tx.send(WorkerCommand::Shutdown { ack: ack_tx }).await.is_err() {
                // inbox already closed, the task is on its way out
                return;
            }
            let _ = ack_rx.await;
        }).await;

        match acknowledged {
            Ok(()) => {
                let _ = task.await;
                self.logger.log("search worker shut down");
                Ok(())
            }
            Err(_) => {
                task.abort();
                self.logger.log("search worker did not acknowledge shutdown, aborted");
                Err(LibraryError::search_timeout("search worker did not acknowledge shutdown", None))
            }
        }
    }
}

impl Drop for SearchWorker {
    fn drop(&mut self) {
        if self.task.is_some() {
            let (ack_tx, _) = oneshot::channel();
            let _ = self.cmd_tx.try_send(WorkerCommand::Shutdown { ack: ack_tx });
        }
    }
}

/// Waits for the spawned task to hand over its inbox. A task that stays silent
/// past `wait` is aborted.
async fn await_readiness(ready_rx: oneshot::Receiver<mpsc::Sender<WorkerCommand>>, wait: Duration,
                         task: &JoinHandle<()>) -> LibraryResult<mpsc::Sender<WorkerCommand>> {
    match timeout(wait, ready_rx).await {
        Ok(Ok(cmd_tx)) => Ok(cmd_tx),
        Ok(Err(_)) => Err(LibraryError::runtime("search worker exited before signalling readiness", None)),
        Err(_) => {
            task.abort();
            Err(LibraryError::search_timeout("search worker did not signal readiness", None))
        }
    }
}

async fn worker_loop(capacity: usize, matcher: Matcher, state_tx: watch::Sender<WorkerState>,
                     logger: Arc<dyn Logger>, ready_tx: oneshot::Sender<mpsc::Sender<WorkerCommand>>) {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<WorkerCommand>(capacity);
    if ready_tx.send(cmd_tx).is_err() {
        state_tx.send_replace(WorkerState::Stopped);
        logger.log("search worker abandoned before readiness");
        return;
    }
    logger.log("search worker started");

    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            WorkerCommand::Search { request, reply } => {
                serve(request, reply, matcher, &state_tx, logger.as_ref()).await;
            }
            WorkerCommand::Shutdown { ack } => {
                // answer whatever slipped in before the inbox closed
                cmd_rx.close();
                while let Some(rest) = cmd_rx.recv().await {
                    match rest {
                        WorkerCommand::Search { request, reply } => {
                            serve(request, reply, matcher, &state_tx, logger.as_ref()).await;
                        }
                        WorkerCommand::Shutdown { ack } => {
                            let _ = ack.send(());
                        }
                    }
                }
                state_tx.send_replace(WorkerState::Stopped);
                let _ = ack.send(());
                break;
            }
        }
    }

    state_tx.send_replace(WorkerState::Stopped);
    logger.log("search worker stopped");
}

async fn serve(request: SearchRequest, reply: oneshot::Sender<SearchResponse>, matcher: Matcher,
               state_tx: &watch::Sender<WorkerState>, logger: &dyn Logger) {
    state_tx.send_replace(WorkerState::Matching);
    let request_id = request.request_id.clone();
    let response = execute(request, matcher, logger).await;
    state_tx.send_replace(WorkerState::Idle);
    if reply.send(response).is_err() {
        logger.log(format!("search caller went away before reply {}", request_id).as_str());
    }
}

async fn execute(request: SearchRequest, matcher: Matcher, logger: &dyn Logger) -> SearchResponse {
    let request_id = request.request_id.clone();
    let (snapshot, keyword) = match request.into_parts() {
        Ok(parts) => parts,
        Err(reason) => {
            logger.log(format!("rejected malformed search request {}: {}", request_id, reason).as_str());
            return SearchResponse::failed(request_id.as_str(), SearchFault::Malformed(reason));
        }
    };

    // a panic inside the matcher surfaces as a JoinError and only fails this request
    match tokio::task::spawn_blocking(move || matcher(&snapshot, &keyword)).await {
        Ok(matches) => SearchResponse::matched(request_id.as_str(), matches),
        Err(err) => {
            logger.log(format!("search request {} failed: {}", request_id, err).as_str());
            SearchResponse::failed(request_id.as_str(), SearchFault::Internal(err.to_string()))
        }
    }
}
