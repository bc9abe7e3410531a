use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::app::FreshetError;
use crate::cache::{PageCache, RefreshCache};
use crate::domain::{ExposureLog, ExposureRecord, FeedItem, FeedSnapshot};
use crate::fetcher::FetchSource;
use crate::prefetch::{collect_image_urls, PrefetchHandle};

/// Message type for the sync controller. Fetch completions are posted
/// back through the same channel so commands stay responsive while a
/// fetch is in flight.
#[derive(Debug)]
enum SyncMessage {
    LoadFeeds,
    RefreshFeeds,
    DeleteFeed(String),
    Retry,
    AddExposureLog(ExposureRecord),
    ClearExposureLogs,
    Shutdown,
    LoadFinished {
        token: u64,
        page: u32,
        result: Result<Vec<FeedItem>, FreshetError>,
    },
    RefreshFinished {
        token: u64,
        result: Result<Vec<FeedItem>, FreshetError>,
    },
}

/// Handle to drive the sync controller and observe its state.
///
/// Commands never fail across this boundary; a closed controller is
/// logged and the command dropped. State is read through snapshots,
/// never through shared mutable references.
#[derive(Clone)]
pub struct SyncHandle {
    tx: mpsc::Sender<SyncMessage>,
    state: watch::Receiver<FeedSnapshot>,
}

impl SyncHandle {
    async fn send(&self, msg: SyncMessage) {
        if let Err(e) = self.tx.send(msg).await {
            warn!("Sync controller unavailable: {}", e);
        }
    }

    /// Load the next page (or the pending retry page). No-op while a
    /// load is in flight or after the end of the feed.
    pub async fn load_feeds(&self) {
        self.send(SyncMessage::LoadFeeds).await;
    }

    /// Fetch a refresh batch and prepend it. No-op while a refresh is
    /// in flight.
    pub async fn refresh_feeds(&self) {
        self.send(SyncMessage::RefreshFeeds).await;
    }

    /// Remove one item by id. Numbering of the remaining items is left
    /// untouched.
    pub async fn delete_feed(&self, id: impl Into<String>) {
        self.send(SyncMessage::DeleteFeed(id.into())).await;
    }

    /// Re-attempt the pending page. No-op unless the last operation
    /// surfaced an error.
    pub async fn retry(&self) {
        self.send(SyncMessage::Retry).await;
    }

    pub async fn add_exposure_log(&self, record: ExposureRecord) {
        self.send(SyncMessage::AddExposureLog(record)).await;
    }

    pub async fn clear_exposure_logs(&self) {
        self.send(SyncMessage::ClearExposureLogs).await;
    }

    /// Stop the controller task
    pub async fn shutdown(&self) {
        let _ = self.tx.send(SyncMessage::Shutdown).await;
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> FeedSnapshot {
        self.state.borrow().clone()
    }

    /// Watch receiver for callers that want to react to state changes.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.state.clone()
    }

    /// Wait until the published state satisfies `pred` and return it.
    pub async fn wait_until<F>(&self, pred: F) -> FeedSnapshot
    where
        F: Fn(&FeedSnapshot) -> bool,
    {
        let mut rx = self.state.clone();
        loop {
            {
                let snapshot = rx.borrow_and_update();
                if pred(&snapshot) {
                    return snapshot.clone();
                }
            }
            if rx.changed().await.is_err() {
                return self.snapshot();
            }
        }
    }
}

/// Owns the authoritative feed list, both caches, the exposure log and
/// all loading/error flags. Single-writer: every mutation happens on
/// this task, between its suspension points, and is published as one
/// consistent snapshot.
pub struct SyncController {
    source: Arc<dyn FetchSource + Send + Sync>,
    prefetch: PrefetchHandle,

    feeds: Vec<FeedItem>,
    page_cache: PageCache,
    refresh_cache: RefreshCache,
    exposure_log: ExposureLog,

    current_page: u32,
    pending_retry_page: Option<u32>,
    is_loading: bool,
    is_refreshing: bool,
    has_error: bool,
    error_message: String,
    can_load_more: bool,

    // Supersession tokens, one per axis: a completion carrying a stale
    // token is discarded.
    load_token: u64,
    refresh_token: u64,

    rx: mpsc::Receiver<SyncMessage>,
    tx: mpsc::Sender<SyncMessage>,
    state_tx: watch::Sender<FeedSnapshot>,
}

impl SyncController {
    pub fn new(
        source: Arc<dyn FetchSource + Send + Sync>,
        prefetch: PrefetchHandle,
    ) -> (Self, SyncHandle) {
        let (tx, rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(FeedSnapshot::default());
        let handle = SyncHandle {
            tx: tx.clone(),
            state: state_rx,
        };
        let controller = Self {
            source,
            prefetch,
            feeds: Vec::new(),
            page_cache: PageCache::new(),
            refresh_cache: RefreshCache::new(),
            exposure_log: ExposureLog::new(),
            current_page: 0,
            pending_retry_page: None,
            is_loading: false,
            is_refreshing: false,
            has_error: false,
            error_message: String::new(),
            can_load_more: true,
            load_token: 0,
            refresh_token: 0,
            rx,
            tx,
            state_tx,
        };
        (controller, handle)
    }

    /// Run the controller loop
    pub async fn run(mut self) {
        info!("Sync controller started");

        while let Some(msg) = self.rx.recv().await {
            match msg {
                SyncMessage::LoadFeeds => self.start_load(),
                SyncMessage::RefreshFeeds => self.start_refresh(),
                SyncMessage::DeleteFeed(id) => self.delete_feed(&id),
                SyncMessage::Retry => self.retry(),
                SyncMessage::AddExposureLog(record) => {
                    self.exposure_log.append(record);
                    self.publish();
                }
                SyncMessage::ClearExposureLogs => {
                    self.exposure_log.clear();
                    self.publish();
                }
                SyncMessage::LoadFinished {
                    token,
                    page,
                    result,
                } => self.finish_load(token, page, result),
                SyncMessage::RefreshFinished { token, result } => {
                    self.finish_refresh(token, result)
                }
                SyncMessage::Shutdown => {
                    info!("Sync controller shutting down");
                    break;
                }
            }
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(FeedSnapshot {
            feeds: self.feeds.clone(),
            is_loading: self.is_loading,
            is_refreshing: self.is_refreshing,
            has_error: self.has_error,
            error_message: self.error_message.clone(),
            can_load_more: self.can_load_more,
            exposure_logs: self.exposure_log.all().to_vec(),
        });
    }

    fn clear_error(&mut self) {
        self.has_error = false;
        self.error_message.clear();
    }

    fn start_load(&mut self) {
        if self.is_loading {
            debug!("Load already in flight; ignoring");
            return;
        }
        if !self.can_load_more {
            debug!("End of feed reached; ignoring load");
            return;
        }

        self.is_loading = true;
        self.clear_error();
        self.load_token += 1;

        let token = self.load_token;
        let page = self.pending_retry_page.unwrap_or(self.current_page);
        let source = self.source.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_page(page).await;
            let _ = tx
                .send(SyncMessage::LoadFinished {
                    token,
                    page,
                    result,
                })
                .await;
        });

        self.publish();
    }

    fn finish_load(&mut self, token: u64, page: u32, result: Result<Vec<FeedItem>, FreshetError>) {
        if token != self.load_token {
            debug!("Discarding superseded load result for page {}", page);
            return;
        }
        self.is_loading = false;

        match result {
            Ok(items) if items.is_empty() => {
                info!("Page {} is empty; end of feed", page);
                self.can_load_more = false;
                self.pending_retry_page = None;
            }
            Ok(items) => {
                self.apply_page(page, items);
            }
            Err(err) => {
                if let Some(cached) = self.page_cache.get(page).cloned() {
                    warn!("Page {} fetch failed, serving cached copy: {}", page, err);
                    self.apply_page(page, cached);
                } else {
                    warn!("Page {} fetch failed with no fallback: {}", page, err);
                    self.page_cache.increment_retry(page);
                    self.has_error = true;
                    self.error_message = err.to_string();
                    self.pending_retry_page = Some(page);
                }
            }
        }

        self.publish();
    }

    /// Append a successful (or stale-served) page: items are renumbered
    /// continuing from the current list length, the raw page is cached,
    /// and pagination advances past it.
    fn apply_page(&mut self, page: u32, items: Vec<FeedItem>) {
        self.prefetch.queue(collect_image_urls(&items));
        self.page_cache.put(page, items.clone());

        let offset = self.feeds.len();
        self.feeds.extend(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| item.renumbered(offset + i + 1)),
        );

        self.current_page = page + 1;
        self.pending_retry_page = None;
        self.page_cache.clear_retry(page);
    }

    fn start_refresh(&mut self) {
        if self.is_refreshing {
            debug!("Refresh already in flight; ignoring");
            return;
        }

        self.is_refreshing = true;
        self.clear_error();
        self.refresh_token += 1;

        let token = self.refresh_token;
        let source = self.source.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = source.fetch_refresh().await;
            let _ = tx.send(SyncMessage::RefreshFinished { token, result }).await;
        });

        self.publish();
    }

    fn finish_refresh(&mut self, token: u64, result: Result<Vec<FeedItem>, FreshetError>) {
        if token != self.refresh_token {
            debug!("Discarding superseded refresh result");
            return;
        }
        self.is_refreshing = false;

        match result {
            Ok(batch) => {
                self.refresh_cache.set(batch.clone());
                self.apply_refresh(batch);
            }
            Err(err) => {
                if let Some(batch) = self.refresh_cache.get().cloned() {
                    warn!("Refresh failed, serving cached batch: {}", err);
                    self.apply_refresh(batch);
                } else {
                    warn!("Refresh failed with no fallback: {}", err);
                    self.has_error = true;
                    self.error_message = err.to_string();
                }
            }
        }

        self.publish();
    }

    /// Prepend a refresh batch, renumber the whole merged list from 1
    /// and restart pagination. Any load still in flight is superseded:
    /// its page was numbered against a list order that no longer exists.
    fn apply_refresh(&mut self, batch: Vec<FeedItem>) {
        if self.is_loading {
            debug!("Refresh supersedes in-flight load");
            self.load_token += 1;
            self.is_loading = false;
        }

        self.prefetch.queue(collect_image_urls(&batch));

        let mut merged = batch;
        merged.append(&mut self.feeds);
        self.feeds = merged
            .into_iter()
            .enumerate()
            .map(|(i, item)| item.renumbered(i + 1))
            .collect();

        self.current_page = 0;
        self.pending_retry_page = None;
    }

    fn delete_feed(&mut self, id: &str) {
        let before = self.feeds.len();
        self.feeds.retain(|item| item.id != id);
        if self.feeds.len() == before {
            debug!("Delete ignored; no item with id {}", id);
        }
        self.publish();
    }

    fn retry(&mut self) {
        if !self.has_error {
            debug!("Retry ignored; no error pending");
            return;
        }
        // Empty and non-empty feed lists take the same path: the pending
        // retry page (if any) is re-attempted without resetting pagination.
        self.clear_error();
        self.start_load();
    }
}

/// Spawn the controller as a tokio task and return its handle.
pub fn spawn_sync_controller(
    source: Arc<dyn FetchSource + Send + Sync>,
    prefetch: PrefetchHandle,
) -> SyncHandle {
    let (controller, handle) = SyncController::new(source, prefetch);

    tokio::spawn(async move {
        controller.run().await;
    });

    handle
}
