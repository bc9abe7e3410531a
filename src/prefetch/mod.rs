use std::collections::HashSet;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::{CardType, FeedItem};

/// Message type for the background prefetcher
#[derive(Debug)]
enum PrefetchMessage {
    /// Warm a batch of image URLs
    Prefetch(Vec<String>),
    /// Shutdown the prefetcher
    Shutdown,
}

/// Handle to send URL batches to the background prefetcher.
///
/// Best-effort by contract: queueing never blocks and every failure is
/// swallowed with a warning, so prefetch can never affect loading state.
#[derive(Clone)]
pub struct PrefetchHandle {
    tx: mpsc::Sender<PrefetchMessage>,
}

impl PrefetchHandle {
    /// Queue URLs for warming. Fire-and-forget.
    pub fn queue(&self, urls: Vec<String>) {
        if urls.is_empty() {
            return;
        }
        if let Err(e) = self.tx.try_send(PrefetchMessage::Prefetch(urls)) {
            warn!("Failed to queue prefetch batch: {}", e);
        }
    }

    /// Shutdown the background prefetcher
    pub async fn shutdown(&self) {
        let _ = self.tx.send(PrefetchMessage::Shutdown).await;
    }
}

/// Gather every prefetchable URL from a slice of items: the item's own
/// image plus, for carousel cards, each URL embedded in its content.
pub fn collect_image_urls(items: &[FeedItem]) -> Vec<String> {
    let mut urls = Vec::new();
    for item in items {
        if let Some(url) = &item.image_url {
            urls.push(url.clone());
        }
        if item.card_type == CardType::Carousel {
            urls.extend(item.carousel_urls());
        }
    }
    urls
}

/// Background service that warms an in-memory URL cache.
///
/// There is no real image pipeline behind the engine, so warming means
/// validating the URL and remembering it; a production build would hand
/// the batch to an image loader here.
pub struct Prefetcher {
    rx: mpsc::Receiver<PrefetchMessage>,
    warmed: HashSet<String>,
}

impl Prefetcher {
    pub fn new() -> (Self, PrefetchHandle) {
        let (tx, rx) = mpsc::channel(100);
        let handle = PrefetchHandle { tx };
        let prefetcher = Self {
            rx,
            warmed: HashSet::new(),
        };
        (prefetcher, handle)
    }

    /// Run the prefetcher loop
    pub async fn run(mut self) {
        info!("Prefetcher started");

        while let Some(msg) = self.rx.recv().await {
            match msg {
                PrefetchMessage::Prefetch(urls) => {
                    let mut fresh = 0usize;
                    for url in urls {
                        if let Err(e) = Url::parse(&url) {
                            warn!("Skipping unparseable prefetch URL {}: {}", url, e);
                            continue;
                        }
                        if self.warmed.insert(url) {
                            fresh += 1;
                        }
                    }
                    if fresh > 0 {
                        debug!("Warmed {} new URLs ({} total)", fresh, self.warmed.len());
                    }
                }
                PrefetchMessage::Shutdown => {
                    info!("Prefetcher shutting down");
                    break;
                }
            }
        }
    }
}

/// Spawn the prefetcher as a tokio task
pub fn spawn_prefetcher() -> PrefetchHandle {
    let (prefetcher, handle) = Prefetcher::new();

    tokio::spawn(async move {
        prefetcher.run().await;
    });

    handle
}
