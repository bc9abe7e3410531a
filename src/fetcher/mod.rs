pub mod simulated;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::FeedItem;

pub use simulated::SimulatedSource;

/// Produces pages of feed items and refresh batches.
///
/// Implementations know nothing about caching or retry bookkeeping;
/// that is the caller's responsibility. A real deployment would back
/// this with an HTTP/RPC client honoring the same contract.
#[async_trait]
pub trait FetchSource {
    /// Fetch one page by zero-based index. An empty Vec signals the end
    /// of the feed, not an error.
    async fn fetch_page(&self, page: u32) -> Result<Vec<FeedItem>>;

    /// Fetch a fresh batch of items to prepend to the feed.
    async fn fetch_refresh(&self) -> Result<Vec<FeedItem>>;
}
