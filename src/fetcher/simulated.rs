use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::app::{FreshetError, Result};
use crate::config::SourceConfig;
use crate::domain::{CardType, DoubleColumnPosition, FeedItem, LayoutType};
use crate::fetcher::FetchSource;

/// Deterministic in-process stand-in for a remote feed service.
///
/// Item synthesis is a pure function of `page`/`index`; the only state
/// kept is per-page attempt counts, used to make every third page fail
/// its first fetch and succeed on the next one.
pub struct SimulatedSource {
    config: SourceConfig,
    attempts: Mutex<HashMap<u32, u32>>,
    refresh_seq: AtomicU64,
}

impl SimulatedSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            config,
            attempts: Mutex::new(HashMap::new()),
            refresh_seq: AtomicU64::new(0),
        }
    }

    /// True exactly once per page: on the first attempt at a page index
    /// where `page % 3 == 2`.
    fn should_fail(&self, page: u32) -> bool {
        let mut attempts = self.attempts.lock().expect("attempts lock poisoned");
        let count = attempts.entry(page).or_insert(0);
        *count += 1;
        page % 3 == 2 && *count == 1
    }

    fn synthesize_page_item(&self, index: u32) -> FeedItem {
        let n = index + 1;
        let card_type = match index % 3 {
            0 => CardType::ImageTop,
            1 => CardType::Video,
            _ => CardType::ImageBottom,
        };
        let layout_type = if index % 2 == 0 {
            LayoutType::SingleColumn
        } else {
            LayoutType::DoubleColumn
        };
        let double_column_position = match layout_type {
            LayoutType::SingleColumn => None,
            LayoutType::DoubleColumn => Some(if (index / 2) % 2 == 0 {
                DoubleColumnPosition::Left
            } else {
                DoubleColumnPosition::Right
            }),
        };

        FeedItem {
            id: format!("item_{}", index),
            title: format!("Post {}", n),
            content: format!("Synthesized feed entry {}.", n),
            image_url: Some(format!("https://picsum.photos/seed/{}/400/300", n)),
            card_type,
            layout_type,
            double_column_position,
        }
    }

    fn synthesize_refresh_item(&self, token: &str, i: u32) -> FeedItem {
        let n = i + 1;
        let card_type = match i % 4 {
            0 => CardType::TextOnly,
            1 => CardType::ImageTop,
            2 => CardType::ImageBottom,
            _ => CardType::Carousel,
        };
        let content = match card_type {
            CardType::Carousel => (1..=3)
                .map(|k| format!("https://picsum.photos/seed/carousel{}_{}_{}/400/300", token, n, k))
                .collect::<Vec<_>>()
                .join(","),
            _ => format!("A freshly refreshed feed entry {}.", n),
        };
        let image_url = match card_type {
            CardType::TextOnly | CardType::Carousel => None,
            _ => Some(format!(
                "https://picsum.photos/seed/refresh{}_{}/400/300",
                token, n
            )),
        };
        let layout_type = if i % 5 == 3 || i % 5 == 4 {
            LayoutType::DoubleColumn
        } else {
            LayoutType::SingleColumn
        };
        let double_column_position = match layout_type {
            LayoutType::SingleColumn => None,
            LayoutType::DoubleColumn => Some(if i % 5 == 3 {
                DoubleColumnPosition::Left
            } else {
                DoubleColumnPosition::Right
            }),
        };

        FeedItem {
            id: format!("refresh_{}_{}", token, n),
            title: format!("Post {}", n),
            content,
            image_url,
            card_type,
            layout_type,
            double_column_position,
        }
    }
}

#[async_trait]
impl FetchSource for SimulatedSource {
    async fn fetch_page(&self, page: u32) -> Result<Vec<FeedItem>> {
        tokio::time::sleep(self.config.latency()).await;

        if self.should_fail(page) {
            debug!("simulated network error for page {}", page);
            return Err(FreshetError::Network(format!(
                "simulated network error for page {}",
                page
            )));
        }

        if page >= self.config.total_pages {
            debug!("page {} is past the end of the feed", page);
            return Ok(Vec::new());
        }

        let start = page * self.config.page_size;
        let items = (start..start + self.config.page_size)
            .map(|index| self.synthesize_page_item(index))
            .collect();
        Ok(items)
    }

    async fn fetch_refresh(&self) -> Result<Vec<FeedItem>> {
        tokio::time::sleep(self.config.latency()).await;

        // Time-derived token plus a sequence number so refreshed ids never
        // collide with anything fetched earlier in the session.
        let seq = self.refresh_seq.fetch_add(1, Ordering::Relaxed);
        let token = format!("{}_{}", Utc::now().timestamp_millis() % 1_000_000, seq);

        let items = (0..self.config.refresh_size)
            .map(|i| self.synthesize_refresh_item(&token, i))
            .collect();
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SourceConfig {
        SourceConfig {
            page_size: 4,
            refresh_size: 5,
            latency_ms: 1,
            total_pages: 8,
        }
    }

    #[tokio::test]
    async fn test_every_third_page_fails_once_then_succeeds() {
        let source = SimulatedSource::new(fast_config());

        let first = source.fetch_page(2).await;
        assert!(first.is_err());

        let second = source.fetch_page(2).await.unwrap();
        assert_eq!(second.len(), 4);
    }

    #[tokio::test]
    async fn test_other_pages_succeed_first_time() {
        let source = SimulatedSource::new(fast_config());
        assert_eq!(source.fetch_page(0).await.unwrap().len(), 4);
        assert_eq!(source.fetch_page(1).await.unwrap().len(), 4);
        assert_eq!(source.fetch_page(3).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_page_synthesis_is_deterministic() {
        let source = SimulatedSource::new(fast_config());
        let a = source.fetch_page(1).await.unwrap();
        let b = source.fetch_page(1).await.unwrap();
        assert_eq!(a, b);

        assert_eq!(a[0].id, "item_4");
        assert_eq!(a[0].card_type, CardType::Video);
    }

    #[tokio::test]
    async fn test_card_type_cycle() {
        let source = SimulatedSource::new(fast_config());
        let page = source.fetch_page(0).await.unwrap();
        assert_eq!(page[0].card_type, CardType::ImageTop);
        assert_eq!(page[1].card_type, CardType::Video);
        assert_eq!(page[2].card_type, CardType::ImageBottom);
        assert_eq!(page[3].card_type, CardType::ImageTop);
    }

    #[tokio::test]
    async fn test_layout_alternates_by_position() {
        let source = SimulatedSource::new(fast_config());
        let page = source.fetch_page(0).await.unwrap();
        assert_eq!(page[0].layout_type, LayoutType::SingleColumn);
        assert_eq!(page[1].layout_type, LayoutType::DoubleColumn);
        assert!(page[0].double_column_position.is_none());
        assert!(page[1].double_column_position.is_some());
    }

    #[tokio::test]
    async fn test_pages_past_the_end_are_empty() {
        let source = SimulatedSource::new(fast_config());
        let items = source.fetch_page(9).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_failure_policy_applies_before_end_of_feed() {
        // 8 % 3 == 2, so the first attempt fails even though the page is
        // past the end; the retry then reports the empty page.
        let source = SimulatedSource::new(fast_config());
        assert!(source.fetch_page(8).await.is_err());
        assert!(source.fetch_page(8).await.unwrap().is_empty());
    }

    #[test]
    fn test_refresh_ids_unique_across_batches() {
        let source = SimulatedSource::new(fast_config());
        let first = tokio_test::block_on(source.fetch_refresh()).unwrap();
        let second = tokio_test::block_on(source.fetch_refresh()).unwrap();

        assert_eq!(first.len(), 5);
        assert_eq!(second.len(), 5);
        for a in &first {
            assert!(second.iter().all(|b| b.id != a.id));
            assert!(a.id.starts_with("refresh_"));
        }
    }

    #[tokio::test]
    async fn test_refresh_carousel_items_carry_url_list() {
        let source = SimulatedSource::new(fast_config());
        let batch = source.fetch_refresh().await.unwrap();
        let carousel = batch
            .iter()
            .find(|i| i.card_type == CardType::Carousel)
            .unwrap();
        assert_eq!(carousel.carousel_urls().len(), 3);
        assert!(carousel.image_url.is_none());
    }
}
