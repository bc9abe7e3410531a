use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::Config;
use crate::controller::{spawn_sync_controller, SyncHandle};
use crate::exposure::{spawn_exposure_tracker, ExposureTrackerHandle};
use crate::fetcher::{FetchSource, SimulatedSource};
use crate::prefetch::{spawn_prefetcher, PrefetchHandle};
use crate::render::RendererRegistry;

/// Process-scoped wiring of the engine: one fetch source, one prefetch
/// worker, one controller, one exposure tracker. Created once at
/// startup and passed explicitly to whoever needs it.
pub struct AppContext {
    pub config: Config,
    pub source: Arc<dyn FetchSource + Send + Sync>,
    pub prefetch: PrefetchHandle,
    pub sync: SyncHandle,
    pub tracker: ExposureTrackerHandle,
    pub renderers: RendererRegistry,
}

impl AppContext {
    pub fn new(config: Config) -> Self {
        let source: Arc<dyn FetchSource + Send + Sync> =
            Arc::new(SimulatedSource::new(config.source.clone()));
        Self::with_source(config, source)
    }

    /// Wire the engine around any fetch source.
    pub fn with_source(config: Config, source: Arc<dyn FetchSource + Send + Sync>) -> Self {
        let prefetch = spawn_prefetcher();
        let sync = spawn_sync_controller(source.clone(), prefetch.clone());

        // Exposure events flow straight into the controller's log.
        let (events_tx, mut events_rx) = mpsc::channel(256);
        let tracker = spawn_exposure_tracker(config.tracker.debounce(), events_tx);
        let log_sink = sync.clone();
        tokio::spawn(async move {
            while let Some(record) = events_rx.recv().await {
                log_sink.add_exposure_log(record).await;
            }
        });

        Self {
            config,
            source,
            prefetch,
            sync,
            tracker,
            renderers: RendererRegistry::with_defaults(),
        }
    }

    /// Stop the background tasks.
    pub async fn shutdown(&self) {
        self.tracker.shutdown().await;
        self.prefetch.shutdown().await;
        self.sync.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::{SourceConfig, TrackerConfig};
    use crate::exposure::{ViewportSnapshot, VisibleItem};

    fn fast_config() -> Config {
        Config {
            source: SourceConfig {
                page_size: 3,
                refresh_size: 2,
                latency_ms: 1,
                total_pages: 4,
            },
            tracker: TrackerConfig { debounce_ms: 10 },
        }
    }

    #[tokio::test]
    async fn test_exposure_events_reach_the_feed_log() {
        let ctx = AppContext::new(fast_config());

        ctx.sync.load_feeds().await;
        let snapshot = tokio::time::timeout(
            Duration::from_secs(5),
            ctx.sync.wait_until(|s| s.feeds.len() == 3),
        )
        .await
        .unwrap();

        let ids: Vec<String> = snapshot.feeds.iter().map(|i| i.id.clone()).collect();
        ctx.tracker.track_ids(ids.clone()).await;
        ctx.tracker
            .submit(ViewportSnapshot {
                viewport_start: 0,
                viewport_end: 900,
                visible: vec![VisibleItem {
                    id: ids[0].clone(),
                    top: 0,
                    height: 300,
                }],
            })
            .await;

        let snapshot = tokio::time::timeout(
            Duration::from_secs(5),
            ctx.sync.wait_until(|s| !s.exposure_logs.is_empty()),
        )
        .await
        .unwrap();
        assert_eq!(snapshot.exposure_logs[0].item_id, ids[0]);

        ctx.shutdown().await;
    }
}
