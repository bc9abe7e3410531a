use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::domain::{ExposureEvent, ExposureRecord};

/// Geometry of one on-screen item, in the scroll axis of the viewport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleItem {
    pub id: String,
    pub top: i32,
    pub height: i32,
}

/// One layout snapshot: viewport bounds plus the items currently
/// reported as visible by the layout system.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewportSnapshot {
    pub viewport_start: i32,
    pub viewport_end: i32,
    pub visible: Vec<VisibleItem>,
}

/// Threshold ladder, evaluated top-down, first match wins.
pub fn classify(ratio: f32) -> ExposureEvent {
    if ratio >= 1.0 {
        ExposureEvent::FullyVisible
    } else if ratio >= 0.5 {
        ExposureEvent::Visible50Percent
    } else if ratio > 0.0 {
        ExposureEvent::Visible
    } else {
        ExposureEvent::Invisible
    }
}

/// Computes visibility transitions between consecutive layout snapshots.
///
/// State is re-derived fresh from every snapshot; the only memory kept
/// is the last classification reported per item, so the output stream
/// carries no duplicate consecutive events and every visible item gets
/// exactly one `Invisible` when it leaves.
#[derive(Debug, Default)]
pub struct ExposureTracker {
    tracked_ids: Vec<String>,
    last_reported: HashMap<String, ExposureEvent>,
}

impl ExposureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tracked item-id list. A change of identity starts a
    /// new tracking session: the last-reported map is reset.
    pub fn set_tracked_ids(&mut self, ids: Vec<String>) {
        if ids != self.tracked_ids {
            self.tracked_ids = ids;
            self.last_reported.clear();
        }
    }

    /// Process one snapshot and return the transitions since the last
    /// one, disappeared items first.
    pub fn process(&mut self, snapshot: &ViewportSnapshot) -> Vec<(String, ExposureEvent)> {
        let mut current: HashMap<String, ExposureEvent> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();

        for item in &snapshot.visible {
            if !self.tracked_ids.iter().any(|id| id == &item.id) {
                continue;
            }
            let item_bottom = item.top + item.height;
            let visible_top = item.top.max(snapshot.viewport_start);
            let visible_bottom = item_bottom.min(snapshot.viewport_end);
            let visible_height = (visible_bottom - visible_top).max(0);
            let ratio = if item.height > 0 {
                visible_height as f32 / item.height as f32
            } else {
                0.0
            };
            if current.insert(item.id.clone(), classify(ratio)).is_none() {
                order.push(&item.id);
            }
        }

        let mut events = Vec::new();

        // Items gone from the visible set get one synthesized Invisible
        // and are dropped from tracking.
        let mut disappeared: Vec<String> = self
            .last_reported
            .keys()
            .filter(|id| !current.contains_key(*id))
            .cloned()
            .collect();
        disappeared.sort();
        for id in disappeared {
            let last = self.last_reported.remove(&id);
            if last != Some(ExposureEvent::Invisible) {
                events.push((id, ExposureEvent::Invisible));
            }
        }

        for id in order {
            let event = current[id];
            if self.last_reported.get(id) != Some(&event) {
                events.push((id.to_string(), event));
            }
            self.last_reported.insert(id.to_string(), event);
        }

        events
    }
}

/// Message type for the debounced tracker
#[derive(Debug)]
enum TrackerMessage {
    Snapshot(ViewportSnapshot),
    TrackIds(Vec<String>),
    Shutdown,
}

/// Handle to feed layout snapshots into the background tracker.
#[derive(Clone)]
pub struct ExposureTrackerHandle {
    tx: mpsc::Sender<TrackerMessage>,
}

impl ExposureTrackerHandle {
    /// Start a tracking session over these item ids.
    pub async fn track_ids(&self, ids: Vec<String>) {
        if let Err(e) = self.tx.send(TrackerMessage::TrackIds(ids)).await {
            warn!("Failed to send tracked ids: {}", e);
        }
    }

    /// Submit a layout snapshot. Snapshots arriving within the debounce
    /// window supersede each other; only the latest is processed.
    pub async fn submit(&self, snapshot: ViewportSnapshot) {
        if let Err(e) = self.tx.send(TrackerMessage::Snapshot(snapshot)).await {
            warn!("Failed to submit viewport snapshot: {}", e);
        }
    }

    /// Shutdown the tracker task
    pub async fn shutdown(&self) {
        let _ = self.tx.send(TrackerMessage::Shutdown).await;
    }
}

/// Debouncing wrapper around [`ExposureTracker`].
///
/// A snapshot is processed only after a quiet interval with no newer
/// snapshot; superseded intermediates are discarded, never queued.
pub struct DebouncedExposureTracker {
    debounce: Duration,
    tracker: ExposureTracker,
    rx: mpsc::Receiver<TrackerMessage>,
    sink: mpsc::Sender<ExposureRecord>,
}

impl DebouncedExposureTracker {
    pub fn new(
        debounce: Duration,
        sink: mpsc::Sender<ExposureRecord>,
    ) -> (Self, ExposureTrackerHandle) {
        let (tx, rx) = mpsc::channel(100);
        let handle = ExposureTrackerHandle { tx };
        let tracker = Self {
            debounce,
            tracker: ExposureTracker::new(),
            rx,
            sink,
        };
        (tracker, handle)
    }

    pub async fn run(mut self) {
        info!("Exposure tracker started");

        let mut pending: Option<ViewportSnapshot> = None;
        loop {
            tokio::select! {
                msg = self.rx.recv() => match msg {
                    Some(TrackerMessage::Snapshot(snapshot)) => {
                        // Supersedes whatever was waiting out the debounce.
                        pending = Some(snapshot);
                    }
                    Some(TrackerMessage::TrackIds(ids)) => {
                        self.tracker.set_tracked_ids(ids);
                    }
                    Some(TrackerMessage::Shutdown) | None => {
                        info!("Exposure tracker shutting down");
                        break;
                    }
                },
                _ = tokio::time::sleep(self.debounce), if pending.is_some() => {
                    if let Some(snapshot) = pending.take() {
                        for (item_id, event) in self.tracker.process(&snapshot) {
                            let record = ExposureRecord::new(item_id, event);
                            if self.sink.send(record).await.is_err() {
                                warn!("Exposure sink closed; dropping event");
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Spawn the debounced tracker as a tokio task
pub fn spawn_exposure_tracker(
    debounce: Duration,
    sink: mpsc::Sender<ExposureRecord>,
) -> ExposureTrackerHandle {
    let (tracker, handle) = DebouncedExposureTracker::new(debounce, sink);

    tokio::spawn(async move {
        tracker.run().await;
    });

    handle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(visible: Vec<(&str, i32, i32)>) -> ViewportSnapshot {
        ViewportSnapshot {
            viewport_start: 0,
            viewport_end: 1000,
            visible: visible
                .into_iter()
                .map(|(id, top, height)| VisibleItem {
                    id: id.into(),
                    top,
                    height,
                })
                .collect(),
        }
    }

    fn tracker_for(ids: &[&str]) -> ExposureTracker {
        let mut tracker = ExposureTracker::new();
        tracker.set_tracked_ids(ids.iter().map(|s| s.to_string()).collect());
        tracker
    }

    #[test]
    fn test_classify_threshold_ladder() {
        assert_eq!(classify(1.0), ExposureEvent::FullyVisible);
        assert_eq!(classify(0.99), ExposureEvent::Visible50Percent);
        assert_eq!(classify(0.5), ExposureEvent::Visible50Percent);
        assert_eq!(classify(0.49), ExposureEvent::Visible);
        assert_eq!(classify(0.0), ExposureEvent::Invisible);
    }

    #[test]
    fn test_fully_within_viewport() {
        let mut tracker = tracker_for(&["a"]);
        let events = tracker.process(&snapshot(vec![("a", 100, 300)]));
        assert_eq!(events, vec![("a".to_string(), ExposureEvent::FullyVisible)]);
    }

    #[test]
    fn test_exact_half_overlap() {
        // Item of height 200 with its top 100 above the viewport start.
        let mut tracker = tracker_for(&["a"]);
        let events = tracker.process(&snapshot(vec![("a", -100, 200)]));
        assert_eq!(
            events,
            vec![("a".to_string(), ExposureEvent::Visible50Percent)]
        );
    }

    #[test]
    fn test_sliver_is_visible() {
        let mut tracker = tracker_for(&["a"]);
        let events = tracker.process(&snapshot(vec![("a", -290, 300)]));
        assert_eq!(events, vec![("a".to_string(), ExposureEvent::Visible)]);
    }

    #[test]
    fn test_zero_height_classifies_invisible() {
        let mut tracker = tracker_for(&["a"]);
        let events = tracker.process(&snapshot(vec![("a", 100, 0)]));
        assert_eq!(events, vec![("a".to_string(), ExposureEvent::Invisible)]);
    }

    #[test]
    fn test_no_duplicate_events_for_unchanged_state() {
        let mut tracker = tracker_for(&["a"]);
        let layout = snapshot(vec![("a", 100, 300)]);
        assert_eq!(tracker.process(&layout).len(), 1);
        assert!(tracker.process(&layout).is_empty());
        assert!(tracker.process(&layout).is_empty());
    }

    #[test]
    fn test_exactly_one_invisible_when_item_leaves() {
        let mut tracker = tracker_for(&["a"]);
        tracker.process(&snapshot(vec![("a", 100, 300)]));

        let gone = snapshot(vec![]);
        assert_eq!(
            tracker.process(&gone),
            vec![("a".to_string(), ExposureEvent::Invisible)]
        );
        // Dropped from tracking: no further events.
        assert!(tracker.process(&gone).is_empty());
    }

    #[test]
    fn test_transition_sequence_while_scrolling_off() {
        let mut tracker = tracker_for(&["a"]);
        tracker.process(&snapshot(vec![("a", 0, 300)]));

        let events = tracker.process(&snapshot(vec![("a", -200, 300)]));
        assert_eq!(events, vec![("a".to_string(), ExposureEvent::Visible)]);

        let events = tracker.process(&snapshot(vec![]));
        assert_eq!(events, vec![("a".to_string(), ExposureEvent::Invisible)]);
    }

    #[test]
    fn test_untracked_ids_are_skipped() {
        let mut tracker = tracker_for(&["a"]);
        let events = tracker.process(&snapshot(vec![("a", 0, 300), ("ghost", 0, 300)]));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, "a");
    }

    #[test]
    fn test_id_list_identity_change_resets_session() {
        let mut tracker = tracker_for(&["a"]);
        let layout = snapshot(vec![("a", 0, 300)]);
        assert_eq!(tracker.process(&layout).len(), 1);

        tracker.set_tracked_ids(vec!["a".into(), "b".into()]);
        // Same geometry reports again after the reset.
        assert_eq!(tracker.process(&layout).len(), 1);
    }

    #[test]
    fn test_same_id_list_keeps_session() {
        let mut tracker = tracker_for(&["a"]);
        let layout = snapshot(vec![("a", 0, 300)]);
        assert_eq!(tracker.process(&layout).len(), 1);

        tracker.set_tracked_ids(vec!["a".into()]);
        assert!(tracker.process(&layout).is_empty());
    }

    #[test]
    fn test_invisible_in_set_then_disappears_emits_once() {
        let mut tracker = tracker_for(&["a"]);
        // Listed as visible but with zero overlap.
        tracker.process(&snapshot(vec![("a", 2000, 300)]));
        // Leaving the set must not synthesize a second Invisible.
        assert!(tracker.process(&snapshot(vec![])).is_empty());
    }

    #[tokio::test]
    async fn test_debounce_coalesces_to_latest_snapshot() {
        let (sink_tx, mut sink_rx) = mpsc::channel(32);
        let handle = spawn_exposure_tracker(Duration::from_millis(20), sink_tx);

        handle.track_ids(vec!["a".into()]).await;
        // Two snapshots inside one debounce window: only the second counts.
        handle.submit(snapshot(vec![("a", -100, 200)])).await;
        handle.submit(snapshot(vec![("a", 100, 200)])).await;

        let record = tokio::time::timeout(Duration::from_millis(500), sink_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.item_id, "a");
        assert_eq!(record.event, ExposureEvent::FullyVisible);

        handle.shutdown().await;
        // Channel drains with no intermediate Visible50Percent event.
        assert!(sink_rx.recv().await.is_none());
    }
}
