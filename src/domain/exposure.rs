use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discrete visibility-state transition for one feed item relative to
/// the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExposureEvent {
    /// Any part of the card is on screen.
    Visible,
    /// At least half of the card is on screen.
    Visible50Percent,
    /// The whole card is on screen.
    FullyVisible,
    /// The card left the screen.
    Invisible,
}

/// One reported exposure transition. The timestamp is assigned at
/// report time, not at layout time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureRecord {
    pub item_id: String,
    pub event: ExposureEvent,
    pub timestamp: DateTime<Utc>,
}

impl ExposureRecord {
    pub fn new(item_id: String, event: ExposureEvent) -> Self {
        Self {
            item_id,
            event,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only record of exposure transitions, ordered by arrival.
/// No deduplication; the tracker already guarantees no consecutive
/// duplicates per item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExposureLog {
    records: Vec<ExposureRecord>,
}

impl ExposureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, record: ExposureRecord) {
        self.records.push(record);
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// All records, most-recent-last. Consumers may reverse for display.
    pub fn all(&self) -> &[ExposureRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_arrival_order() {
        let mut log = ExposureLog::new();
        log.append(ExposureRecord::new("a".into(), ExposureEvent::Visible));
        log.append(ExposureRecord::new("b".into(), ExposureEvent::FullyVisible));
        log.append(ExposureRecord::new("a".into(), ExposureEvent::Invisible));

        let ids: Vec<_> = log.all().iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "a"]);
        assert_eq!(log.all().last().unwrap().event, ExposureEvent::Invisible);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let mut log = ExposureLog::new();
        log.append(ExposureRecord::new("a".into(), ExposureEvent::Visible));
        log.append(ExposureRecord::new("a".into(), ExposureEvent::Visible));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut log = ExposureLog::new();
        log.append(ExposureRecord::new("a".into(), ExposureEvent::Visible));
        log.clear();
        assert!(log.is_empty());
    }
}
