use serde::Serialize;

use crate::domain::{ExposureRecord, FeedItem};

/// Read-only view of the controller's state, published through a watch
/// channel after every state change. Consumers never see a partial
/// update.
#[derive(Debug, Clone, Serialize)]
pub struct FeedSnapshot {
    pub feeds: Vec<FeedItem>,
    pub is_loading: bool,
    pub is_refreshing: bool,
    pub has_error: bool,
    pub error_message: String,
    pub can_load_more: bool,
    pub exposure_logs: Vec<ExposureRecord>,
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            is_loading: false,
            is_refreshing: false,
            has_error: false,
            error_message: String::new(),
            can_load_more: true,
            exposure_logs: Vec::new(),
        }
    }
}

impl FeedSnapshot {
    /// True when no load or refresh is in flight.
    pub fn is_idle(&self) -> bool {
        !self.is_loading && !self.is_refreshing
    }
}
