pub mod exposure;
pub mod item;
pub mod state;

pub use exposure::{ExposureEvent, ExposureLog, ExposureRecord};
pub use item::{CardType, DoubleColumnPosition, FeedItem, LayoutType};
pub use state::FeedSnapshot;
