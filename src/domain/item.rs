use serde::{Deserialize, Serialize};

/// Visual treatment of a feed card. The engine never renders; it only
/// carries the tag so a caller can resolve a renderer for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardType {
    TextOnly,
    ImageTop,
    ImageBottom,
    Video,
    Carousel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutType {
    SingleColumn,
    DoubleColumn,
}

/// Informational only; which side of a double-column row the item sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoubleColumnPosition {
    Left,
    Right,
}

/// A single feed entry. Immutable value object: the only mutation the
/// engine ever performs is [`FeedItem::renumbered`], which produces a
/// new item with an updated title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub title: String,
    /// Plain text, except for [`CardType::Carousel`] items where it holds
    /// a comma-separated list of image URLs.
    pub content: String,
    pub image_url: Option<String>,
    pub card_type: CardType,
    pub layout_type: LayoutType,
    pub double_column_position: Option<DoubleColumnPosition>,
}

/// Title prefix applied when renumbering. The numeric suffix always
/// equals the item's 1-based position in the feed list.
pub const TITLE_PREFIX: &str = "Post ";

impl FeedItem {
    /// Copy of this item titled for the given 1-based list position.
    pub fn renumbered(&self, position: usize) -> Self {
        Self {
            title: format!("{}{}", TITLE_PREFIX, position),
            ..self.clone()
        }
    }

    /// Image URLs embedded in a carousel item's content.
    ///
    /// Returns an empty list for every other card type.
    pub fn carousel_urls(&self) -> Vec<String> {
        if self.card_type != CardType::Carousel {
            return Vec::new();
        }
        self.content
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }
}
