use std::collections::HashMap;

use crate::domain::CardType;

/// Opaque handle to an externally provided renderer. The engine never
/// renders; it only resolves the tag so a caller can.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererHandle {
    pub name: String,
    pub card_type: CardType,
}

impl RendererHandle {
    pub fn new(name: impl Into<String>, card_type: CardType) -> Self {
        Self {
            name: name.into(),
            card_type,
        }
    }
}

/// Lookup table from card type to renderer handle. Absence of a
/// renderer is not an engine error; callers decide how to fall back.
#[derive(Debug, Default)]
pub struct RendererRegistry {
    renderers: HashMap<CardType, RendererHandle>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with one named handle per card type.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RendererHandle::new("text-only", CardType::TextOnly));
        registry.register(RendererHandle::new("image-top", CardType::ImageTop));
        registry.register(RendererHandle::new("image-bottom", CardType::ImageBottom));
        registry.register(RendererHandle::new("video", CardType::Video));
        registry.register(RendererHandle::new("carousel", CardType::Carousel));
        registry
    }

    /// Register a renderer for its card type. Last registration wins.
    pub fn register(&mut self, handle: RendererHandle) {
        self.renderers.insert(handle.card_type, handle);
    }

    pub fn resolve(&self, card_type: CardType) -> Option<&RendererHandle> {
        self.renderers.get(&card_type)
    }

    pub fn supported_card_types(&self) -> Vec<CardType> {
        self.renderers.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_missing_renderer_is_none() {
        let registry = RendererRegistry::new();
        assert!(registry.resolve(CardType::Video).is_none());
    }

    #[test]
    fn test_defaults_cover_every_card_type() {
        let registry = RendererRegistry::with_defaults();
        for card_type in [
            CardType::TextOnly,
            CardType::ImageTop,
            CardType::ImageBottom,
            CardType::Video,
            CardType::Carousel,
        ] {
            assert!(registry.resolve(card_type).is_some());
        }
        assert_eq!(registry.supported_card_types().len(), 5);
    }

    #[test]
    fn test_last_registration_wins() {
        let mut registry = RendererRegistry::with_defaults();
        registry.register(RendererHandle::new("video-v2", CardType::Video));
        assert_eq!(registry.resolve(CardType::Video).unwrap().name, "video-v2");
    }
}
