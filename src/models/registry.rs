//! Known models per provider.
//!
//! The first model listed for a provider is its fallback default when
//! neither the command line nor the config file names one.

use super::card::{Encoding, ModelCard, Provider};

/// Embedded model cards, grouped by provider in preference order
pub static KNOWN_MODELS: &[ModelCard] = &[
    // Gemini
    ModelCard::remote("gemini-2.5-flash", Provider::Gemini),
    ModelCard::remote("gemini-2.0-flash-exp", Provider::Gemini),
    ModelCard::remote("gemini-1.5-pro", Provider::Gemini),
    ModelCard::remote("gemini-1.5-flash", Provider::Gemini),
    // OpenAI
    ModelCard::local("gpt-4o", Encoding::O200kBase),
    ModelCard::local("gpt-4", Encoding::Cl100kBase),
    ModelCard::local("gpt-4-turbo", Encoding::Cl100kBase),
    ModelCard::local("gpt-3.5-turbo", Encoding::Cl100kBase),
    ModelCard::local("o1-preview", Encoding::O200kBase),
    ModelCard::local("o1-mini", Encoding::O200kBase),
    // Anthropic
    ModelCard::remote("claude-3-5-sonnet-20241022", Provider::Anthropic),
    ModelCard::remote("claude-3-5-haiku-20241022", Provider::Anthropic),
    ModelCard::remote("claude-3-opus-20240229", Provider::Anthropic),
    ModelCard::remote("claude-3-sonnet-20240229", Provider::Anthropic),
    ModelCard::remote("claude-3-haiku-20240307", Provider::Anthropic),
];

/// Lookup over [`KNOWN_MODELS`]
///
/// # Example
/// ```
/// use tokenscope::models::{ModelRegistry, Provider};
///
/// let registry = ModelRegistry::new();
/// assert_eq!(registry.default_model(Provider::OpenAI), Some("gpt-4o"));
/// assert!(registry.get("claude-3-opus-20240229").is_some());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ModelRegistry {
    cards: &'static [ModelCard],
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    /// Create a registry over the embedded cards
    pub fn new() -> Self {
        Self {
            cards: KNOWN_MODELS,
        }
    }

    /// Iterate over all cards
    pub fn iter(&self) -> impl Iterator<Item = &'static ModelCard> {
        let cards: &'static [ModelCard] = self.cards;
        cards.iter()
    }

    /// Look up a card by model name (case-insensitive)
    pub fn get(&self, id: &str) -> Option<&'static ModelCard> {
        self.cards.iter().find(|c| c.id.eq_ignore_ascii_case(id))
    }

    /// Cards for one provider, in preference order
    pub fn for_provider(&self, provider: Provider) -> impl Iterator<Item = &'static ModelCard> {
        let cards: &'static [ModelCard] = self.cards;
        cards.iter().filter(move |c| c.provider == provider)
    }

    /// Model names for one provider
    pub fn model_ids(&self, provider: Provider) -> Vec<&'static str> {
        self.for_provider(provider).map(|c| c.id).collect()
    }

    /// First listed model for a provider
    pub fn default_model(&self, provider: Provider) -> Option<&'static str> {
        self.for_provider(provider).next().map(|c| c.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_provider() {
        let registry = ModelRegistry::new();
        assert_eq!(
            registry.default_model(Provider::Gemini),
            Some("gemini-2.5-flash")
        );
        assert_eq!(registry.default_model(Provider::OpenAI), Some("gpt-4o"));
        assert_eq!(
            registry.default_model(Provider::Anthropic),
            Some("claude-3-5-sonnet-20241022")
        );
    }

    #[test]
    fn test_lookup_case_insensitive() {
        let registry = ModelRegistry::new();
        let card = registry.get("GPT-4").unwrap();
        assert_eq!(card.encoding, Some(Encoding::Cl100kBase));
        assert!(registry.get("unknown-model").is_none());
    }

    #[test]
    fn test_cards_are_consistent() {
        let registry = ModelRegistry::new();
        assert_eq!(registry.iter().count(), 15);

        for card in registry.iter() {
            // Provider inferred from the name matches the card
            assert_eq!(Provider::from_model_id(card.id), Some(card.provider));
            // Only OpenAI models are counted locally
            assert_eq!(card.encoding.is_some(), card.provider == Provider::OpenAI);
            if let Some(encoding) = card.encoding {
                assert_eq!(Encoding::infer_from_id(card.id), encoding);
            }
        }
    }

    #[test]
    fn test_model_ids() {
        let registry = ModelRegistry::new();
        assert_eq!(registry.model_ids(Provider::Gemini).len(), 4);
        assert_eq!(registry.model_ids(Provider::OpenAI).len(), 6);
        assert_eq!(registry.model_ids(Provider::Anthropic).len(), 5);
    }
}
