//! Model capability catalog.
//!
//! Decides which models accept reasoning controls. Explicit table entries
//! come first; models without an entry are classified by configurable name
//! prefixes and suffixes.

use scout_core::{LlmSettings, ReasoningMarkers};
use std::collections::HashMap;

/// Capability flags for a model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelCapabilities {
    /// Accepts a reasoning-effort control
    pub reasoning: bool,
}

/// Model name to capability lookup.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: HashMap<String, ModelCapabilities>,
    markers: ReasoningMarkers,
}

impl ModelCatalog {
    /// Create a catalog from explicit entries and name markers.
    pub fn new(models: HashMap<String, ModelCapabilities>, markers: ReasoningMarkers) -> Self {
        let models = models
            .into_iter()
            .map(|(name, caps)| (name.to_lowercase(), caps))
            .collect();
        Self { models, markers }
    }

    /// Build the catalog from the `models` and `reasoningMarkers` settings.
    pub fn from_settings(settings: &LlmSettings) -> Self {
        let models = settings
            .models
            .iter()
            .map(|(name, model)| {
                (
                    name.clone(),
                    ModelCapabilities {
                        reasoning: model.reasoning,
                    },
                )
            })
            .collect();
        Self::new(models, settings.reasoning_markers.clone())
    }

    /// Add or replace an explicit entry.
    pub fn with_model(mut self, name: &str, capabilities: ModelCapabilities) -> Self {
        self.models.insert(name.to_lowercase(), capabilities);
        self
    }

    /// Capabilities of `model`.
    pub fn capabilities(&self, model: &str) -> ModelCapabilities {
        let name = normalize(model);

        if let Some(caps) = self.models.get(&name) {
            return *caps;
        }

        let reasoning = self
            .markers
            .prefixes
            .iter()
            .any(|p| !p.is_empty() && name.starts_with(&p.to_lowercase()))
            || self
                .markers
                .suffixes
                .iter()
                .any(|s| !s.is_empty() && has_trailing_segment(&name, &s.to_lowercase()));

        ModelCapabilities { reasoning }
    }

    /// Whether `model` accepts reasoning-effort controls.
    pub fn is_reasoning(&self, model: &str) -> bool {
        self.capabilities(model).reasoning
    }
}

/// Whether `marker` appears as a `-`-separated segment after the first one,
/// as in `claude-sonnet-thinking` or `gemini-2.0-flash-thinking-exp-01-21`.
fn has_trailing_segment(name: &str, marker: &str) -> bool {
    name.split('-').skip(1).any(|segment| segment == marker)
}

/// Lowercase and drop resource prefixes such as `models/` or `org/`.
fn normalize(model: &str) -> String {
    let trimmed = model.trim();
    let base = trimmed.rsplit('/').next().unwrap_or(trimmed);
    base.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_core::ModelSettings;

    fn default_catalog() -> ModelCatalog {
        ModelCatalog::from_settings(&LlmSettings::default())
    }

    #[test]
    fn test_reasoning_markers() {
        let catalog = default_catalog();
        assert!(catalog.is_reasoning("gpt-5"));
        assert!(catalog.is_reasoning("gpt-5-mini"));
        assert!(catalog.is_reasoning("gpt-5.1"));
        assert!(catalog.is_reasoning("o3-mini"));
        assert!(catalog.is_reasoning("o4-mini"));
        assert!(catalog.is_reasoning("gemini-2.0-flash-thinking"));
        assert!(catalog.is_reasoning("models/gemini-2.0-flash-thinking"));
        assert!(catalog.is_reasoning("gemini-2.0-flash-thinking-exp-01-21"));
        assert!(catalog.is_reasoning("models/gemini-2.0-flash-thinking-exp"));
        assert!(catalog.is_reasoning("GPT-5"));
    }

    #[test]
    fn test_chat_models_are_not_reasoning() {
        let catalog = default_catalog();
        assert!(!catalog.is_reasoning("gpt-4o"));
        assert!(!catalog.is_reasoning("gpt-4.1-mini"));
        assert!(!catalog.is_reasoning("gemini-2.5-flash"));
        // Markers are anchored, so a mid-string match does not count
        assert!(!catalog.is_reasoning("turbo-o3-chat"));
        assert!(!catalog.is_reasoning("thinking-about-it-chat"));
        assert!(!catalog.is_reasoning("gemini-rethinking-pro"));
    }

    #[test]
    fn test_explicit_entry_overrides_markers() {
        let mut settings = LlmSettings::default();
        settings
            .models
            .insert("o3-mini".to_string(), ModelSettings { reasoning: false });
        settings
            .models
            .insert("house-model".to_string(), ModelSettings { reasoning: true });

        let catalog = ModelCatalog::from_settings(&settings);
        assert!(!catalog.is_reasoning("o3-mini"));
        assert!(catalog.is_reasoning("house-model"));
        assert!(catalog.is_reasoning("House-Model"));
    }

    #[test]
    fn test_with_model_and_custom_markers() {
        let markers = ReasoningMarkers {
            prefixes: vec!["r1".to_string()],
            suffixes: vec![],
        };
        let catalog = ModelCatalog::new(HashMap::new(), markers)
            .with_model("plain", ModelCapabilities { reasoning: true });

        assert!(catalog.is_reasoning("r1-distill"));
        assert!(catalog.is_reasoning("plain"));
        assert!(!catalog.is_reasoning("gpt-5"));
    }
}
