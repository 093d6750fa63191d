//! URI-keyed model registry.
//!
//! A URI maps to at most one live [`TextModel`]. Lookups for missing models are not errors:
//! callers get `None` and treat the request as a no-op.

use crate::error::BridgeError;
use crate::model::{ContentChangeEvent, SingleEdit, TextModel};
use crate::uri::ModelUri;
use editor_bridge_lang::LanguageRegistry;
use std::collections::BTreeMap;

/// Outcome of [`ModelRegistry::get_or_create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelUpsert {
    /// A new model was created.
    pub created: bool,
    /// Flush event when an existing model had its content replaced.
    pub change: Option<ContentChangeEvent>,
}

/// Owns every live model.
#[derive(Debug)]
pub struct ModelRegistry {
    models: BTreeMap<ModelUri, TextModel>,
    languages: LanguageRegistry,
    max_undo_steps: usize,
}

impl ModelRegistry {
    /// Create an empty registry.
    pub fn new(languages: LanguageRegistry, max_undo_steps: usize) -> Self {
        Self {
            models: BTreeMap::new(),
            languages,
            max_undo_steps,
        }
    }

    /// Language table used to infer ids from URIs.
    pub fn languages(&self) -> &LanguageRegistry {
        &self.languages
    }

    /// Look up a model.
    pub fn get(&self, uri: &ModelUri) -> Option<&TextModel> {
        self.models.get(uri)
    }

    /// Look up a model mutably.
    pub fn get_mut(&mut self, uri: &ModelUri) -> Option<&mut TextModel> {
        self.models.get_mut(uri)
    }

    /// Whether a model exists for `uri`.
    pub fn contains(&self, uri: &ModelUri) -> bool {
        self.models.contains_key(uri)
    }

    /// Number of live models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Iterate over live models in URI order.
    pub fn iter(&self) -> impl Iterator<Item = &TextModel> {
        self.models.values()
    }

    /// Create a model, failing if one already exists.
    ///
    /// Without an explicit language the id is inferred from the URI path.
    pub fn create(
        &mut self,
        uri: ModelUri,
        content: &str,
        language: Option<&str>,
    ) -> Result<&mut TextModel, BridgeError> {
        if self.models.contains_key(&uri) {
            return Err(BridgeError::ModelAlreadyExists(uri.to_string()));
        }
        let language = match language {
            Some(language) => language.to_string(),
            None => self.languages.language_for_path(uri.path()).to_string(),
        };
        let model = TextModel::new(uri.clone(), content, language, self.max_undo_steps);
        tracing::debug!(uri = %uri, "model created");
        Ok(self.models.entry(uri).or_insert(model))
    }

    /// Return the model for `uri`, creating it when absent.
    ///
    /// For an existing model, a `content` that differs from the current text replaces it in
    /// place: identity is kept, the version moves and a flush event is returned.
    pub fn get_or_create(
        &mut self,
        uri: &ModelUri,
        content: Option<&str>,
        language: Option<&str>,
    ) -> ModelUpsert {
        if let Some(model) = self.models.get_mut(uri) {
            let change = match content {
                Some(content) if model.value() != content => Some(model.set_value(content)),
                _ => None,
            };
            return ModelUpsert {
                created: false,
                change,
            };
        }

        let language = match language {
            Some(language) => language.to_string(),
            None => self.languages.language_for_path(uri.path()).to_string(),
        };
        let model = TextModel::new(
            uri.clone(),
            content.unwrap_or_default(),
            language,
            self.max_undo_steps,
        );
        self.models.insert(uri.clone(), model);
        tracing::debug!(uri = %uri, "model created");
        ModelUpsert {
            created: true,
            change: None,
        }
    }

    /// Flush-replace the text of an existing model. Missing models are a no-op.
    pub fn set_value(&mut self, uri: &ModelUri, content: &str) -> Option<ContentChangeEvent> {
        self.models
            .get_mut(uri)
            .map(|model| model.set_value(content))
    }

    /// Apply edits to an existing model. Missing models are a no-op.
    pub fn apply_edits(
        &mut self,
        uri: &ModelUri,
        edits: &[SingleEdit],
    ) -> Result<Option<ContentChangeEvent>, BridgeError> {
        match self.models.get_mut(uri) {
            Some(model) => model.apply_edits(edits),
            None => Ok(None),
        }
    }

    /// Move a model to a new URI.
    ///
    /// The new model gets the old text and the old undo history, and its language is inferred
    /// from the new URI. Returns `Ok(false)` when `old` does not exist.
    pub fn rename(&mut self, old: &ModelUri, new: &ModelUri) -> Result<bool, BridgeError> {
        if !self.models.contains_key(old) {
            return Ok(false);
        }
        if old == new {
            return Ok(true);
        }
        if self.models.contains_key(new) {
            return Err(BridgeError::ModelAlreadyExists(new.to_string()));
        }
        let Some(mut previous) = self.models.remove(old) else {
            return Ok(false);
        };
        let target = self.create(new.clone(), &previous.value(), None)?;
        previous.transfer_history_to(target);
        tracing::debug!(old = %old, new = %new, "model renamed");
        Ok(true)
    }

    /// Remove a model, returning it. Missing models are a no-op.
    pub fn remove(&mut self, uri: &ModelUri) -> Option<TextModel> {
        let removed = self.models.remove(uri);
        if removed.is_some() {
            tracing::debug!(uri = %uri, "model disposed");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModelRegistry {
        ModelRegistry::new(LanguageRegistry::builtin(), 100)
    }

    #[test]
    fn test_get_or_create_keeps_identity() {
        let mut registry = registry();
        let uri = ModelUri::parse("file:///a.rs");
        assert!(registry.get_or_create(&uri, Some("x"), None).created);
        let upsert = registry.get_or_create(&uri, Some("x"), None);
        assert!(!upsert.created);
        assert!(upsert.change.is_none());
        assert_eq!(registry.get(&uri).unwrap().version(), 1);

        let upsert = registry.get_or_create(&uri, Some("y"), None);
        assert!(upsert.change.unwrap().is_flush);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&uri).unwrap().language_id(), "rust");
    }

    #[test]
    fn test_create_rejects_duplicates() {
        let mut registry = registry();
        let uri = ModelUri::parse("/a.txt");
        registry.create(uri.clone(), "", None).unwrap();
        assert!(matches!(
            registry.create(uri, "", None),
            Err(BridgeError::ModelAlreadyExists(_))
        ));
    }

    #[test]
    fn test_rename_missing_is_noop() {
        let mut registry = registry();
        let renamed = registry
            .rename(&ModelUri::parse("/nope"), &ModelUri::parse("/other"))
            .unwrap();
        assert!(!renamed);
        assert!(registry.is_empty());
    }
}
