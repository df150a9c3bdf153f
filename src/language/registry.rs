// SPDX-License-Identifier: MIT
//! Language registry: name → factory.
//!
//! Populated once at configuration time and read-only afterwards, so
//! lookups need no synchronization. Removing a language disables it
//! entirely — later resolution fails with `UnknownLanguage`.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::ProtocolError;

use super::service::{LanguageConfig, LanguageService};
use super::text::TextLanguageService;

/// Builds an immutable service instance from a configuration object.
pub type LanguageFactory =
    Arc<dyn Fn(&LanguageConfig) -> anyhow::Result<Arc<dyn LanguageService>> + Send + Sync>;

pub const TEXT_LANGUAGE: &str = "text";

#[derive(Default)]
pub struct LanguageRegistry {
    factories: HashMap<String, LanguageFactory>,
}

impl LanguageRegistry {
    /// An empty registry; most callers want `with_defaults`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the built-in `"text"` language.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(TEXT_LANGUAGE, TextLanguageService::factory())
            .expect("empty registry cannot hold a duplicate");
        registry
    }

    /// Associate `name` with a factory. Registering a name twice is a
    /// configuration error, fatal to startup.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: LanguageFactory,
    ) -> Result<(), ProtocolError> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(ProtocolError::DuplicateLanguage(name));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Disable a language entirely. Unknown names are ignored.
    pub fn remove(&mut self, name: &str) {
        self.factories.remove(name);
    }

    pub fn resolve(&self, name: &str) -> Result<LanguageFactory, ProtocolError> {
        self.factories
            .get(name)
            .cloned()
            .ok_or_else(|| ProtocolError::UnknownLanguage(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_include_text() {
        let registry = LanguageRegistry::with_defaults();
        assert!(registry.resolve(TEXT_LANGUAGE).is_ok());
    }

    #[test]
    fn removed_language_fails_resolution() {
        let mut registry = LanguageRegistry::with_defaults();
        registry.remove(TEXT_LANGUAGE);
        assert!(matches!(
            registry.resolve(TEXT_LANGUAGE),
            Err(ProtocolError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn duplicate_registration_is_fatal() {
        let mut registry = LanguageRegistry::with_defaults();
        let result = registry.register(TEXT_LANGUAGE, TextLanguageService::factory());
        assert!(matches!(result, Err(ProtocolError::DuplicateLanguage(_))));
    }
}
