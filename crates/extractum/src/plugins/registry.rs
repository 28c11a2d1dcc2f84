//! Backend registration and lookup.
//!
//! Each [`Extractor`](crate::Extractor) owns an `Arc<DocumentExtractorRegistry>`.
//! Registering a backend on an extractor clones the registry (backends are
//! shared `Arc`s), so extractors cloned earlier keep their own view.

use crate::plugins::DocumentExtractor;
use crate::{ExtractumError, Result};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

fn validate_plugin_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ExtractumError::invalid_argument("Plugin name cannot be empty"));
    }

    if name.contains(char::is_whitespace) {
        return Err(ExtractumError::invalid_argument(format!(
            "Plugin name '{}' cannot contain whitespace",
            name
        )));
    }

    Ok(())
}

#[derive(Clone, Default)]
pub struct DocumentExtractorRegistry {
    extractors: HashMap<String, BTreeMap<i32, Arc<dyn DocumentExtractor>>>,
    name_index: HashMap<String, Vec<(String, i32)>>,
}

impl DocumentExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every backend compiled into the crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for extractor in crate::extractors::default_extractors() {
            if let Err(e) = registry.register(extractor) {
                tracing::warn!("Failed to register built-in backend: {}", e);
            }
        }
        registry
    }

    /// Register a backend for every MIME type it supports. A backend with the
    /// same priority for a MIME type replaces the previous one.
    pub fn register(&mut self, extractor: Arc<dyn DocumentExtractor>) -> Result<()> {
        let name = extractor.name().to_string();
        let priority = extractor.priority();

        validate_plugin_name(&name)?;

        extractor.initialize()?;

        if self.name_index.contains_key(&name) {
            self.remove(&name)?;
        }

        let mut index_entries = Vec::new();
        for mime_type in extractor.supported_mime_types() {
            self.extractors
                .entry(mime_type.to_string())
                .or_default()
                .insert(priority, Arc::clone(&extractor));
            index_entries.push((mime_type.to_string(), priority));
        }

        tracing::debug!(backend = %name, priority, mime_types = index_entries.len(), "registered backend");
        self.name_index.insert(name, index_entries);

        Ok(())
    }

    /// Highest-priority backend for `mime_type`, falling back to `family/*` entries.
    pub fn get(&self, mime_type: &str) -> Result<Arc<dyn DocumentExtractor>> {
        if let Some(priority_map) = self.extractors.get(mime_type)
            && let Some((_priority, extractor)) = priority_map.iter().next_back()
        {
            return Ok(Arc::clone(extractor));
        }

        let mut best_match: Option<(i32, Arc<dyn DocumentExtractor>)> = None;

        for (registered_mime, priority_map) in &self.extractors {
            let Some(prefix) = registered_mime.strip_suffix('*') else {
                continue;
            };
            if !mime_type.starts_with(prefix) {
                continue;
            }
            if let Some((priority, extractor)) = priority_map.iter().next_back()
                && best_match.as_ref().is_none_or(|(current, _)| priority > current)
            {
                best_match = Some((*priority, Arc::clone(extractor)));
            }
        }

        best_match
            .map(|(_, extractor)| extractor)
            .ok_or_else(|| ExtractumError::UnsupportedFormat(mime_type.to_string()))
    }

    pub fn supports(&self, mime_type: &str) -> bool {
        self.get(mime_type).is_ok()
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.name_index.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn remove(&mut self, name: &str) -> Result<()> {
        let Some(index_entries) = self.name_index.remove(name) else {
            return Ok(());
        };

        let mut extractor_to_shutdown: Option<Arc<dyn DocumentExtractor>> = None;

        for (mime_type, priority) in index_entries {
            if let Some(priority_map) = self.extractors.get_mut(&mime_type) {
                if let Some(extractor) = priority_map.remove(&priority)
                    && extractor_to_shutdown.is_none()
                {
                    extractor_to_shutdown = Some(extractor);
                }

                if priority_map.is_empty() {
                    self.extractors.remove(&mime_type);
                }
            }
        }

        // Registries cloned from this one may still hold the backend.
        match extractor_to_shutdown {
            Some(extractor) if Arc::strong_count(&extractor) == 1 => extractor.shutdown()?,
            Some(_) => tracing::debug!(backend = %name, "backend still shared, skipping shutdown"),
            None => {}
        }

        Ok(())
    }
}

impl std::fmt::Debug for DocumentExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentExtractorRegistry").field("backends", &self.list()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{DocumentSource, ExtractionContext, ParsedDocument, Plugin};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct MockExtractor {
        name: &'static str,
        mime_types: &'static [&'static str],
        priority: i32,
    }

    impl Plugin for MockExtractor {
        fn name(&self) -> &str {
            self.name
        }

        fn version(&self) -> String {
            "1.0.0".to_string()
        }
    }

    impl DocumentExtractor for MockExtractor {
        fn supported_mime_types(&self) -> &[&str] {
            self.mime_types
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn extract(&self, _: DocumentSource, _: &str, _: &ExtractionContext) -> Result<ParsedDocument> {
            Ok(ParsedDocument::from_events(Default::default(), Vec::new()))
        }
    }

    fn mock(name: &'static str, mime_types: &'static [&'static str], priority: i32) -> Arc<dyn DocumentExtractor> {
        Arc::new(MockExtractor {
            name,
            mime_types,
            priority,
        })
    }

    #[test]
    fn test_highest_priority_wins() {
        let mut registry = DocumentExtractorRegistry::new();
        registry.register(mock("low", &["text/plain"], 10)).unwrap();
        registry.register(mock("high", &["text/plain"], 90)).unwrap();

        assert_eq!(registry.get("text/plain").unwrap().name(), "high");
        assert_eq!(registry.list(), vec!["high".to_string(), "low".to_string()]);
    }

    #[test]
    fn test_wildcard_fallback() {
        let mut registry = DocumentExtractorRegistry::new();
        registry.register(mock("images", &["image/*"], 50)).unwrap();

        assert_eq!(registry.get("image/png").unwrap().name(), "images");
        let err = registry.get("application/pdf").err().unwrap();
        assert_eq!(err.kind(), crate::ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_remove_unregisters_all_mime_types() {
        let mut registry = DocumentExtractorRegistry::new();
        registry.register(mock("multi", &["text/plain", "text/csv"], 50)).unwrap();
        registry.remove("multi").unwrap();

        assert!(!registry.supports("text/plain"));
        assert!(!registry.supports("text/csv"));
        assert!(registry.list().is_empty());
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut registry = DocumentExtractorRegistry::new();
        assert!(registry.register(mock("", &["text/plain"], 50)).is_err());
        assert!(registry.register(mock("has space", &["text/plain"], 50)).is_err());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut original = DocumentExtractorRegistry::new();
        original.register(mock("a", &["text/plain"], 50)).unwrap();
        let mut copy = original.clone();
        copy.register(mock("b", &["text/csv"], 50)).unwrap();

        assert!(!original.supports("text/csv"));
        assert!(copy.supports("text/plain"));
    }

    struct Lifecycle {
        shutdowns: Arc<AtomicUsize>,
    }

    impl Plugin for Lifecycle {
        fn name(&self) -> &str {
            "lifecycle"
        }

        fn version(&self) -> String {
            "1.0.0".to_string()
        }

        fn shutdown(&self) -> Result<()> {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl DocumentExtractor for Lifecycle {
        fn supported_mime_types(&self) -> &[&str] {
            &["text/plain", "text/csv"]
        }

        fn extract(&self, _: DocumentSource, _: &str, _: &ExtractionContext) -> Result<ParsedDocument> {
            Ok(ParsedDocument::from_events(Default::default(), Vec::new()))
        }
    }

    #[test]
    fn test_shutdown_waits_for_last_registry() {
        let shutdowns = Arc::new(AtomicUsize::new(0));
        let mut original = DocumentExtractorRegistry::new();
        original
            .register(Arc::new(Lifecycle {
                shutdowns: Arc::clone(&shutdowns),
            }))
            .unwrap();
        let mut copy = original.clone();

        copy.remove("lifecycle").unwrap();
        assert_eq!(shutdowns.load(Ordering::SeqCst), 0);
        assert!(original.supports("text/csv"));

        original.remove("lifecycle").unwrap();
        assert_eq!(shutdowns.load(Ordering::SeqCst), 1);
    }
}
