//! Translation lookup used by [`ResponseComposer::write_translated`](crate::ResponseComposer::write_translated).

use std::collections::HashMap;

/// Looks up the localized form of a message key.
pub trait Translator {
    /// Returns the translation of `key`. Unknown keys come back unchanged.
    fn translate(&self, key: &str) -> String;
}

/// Returns every key unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTranslator;

impl Translator for IdentityTranslator {
    fn translate(&self, key: &str) -> String {
        key.to_string()
    }
}

/// In-memory message catalog for one locale.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    messages: HashMap<String, String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a translation (builder style).
    pub fn with(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.messages.insert(key.into(), message.into());
        self
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Translator for Catalog {
    fn translate(&self, key: &str) -> String {
        self.messages
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}

impl<K, V> FromIterator<(K, V)> for Catalog
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            messages: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_falls_back_to_key() {
        let catalog = Catalog::new().with("Hello %s", "Hallo %s");
        assert_eq!(catalog.translate("Hello %s"), "Hallo %s");
        assert_eq!(catalog.translate("Goodbye"), "Goodbye");
    }

    #[test]
    fn test_catalog_from_iter() {
        let catalog: Catalog = [("yes", "ja"), ("no", "nein")].into_iter().collect();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.translate("no"), "nein");
    }
}
