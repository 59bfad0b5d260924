//! Revision-gated template cache.

use log::debug;

/// Identifies the inputs a cached template was generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateKey {
    /// Configuration revision at generation time
    pub revision: u64,
    pub web_style_sheet: String,
    pub highlight_style_sheet: String,
}

/// Holds the most recently generated template.
#[derive(Debug, Default)]
pub struct TemplateCache {
    entry: Option<(TemplateKey, String)>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached template for `key`, generating it only when the key
    /// differs from the cached one.
    pub fn get_or_generate<F>(&mut self, key: TemplateKey, generate: F) -> &str
    where
        F: FnOnce() -> String,
    {
        let stale = self
            .entry
            .as_ref()
            .map_or(true, |(cached_key, _)| *cached_key != key);

        if stale {
            debug!("Generating viewer template for revision {}", key.revision);
            self.entry = Some((key, generate()));
        } else {
            debug!("Reusing viewer template for revision {}", key.revision);
        }

        self.entry
            .as_ref()
            .map(|(_, template)| template.as_str())
            .unwrap_or_default()
    }

    /// Revision of the cached template, if any.
    #[cfg(test)]
    pub fn revision(&self) -> Option<u64> {
        self.entry.as_ref().map(|(key, _)| key.revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn key(revision: u64) -> TemplateKey {
        TemplateKey {
            revision,
            web_style_sheet: "web.css".to_string(),
            highlight_style_sheet: String::new(),
        }
    }

    #[test]
    fn test_same_revision_generates_once() {
        let mut cache = TemplateCache::new();
        let calls = Cell::new(0);
        let generate = || {
            calls.set(calls.get() + 1);
            format!("template #{}", calls.get())
        };

        let first = cache.get_or_generate(key(1), generate).to_string();
        let second = cache.get_or_generate(key(1), generate).to_string();

        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.revision(), Some(1));
    }

    #[test]
    fn test_new_revision_regenerates() {
        let mut cache = TemplateCache::new();
        cache.get_or_generate(key(1), || "old".to_string());
        let fresh = cache.get_or_generate(key(2), || "new".to_string());
        assert_eq!(fresh, "new");
        assert_eq!(cache.revision(), Some(2));
    }

    #[test]
    fn test_style_change_regenerates() {
        let mut cache = TemplateCache::new();
        cache.get_or_generate(key(1), || "old".to_string());
        let mut other = key(1);
        other.highlight_style_sheet = "hl.css".to_string();
        assert_eq!(cache.get_or_generate(other, || "new".to_string()), "new");
    }
}
