//! Suggestion Store
//!
//! Per-scope memory of default values seen for each field, most recent
//! first. Feeds the inline suggestion lists; no I/O.

use std::collections::HashMap;

use crate::models::{ClientDefaults, DefaultField};

#[derive(Debug, Clone)]
pub struct SuggestionStore {
    limit: usize,
    entries: HashMap<DefaultField, Vec<String>>,
}

impl SuggestionStore {
    pub fn new(limit: usize) -> Self {
        Self { limit, entries: HashMap::new() }
    }

    /// Move `value` to the front of the field's list
    pub fn remember(&mut self, field: DefaultField, value: &str) {
        let value = value.trim();
        if value.is_empty() || self.limit == 0 {
            return;
        }
        let list = self.entries.entry(field).or_default();
        list.retain(|existing| existing != value);
        list.insert(0, value.to_string());
        list.truncate(self.limit);
    }

    /// Remember every non-empty value of a defaults record
    pub fn record(&mut self, defaults: &ClientDefaults) {
        for (field, value) in defaults.present() {
            self.remember(field, value);
        }
    }

    pub fn candidates(&self, field: DefaultField) -> &[String] {
        self.entries.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}
