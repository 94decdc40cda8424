//! Field Binder
//!
//! Finds a scope's dependent fields through ordered suffix rules and merges
//! client defaults into them without touching anything the operator typed.

use crate::config::LocatorRule;
use crate::models::{ClientDefaults, DefaultField};
use crate::scope::{FieldScope, FormField};

/// A located dependent field
#[derive(Debug, Clone)]
pub struct BoundField<F> {
    pub field: DefaultField,
    pub handle: F,
}

#[derive(Debug, Clone)]
pub struct FieldBinder {
    rules: Vec<(DefaultField, LocatorRule)>,
}

impl FieldBinder {
    pub fn new(rules: Vec<(DefaultField, LocatorRule)>) -> Self {
        Self { rules }
    }

    pub fn locate_one<S: FieldScope>(scope: &S, rule: &LocatorRule) -> Option<S::Field> {
        rule.resolve(|suffix| scope.field_by_id_suffix(suffix), |suffix| scope.field_by_name_suffix(suffix))
    }

    /// Locate every configured field. Missing fields are skipped.
    pub fn locate<S: FieldScope>(&self, scope: &S) -> Vec<BoundField<S::Field>> {
        let mut bound: Vec<BoundField<S::Field>> = Vec::with_capacity(self.rules.len());
        for (field, rule) in &self.rules {
            match Self::locate_one(scope, rule) {
                Some(handle) => {
                    // Two rules resolving to one element would fill it twice
                    if bound.iter().any(|b| b.handle.key() == handle.key()) {
                        log::debug!("[FIELDS] {} resolves to {} which is already bound", field.as_str(), handle.key());
                        continue;
                    }
                    bound.push(BoundField { field: *field, handle });
                }
                None => log::debug!("[FIELDS] {} not present in scope, skipping", field.as_str()),
            }
        }
        bound
    }

    /// Fill-if-empty merge. Returns the names of the fields actually written.
    pub fn reconcile<F: FormField>(fields: &[BoundField<F>], defaults: &ClientDefaults) -> Vec<String> {
        let mut filled = Vec::new();
        for bound in fields {
            let incoming = defaults.get(bound.field);
            if is_blank(incoming) {
                continue;
            }
            if !is_blank(&bound.handle.value()) {
                continue;
            }
            bound.handle.write(incoming);
            filled.push(bound.field.as_str().to_string());
        }
        filled
    }
}

/// Whitespace-only counts as empty
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeploymentContext, EngineConfig};
    use crate::testing::{MemoryField, MemoryScope};

    fn binder() -> FieldBinder {
        FieldBinder::new(EngineConfig::for_context(DeploymentContext::Public).fields)
    }

    fn names<F>(bound: &[BoundField<F>]) -> Vec<&'static str> {
        bound.iter().map(|b| b.field.as_str()).collect()
    }

    #[test]
    fn test_locate_skips_missing_fields() {
        let scope = MemoryScope::with_fields(&[("pickup_address", ""), ("notes", "")]);
        let bound = binder().locate(&scope);
        assert_eq!(names(&bound), vec!["pickup_address", "notes"]);
    }

    #[test]
    fn test_locate_start_time_for_pickup_time() {
        let scope = MemoryScope::with_fields(&[("start_time", "")]);
        let bound = binder().locate(&scope);
        assert_eq!(names(&bound), vec!["pickup_time"]);
        assert_eq!(bound[0].handle.id, "id_start_time");
    }

    #[test]
    fn test_locate_prefers_id_over_name() {
        let mut scope = MemoryScope::default();
        scope.fields.push(MemoryField::new("other", "entries-0-notes", ""));
        scope.fields.push(MemoryField::new("id_entries-0-notes", "unrelated", ""));
        let rule = LocatorRule::new(&["notes"]);
        let found = FieldBinder::locate_one(&scope, &rule).unwrap();
        assert_eq!(found.id, "id_entries-0-notes");
    }

    #[test]
    fn test_locate_falls_back_to_name() {
        let mut scope = MemoryScope::default();
        scope.fields.push(MemoryField::new("", "entries-2-dropoff_city", ""));
        let rule = LocatorRule::new(&["dropoff_city"]);
        let found = FieldBinder::locate_one(&scope, &rule).unwrap();
        assert_eq!(found.name, "entries-2-dropoff_city");
    }

    #[test]
    fn test_reconcile_fills_only_empty() {
        let scope = MemoryScope::with_fields(&[
            ("pickup_address", ""),
            ("dropoff_address", "Typed by hand"),
            ("notes", "   "),
        ]);
        let bound = binder().locate(&scope);
        let defaults = ClientDefaults {
            pickup_address: Some("12 Elm St".into()),
            dropoff_address: Some("9 Oak Ave".into()),
            notes: Some("VIP".into()),
            ..Default::default()
        };

        let filled = FieldBinder::reconcile(&bound, &defaults);

        assert_eq!(filled, vec!["pickup_address", "notes"]);
        assert_eq!(scope.field("pickup_address").get(), "12 Elm St");
        assert_eq!(scope.field("dropoff_address").get(), "Typed by hand");
        assert!(scope.field("dropoff_address").events().is_empty());
        assert_eq!(scope.field("notes").get(), "VIP");
    }

    #[test]
    fn test_reconcile_never_overwrites_non_empty() {
        let scope = MemoryScope::with_fields(&[
            ("pickup_address", "a"),
            ("pickup_city", "b"),
            ("pickup_state", "c"),
            ("dropoff_address", "d"),
            ("dropoff_city", "e"),
            ("dropoff_state", "f"),
            ("pickup_time", "07:15"),
            ("notes", "g"),
        ]);
        let bound = binder().locate(&scope);
        let defaults = ClientDefaults {
            pickup_address: Some("x".into()),
            pickup_city: Some("x".into()),
            pickup_state: Some("x".into()),
            dropoff_address: Some("x".into()),
            dropoff_city: Some("x".into()),
            dropoff_state: Some("x".into()),
            pickup_time: Some("08:00".into()),
            notes: Some("x".into()),
        };

        assert!(FieldBinder::reconcile(&bound, &defaults).is_empty());
        for field in &scope.fields {
            assert!(field.events().is_empty(), "{} was written", field.id);
        }
        assert_eq!(scope.field("pickup_time").get(), "07:15");
    }

    #[test]
    fn test_reconcile_emits_input_then_change() {
        let scope = MemoryScope::with_fields(&[("pickup_city", "")]);
        let bound = binder().locate(&scope);
        let defaults = ClientDefaults { pickup_city: Some("Springfield".into()), ..Default::default() };
        FieldBinder::reconcile(&bound, &defaults);
        assert_eq!(scope.field("pickup_city").events(), vec!["input", "change"]);
    }

    #[test]
    fn test_reconcile_empty_default_leaves_field_untouched() {
        let scope = MemoryScope::with_fields(&[("dropoff_address", "")]);
        let bound = binder().locate(&scope);
        let defaults = ClientDefaults { dropoff_address: Some(String::new()), ..Default::default() };
        assert!(FieldBinder::reconcile(&bound, &defaults).is_empty());
        assert_eq!(scope.field("dropoff_address").get(), "");
        assert!(scope.field("dropoff_address").events().is_empty());
    }

    #[test]
    fn test_reconcile_blank_default_leaves_field_untouched() {
        let scope = MemoryScope::with_fields(&[("notes", ""), ("pickup_city", "")]);
        let bound = binder().locate(&scope);
        let defaults = ClientDefaults {
            notes: Some("   ".into()),
            pickup_city: Some("Springfield".into()),
            ..Default::default()
        };
        assert_eq!(FieldBinder::reconcile(&bound, &defaults), vec!["pickup_city"]);
        assert_eq!(scope.field("notes").get(), "");
        assert!(scope.field("notes").events().is_empty());
    }
}
