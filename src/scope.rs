//! Scope Abstractions
//!
//! The engine only talks to the page through these traits. The browser
//! implementations live in `dom`; tests use in-memory ones.

use crate::typeahead::{OptionSet, SearchStatus};

/// One dependent input inside a scope
pub trait FormField: Clone {
    /// id or name, for logging
    fn key(&self) -> String;

    fn value(&self) -> String;

    /// Set the value and emit `input` then `change`, as if typed
    fn write(&self, value: &str);

    fn is_disabled(&self) -> bool;

    fn set_disabled(&self, disabled: bool);

    /// Expose candidate values as an inline suggestion list
    fn offer_suggestions(&self, candidates: &[String]);
}

/// A form or inline row that owns one client-selection control
pub trait FieldScope {
    type Field: FormField;

    /// First owned field whose id is or ends with `_<suffix>`/`-<suffix>`
    fn field_by_id_suffix(&self, suffix: &str) -> Option<Self::Field>;

    /// Same as `field_by_id_suffix`, matched against `name`
    fn field_by_name_suffix(&self, suffix: &str) -> Option<Self::Field>;

    /// Toggle the busy indicator next to the client control
    fn show_busy(&self, busy: bool);
}

/// A selection list whose options the typeahead rewrites
pub trait SelectControl {
    fn selected_value(&self) -> String;

    /// Replace every option and apply `set.selected`
    fn replace_options(&self, set: &OptionSet);

    /// Emit `input` then `change` so listeners see a manual pick
    fn notify_changed(&self);

    fn focus(&self);

    fn show_status(&self, status: SearchStatus);
}
