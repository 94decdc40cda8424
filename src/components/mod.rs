//! UI Components
//!
//! Leptos views mounted into server-rendered forms.

mod scope_status;

pub use scope_status::ScopeStatus;
