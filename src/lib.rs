//! Client Autofill
//!
//! Fills dependent trip fields from a client's stored defaults when the
//! operator picks a client, and drives a debounced server-side client search.
//! Pure logic is generic over the traits in [`scope`]; [`dom`] and [`binder`]
//! connect it to a live page.

pub mod api;
pub mod binder;
pub mod busy;
pub mod components;
pub mod config;
pub mod dom;
pub mod error;
pub mod fields;
pub mod models;
pub mod reconciler;
pub mod scope;
pub mod suggestions;
pub mod typeahead;

#[cfg(test)]
mod testing;

pub use config::EngineConfig;
pub use error::{AutofillError, AutofillResult};
