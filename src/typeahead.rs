//! Typeahead Controller
//!
//! Debounced free-text search above a client `<select>`. Each keystroke arms
//! a new ticket; only the latest ticket survives the quiet interval, and only
//! its response may rewrite the option list.

use std::cell::Cell;
use std::rc::Rc;

use futures::future::LocalBoxFuture;

use crate::api::ClientApi;
use crate::models::{SearchPage, SearchResultItem};
use crate::scope::SelectControl;

/// Label of the leading "no selection" option (Django's empty label)
pub const PLACEHOLDER_LABEL: &str = "---------";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Rebuilt option list plus the value to select afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet {
    pub options: Vec<SelectOption>,
    pub selected: Option<String>,
}

/// Placeholder first, one option per result, then keep `previous` selected if
/// it is still offered
pub fn rebuild_options(items: &[SearchResultItem], previous: &str) -> OptionSet {
    let mut options = Vec::with_capacity(items.len() + 1);
    options.push(SelectOption { value: String::new(), label: PLACEHOLDER_LABEL.to_string() });
    options.extend(items.iter().map(|item| SelectOption { value: item.id.to_string(), label: item.label() }));

    let selected = Some(previous.trim())
        .filter(|p| !p.is_empty())
        .filter(|p| options.iter().any(|o| o.value == *p))
        .map(str::to_string);

    OptionSet { options, selected }
}

/// Inline status shown next to the control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Idle,
    Searching,
    Failed,
    NoResults,
    MoreAvailable,
}

impl SearchStatus {
    pub fn for_page(page: &SearchPage) -> Self {
        if page.failed {
            SearchStatus::Failed
        } else if page.results.is_empty() {
            SearchStatus::NoResults
        } else if page.has_more {
            SearchStatus::MoreAvailable
        } else {
            SearchStatus::Idle
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            SearchStatus::Idle => None,
            SearchStatus::Searching => Some("Searching…"),
            SearchStatus::Failed => Some("Search failed"),
            SearchStatus::NoResults => Some("No results"),
            SearchStatus::MoreAvailable => Some("More matches, keep typing"),
        }
    }
}

/// Sleep source for the debounce interval
pub trait Timer {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;
}

/// `setTimeout`-backed timer
pub struct BrowserTimer;

impl Timer for BrowserTimer {
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        Box::pin(gloo_timers::future::TimeoutFuture::new(ms))
    }
}

/// Latest-wins ticket counter
#[derive(Debug, Default)]
pub struct Debouncer {
    generation: Cell<u64>,
}

impl Debouncer {
    pub fn arm(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        self.generation.get() == ticket
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeaheadOutcome {
    /// Newer input arrived during the quiet interval
    Debounced,
    /// Newer input arrived while the search was in flight
    Stale,
    /// Search failed; options left as they were
    Failed,
    /// Options rewritten; count includes the placeholder
    Rebuilt(usize),
}

pub struct TypeaheadController<C: SelectControl, A: ClientApi, T: Timer> {
    control: C,
    api: Rc<A>,
    timer: T,
    debounce_ms: u32,
    limit: u32,
    debouncer: Debouncer,
}

impl<C: SelectControl, A: ClientApi, T: Timer> TypeaheadController<C, A, T> {
    pub fn new(control: C, api: Rc<A>, timer: T, debounce_ms: u32, limit: u32) -> Self {
        Self { control, api, timer, debounce_ms, limit, debouncer: Debouncer::default() }
    }

    pub fn control(&self) -> &C {
        &self.control
    }

    /// Handle one keystroke's worth of search text
    pub async fn input_changed(&self, query: &str) -> TypeaheadOutcome {
        let ticket = self.debouncer.arm();
        self.timer.sleep(self.debounce_ms).await;
        if !self.debouncer.is_latest(ticket) {
            return TypeaheadOutcome::Debounced;
        }

        self.control.show_status(SearchStatus::Searching);
        // Empty query is a browse request, the backend returns its top page
        let page = self.api.search_clients(query.trim(), self.limit).await;
        if !self.debouncer.is_latest(ticket) {
            log::debug!("[SEARCH] dropping stale page for {:?}", query);
            return TypeaheadOutcome::Stale;
        }

        let status = SearchStatus::for_page(&page);
        if page.failed {
            self.control.show_status(status);
            return TypeaheadOutcome::Failed;
        }

        let set = rebuild_options(&page.results, &self.control.selected_value());
        self.control.replace_options(&set);
        self.control.notify_changed();
        self.control.show_status(status);
        log::debug!("[SEARCH] q={:?} -> {} result(s), has_more={}", query, page.results.len(), page.has_more);
        TypeaheadOutcome::Rebuilt(set.options.len())
    }

    /// Keyboard handling for the search input. Returns true when the key was
    /// consumed and the default action must be prevented.
    pub fn key_pressed(&self, key: &str) -> bool {
        if key == "Enter" {
            self.control.focus();
            return true;
        }
        false
    }
}
