//! In-memory scope, field, select and API fakes for unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;

use crate::api::ClientApi;
use crate::config::suffix_matches;
use crate::models::{ClientDefaults, ClientId, SearchPage};
use crate::scope::{FieldScope, FormField, SelectControl};
use crate::typeahead::{OptionSet, SearchStatus, Timer};

// ========================
// Fields and scopes
// ========================

#[derive(Debug, Default)]
pub struct FieldState {
    pub value: String,
    pub disabled: bool,
    pub events: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MemoryField {
    pub id: String,
    pub name: String,
    pub state: Rc<RefCell<FieldState>>,
}

impl MemoryField {
    pub fn new(id: &str, name: &str, value: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            state: Rc::new(RefCell::new(FieldState { value: value.to_string(), ..Default::default() })),
        }
    }

    pub fn get(&self) -> String {
        self.state.borrow().value.clone()
    }

    pub fn events(&self) -> Vec<String> {
        self.state.borrow().events.clone()
    }

    pub fn disabled(&self) -> bool {
        self.state.borrow().disabled
    }

    pub fn suggestions(&self) -> Vec<String> {
        self.state.borrow().suggestions.clone()
    }
}

impl FormField for MemoryField {
    fn key(&self) -> String {
        self.id.clone()
    }

    fn value(&self) -> String {
        self.get()
    }

    fn write(&self, value: &str) {
        let mut state = self.state.borrow_mut();
        state.value = value.to_string();
        state.events.push("input".into());
        state.events.push("change".into());
    }

    fn is_disabled(&self) -> bool {
        self.disabled()
    }

    fn set_disabled(&self, disabled: bool) {
        self.state.borrow_mut().disabled = disabled;
    }

    fn offer_suggestions(&self, candidates: &[String]) {
        self.state.borrow_mut().suggestions = candidates.to_vec();
    }
}

#[derive(Default)]
pub struct MemoryScope {
    pub fields: Vec<MemoryField>,
    pub busy_log: RefCell<Vec<bool>>,
}

impl MemoryScope {
    /// Scope with Django-style `id_<name>` fields
    pub fn with_fields(fields: &[(&str, &str)]) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(name, value)| MemoryField::new(&format!("id_{}", name), name, value))
                .collect(),
            ..Default::default()
        }
    }

    pub fn field(&self, name: &str) -> &MemoryField {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("no field {}", name))
    }

    pub fn busy_log(&self) -> Vec<bool> {
        self.busy_log.borrow().clone()
    }
}

impl FieldScope for MemoryScope {
    type Field = MemoryField;

    fn field_by_id_suffix(&self, suffix: &str) -> Option<MemoryField> {
        self.fields.iter().find(|f| suffix_matches(&f.id, suffix)).cloned()
    }

    fn field_by_name_suffix(&self, suffix: &str) -> Option<MemoryField> {
        self.fields.iter().find(|f| suffix_matches(&f.name, suffix)).cloned()
    }

    fn show_busy(&self, busy: bool) {
        self.busy_log.borrow_mut().push(busy);
    }
}

impl FieldScope for Rc<MemoryScope> {
    type Field = MemoryField;

    fn field_by_id_suffix(&self, suffix: &str) -> Option<MemoryField> {
        self.as_ref().field_by_id_suffix(suffix)
    }

    fn field_by_name_suffix(&self, suffix: &str) -> Option<MemoryField> {
        self.as_ref().field_by_name_suffix(suffix)
    }

    fn show_busy(&self, busy: bool) {
        self.as_ref().show_busy(busy)
    }
}

// ========================
// Select control
// ========================

#[derive(Default)]
pub struct MemorySelect {
    pub options: RefCell<Vec<(String, String)>>,
    pub selected: RefCell<String>,
    pub events: RefCell<Vec<String>>,
    pub statuses: RefCell<Vec<SearchStatus>>,
    pub focused: Cell<bool>,
}

impl MemorySelect {
    pub fn with_selected(value: &str) -> Rc<Self> {
        let select = Self::default();
        *select.selected.borrow_mut() = value.to_string();
        Rc::new(select)
    }

    pub fn labels(&self) -> Vec<String> {
        self.options.borrow().iter().map(|(_, label)| label.clone()).collect()
    }
}

impl SelectControl for Rc<MemorySelect> {
    fn selected_value(&self) -> String {
        self.selected.borrow().clone()
    }

    fn replace_options(&self, set: &OptionSet) {
        *self.options.borrow_mut() = set.options.iter().map(|o| (o.value.clone(), o.label.clone())).collect();
        *self.selected.borrow_mut() = set.selected.clone().unwrap_or_default();
    }

    fn notify_changed(&self) {
        self.events.borrow_mut().push("input".into());
        self.events.borrow_mut().push("change".into());
    }

    fn focus(&self) {
        self.focused.set(true);
    }

    fn show_status(&self, status: SearchStatus) {
        self.statuses.borrow_mut().push(status);
    }
}

// ========================
// API and timer
// ========================

/// API fake. Defaults are either immediate or parked on a oneshot the
/// test resolves later.
#[derive(Default)]
pub struct FakeApi {
    pub immediate: RefCell<HashMap<u64, Option<ClientDefaults>>>,
    pub parked: RefCell<HashMap<u64, VecDeque<oneshot::Receiver<Option<ClientDefaults>>>>>,
    pub pages: RefCell<HashMap<String, SearchPage>>,
    pub parked_pages: RefCell<HashMap<String, VecDeque<oneshot::Receiver<SearchPage>>>>,
    pub defaults_calls: RefCell<Vec<u64>>,
    pub search_calls: RefCell<Vec<(String, u32)>>,
}

impl FakeApi {
    pub fn respond(&self, id: u64, defaults: Option<ClientDefaults>) {
        self.immediate.borrow_mut().insert(id, defaults);
    }

    /// Park the next fetch for `id` until the returned sender fires
    pub fn park(&self, id: u64) -> oneshot::Sender<Option<ClientDefaults>> {
        let (tx, rx) = oneshot::channel();
        self.parked.borrow_mut().entry(id).or_default().push_back(rx);
        tx
    }

    pub fn page(&self, query: &str, page: SearchPage) {
        self.pages.borrow_mut().insert(query.to_string(), page);
    }

    /// Park the next search for `query` until the returned sender fires
    pub fn park_page(&self, query: &str) -> oneshot::Sender<SearchPage> {
        let (tx, rx) = oneshot::channel();
        self.parked_pages.borrow_mut().entry(query.to_string()).or_default().push_back(rx);
        tx
    }
}

#[async_trait(?Send)]
impl ClientApi for FakeApi {
    async fn fetch_defaults(&self, client_id: ClientId) -> Option<ClientDefaults> {
        let id = client_id.get();
        self.defaults_calls.borrow_mut().push(id);
        let parked = self.parked.borrow_mut().get_mut(&id).and_then(|q| q.pop_front());
        if let Some(rx) = parked {
            return rx.await.ok().flatten();
        }
        self.immediate.borrow().get(&id).cloned().flatten()
    }

    async fn search_clients(&self, query: &str, limit: u32) -> SearchPage {
        self.search_calls.borrow_mut().push((query.to_string(), limit));
        let parked = self.parked_pages.borrow_mut().get_mut(query).and_then(|q| q.pop_front());
        if let Some(rx) = parked {
            return rx.await.unwrap_or_else(|_| SearchPage::unavailable());
        }
        self.pages.borrow().get(query).cloned().unwrap_or_else(SearchPage::unavailable)
    }
}

/// Timer that gives other futures one turn instead of sleeping
pub struct YieldTimer;

impl Timer for YieldTimer {
    fn sleep(&self, _ms: u32) -> LocalBoxFuture<'static, ()> {
        Box::pin(tokio::task::yield_now())
    }
}
