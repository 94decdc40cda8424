//! Scope Binder
//!
//! Discovers forms and inline rows, wires a reconciler (and a typeahead when
//! the scope has a search box) to each, and re-runs when the page inserts
//! new rows.

use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, EventTarget, HtmlInputElement, KeyboardEvent};

use crate::api::HttpClientApi;
use crate::config::EngineConfig;
use crate::dom::{is_template, DomScope, DomSelect};
use crate::fields::FieldBinder;
use crate::models::ClientId;
use crate::reconciler::Reconciler;
use crate::typeahead::{BrowserTimer, TypeaheadController};

/// Marks a scope root that already has listeners
pub const BOUND_ATTR: &str = "data-client-autofill";

/// `document.readyState` before DOMContentLoaded
const READY_STATE_LOADING: &str = "loading";

/// Outcome of looking at one candidate scope root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindPlan {
    /// Root already carries the bound marker
    AlreadyBound,
    /// No client-selection control inside the root
    NoControl,
    /// Wire listeners; `initial` is a pre-selected client to reconcile now
    Bind { initial: Option<ClientId> },
}

impl BindPlan {
    pub fn decide(marker: Option<&str>, has_control: bool, control_value: &str) -> Self {
        if marker.is_some() {
            BindPlan::AlreadyBound
        } else if !has_control {
            BindPlan::NoControl
        } else {
            BindPlan::Bind { initial: ClientId::parse(control_value) }
        }
    }
}

type DomReconciler = Reconciler<DomScope, HttpClientApi>;
type DomTypeahead = TypeaheadController<DomSelect, HttpClientApi, BrowserTimer>;

pub struct ScopeBinder {
    config: EngineConfig,
    api: Rc<HttpClientApi>,
    document: Document,
}

impl ScopeBinder {
    pub fn new(config: EngineConfig, document: Document) -> Self {
        let api = Rc::new(HttpClientApi::new(config.clone()));
        Self { config, api, document }
    }

    /// Candidate scope roots under `root`, document order per selector
    pub fn discover_scopes(&self, root: &Element) -> Vec<Element> {
        let mut scopes: Vec<Element> = Vec::new();
        for selector in &self.config.scope_selectors {
            let nodes = match root.query_selector_all(selector) {
                Ok(nodes) => nodes,
                Err(e) => {
                    log::warn!("[BINDER] bad scope selector {}: {:?}", selector, e);
                    continue;
                }
            };
            for i in 0..nodes.length() {
                let Some(element) = nodes.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                    continue;
                };
                if is_template(&element) || scopes.iter().any(|s| s.is_same_node(Some(element.as_ref()))) {
                    continue;
                }
                scopes.push(element);
            }
        }
        scopes
    }

    /// Wire one scope. Returns false when it was already bound or has no
    /// client control.
    pub fn bind(&self, root: Element) -> bool {
        let marker = root.get_attribute(BOUND_ATTR);
        let scope = match marker {
            Some(_) => None,
            None => DomScope::attach(root.clone(), &self.config)
                .map_err(|e| log::debug!("[BINDER] skipping <{}>: {}", root.tag_name().to_lowercase(), e))
                .ok(),
        };
        let value = scope.as_ref().map(DomScope::client_value).unwrap_or_default();
        let plan = BindPlan::decide(marker.as_deref(), scope.is_some(), &value);
        let (Some(scope), BindPlan::Bind { initial }) = (scope, plan) else {
            return false;
        };
        if let Err(e) = root.set_attribute(BOUND_ATTR, "bound") {
            log::warn!("[BINDER] marking scope failed: {:?}", e);
            return false;
        }

        let select = scope.select();
        let search_input = scope.search_input(&self.config.search_rule);
        let control: EventTarget = scope.control().clone().into();

        let reconciler = Rc::new(Reconciler::new(
            scope,
            self.api.clone(),
            FieldBinder::new(self.config.fields.clone()),
            self.config.suggestion_limit,
        ));
        listen_for_selection(&control, reconciler.clone());

        if let (Some(select), Some(input)) = (select, search_input) {
            let typeahead = Rc::new(TypeaheadController::new(
                select,
                self.api.clone(),
                BrowserTimer,
                self.config.debounce_ms,
                self.config.search_limit,
            ));
            listen_for_search(&input, typeahead);
        }

        // Editing an existing record: fill empty fields right away
        if let Some(client_id) = initial {
            spawn_local(async move {
                reconciler.selection_changed(&client_id.to_string()).await;
            });
        }
        true
    }

    /// Discover and bind everything not yet bound
    pub fn bind_all(&self) -> usize {
        let Some(root) = self.document.document_element() else {
            return 0;
        };
        let bound = self
            .discover_scopes(&root)
            .into_iter()
            .filter(|scope| self.bind(scope.clone()))
            .count();
        if bound > 0 {
            log::info!("[BINDER] bound {} scope(s)", bound);
        }
        bound
    }
}

fn listen_for_selection(control: &EventTarget, reconciler: Rc<DomReconciler>) {
    let on_change = Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| {
        let reconciler = reconciler.clone();
        let value = reconciler.scope().client_value();
        spawn_local(async move {
            reconciler.selection_changed(&value).await;
        });
    });
    if let Err(e) = control.add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref()) {
        log::warn!("[BINDER] change listener failed: {:?}", e);
    }
    on_change.forget();
}

fn listen_for_search(input: &HtmlInputElement, typeahead: Rc<DomTypeahead>) {
    let on_input = {
        let typeahead = typeahead.clone();
        let input = input.clone();
        Closure::<dyn FnMut(web_sys::Event)>::new(move |_ev: web_sys::Event| {
            let typeahead = typeahead.clone();
            let query = input.value();
            spawn_local(async move {
                typeahead.input_changed(&query).await;
            });
        })
    };
    let on_keydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |ev: KeyboardEvent| {
        if typeahead.key_pressed(&ev.key()) {
            ev.prevent_default();
        }
    });

    if let Err(e) = input.add_event_listener_with_callback("input", on_input.as_ref().unchecked_ref()) {
        log::warn!("[BINDER] input listener failed: {:?}", e);
    }
    if let Err(e) = input.add_event_listener_with_callback("keydown", on_keydown.as_ref().unchecked_ref()) {
        log::warn!("[BINDER] keydown listener failed: {:?}", e);
    }
    on_input.forget();
    on_keydown.forget();
}

/// Bind all scopes once the document is ready, and again whenever the page
/// announces new inline rows
pub fn install(config: EngineConfig) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        log::warn!("[BINDER] no document, nothing to bind");
        return;
    };
    let rows_added_event = config.rows_added_event.clone();
    let binder = Rc::new(ScopeBinder::new(config, document.clone()));

    if document.ready_state() == READY_STATE_LOADING {
        let on_ready = {
            let binder = binder.clone();
            Closure::<dyn FnMut()>::new(move || {
                binder.bind_all();
            })
        };
        if let Err(e) = document.add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref()) {
            log::warn!("[BINDER] DOMContentLoaded listener failed: {:?}", e);
        }
        on_ready.forget();
    } else {
        binder.bind_all();
    }

    let on_rows_added = Closure::<dyn FnMut()>::new(move || {
        binder.bind_all();
    });
    if let Err(e) = document.add_event_listener_with_callback(&rows_added_event, on_rows_added.as_ref().unchecked_ref()) {
        log::warn!("[BINDER] {} listener failed: {:?}", rows_added_event, e);
    }
    on_rows_added.forget();
}
