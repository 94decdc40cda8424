//! Browser Adapters
//!
//! `web_sys` implementations of the scope traits: form fields, a scope rooted
//! at a form or inline row, and the client `<select>` the typeahead drives.

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, EventInit, EventTarget, HtmlElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};

use crate::components::ScopeStatus;
use crate::config::{suffix_matches, EngineConfig, LocatorRule};
use crate::error::{AutofillError, AutofillResult};
use crate::scope::{FieldScope, FormField, SelectControl};
use crate::typeahead::{OptionSet, SearchStatus};

/// Admin formsets keep an unbound template row around
const TEMPLATE_MARKER: &str = "__prefix__";
const TEMPLATE_ROW_SELECTOR: &str = ".empty-form";

// ========================
// Helpers
// ========================

/// Dispatch a bubbling `input` then `change` on `target`
pub fn emit_input_and_change(target: &EventTarget) {
    for kind in ["input", "change"] {
        let init = EventInit::new();
        init.set_bubbles(true);
        match Event::new_with_event_init_dict(kind, &init) {
            Ok(event) => {
                if let Err(e) = target.dispatch_event(&event) {
                    log::warn!("[DOM] dispatching {} failed: {:?}", kind, e);
                }
            }
            Err(e) => log::warn!("[DOM] creating {} event failed: {:?}", kind, e),
        }
    }
}

/// Current value of an input, select or textarea
pub fn element_value(element: &Element) -> String {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        select.value()
    } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        area.value()
    } else {
        element.get_attribute("value").unwrap_or_default()
    }
}

fn set_element_value(element: &Element, value: &str) {
    if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
        select.set_value(value);
    } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
        area.set_value(value);
    } else if let Err(e) = element.set_attribute("value", value) {
        log::warn!("[DOM] setting value failed: {:?}", e);
    }
}

/// Whether an element with this id and name, possibly sitting inside an
/// `.empty-form` row, belongs to a formset template
pub fn is_template_marked(id: Option<&str>, name: Option<&str>, in_template_row: bool) -> bool {
    let marked = |value: Option<&str>| value.is_some_and(|v| v.contains(TEMPLATE_MARKER));
    in_template_row || marked(id) || marked(name)
}

/// Part of an admin formset's template row
pub fn is_template(element: &Element) -> bool {
    is_template_marked(
        element.get_attribute("id").as_deref(),
        element.get_attribute("name").as_deref(),
        matches!(element.closest(TEMPLATE_ROW_SELECTOR), Ok(Some(_))),
    )
}

/// Where the nearest repeatable row around a field sits relative to a scope root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowPlacement {
    /// The row is the scope root itself
    Root,
    /// The row is nested inside the scope root
    Nested,
    /// The row encloses the scope root, or is elsewhere
    Outside,
}

/// A field belongs to a scope unless some row nested inside the scope holds it
pub fn is_owned(placements: impl IntoIterator<Item = RowPlacement>) -> bool {
    !placements.into_iter().any(|p| p == RowPlacement::Nested)
}

// ========================
// Fields
// ========================

#[derive(Debug, Clone)]
pub struct DomField {
    element: Element,
}

impl DomField {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }
}

impl FormField for DomField {
    fn key(&self) -> String {
        let id = self.element.id();
        if id.is_empty() {
            self.element.get_attribute("name").unwrap_or_default()
        } else {
            id
        }
    }

    fn value(&self) -> String {
        element_value(&self.element)
    }

    fn write(&self, value: &str) {
        set_element_value(&self.element, value);
        emit_input_and_change(&self.element);
    }

    fn is_disabled(&self) -> bool {
        self.element.has_attribute("disabled")
    }

    fn set_disabled(&self, disabled: bool) {
        let result = if disabled {
            self.element.set_attribute("disabled", "")
        } else {
            self.element.remove_attribute("disabled")
        };
        if let Err(e) = result {
            log::warn!("[DOM] toggling disabled on {} failed: {:?}", self.key(), e);
        }
    }

    fn offer_suggestions(&self, candidates: &[String]) {
        let Some(input) = self.element.dyn_ref::<HtmlInputElement>() else {
            return;
        };
        let Some(document) = self.element.owner_document() else {
            return;
        };
        let key = self.key();
        if key.is_empty() {
            return;
        }
        let list_id = format!("{}-suggestions", key);

        let datalist = match document.get_element_by_id(&list_id) {
            Some(existing) => existing,
            None => {
                let Ok(created) = document.create_element("datalist") else {
                    return;
                };
                created.set_id(&list_id);
                if let Err(e) = self.element.after_with_node_1(&created) {
                    log::warn!("[DOM] inserting datalist for {} failed: {:?}", key, e);
                    return;
                }
                created
            }
        };

        datalist.set_inner_html("");
        for candidate in candidates {
            if let Ok(option) = document.create_element("option") {
                let _ = option.set_attribute("value", candidate);
                let _ = datalist.append_child(&option);
            }
        }
        let _ = input.set_attribute("list", &list_id);
    }
}

// ========================
// Scope
// ========================

/// Suffix queries confined to one scope root
#[derive(Debug, Clone)]
pub struct ScopeQuery {
    root: Element,
    row_selectors: Vec<String>,
}

impl ScopeQuery {
    pub fn new(root: Element, row_selectors: Vec<String>) -> Self {
        Self { root, row_selectors }
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// First element under the root whose `attr` matches `suffix`
    pub fn find(&self, attr: &str, suffix: &str) -> Option<Element> {
        let selector = format!("[{}$=\"{}\"]", attr, suffix);
        let nodes = match self.root.query_selector_all(&selector) {
            Ok(nodes) => nodes,
            Err(e) => {
                log::warn!("[DOM] bad selector {}: {:?}", selector, e);
                return None;
            }
        };
        (0..nodes.length())
            .filter_map(|i| nodes.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .find(|el| {
                let candidate = el.get_attribute(attr).unwrap_or_default();
                suffix_matches(&candidate, suffix) && !is_template(el) && self.owns(el)
            })
    }

    pub fn locate(&self, rule: &LocatorRule) -> Option<Element> {
        rule.resolve(|suffix| self.find("id", suffix), |suffix| self.find("name", suffix))
    }

    /// False when `element` sits in a repeatable row nested inside the root
    fn owns(&self, element: &Element) -> bool {
        is_owned(self.row_selectors.iter().filter_map(|selector| match element.closest(selector) {
            Ok(Some(row)) => Some(self.placement(&row)),
            _ => None,
        }))
    }

    fn placement(&self, row: &Element) -> RowPlacement {
        if row.is_same_node(Some(self.root.as_ref())) {
            RowPlacement::Root
        } else if self.root.contains(Some(row.as_ref())) {
            RowPlacement::Nested
        } else {
            RowPlacement::Outside
        }
    }
}

/// A bound form or inline row
pub struct DomScope {
    query: ScopeQuery,
    control: Element,
    busy: RwSignal<bool>,
    status: RwSignal<SearchStatus>,
}

impl DomScope {
    /// Attach to `root`. Fails with a locator error when the root has no
    /// client-selection control of its own.
    pub fn attach(root: Element, config: &EngineConfig) -> AutofillResult<Self> {
        let query = ScopeQuery::new(root, config.row_selectors.clone());
        let control = query
            .locate(&config.client_rule)
            .ok_or_else(|| AutofillError::Locator { field: "client".into() })?;

        let busy = RwSignal::new(false);
        let status = RwSignal::new(SearchStatus::Idle);
        mount_status(&control, busy, status);

        Ok(Self { query, control, busy, status })
    }

    pub fn root(&self) -> &Element {
        self.query.root()
    }

    pub fn control(&self) -> &Element {
        &self.control
    }

    pub fn client_value(&self) -> String {
        element_value(&self.control)
    }

    /// Client `<select>` wrapped for the typeahead, if the control is one
    pub fn select(&self) -> Option<DomSelect> {
        self.control
            .dyn_ref::<HtmlSelectElement>()
            .map(|select| DomSelect { select: select.clone(), status: self.status })
    }

    pub fn search_input(&self, rule: &LocatorRule) -> Option<HtmlInputElement> {
        self.query.locate(rule).and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
    }
}

impl FieldScope for DomScope {
    type Field = DomField;

    fn field_by_id_suffix(&self, suffix: &str) -> Option<DomField> {
        self.query.find("id", suffix).map(DomField::new)
    }

    fn field_by_name_suffix(&self, suffix: &str) -> Option<DomField> {
        self.query.find("name", suffix).map(DomField::new)
    }

    fn show_busy(&self, busy: bool) {
        self.busy.set(busy);
    }
}

/// Render the busy indicator and status line right after the control
fn mount_status(control: &Element, busy: RwSignal<bool>, status: RwSignal<SearchStatus>) {
    let Some(document) = control.owner_document() else {
        return;
    };
    let holder = match document.create_element("span") {
        Ok(holder) => holder,
        Err(e) => {
            log::warn!("[DOM] creating status holder failed: {:?}", e);
            return;
        }
    };
    holder.set_class_name("client-autofill-status");
    if let Err(e) = control.after_with_node_1(&holder) {
        log::warn!("[DOM] inserting status holder failed: {:?}", e);
        return;
    }
    let Ok(holder) = holder.dyn_into::<HtmlElement>() else {
        return;
    };
    leptos::mount::mount_to(holder, move || {
        view! { <ScopeStatus busy=busy.read_only() status=status.read_only() /> }
    })
    .forget();
}

// ========================
// Select control
// ========================

#[derive(Clone)]
pub struct DomSelect {
    select: HtmlSelectElement,
    status: RwSignal<SearchStatus>,
}

impl SelectControl for DomSelect {
    fn selected_value(&self) -> String {
        self.select.value()
    }

    fn replace_options(&self, set: &OptionSet) {
        self.select.set_length(0);
        for option in &set.options {
            match web_sys::HtmlOptionElement::new_with_text_and_value(&option.label, &option.value) {
                Ok(element) => {
                    if let Err(e) = self.select.add_with_html_option_element(&element) {
                        log::warn!("[DOM] adding option {} failed: {:?}", option.value, e);
                    }
                }
                Err(e) => log::warn!("[DOM] creating option {} failed: {:?}", option.value, e),
            }
        }
        self.select.set_value(set.selected.as_deref().unwrap_or(""));
    }

    fn notify_changed(&self) {
        emit_input_and_change(&self.select);
    }

    fn focus(&self) {
        if let Err(e) = self.select.focus() {
            log::debug!("[DOM] focusing select failed: {:?}", e);
        }
    }

    fn show_status(&self, status: SearchStatus) {
        self.status.set(status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_prefix_in_id_or_name() {
        assert!(is_template_marked(Some("id_entries-__prefix__-client"), None, false));
        assert!(is_template_marked(None, Some("entries-__prefix__-notes"), false));
        assert!(!is_template_marked(Some("id_entries-0-client"), Some("entries-0-client"), false));
    }

    #[test]
    fn test_template_empty_form_row() {
        assert!(is_template_marked(Some("id_entries-3-client"), None, true));
        assert!(!is_template_marked(None, None, false));
    }

    #[test]
    fn test_field_in_nested_row_not_owned_by_form() {
        assert!(!is_owned([RowPlacement::Nested]));
        assert!(!is_owned([RowPlacement::Outside, RowPlacement::Nested]));
    }

    #[test]
    fn test_field_owned_by_its_own_row() {
        assert!(is_owned([RowPlacement::Root]));
        assert!(is_owned([RowPlacement::Root, RowPlacement::Outside]));
        assert!(is_owned(std::iter::empty()));
    }
}
