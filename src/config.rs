//! Engine Configuration
//!
//! Per-page settings: endpoints, timing, scope selectors and the locator
//! rules that find dependent fields. Pages can override any of it through
//! `window.clientAutofillConfig` or a JSON script element.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use wasm_bindgen::{JsCast, JsValue};

use crate::error::{AutofillError, AutofillResult};
use crate::models::{ClientId, DefaultField};

/// Global object checked first
pub const CONFIG_GLOBAL: &str = "clientAutofillConfig";
/// `<script type="application/json">` element checked second
pub const CONFIG_ELEMENT_ID: &str = "client-autofill-config";

/// Where the engine is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentContext {
    /// Staff admin change forms with inline rows
    Admin,
    /// Public "add schedule" form
    Public,
}

/// Ordered suffixes used to find a field by id, then by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocatorRule {
    pub suffixes: Vec<String>,
}

impl LocatorRule {
    pub fn new(suffixes: &[&str]) -> Self {
        Self { suffixes: suffixes.iter().map(|s| s.to_string()).collect() }
    }

    /// Try every suffix against ids first, then every suffix against names
    pub fn resolve<T>(
        &self,
        by_id: impl Fn(&str) -> Option<T>,
        by_name: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        self.suffixes
            .iter()
            .find_map(|suffix| by_id(suffix))
            .or_else(|| self.suffixes.iter().find_map(|suffix| by_name(suffix)))
    }
}

/// Whether an element id or name refers to the field `suffix`.
///
/// Matches `suffix` itself, Django's `id_<suffix>`, and formset
/// `<prefix>-<n>-<suffix>` names.
pub fn suffix_matches(candidate: &str, suffix: &str) -> bool {
    if suffix.is_empty() {
        return false;
    }
    if candidate == suffix {
        return true;
    }
    match candidate.strip_suffix(suffix) {
        Some(head) => head.ends_with('_') || head.ends_with('-'),
        None => false,
    }
}

/// Resolved configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub context: DeploymentContext,
    /// Template with an `{id}` placeholder
    pub defaults_url: String,
    pub search_url: String,
    pub search_limit: u32,
    pub debounce_ms: u32,
    pub suggestion_limit: usize,
    pub scope_selectors: Vec<String>,
    /// Repeatable rows; fields inside them belong to the row, not the form
    pub row_selectors: Vec<String>,
    pub rows_added_event: String,
    pub client_rule: LocatorRule,
    pub search_rule: LocatorRule,
    pub fields: Vec<(DefaultField, LocatorRule)>,
    pub log_level: String,
}

impl EngineConfig {
    pub fn for_context(context: DeploymentContext) -> Self {
        let (scope_selectors, row_selectors) = match context {
            DeploymentContext::Admin => (
                vec![
                    "#content-main form".to_string(),
                    "tr.form-row".to_string(),
                    ".inline-related:not(.tabular)".to_string(),
                ],
                vec!["tr.form-row".to_string(), ".inline-related:not(.tabular)".to_string()],
            ),
            DeploymentContext::Public => (vec!["form".to_string()], Vec::new()),
        };

        Self {
            context,
            defaults_url: "/admin/ajax/client/{id}/defaults/".to_string(),
            search_url: "/api/clients/search/".to_string(),
            search_limit: 20,
            debounce_ms: 250,
            suggestion_limit: 8,
            scope_selectors,
            row_selectors,
            rows_added_event: "formset:added".to_string(),
            client_rule: LocatorRule::new(&["client", "client_id"]),
            search_rule: LocatorRule::new(&["client_search", "client-search"]),
            fields: default_field_rules(),
            log_level: "info".to_string(),
        }
    }

    /// Defaults URL for one client
    pub fn defaults_url_for(&self, id: ClientId) -> String {
        let id = id.to_string();
        if self.defaults_url.contains("{id}") {
            self.defaults_url.replace("{id}", &id)
        } else {
            format!("{}/{}/", self.defaults_url.trim_end_matches('/'), id)
        }
    }

    /// Apply page overrides on top of the context defaults
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(v) = overrides.defaults_url { self.defaults_url = v; }
        if let Some(v) = overrides.search_url { self.search_url = v; }
        if let Some(v) = overrides.search_limit { self.search_limit = v.max(1); }
        if let Some(v) = overrides.debounce_ms { self.debounce_ms = v; }
        if let Some(v) = overrides.suggestion_limit { self.suggestion_limit = v; }
        if let Some(v) = overrides.scope_selectors { self.scope_selectors = v; }
        if let Some(v) = overrides.row_selectors { self.row_selectors = v; }
        if let Some(v) = overrides.rows_added_event { self.rows_added_event = v; }
        if let Some(v) = overrides.client_rule { self.client_rule = v; }
        if let Some(v) = overrides.search_rule { self.search_rule = v; }
        if let Some(v) = overrides.log_level { self.log_level = v; }
        if let Some(mut custom) = overrides.fields {
            for (field, rule) in self.fields.iter_mut() {
                if let Some(replacement) = custom.remove(field) {
                    *rule = replacement;
                }
            }
        }
        self
    }

    /// Parse overrides from JSON text
    pub fn from_json(json: &str, inferred: DeploymentContext) -> AutofillResult<Self> {
        let overrides: ConfigOverrides =
            serde_json::from_str(json).map_err(|e| AutofillError::Config(e.to_string()))?;
        Ok(Self::resolve(overrides, inferred))
    }

    fn resolve(overrides: ConfigOverrides, inferred: DeploymentContext) -> Self {
        let context = overrides.context.unwrap_or(inferred);
        Self::for_context(context).with_overrides(overrides)
    }
}

fn default_field_rules() -> Vec<(DefaultField, LocatorRule)> {
    DefaultField::ALL
        .into_iter()
        .map(|field| {
            let rule = match field {
                DefaultField::PickupAddress => LocatorRule::new(&["pickup_address", "default_pickup_address"]),
                DefaultField::DropoffAddress => LocatorRule::new(&["dropoff_address", "default_dropoff_address"]),
                DefaultField::PickupTime => LocatorRule::new(&["pickup_time", "start_time"]),
                other => LocatorRule::new(&[other.as_str()]),
            };
            (field, rule)
        })
        .collect()
}

/// Page-supplied overrides; everything optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    pub context: Option<DeploymentContext>,
    pub defaults_url: Option<String>,
    pub search_url: Option<String>,
    pub search_limit: Option<u32>,
    pub debounce_ms: Option<u32>,
    pub suggestion_limit: Option<usize>,
    pub scope_selectors: Option<Vec<String>>,
    pub row_selectors: Option<Vec<String>>,
    pub rows_added_event: Option<String>,
    pub client_rule: Option<LocatorRule>,
    pub search_rule: Option<LocatorRule>,
    pub fields: Option<HashMap<DefaultField, LocatorRule>>,
    pub log_level: Option<String>,
}

// ========================
// Loading from the page
// ========================

/// Any of these present means a Django admin page
pub const ADMIN_MARKERS: [&str; 3] = ["body.change-form", "body[data-admin-utc-offset]", "#changelist"];

/// Context implied by which admin markers the page matches
pub fn context_from_markers(matches: impl Fn(&str) -> bool) -> DeploymentContext {
    if ADMIN_MARKERS.iter().any(|selector| matches(selector)) {
        DeploymentContext::Admin
    } else {
        DeploymentContext::Public
    }
}

fn infer_context(document: &web_sys::Document) -> DeploymentContext {
    context_from_markers(|selector| matches!(document.query_selector(selector), Ok(Some(_))))
}

fn global_overrides(window: &web_sys::Window) -> AutofillResult<Option<ConfigOverrides>> {
    let value = js_sys::Reflect::get(window, &JsValue::from_str(CONFIG_GLOBAL))
        .map_err(|e| AutofillError::Config(format!("{:?}", e)))?;
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    serde_wasm_bindgen::from_value(value)
        .map(Some)
        .map_err(|e| AutofillError::Config(e.to_string()))
}

fn element_json(document: &web_sys::Document) -> Option<String> {
    document
        .get_element_by_id(CONFIG_ELEMENT_ID)
        .and_then(|el| el.dyn_into::<web_sys::HtmlScriptElement>().ok())
        .and_then(|script| script.text().ok())
}

/// Resolve configuration for the current page. Never fails: a malformed
/// source is logged and the context defaults are used.
pub fn load(window: &web_sys::Window, document: &web_sys::Document) -> EngineConfig {
    let inferred = infer_context(document);

    match global_overrides(window) {
        Ok(Some(overrides)) => return EngineConfig::resolve(overrides, inferred),
        Ok(None) => {}
        Err(e) => log::warn!("[CONFIG] {} ({}), ignoring", e, CONFIG_GLOBAL),
    }

    if let Some(json) = element_json(document) {
        match EngineConfig::from_json(&json, inferred) {
            Ok(config) => return config,
            Err(e) => log::warn!("[CONFIG] {} (#{}), ignoring", e, CONFIG_ELEMENT_ID),
        }
    }

    EngineConfig::for_context(inferred)
}
