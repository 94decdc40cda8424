//! Reconciler
//!
//! Per-scope driver for client selection changes:
//! Idle -> Fetching -> (Applying | Discarded) -> Idle.
//!
//! Every fetch takes a new `FetchEpoch` value; only a response whose epoch is
//! still current may touch the scope's fields. Superseded requests are not
//! aborted, their results are ignored.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::api::ClientApi;
use crate::busy::BusyGate;
use crate::fields::{BoundField, FieldBinder};
use crate::models::{ClientDefaults, ClientId};
use crate::scope::{FieldScope, FormField};
use crate::suggestions::SuggestionStore;

/// Monotonic per-scope fetch counter
#[derive(Debug, Default)]
pub struct FetchEpoch(Cell<u64>);

impl FetchEpoch {
    pub fn advance(&self) -> u64 {
        let next = self.0.get() + 1;
        self.0.set(next);
        next
    }

    pub fn current(&self) -> u64 {
        self.0.get()
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.0.get() == epoch
    }
}

/// What one selection change ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Empty or non-numeric selection
    Skipped,
    /// Defaults applied; names of the fields written
    Applied(Vec<String>),
    /// Fetch failed or was rejected; nothing changed
    Absent,
    /// A newer selection started while this one was in flight
    Discarded,
}

pub struct Reconciler<S: FieldScope, A: ClientApi> {
    scope: S,
    api: Rc<A>,
    binder: FieldBinder,
    gate: BusyGate<S::Field>,
    suggestions: RefCell<SuggestionStore>,
    epoch: FetchEpoch,
}

impl<S: FieldScope, A: ClientApi> Reconciler<S, A> {
    pub fn new(scope: S, api: Rc<A>, binder: FieldBinder, suggestion_limit: usize) -> Self {
        Self {
            scope,
            api,
            binder,
            gate: BusyGate::new(),
            suggestions: RefCell::new(SuggestionStore::new(suggestion_limit)),
            epoch: FetchEpoch::default(),
        }
    }

    pub fn scope(&self) -> &S {
        &self.scope
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.current()
    }

    pub fn busy(&self) -> usize {
        self.gate.outstanding()
    }

    /// Handle a new value on the client-selection control
    pub async fn selection_changed(&self, raw: &str) -> ReconcileOutcome {
        let Some(client_id) = ClientId::parse(raw) else {
            // Clearing the control still invalidates whatever is in flight
            if self.gate.outstanding() > 0 {
                self.epoch.advance();
            }
            log::debug!("[RECONCILE] no client selected ({:?})", raw);
            return ReconcileOutcome::Skipped;
        };

        let epoch = self.epoch.advance();
        let fields = self.binder.locate(&self.scope);
        let _busy = self.gate.enter(&self.scope, &fields);
        log::debug!("[RECONCILE] epoch {} fetching defaults for client {}", epoch, client_id);

        let defaults = self.api.fetch_defaults(client_id).await;

        if !self.epoch.is_current(epoch) {
            log::debug!(
                "[RECONCILE] epoch {} superseded by {}, dropping response for client {}",
                epoch,
                self.epoch.current(),
                client_id
            );
            return ReconcileOutcome::Discarded;
        }

        let Some(defaults) = defaults else {
            return ReconcileOutcome::Absent;
        };

        let filled = FieldBinder::reconcile(&fields, &defaults);
        self.offer_suggestions(&fields, &defaults);
        log::info!("[RECONCILE] client {} filled {:?}", client_id, filled);
        ReconcileOutcome::Applied(filled)
    }

    fn offer_suggestions(&self, fields: &[BoundField<S::Field>], defaults: &ClientDefaults) {
        let mut store = self.suggestions.borrow_mut();
        store.record(defaults);
        for bound in fields {
            let candidates = store.candidates(bound.field);
            if !candidates.is_empty() {
                bound.handle.offer_suggestions(candidates);
            }
        }
    }
}
