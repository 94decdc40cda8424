//! Busy Gate
//!
//! Shows a scope's busy indicator and disables its dependent fields while
//! at least one defaults fetch is outstanding. Each fetch holds a
//! `BusyGuard`; dropping the last guard restores the scope.

use std::cell::{Cell, RefCell};

use crate::fields::BoundField;
use crate::scope::{FieldScope, FormField};

pub struct BusyGate<F> {
    outstanding: Cell<usize>,
    /// Fields this gate disabled; fields disabled by the page are left alone
    disabled: RefCell<Vec<F>>,
}

impl<F: FormField> BusyGate<F> {
    pub fn new() -> Self {
        Self { outstanding: Cell::new(0), disabled: RefCell::new(Vec::new()) }
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.get()
    }

    /// Engage the gate for one fetch
    pub fn enter<'a, S>(&'a self, scope: &'a S, fields: &[BoundField<F>]) -> BusyGuard<'a, S>
    where
        S: FieldScope<Field = F>,
    {
        let previous = self.outstanding.get();
        self.outstanding.set(previous + 1);
        if previous == 0 {
            let mut disabled = self.disabled.borrow_mut();
            for bound in fields {
                if !bound.handle.is_disabled() {
                    bound.handle.set_disabled(true);
                    disabled.push(bound.handle.clone());
                }
            }
            scope.show_busy(true);
            log::debug!("[BUSY] engaged, {} field(s) disabled", disabled.len());
        }
        BusyGuard { gate: self, scope }
    }

    fn exit<S: FieldScope<Field = F>>(&self, scope: &S) {
        let previous = self.outstanding.get();
        if previous == 0 {
            log::warn!("[BUSY] exit without matching enter");
            return;
        }
        self.outstanding.set(previous - 1);
        if previous == 1 {
            for field in self.disabled.borrow_mut().drain(..) {
                field.set_disabled(false);
            }
            scope.show_busy(false);
            log::debug!("[BUSY] released");
        }
    }
}

impl<F: FormField> Default for BusyGate<F> {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases one `enter` when dropped, on every exit path of a fetch
pub struct BusyGuard<'a, S: FieldScope> {
    gate: &'a BusyGate<S::Field>,
    scope: &'a S,
}

impl<S: FieldScope> Drop for BusyGuard<'_, S> {
    fn drop(&mut self) {
        self.gate.exit(self.scope);
    }
}
