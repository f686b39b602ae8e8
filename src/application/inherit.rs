//! Inherited-component registration and splicing.

use std::sync::{Mutex, PoisonError};

use crate::domain::{components::ComponentData, types::InheritMode};

/// A request, made during `fetch`, to splice another page's components into
/// one of the requesting node's areas.
#[derive(Debug, Clone, PartialEq)]
pub struct InheritRegistration {
    pub area: String,
    pub components: Vec<ComponentData>,
    pub mode: InheritMode,
    pub from_page_id: String,
}

/// Collects registrations for one node's fetch. Disabled registrars accept
/// and discard everything, so inherited content never inherits further.
#[derive(Debug)]
pub struct InheritRegistrar {
    enabled: bool,
    entries: Mutex<Vec<InheritRegistration>>,
}

impl InheritRegistrar {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns whether the registration was kept.
    pub fn register(&self, registration: InheritRegistration) -> bool {
        if !self.enabled {
            return false;
        }
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(registration);
        true
    }

    pub fn into_entries(self) -> Vec<InheritRegistration> {
        self.entries
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Splice `incoming` into `existing`.
///
/// `cursor` is the insertion point for `Top` registrations into this area.
/// It advances past each inserted batch so several `Top` registrations keep
/// their registration order ahead of the area's own children. Returns the
/// new list and the updated cursor.
pub fn apply_splice<T>(
    mut existing: Vec<T>,
    incoming: Vec<T>,
    mode: InheritMode,
    cursor: usize,
) -> (Vec<T>, usize) {
    match mode {
        InheritMode::Top => {
            let at = cursor.min(existing.len());
            let inserted = incoming.len();
            existing.splice(at..at, incoming);
            (existing, at + inserted)
        }
        InheritMode::Bottom => {
            existing.extend(incoming);
            (existing, cursor)
        }
        InheritMode::Replace => {
            let inserted = incoming.len();
            (incoming, inserted)
        }
    }
}
