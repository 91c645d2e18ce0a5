//! Per-admin, per-collection editing panel.
//!
//! ```text
//! Browsing --begin_edit(id)--> Editing(id) --cancel--> Browsing
//! Browsing | Editing --begin_submit--> Submitting --complete--> Browsing
//!                                      Submitting --drop------> previous state
//! ```
//!
//! A second submit while one is in flight is rejected with `PanelError::Busy`.

use crate::models::Collection;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SubmitTarget {
    Create,
    Update(String),
    Delete(String),
    Publish(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PanelState {
    Browsing,
    Editing { id: String },
    Submitting { target: SubmitTarget },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PanelError {
    #[error("Another change to {0} is still being saved.")]
    Busy(Collection),
}

type PanelKey = (String, Collection);

#[derive(Default)]
pub struct PanelRegistry {
    // Only non-Browsing states are stored.
    panels: Mutex<HashMap<PanelKey, PanelState>>,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PanelKey, PanelState>> {
        self.panels.lock().unwrap_or_else(|poisoned| {
            log::error!("Mutex for manager panels was poisoned! Recovering lock.");
            poisoned.into_inner()
        })
    }

    fn set(panels: &mut HashMap<PanelKey, PanelState>, key: PanelKey, state: PanelState) {
        if state == PanelState::Browsing {
            panels.remove(&key);
        } else {
            panels.insert(key, state);
        }
    }

    pub fn state(&self, admin_id: &str, collection: Collection) -> PanelState {
        self.lock()
            .get(&(admin_id.to_string(), collection))
            .cloned()
            .unwrap_or(PanelState::Browsing)
    }

    /// Opens the form for `id`. Switching straight from one record to
    /// another is allowed; nothing was persisted for the first.
    pub fn begin_edit(
        &self,
        admin_id: &str,
        collection: Collection,
        id: &str,
    ) -> Result<(), PanelError> {
        let mut panels = self.lock();
        let key = (admin_id.to_string(), collection);
        if let Some(PanelState::Submitting { .. }) = panels.get(&key) {
            return Err(PanelError::Busy(collection));
        }
        Self::set(&mut panels, key, PanelState::Editing { id: id.to_string() });
        Ok(())
    }

    /// Drops the form. A no-op while browsing.
    pub fn cancel(&self, admin_id: &str, collection: Collection) -> Result<(), PanelError> {
        let mut panels = self.lock();
        let key = (admin_id.to_string(), collection);
        if let Some(PanelState::Submitting { .. }) = panels.get(&key) {
            return Err(PanelError::Busy(collection));
        }
        Self::set(&mut panels, key, PanelState::Browsing);
        Ok(())
    }

    pub fn begin_submit(
        &self,
        admin_id: &str,
        collection: Collection,
        target: SubmitTarget,
    ) -> Result<SubmitGuard<'_>, PanelError> {
        let mut panels = self.lock();
        let key = (admin_id.to_string(), collection);
        let previous = panels.get(&key).cloned().unwrap_or(PanelState::Browsing);
        if let PanelState::Submitting { .. } = previous {
            return Err(PanelError::Busy(collection));
        }
        Self::set(&mut panels, key.clone(), PanelState::Submitting { target });

        Ok(SubmitGuard { registry: self, key, previous, completed: false })
    }
}

/// Held for the duration of one write. `complete()` returns the panel to
/// browsing; dropping without completing restores the state the submit
/// started from, so the form stays populated after a failure.
pub struct SubmitGuard<'a> {
    registry: &'a PanelRegistry,
    key: PanelKey,
    previous: PanelState,
    completed: bool,
}

impl SubmitGuard<'_> {
    pub fn complete(mut self) {
        self.completed = true;
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        let next = if self.completed { PanelState::Browsing } else { self.previous.clone() };
        let mut panels = self.registry.lock();
        PanelRegistry::set(&mut panels, self.key.clone(), next);
    }
}
