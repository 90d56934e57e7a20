//! Advisory "being edited by" markers, per entity and user.
//!
//! Markers never lock anything. Only the context patch/clean handlers and
//! the watch guard write here.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditUserContext {
    pub user_id: String,
    pub name: String,
    pub focus_on: Option<String>,
}

#[derive(Clone, Default)]
pub struct EditContextRegistry {
    contexts: Arc<DashMap<String, BTreeMap<String, EditUserContext>>>,
}

impl EditContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `user_id` as editing `entity_id`, replacing any previous focus.
    pub fn set(&self, entity_id: &str, user_id: &str, name: &str, focus_on: Option<String>) {
        self.contexts
            .entry(entity_id.to_string())
            .or_default()
            .insert(
                user_id.to_string(),
                EditUserContext {
                    user_id: user_id.to_string(),
                    name: name.to_string(),
                    focus_on,
                },
            );
    }

    /// Clears the marker. Returns false when there was nothing to clear.
    pub fn clear(&self, entity_id: &str, user_id: &str) -> bool {
        let removed = match self.contexts.get_mut(entity_id) {
            Some(mut users) => users.remove(user_id).is_some(),
            None => false,
        };
        self.contexts.remove_if(entity_id, |_, users| users.is_empty());
        removed
    }

    /// Drops every marker of a deleted entity.
    pub fn remove_entity(&self, entity_id: &str) -> usize {
        self.contexts
            .remove(entity_id)
            .map(|(_, users)| users.len())
            .unwrap_or(0)
    }

    pub fn list(&self, entity_id: &str) -> Vec<EditUserContext> {
        self.contexts
            .get(entity_id)
            .map(|users| users.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn is_editing(&self, entity_id: &str, user_id: &str) -> bool {
        self.contexts
            .get(entity_id)
            .map(|users| users.contains_key(user_id))
            .unwrap_or(false)
    }

    pub fn entity_count(&self) -> usize {
        self.contexts.len()
    }
}

/// Clears one `(entity, user)` marker exactly once, at the latest when
/// dropped.
pub struct PresenceGuard {
    registry: EditContextRegistry,
    entity_id: String,
    user_id: String,
    released: AtomicBool,
}

impl PresenceGuard {
    /// Sets the marker and returns the guard owning its removal.
    pub fn acquire(registry: &EditContextRegistry, entity_id: &str, user_id: &str, name: &str) -> Self {
        registry.set(entity_id, user_id, name, None);
        Self {
            registry: registry.clone(),
            entity_id: entity_id.to_string(),
            user_id: user_id.to_string(),
            released: AtomicBool::new(false),
        }
    }

    /// Returns true only for the call that performed the cleanup.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.registry.clear(&self.entity_id, &self.user_id);
        true
    }
}

impl Drop for PresenceGuard {
    fn drop(&mut self) {
        self.release();
    }
}
