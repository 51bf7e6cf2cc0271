//! Dropdown menus bound to one hash key.
//!
//! Picking an item writes the key; a hash change (back button, shared link,
//! another region) is mirrored back into the menu's selection.

use serde_json::Value;

use super::state::HashState;
use crate::error::HashStateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkMenuItem {
    pub value: String,
    pub text: String,
}

impl LinkMenuItem {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

/// A menu whose selection lives in the hash state under `hash_key`.
#[derive(Debug, Clone)]
pub struct LinkMenu {
    hash_key: String,
    items: Vec<LinkMenuItem>,
    selected: Option<String>,
}

impl LinkMenu {
    pub fn new(hash_key: impl Into<String>, items: Vec<LinkMenuItem>) -> Self {
        Self {
            hash_key: hash_key.into(),
            items,
            selected: None,
        }
    }

    pub fn hash_key(&self) -> &str {
        &self.hash_key
    }

    pub fn selected(&self) -> Option<&LinkMenuItem> {
        let selected = self.selected.as_deref()?;
        self.items.iter().find(|item| item.value == selected)
    }

    /// The text the menu's link shows.
    pub fn selected_text(&self) -> Option<&str> {
        self.selected().map(|item| item.text.as_str())
    }

    /// User picked `value`: write it to the hash state.
    pub fn select(&mut self, hash_state: &HashState, value: &str) -> Result<(), HashStateError> {
        hash_state.set_key(&self.hash_key, Value::String(value.to_string()))?;
        if self.items.iter().any(|item| item.value == value) {
            self.selected = Some(value.to_string());
        }
        Ok(())
    }

    /// Mirror the hash state into the selection.
    ///
    /// Returns the newly selected item when the key now names a known item
    /// other than the current selection.
    pub fn sync(&mut self, hash_state: &HashState) -> Option<LinkMenuItem> {
        let value = match hash_state.get_key(&self.hash_key)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        if self.selected.as_deref() == Some(value.as_str()) {
            return None;
        }

        let item = self.items.iter().find(|item| item.value == value)?.clone();
        self.selected = Some(value);
        Some(item)
    }
}
