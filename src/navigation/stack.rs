//! The navigation back-stack.
//!
//! Stored as a JSON array of `{urlKey, url, text}` under one session storage
//! key. The key exists only while the stack is non-empty. Reads fail closed:
//! a corrupt entry is treated as an empty stack.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::error::StorageError;
use crate::host::{strip_fragment, PageLocation, SessionStorage};

/// Session storage key holding the serialized stack.
pub const NAVIGATION_STORAGE_KEY: &str = "emaNavigation";

/// Replacement for stored urls that are not plain http(s) links.
const UNSAFE_URL_PLACEHOLDER: &str = "#";

/// One visitable location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationEntry {
    /// Identity used to collapse history when a location is revisited
    pub url_key: String,
    /// Where the back link points
    pub url: String,
    /// What the back link says
    pub text: String,
}

impl NavigationEntry {
    pub fn new(
        url_key: impl Into<String>,
        url: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            url_key: url_key.into(),
            url: url.into(),
            text: text.into(),
        }
    }

    /// Copy safe for display: non-http urls become `#`, text is HTML-escaped.
    fn sanitized(&self) -> Self {
        Self {
            url_key: self.url_key.clone(),
            url: if is_http_url(&self.url) {
                self.url.clone()
            } else {
                UNSAFE_URL_PLACEHOLDER.to_string()
            },
            text: handlebars::html_escape(&self.text),
        }
    }
}

fn is_http_url(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Session-backed navigation stack.
pub struct Navigation {
    storage: Arc<dyn SessionStorage>,
    location: Arc<dyn PageLocation>,
    page_route: Option<String>,
    auto_update_navigation: bool,
    auto_push: AtomicBool,
}

impl Navigation {
    pub fn new(
        storage: Arc<dyn SessionStorage>,
        location: Arc<dyn PageLocation>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            storage,
            location,
            page_route: config.page.page_route.clone(),
            auto_update_navigation: config.features.auto_update_navigation,
            auto_push: AtomicBool::new(true),
        }
    }

    fn load_stack(&self) -> Vec<NavigationEntry> {
        let Some(raw) = self.storage.get_item(NAVIGATION_STORAGE_KEY) else {
            return Vec::new();
        };

        match serde_json::from_str(&raw) {
            Ok(stack) => stack,
            Err(e) => {
                tracing::warn!(error = %e, "Corrupt navigation stack in session storage, treating as empty");
                Vec::new()
            }
        }
    }

    fn store_stack(&self, stack: &[NavigationEntry]) -> Result<(), StorageError> {
        if stack.is_empty() {
            self.storage.remove_item(NAVIGATION_STORAGE_KEY);
            return Ok(());
        }

        let json = serde_json::to_string(stack)?;
        self.storage.set_item(NAVIGATION_STORAGE_KEY, &json);
        Ok(())
    }

    /// Record a location, collapsing history back to any earlier visit of
    /// the same `url_key`.
    ///
    /// Missing (or empty) arguments default to the document title, the
    /// current address, and the page route (or the address without its
    /// fragment).
    pub fn push(
        &self,
        text: Option<&str>,
        url: Option<&str>,
        url_key: Option<&str>,
    ) -> Result<(), StorageError> {
        let text = non_empty(text).map_or_else(|| self.location.title(), str::to_string);
        let url = non_empty(url).map_or_else(|| self.location.href(), str::to_string);
        let url_key = match non_empty(url_key) {
            Some(key) => key.to_string(),
            None => self.default_url_key(),
        };

        let mut stack = self.load_stack();
        if let Some(index) = stack.iter().position(|entry| entry.url_key == url_key) {
            stack.truncate(index);
        }

        tracing::debug!(url_key = %url_key, depth = stack.len() + 1, "Pushing navigation entry");
        stack.push(NavigationEntry { url_key, url, text });
        self.store_stack(&stack)
    }

    fn default_url_key(&self) -> String {
        match non_empty(self.page_route.as_deref()) {
            Some(route) => route.to_string(),
            None => strip_fragment(&self.location.href()).to_string(),
        }
    }

    /// Remove and return the most recent entry.
    pub fn pop(&self) -> Result<Option<NavigationEntry>, StorageError> {
        let mut stack = self.load_stack();
        let Some(entry) = stack.pop() else {
            return Ok(None);
        };
        self.store_stack(&stack)?;
        Ok(Some(entry))
    }

    pub fn top(&self) -> Option<NavigationEntry> {
        self.get(0)
    }

    /// The entry a "back" link should lead to.
    ///
    /// When the current page was never pushed, the top entry is the page we
    /// came from; otherwise it is the entry below the top.
    pub fn previous(&self) -> Option<NavigationEntry> {
        let stack = self.load_stack();
        let top = stack.last()?;

        if top.url != self.location.href() {
            return Some(top.sanitized());
        }

        Self::entry_at(&stack, 1)
    }

    /// The entry `delta` positions below the top (0 = top), sanitized.
    pub fn get(&self, delta: usize) -> Option<NavigationEntry> {
        Self::entry_at(&self.load_stack(), delta)
    }

    fn entry_at(stack: &[NavigationEntry], delta: usize) -> Option<NavigationEntry> {
        if stack.len() <= delta {
            return None;
        }
        Some(stack[stack.len() - delta - 1].sanitized())
    }

    /// Raw entries, oldest first.
    pub fn entries(&self) -> Vec<NavigationEntry> {
        self.load_stack()
    }

    pub fn len(&self) -> usize {
        self.load_stack().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.storage.remove_item(NAVIGATION_STORAGE_KEY);
    }

    /// Whether page loads and hash changes push automatically.
    pub fn is_auto_push_enabled(&self) -> bool {
        self.auto_push.load(Ordering::Relaxed) && self.auto_update_navigation
    }

    /// Local switch for pages that push their own entries.
    pub fn set_auto_push_enabled(&self, enabled: bool) {
        self.auto_push.store(enabled, Ordering::Relaxed);
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
