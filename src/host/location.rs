//! Document location and title.

use std::sync::{Arc, Mutex};

use crate::lock;

/// The current document's address, title and navigation (`window.location`
/// plus `document.title`).
pub trait PageLocation: Send + Sync {
    /// Full address including `#fragment` when one is set.
    fn href(&self) -> String;

    /// Document title.
    fn title(&self) -> String;

    /// Raw fragment without the leading `#`; empty when absent.
    fn fragment(&self) -> String;

    /// Replace the fragment. An empty string removes it.
    fn set_fragment(&self, fragment: &str);

    /// Navigate the document to `url`.
    fn assign(&self, url: &str);
}

/// `href` without its `#fragment`.
pub fn strip_fragment(href: &str) -> &str {
    match href.find('#') {
        Some(index) => &href[..index],
        None => href,
    }
}

#[derive(Debug, Default)]
struct LocationState {
    base: String,
    fragment: String,
    title: String,
    assigned: Vec<String>,
}

/// In-memory page location. Clones share the same state, so a test can keep
/// a handle and play the user editing the address bar.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocation {
    inner: Arc<Mutex<LocationState>>,
}

impl MemoryLocation {
    pub fn new(href: &str, title: &str) -> Self {
        let location = Self::default();
        location.visit(href, title);
        location
    }

    /// Load a different page (address and title) in this document.
    pub fn visit(&self, href: &str, title: &str) {
        let mut state = lock(&self.inner);
        let (base, fragment) = split_href(href);
        state.base = base;
        state.fragment = fragment;
        state.title = title.to_string();
    }

    pub fn set_title(&self, title: &str) {
        lock(&self.inner).title = title.to_string();
    }

    /// Every url passed to [`PageLocation::assign`], oldest first.
    pub fn assigned(&self) -> Vec<String> {
        lock(&self.inner).assigned.clone()
    }
}

fn split_href(href: &str) -> (String, String) {
    match href.split_once('#') {
        Some((base, fragment)) => (base.to_string(), fragment.to_string()),
        None => (href.to_string(), String::new()),
    }
}

impl PageLocation for MemoryLocation {
    fn href(&self) -> String {
        let state = lock(&self.inner);
        if state.fragment.is_empty() {
            state.base.clone()
        } else {
            format!("{}#{}", state.base, state.fragment)
        }
    }

    fn title(&self) -> String {
        lock(&self.inner).title.clone()
    }

    fn fragment(&self) -> String {
        lock(&self.inner).fragment.clone()
    }

    fn set_fragment(&self, fragment: &str) {
        lock(&self.inner).fragment = fragment.trim_start_matches('#').to_string();
    }

    fn assign(&self, url: &str) {
        let mut state = lock(&self.inner);
        state.assigned.push(url.to_string());
        let (base, fragment) = split_href(url);
        state.base = base;
        state.fragment = fragment;
    }
}
