//! Render targets.

use std::sync::{Arc, Mutex};

use crate::lock;

/// Marker attribute of controls whose state depends on other controls and
/// must be re-bound after new markup is inserted.
pub const DEPENDENT_CONTROL_MARKER: &str = r#"data-toggle="dependent-control""#;

/// A region of the page the view manager renders into.
pub trait RenderRegion: Send + Sync {
    /// Remove the current content.
    fn clear(&self);

    /// Scroll the region (or the page) back to the top.
    fn scroll_to_top(&self);

    /// Replace the content with rendered markup.
    fn set_html(&self, html: String);

    /// Show or hide the loading indicator (`is-loading`).
    fn set_loading(&self, loading: bool);

    /// Bind dependent controls inside freshly inserted markup.
    fn init_dependent_controls(&self) {}
}

#[derive(Debug, Default)]
struct RegionState {
    html: String,
    loading: bool,
    loading_history: Vec<bool>,
    clears: usize,
    scroll_resets: usize,
    dependent_inits: usize,
}

/// In-memory render region that records what happened to it.
#[derive(Debug, Clone, Default)]
pub struct MemoryRegion {
    inner: Arc<Mutex<RegionState>>,
}

impl MemoryRegion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(&self) -> String {
        lock(&self.inner).html.clone()
    }

    pub fn is_loading(&self) -> bool {
        lock(&self.inner).loading
    }

    /// Every `set_loading` call in order.
    pub fn loading_history(&self) -> Vec<bool> {
        lock(&self.inner).loading_history.clone()
    }

    pub fn clear_count(&self) -> usize {
        lock(&self.inner).clears
    }

    pub fn scroll_reset_count(&self) -> usize {
        lock(&self.inner).scroll_resets
    }

    /// Dependent controls bound so far, across all renders.
    pub fn dependent_control_count(&self) -> usize {
        lock(&self.inner).dependent_inits
    }
}

impl RenderRegion for MemoryRegion {
    fn clear(&self) {
        let mut state = lock(&self.inner);
        state.html.clear();
        state.clears += 1;
    }

    fn scroll_to_top(&self) {
        lock(&self.inner).scroll_resets += 1;
    }

    fn set_html(&self, html: String) {
        lock(&self.inner).html = html;
    }

    fn set_loading(&self, loading: bool) {
        let mut state = lock(&self.inner);
        state.loading = loading;
        state.loading_history.push(loading);
    }

    fn init_dependent_controls(&self) {
        let mut state = lock(&self.inner);
        let found = state.html.matches(DEPENDENT_CONTROL_MARKER).count();
        state.dependent_inits += found;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_region_records_calls() {
        let region = MemoryRegion::new();
        region.set_html("<p>old</p>".to_string());
        region.clear();
        region.scroll_to_top();
        region.set_loading(true);
        region.set_loading(false);

        assert_eq!(region.html(), "");
        assert_eq!(region.clear_count(), 1);
        assert_eq!(region.scroll_reset_count(), 1);
        assert_eq!(region.loading_history(), vec![true, false]);
        assert!(!region.is_loading());
    }

    #[test]
    fn test_dependent_controls_counted() {
        let region = MemoryRegion::new();
        region.set_html(format!(
            "<select {m}></select><input {m}>",
            m = DEPENDENT_CONTROL_MARKER
        ));
        region.init_dependent_controls();
        assert_eq!(region.dependent_control_count(), 2);
    }
}
