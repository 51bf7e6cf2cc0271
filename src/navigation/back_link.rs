//! The page's "back" link.

use super::stack::{Navigation, NavigationEntry};

/// What the back link shows. Hidden when there is nowhere to go back to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackLink {
    pub visible: bool,
    /// HTML-escaped link text
    pub text: String,
    /// Sanitized target (`#` for anything that is not http/https)
    pub href: String,
}

impl BackLink {
    pub fn hidden() -> Self {
        Self::default()
    }

    pub fn from_entry(entry: Option<NavigationEntry>) -> Self {
        match entry {
            Some(entry) => Self {
                visible: true,
                text: entry.text,
                href: entry.url,
            },
            None => Self::hidden(),
        }
    }

    /// Derive the link from the stack's previous entry.
    pub fn resolve(navigation: &Navigation) -> Self {
        Self::from_entry(navigation.previous())
    }
}
