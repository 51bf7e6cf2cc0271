//! Navigation Module
//!
//! Session-backed back-stack for the page's "back" link. It is independent
//! of the hash state: it records where the user came from, not what the
//! current view shows.
//!
//! - `stack`: `Navigation` push/pop/top/previous/get/clear over session storage
//! - `back_link`: the back link model derived from `Navigation::previous`
//!
//! ## Usage Example
//!
//! ```ignore
//! let navigation = Navigation::new(storage, location, &config);
//! navigation.push(Some("Home"), Some("https://ema/home"), Some("home"))?;
//! navigation.push(Some("Detail"), Some("https://ema/detail/5"), Some("detail-5"))?;
//!
//! // Revisiting a known key collapses everything after it
//! navigation.push(None, None, Some("home"))?;
//! assert_eq!(navigation.len(), 1);
//! ```

pub mod back_link;
pub mod stack;

pub use back_link::BackLink;
pub use stack::{Navigation, NavigationEntry, NAVIGATION_STORAGE_KEY};
