//! Hash State Module
//!
//! The URL fragment holds a percent-encoded JSON object with every "current
//! view" parameter (scenario, report, year, step, section, ...). Nothing
//! else holds view state, so a URL is always enough to restore a view.
//!
//! - `state`: `HashState` read/write over the page location, plus the codec
//! - `params`: `ViewParams`, a typed view of the well-known keys
//! - `dispatcher`: `ChangeDispatcher`, per-key change events from whole-blob
//!   transitions
//! - `link_menu`: dropdown menus bound to a single hash key
//!
//! ## Wire format
//!
//! `#%7B%22scenario%22%3A%2242%22%7D` decodes to `{"scenario":"42"}`.

pub mod dispatcher;
pub mod link_menu;
pub mod params;
pub mod state;

pub use dispatcher::{changed_keys, ChangeDispatcher};
pub use link_menu::{LinkMenu, LinkMenuItem};
pub use params::ViewParams;
pub use state::{decode_fragment, encode_fragment, HashState, StateMap};
