//! Host primitives the client state lives in.
//!
//! In a browser these are `sessionStorage` and `window.location`; the traits
//! keep the state layer independent of the host, and the in-memory
//! implementations back tests, the CLI and headless hosts.

pub mod location;
pub mod storage;

pub use location::{strip_fragment, MemoryLocation, PageLocation};
pub use storage::{MemoryStorage, SessionStorage};
