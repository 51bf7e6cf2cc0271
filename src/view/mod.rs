//! View loading.
//!
//! A `ViewManager` owns one page region and runs load cycles against it:
//! clear the region, fetch the model, show the loading indicator if the
//! fetch is slow, render the template and bind dependent controls. Starting
//! a new cycle cancels the previous one, so the region always reflects the
//! last request made, regardless of response order.
//!
//! ```ignore
//! let manager = ViewManager::new(region, renderer, &config.view);
//! let client = api.clone();
//! let outcome = manager
//!     .start(move |token| async move { client.get("Goals", token).await }, "goals", None)
//!     .await;
//! ```

pub mod manager;
pub mod region;
pub mod template;

pub use manager::{LoadCycle, LoadOutcome, Preprocess, RenderedView, ViewManager};
pub use region::{MemoryRegion, RenderRegion, DEPENDENT_CONTROL_MARKER};
pub use template::{HandlebarsRenderer, TemplateRenderer};
