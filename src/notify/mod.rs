//! User-facing failure and status feedback.
//!
//! - `banner`: the page's error banner, driven by failure events
//! - `model_state`: field errors from a bad request body
//! - `notification`: self-dismissing toasts

pub mod banner;
pub mod model_state;
pub mod notification;

pub use banner::{BannerMessage, ErrorBanner, MAINTENANCE_MESSAGE, UNKNOWN_ERROR_MESSAGE};
pub use model_state::model_state_errors;
pub use notification::{NotificationCenter, NotificationKind, TransientNotification};
