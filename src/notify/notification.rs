//! Transient notifications (toasts).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use crate::config::NotificationConfig;
use crate::events::{ClientEvent, EventBus, EventFilter, EventKind, SubscriptionId};
use crate::lock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Failure,
    Info,
}

/// A short-lived message that dismisses itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransientNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    /// Overrides the kind's default duration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl TransientNotification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            duration_ms: None,
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, message)
    }

    pub fn failure(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Failure, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, message)
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// How long the notification stays up.
    pub fn display_duration(&self, defaults: &NotificationConfig) -> Duration {
        let ms = self.duration_ms.unwrap_or(match self.kind {
            NotificationKind::Success => defaults.success_ms,
            NotificationKind::Failure => defaults.failure_ms,
            NotificationKind::Info => defaults.info_ms,
        });
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Default)]
struct Shown {
    next_id: AtomicU64,
    visible: Mutex<Vec<(u64, TransientNotification)>>,
}

/// Shows notifications and dismisses each after its display duration.
#[derive(Debug, Clone)]
pub struct NotificationCenter {
    defaults: NotificationConfig,
    shown: Arc<Shown>,
}

impl NotificationCenter {
    pub fn new(defaults: NotificationConfig) -> Self {
        Self {
            defaults,
            shown: Arc::new(Shown::default()),
        }
    }

    /// Show a notification; returns its id.
    ///
    /// Outside a tokio runtime there is no timer, and the notification stays
    /// up until [`dismiss`](Self::dismiss).
    pub fn show(&self, notification: TransientNotification) -> u64 {
        let id = self.shown.next_id.fetch_add(1, Ordering::Relaxed);
        let duration = notification.display_duration(&self.defaults);
        tracing::debug!(id, title = %notification.title, ?duration, "Showing notification");
        lock(&self.shown.visible).push((id, notification));

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let shown = Arc::clone(&self.shown);
                handle.spawn(async move {
                    tokio::time::sleep(duration).await;
                    lock(&shown.visible).retain(|(visible_id, _)| *visible_id != id);
                });
            }
            Err(_) => tracing::debug!(id, "No runtime, notification will not auto-dismiss"),
        }

        id
    }

    pub fn dismiss(&self, id: u64) -> bool {
        let mut visible = lock(&self.shown.visible);
        let before = visible.len();
        visible.retain(|(visible_id, _)| *visible_id != id);
        visible.len() != before
    }

    /// Currently visible notifications, oldest first.
    pub fn visible(&self) -> Vec<TransientNotification> {
        lock(&self.shown.visible)
            .iter()
            .map(|(_, notification)| notification.clone())
            .collect()
    }

    /// Show every `Notification` event published on `bus`.
    pub fn attach(&self, bus: &EventBus) -> SubscriptionId {
        let center = self.clone();
        bus.subscribe(EventFilter::kind(EventKind::Notification), move |event| {
            if let ClientEvent::Notification(notification) = event {
                center.show(notification.clone());
            }
        })
    }
}
