//! Per-page application context.
//!
//! Owns the state layer for one page: configuration, host handles, the event
//! bus, hash state, navigation stack and change dispatcher. Everything that
//! needs them is built from here, so tests get a fresh, isolated page by
//! constructing a new context (or calling [`AppContext::reset`]).

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::api::{ApiClient, LegacyAjax, Transport};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::events::EventBus;
use crate::hash_state::{ChangeDispatcher, HashState};
use crate::host::{PageLocation, SessionStorage};
use crate::lock;
use crate::navigation::{BackLink, Navigation};
use crate::notify::{ErrorBanner, NotificationCenter};
use crate::view::{RenderRegion, TemplateRenderer, ViewManager};

/// Hash key seeded from the page config on legacy views.
const SCENARIO_KEY: &str = "scenario";

pub struct AppContext {
    config: ClientConfig,
    location: Arc<dyn PageLocation>,
    bus: EventBus,
    hash_state: HashState,
    navigation: Navigation,
    dispatcher: ChangeDispatcher,
    back_link: Mutex<BackLink>,
}

impl AppContext {
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn SessionStorage>,
        location: Arc<dyn PageLocation>,
    ) -> Self {
        let hash_state = HashState::new(Arc::clone(&location));
        let navigation = Navigation::new(storage, Arc::clone(&location), &config);
        Self {
            config,
            location,
            bus: EventBus::new(),
            hash_state,
            navigation,
            dispatcher: ChangeDispatcher::new(),
            back_link: Mutex::new(BackLink::hidden()),
        }
    }

    /// Page load.
    ///
    /// Seeds the scenario into the hash on legacy views (dispatching the
    /// resulting change), pushes the page when auto-push is on and derives
    /// the back link.
    pub fn initialize(&self) -> Result<BackLink, ClientError> {
        if self.config.page.is_legacy_view {
            let before = self.location.fragment();
            let scenario = self.config.page.scenario_id.clone().unwrap_or(Value::Null);
            self.hash_state.set_key(SCENARIO_KEY, scenario)?;

            if self.location.fragment() != before {
                tracing::debug!("Seeded legacy scenario into hash state");
                self.dispatcher.on_hash_change(&self.hash_state, &self.bus);
            }
        }

        if self.navigation.is_auto_push_enabled() {
            self.navigation.push(None, None, None)?;
        }

        Ok(self.refresh_back_link())
    }

    /// The fragment changed: announce per-key changes, auto-push and
    /// refresh the back link. Returns the changed keys.
    pub fn hash_changed(&self) -> Result<Vec<String>, ClientError> {
        let changed = self.dispatcher.on_hash_change(&self.hash_state, &self.bus);

        if self.navigation.is_auto_push_enabled() {
            self.navigation.push(None, None, None)?;
        }
        self.refresh_back_link();

        Ok(changed)
    }

    /// Re-derive the back link from the stack.
    pub fn refresh_back_link(&self) -> BackLink {
        let link = BackLink::resolve(&self.navigation);
        *lock(&self.back_link) = link.clone();
        link
    }

    pub fn back_link(&self) -> BackLink {
        lock(&self.back_link).clone()
    }

    /// Drop all page state: stack, fragment, subscribers and snapshot.
    pub fn reset(&self) {
        self.navigation.clear();
        self.hash_state.clear();
        self.bus.reset();
        self.dispatcher.reset();
        *lock(&self.back_link) = BackLink::hidden();
    }

    /// A web api client reporting on this page's bus.
    pub fn api_client(&self, transport: Arc<dyn Transport>) -> ApiClient {
        ApiClient::new(
            transport,
            self.config.api.clone(),
            self.bus.clone(),
            Arc::clone(&self.location),
        )
    }

    pub fn legacy_ajax(&self, transport: Arc<dyn Transport>) -> LegacyAjax {
        LegacyAjax::new(
            transport,
            self.config.api.clone(),
            self.bus.clone(),
            Arc::clone(&self.location),
        )
    }

    pub fn view_manager(
        &self,
        region: Arc<dyn RenderRegion>,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> ViewManager {
        ViewManager::new(region, renderer, &self.config.view)
    }

    /// An error banner subscribed to this page's failures.
    pub fn error_banner(&self) -> ErrorBanner {
        let banner = ErrorBanner::new(self.config.api.trace_log_header.clone());
        banner.attach(&self.bus);
        banner
    }

    /// A notification center showing this page's notifications.
    pub fn notification_center(&self) -> NotificationCenter {
        let center = NotificationCenter::new(self.config.notifications.clone());
        center.attach(&self.bus);
        center
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn hash_state(&self) -> &HashState {
        &self.hash_state
    }

    pub fn navigation(&self) -> &Navigation {
        &self.navigation
    }

    pub fn dispatcher(&self) -> &ChangeDispatcher {
        &self.dispatcher
    }

    pub fn location(&self) -> &Arc<dyn PageLocation> {
        &self.location
    }
}
