//! Client configuration.
//!
//! Mirrors the page-level configuration object the server embeds in every
//! page (api root, page route, legacy flags, feature toggles), plus the
//! client's own timing knobs. Deserializes from that JSON with PascalCase
//! keys; every field has a default so partial objects are fine.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Configuration for the whole client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ClientConfig {
    /// Web api and redirect settings.
    pub api: ApiConfig,

    /// Page identity and legacy view settings.
    pub page: PageConfig,

    /// Server-driven feature switches.
    pub features: FeatureToggles,

    /// View loading settings.
    pub view: ViewConfig,

    /// Transient notification durations.
    pub notifications: NotificationConfig,
}

impl ClientConfig {
    /// Parse and validate a page configuration object.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from defaults plus environment overrides.
    ///
    /// Reads `.env` if present, then `EMA_API_ROOT`, `EMA_APPLICATION_PATH`,
    /// `EMA_PAGE_ROUTE` and `EMA_AUTO_UPDATE_NAVIGATION`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut config = ClientConfig::default();
        if let Ok(root) = std::env::var("EMA_API_ROOT") {
            config.api.api_root = root;
        }
        if let Ok(path) = std::env::var("EMA_APPLICATION_PATH") {
            config.api.application_path = path;
        }
        if let Ok(route) = std::env::var("EMA_PAGE_ROUTE") {
            config.page.page_route = Some(route);
        }
        if let Ok(flag) = std::env::var("EMA_AUTO_UPDATE_NAVIGATION") {
            config.features.auto_update_navigation = matches!(flag.as_str(), "1" | "true" | "TRUE");
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.api_root.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "Api.ApiRoot".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if !self.api.application_path.ends_with('/') {
            return Err(ConfigError::Invalid {
                field: "Api.ApplicationPath".to_string(),
                reason: "must end with '/'".to_string(),
            });
        }
        Ok(())
    }

    /// Set the api root.
    pub fn api_root(mut self, root: impl Into<String>) -> Self {
        self.api.api_root = root.into();
        self
    }

    /// Set the page route used as the default navigation key.
    pub fn page_route(mut self, route: impl Into<String>) -> Self {
        self.page.page_route = Some(route.into());
        self
    }

    /// Enable or disable automatic navigation pushes.
    pub fn auto_update_navigation(mut self, enabled: bool) -> Self {
        self.features.auto_update_navigation = enabled;
        self
    }

    /// Mark the page as a legacy view seeded with the given scenario.
    pub fn legacy_scenario(mut self, scenario_id: impl Into<Value>) -> Self {
        self.page.is_legacy_view = true;
        self.page.scenario_id = Some(scenario_id.into());
        self
    }

    /// Set the loading indicator delay.
    pub fn loading_delay(mut self, delay: Duration) -> Self {
        self.view.loading_delay_ms = delay.as_millis() as u64;
        self
    }
}

/// Web api settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ApiConfig {
    /// Prefix for every web api route, e.g. `/ema/api`.
    pub api_root: String,

    /// Application base path; the safe redirect endpoint lives under it.
    pub application_path: String,

    /// Response header carrying a server-suggested redirect.
    pub redirect_header: String,

    /// Response header carrying a trace log link for error banners.
    pub trace_log_header: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_root: "/api".to_string(),
            application_path: "/".to_string(),
            redirect_header: "X-Error-Redirect-Location".to_string(),
            trace_log_header: "X-TraceLog-Location".to_string(),
        }
    }
}

/// Page identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct PageConfig {
    /// Route template of the current page; default navigation key.
    pub page_route: Option<String>,

    /// Older pages keep the scenario outside the hash and need it seeded.
    pub is_legacy_view: bool,

    /// Scenario to seed into the hash for legacy views.
    pub scenario_id: Option<Value>,
}

/// Server-driven feature switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FeatureToggles {
    /// Push navigation automatically on page load and hash changes.
    pub auto_update_navigation: bool,
}

/// View loading settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ViewConfig {
    /// How long a fetch may run before the loading indicator shows.
    pub loading_delay_ms: u64,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            loading_delay_ms: 100,
        }
    }
}

impl ViewConfig {
    pub fn loading_delay(&self) -> Duration {
        Duration::from_millis(self.loading_delay_ms)
    }
}

/// Default display durations for transient notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct NotificationConfig {
    pub success_ms: u64,
    pub failure_ms: u64,
    pub info_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            success_ms: 1000,
            failure_ms: 1500,
            info_ms: 1750,
        }
    }
}
