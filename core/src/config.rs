//! Process-wide defaults shared by every resource type.

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable read by [`GlobalConfig::from_env`].
pub const BASE_URL_ENV: &str = "WMS_BASE_URL";

/// Default base URL for resource types that do not override it.
///
/// Set it before the first fetch of any resource type: service URLs are
/// derived from it once and then kept.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GlobalConfig {
    base_url: String,
}

impl GlobalConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Read the base URL from `WMS_BASE_URL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.is_empty() => Ok(Self::new(url)),
            _ => Err(ConfigError::MissingEnv(BASE_URL_ENV)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, url: impl Into<String>) {
        self.base_url = url.into();
    }
}
