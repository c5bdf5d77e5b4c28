//! Per-resource-type state and the registry that owns it.
//!
//! # Design
//! Each resource type gets one `ResourceState`: its base-URL override, the
//! memoized service URL, the error log of the last fetch and the last raw
//! response. The `Registry` owns the shared `GlobalConfig` plus one state per
//! type name, created on first access.
//!
//! A state is not meant to be shared by concurrent fetches. Callers that
//! fetch the same type from several threads serialize access or keep one
//! registry per thread.

use std::collections::HashMap;

use serde_json::Value;

use crate::config::GlobalConfig;
use crate::error::ErrorLog;
use crate::http::HttpResponse;
use crate::query::{build_query, Query};
use crate::resource::Resource;

/// The most recent exchange of a resource type, kept for inspection.
#[derive(Debug, Clone, PartialEq)]
pub struct LastResponse {
    pub response: HttpResponse,
    /// Parsed body, when it was JSON.
    pub json: Option<Value>,
}

/// Configuration and call state for one resource type.
#[derive(Debug, Clone)]
pub struct ResourceState {
    type_name: &'static str,
    base_url: Option<String>,
    service_url: Option<String>,
    errors: ErrorLog,
    last_response: Option<LastResponse>,
}

impl ResourceState {
    pub fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            base_url: None,
            service_url: None,
            errors: ErrorLog::new(),
            last_response: None,
        }
    }

    pub fn for_resource<R: Resource>() -> Self {
        Self::new(R::NAME)
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Override the base URL for this resource type only.
    pub fn set_base_url(&mut self, url: impl Into<String>) {
        self.base_url = Some(url.into());
    }

    /// The override if one is set, else the global base URL.
    pub fn base_url<'a>(&'a self, config: &'a GlobalConfig) -> &'a str {
        self.base_url.as_deref().unwrap_or(config.base_url())
    }

    /// `{base_url}/{lowercased type name}`.
    ///
    /// Computed on first access and kept for the lifetime of the state:
    /// later base-URL changes, global or overridden, do not affect it.
    pub fn service_url(&mut self, config: &GlobalConfig) -> &str {
        if self.service_url.is_none() {
            let url = format!("{}/{}", self.base_url(config), self.type_name.to_lowercase());
            tracing::debug!(resource = self.type_name, %url, "resolved service url");
            self.service_url = Some(url);
        }
        self.service_url.as_deref().unwrap_or_default()
    }

    /// `{service_url}/{path}` followed by the query string, if any.
    pub fn request_url(&mut self, config: &GlobalConfig, path: &str, query: Option<&Query>) -> String {
        let query = build_query(query).unwrap_or_default();
        format!("{}/{path}{query}", self.service_url(config))
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorLog {
        &mut self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn last_response(&self) -> Option<&LastResponse> {
        self.last_response.as_ref()
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.last_response.as_ref().map(|last| &last.response)
    }

    pub fn json(&self) -> Option<&Value> {
        self.last_response.as_ref().and_then(|last| last.json.as_ref())
    }

    /// Reset the per-call state. Runs once at the start of every fetch.
    pub(crate) fn begin_call(&mut self) {
        self.errors.clear();
        self.last_response = None;
    }

    pub(crate) fn record_response(&mut self, last: LastResponse) {
        self.last_response = Some(last);
    }
}

/// Global configuration plus the state of every resource type in use.
#[derive(Debug, Clone)]
pub struct Registry {
    config: GlobalConfig,
    states: HashMap<&'static str, ResourceState>,
}

impl Registry {
    pub fn new(config: GlobalConfig) -> Self {
        Self {
            config,
            states: HashMap::new(),
        }
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut GlobalConfig {
        &mut self.config
    }

    /// State for `R`, created on first access.
    pub fn state<R: Resource>(&mut self) -> &mut ResourceState {
        self.states
            .entry(R::NAME)
            .or_insert_with(ResourceState::for_resource::<R>)
    }

    /// State for `R` if it has been accessed before.
    pub fn get<R: Resource>(&self) -> Option<&ResourceState> {
        self.states.get(R::NAME)
    }

    /// The global config together with the state for `R`, borrowed at once.
    pub fn parts<R: Resource>(&mut self) -> (&GlobalConfig, &mut ResourceState) {
        let state = self
            .states
            .entry(R::NAME)
            .or_insert_with(ResourceState::for_resource::<R>);
        (&self.config, state)
    }
}
