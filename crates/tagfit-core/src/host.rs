//! Runtime host: the environment a creative renders inside.
//!
//! The engine reports diagnostics, fatal errors and assets to wait for through this trait, and
//! reads query parameters from it. Calls are one-way: the engine never branches on what the host
//! does with them.

use crate::Error;
use indexmap::IndexMap;
use serde::Serialize;
use std::cell::RefCell;

pub trait RuntimeHost {
    /// Diagnostic line.
    fn log(&self, message: &str);
    /// The creative cannot render; the host should show its own fallback.
    fn fatal_error(&self, message: &str);
    /// The host should hold its "ready" signal until `url` has loaded.
    fn wait_for_asset(&self, url: &str);
    fn param(&self, key: &str) -> Option<String>;
    fn params(&self) -> IndexMap<String, String>;
}

/// Sends a fatal error to the host's fatal channel and hands it back for propagation.
pub fn raise(host: &dyn RuntimeHost, error: Error) -> Error {
    let message = error.to_string();
    tracing::error!(%message, "fatal creative error");
    host.fatal_error(&message);
    error
}

/// Parses a query string (`a=1&b=two`) into an ordered param map. Later keys win.
pub fn params_from_query(query: &str) -> IndexMap<String, String> {
    let query = query.strip_prefix('?').unwrap_or(query);
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Default host: forwards everything to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingHost {
    params: IndexMap<String, String>,
}

impl TracingHost {
    pub fn new(params: IndexMap<String, String>) -> Self {
        Self { params }
    }
}

impl RuntimeHost for TracingHost {
    fn log(&self, message: &str) {
        tracing::info!(target: "tagfit::host", "{message}");
    }

    fn fatal_error(&self, message: &str) {
        tracing::error!(target: "tagfit::host", "{message}");
    }

    fn wait_for_asset(&self, url: &str) {
        tracing::debug!(target: "tagfit::host", %url, "wait for asset");
    }

    fn param(&self, key: &str) -> Option<String> {
        self.params.get(key).cloned()
    }

    fn params(&self) -> IndexMap<String, String> {
        self.params.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum HostEvent {
    Log(String),
    FatalError(String),
    WaitForAsset(String),
}

/// Host that keeps every event, for tests and headless reports.
#[derive(Debug, Default)]
pub struct RecordingHost {
    params: RefCell<IndexMap<String, String>>,
    events: RefCell<Vec<HostEvent>>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params<K, V>(params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let host = Self::default();
        host.set_params(params);
        host
    }

    /// Replaces every param.
    pub fn set_params<K, V>(&self, params: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        *self.params.borrow_mut() = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
    }

    pub fn set_param(&self, key: impl Into<String>, value: impl Into<String>) {
        self.params.borrow_mut().insert(key.into(), value.into());
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.borrow().clone()
    }

    pub fn logs(&self) -> Vec<String> {
        self.collect(|e| match e {
            HostEvent::Log(m) => Some(m),
            _ => None,
        })
    }

    pub fn fatal_errors(&self) -> Vec<String> {
        self.collect(|e| match e {
            HostEvent::FatalError(m) => Some(m),
            _ => None,
        })
    }

    pub fn awaited_assets(&self) -> Vec<String> {
        self.collect(|e| match e {
            HostEvent::WaitForAsset(u) => Some(u),
            _ => None,
        })
    }

    pub fn clear_events(&self) {
        self.events.borrow_mut().clear();
    }

    fn collect(&self, pick: impl Fn(&HostEvent) -> Option<&String>) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| pick(e).cloned())
            .collect()
    }

    fn record(&self, event: HostEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl RuntimeHost for RecordingHost {
    fn log(&self, message: &str) {
        self.record(HostEvent::Log(message.to_string()));
    }

    fn fatal_error(&self, message: &str) {
        self.record(HostEvent::FatalError(message.to_string()));
    }

    fn wait_for_asset(&self, url: &str) {
        self.record(HostEvent::WaitForAsset(url.to_string()));
    }

    fn param(&self, key: &str) -> Option<String> {
        self.params.borrow().get(key).cloned()
    }

    fn params(&self) -> IndexMap<String, String> {
        self.params.borrow().clone()
    }
}
