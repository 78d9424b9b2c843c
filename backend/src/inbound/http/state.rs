//! Shared application state for HTTP handlers.

use std::sync::Arc;

use crate::domain::ports::{
    AccountSync, ConnectionLink, FixtureAccountSync, FixtureConnectionLink,
};

/// Dependencies injected into every HTTP handler.
///
/// Handlers see only the driving ports; concrete wiring happens in the
/// composition root.
#[derive(Clone)]
pub struct HttpState {
    pub link: Arc<dyn ConnectionLink>,
    pub sync: Arc<dyn AccountSync>,
    /// Where the aggregator redirects the user's browser after
    /// authorization, used when a request does not supply its own.
    pub callback_url: String,
}

impl HttpState {
    /// Build state backed by the given port implementations.
    pub fn new(
        link: Arc<dyn ConnectionLink>,
        sync: Arc<dyn AccountSync>,
        callback_url: impl Into<String>,
    ) -> Self {
        Self {
            link,
            sync,
            callback_url: callback_url.into(),
        }
    }
}

impl Default for HttpState {
    /// Fixture-backed state for tests and examples.
    fn default() -> Self {
        Self::new(
            Arc::new(FixtureConnectionLink),
            Arc::new(FixtureAccountSync),
            "http://localhost:8080/api/connections/callback",
        )
    }
}
