//! Construction-time options for `ApiClient`.

use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::transport::Transport;

/// Environment variable consulted when no server URL is given.
pub const SERVER_ENV_VAR: &str = "QVAPAY_API_ENDPOINT";

/// Public API root used when neither the options nor the environment name one.
pub const DEFAULT_SERVER: &str = "https://qvapay.com/api";

/// Options consumed once by `ApiClient::from_options`.
///
/// Everything is optional:
/// - `server` falls back to `QVAPAY_API_ENDPOINT`, then `DEFAULT_SERVER`.
/// - `transport` defaults to a `UreqTransport` honouring `timeout`.
/// - `diagnostics` enables request/response dumps when present.
#[derive(Default)]
pub struct ClientOptions {
    pub server: Option<String>,
    pub transport: Option<Arc<dyn Transport>>,
    pub timeout: Option<Duration>,
    pub diagnostics: Option<Box<dyn Write + Send>>,
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Ignored when a custom transport is supplied.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn diagnostics(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.diagnostics = Some(sink);
        self
    }

    /// Server URL without a trailing slash.
    pub fn resolve_server(&self) -> String {
        let env = std::env::var(SERVER_ENV_VAR).ok();
        resolve_server(self.server.as_deref(), env.as_deref())
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("server", &self.server)
            .field("transport", &self.transport.as_ref().map(|_| "custom"))
            .field("timeout", &self.timeout)
            .field("diagnostics", &self.diagnostics.is_some())
            .finish()
    }
}

fn resolve_server(explicit: Option<&str>, env: Option<&str>) -> String {
    [explicit, env]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SERVER)
        .trim_end_matches('/')
        .to_string()
}
