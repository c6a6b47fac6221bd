//! Mock SPFE server for blocking clients.
//!
//! wiremock is async; the wrapper owns a runtime so tests can drive the
//! server from a plain `#[test]` while the client under test blocks.

use tokio::runtime::{Builder, Runtime};
use wiremock::{Mock, MockServer, Request};

/// wiremock server plus the runtime used to drive it.
pub struct MockSpfe {
    // Dropped before the runtime.
    server: MockServer,
    runtime: Runtime,
}

impl std::fmt::Debug for MockSpfe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSpfe")
            .field("uri", &self.server.uri())
            .finish_non_exhaustive()
    }
}

impl MockSpfe {
    /// Start a server on a random local port.
    #[must_use]
    pub fn start() -> Self {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("tokio runtime for mock server");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    /// Base URL, `http://127.0.0.1:<port>`.
    #[must_use]
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Register a mock.
    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    /// Requests received so far.
    #[must_use]
    pub fn received_requests(&self) -> Vec<Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    /// Panic if any mounted expectation is unmet.
    pub fn verify(&self) {
        self.runtime.block_on(self.server.verify());
    }
}
