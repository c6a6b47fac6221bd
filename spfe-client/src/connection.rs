//! Single authenticated connection with bounded retry.

use std::sync::Arc;

use parking_lot::{Mutex, RawMutex};
use tracing::{debug, instrument, warn};

use crate::codec::{self, Method, ResponseEnvelope};
use crate::config::TransportConfig;
use crate::error::{SpfeError, SpfeResult};
use crate::params::RequestParams;
use crate::retry::Backoff;
use crate::transport::{HttpsTransport, Transport};

pub(crate) type ClaimGuard<T> = lock_api::ArcMutexGuard<RawMutex, T>;

/// One transport context to the service.
///
/// The transport sits behind the connection's exclusive-use lock, so at most
/// one request is in flight per connection. Cloning yields another handle to
/// the same connection, not a new one.
pub struct Connection<T = HttpsTransport> {
    endpoint: Arc<str>,
    backoff: Backoff,
    transport: Arc<Mutex<T>>,
}

impl<T> Clone for Connection<T> {
    fn clone(&self) -> Self {
        Self {
            endpoint: Arc::clone(&self.endpoint),
            backoff: self.backoff.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T> std::fmt::Debug for Connection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.endpoint)
            .field("busy", &self.transport.is_locked())
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Open a mutually authenticated HTTPS connection.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Config`] on invalid TLS material or address.
    pub fn connect(config: &TransportConfig) -> SpfeResult<Self> {
        let endpoint = config.endpoint()?;
        let transport = HttpsTransport::new(config)?;
        Ok(Self::with_transport(endpoint, transport).with_backoff(config.backoff().clone()))
    }
}

impl<T: Transport> Connection<T> {
    /// Wrap an arbitrary transport. `endpoint` must already be normalized.
    #[must_use]
    pub fn with_transport(endpoint: impl Into<String>, transport: T) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: Arc::from(endpoint),
            backoff: Backoff::default(),
            transport: Arc::new(Mutex::new(transport)),
        }
    }

    /// Set the delay schedule between retries.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Execute one request, waiting if another caller holds this connection.
    ///
    /// # Errors
    ///
    /// See [`execute`].
    pub fn request(
        &self,
        method: Method,
        command: &str,
        params: &RequestParams,
        attempts: u32,
    ) -> SpfeResult<ResponseEnvelope> {
        let mut transport = self.transport.lock();
        execute(
            &mut *transport,
            &self.endpoint,
            &self.backoff,
            method,
            command,
            params,
            attempts,
        )
    }

    /// Take the exclusive-use lock without blocking.
    pub(crate) fn try_claim(&self) -> Option<ClaimGuard<T>> {
        self.transport.try_lock_arc()
    }

    /// Take the exclusive-use lock, waiting if needed.
    pub(crate) fn claim(&self) -> ClaimGuard<T> {
        self.transport.lock_arc()
    }

    pub(crate) fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub(crate) fn shared_endpoint(&self) -> Arc<str> {
        Arc::clone(&self.endpoint)
    }
}

/// Send a request and decode its envelope, retrying transport failures.
///
/// `attempts` is the total number of tries and is clamped to at least 1.
///
/// # Errors
///
/// - [`SpfeError::Transport`] once every attempt failed at transport level
/// - [`SpfeError::Service`] when the service answered `result = false`
/// - [`SpfeError::Protocol`] when the response is not a valid envelope
#[instrument(level = "debug", skip(transport, backoff, params))]
pub(crate) fn execute<T: Transport + ?Sized>(
    transport: &mut T,
    endpoint: &str,
    backoff: &Backoff,
    method: Method,
    command: &str,
    params: &RequestParams,
    attempts: u32,
) -> SpfeResult<ResponseEnvelope> {
    let attempts = attempts.max(1);
    let request = codec::encode_request(endpoint, method, command, params);

    let mut attempt = 1;
    loop {
        debug!(command, attempt, "Sending SPFE request");
        match transport.send(&request) {
            Ok(body) => return codec::decode_envelope(&body),
            Err(source) if attempt >= attempts => {
                return Err(SpfeError::Transport { attempts, source });
            }
            Err(error) => {
                warn!(command, attempt, attempts, %error, "SPFE transport failure, retrying");
                let delay = backoff.delay_for_retry(attempt - 1);
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                attempt += 1;
            }
        }
    }
}

/// Factory for new connections, used by the pool to grow.
pub trait Connect: Send + Sync {
    /// Transport of the connections produced.
    type Transport: Transport;

    /// Open a new connection.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Config`] when the connection cannot be set up.
    fn connect(&self) -> SpfeResult<Connection<Self::Transport>>;
}

impl Connect for TransportConfig {
    type Transport = HttpsTransport;

    fn connect(&self) -> SpfeResult<Connection> {
        Connection::connect(self)
    }
}
