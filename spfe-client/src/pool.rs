//! Growable pool of exclusive connections.
//!
//! Callers never queue for a busy connection: when every pooled connection
//! is in use, a new one is opened and appended. Latency stays bounded under
//! load while the connection count follows peak concurrency; callers needing
//! a hard cap must add their own admission control.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::codec::{Method, ResponseEnvelope};
use crate::config::TransportConfig;
use crate::connection::{self, ClaimGuard, Connect, Connection};
use crate::error::SpfeResult;
use crate::params::RequestParams;
use crate::retry::Backoff;
use crate::transport::Transport;

/// Connections opened when a pool is created unless configured.
pub const DEFAULT_POOL_SIZE: usize = 2;

/// Append-only set of connections sharing one configuration.
///
/// Positions are stable: a connection keeps its index for the lifetime of the
/// pool, and the pool never shrinks.
pub struct ConnectionPool<C: Connect = TransportConfig> {
    connector: C,
    connections: RwLock<Vec<Connection<C::Transport>>>,
    initial_size: usize,
}

impl<C: Connect> fmt::Debug for ConnectionPool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("size", &self.size())
            .field("initial_size", &self.initial_size)
            .finish_non_exhaustive()
    }
}

impl<C: Connect> ConnectionPool<C> {
    /// Create a pool and open `initial_size` connections (at least one).
    ///
    /// # Errors
    ///
    /// Returns the first error raised while opening the initial connections.
    pub fn new(connector: C, initial_size: usize) -> SpfeResult<Self> {
        let initial_size = initial_size.max(1);
        let connections = (0..initial_size)
            .map(|_| connector.connect())
            .collect::<SpfeResult<Vec<_>>>()?;

        debug!(size = initial_size, "SPFE connection pool created");
        Ok(Self {
            connector,
            connections: RwLock::new(connections),
            initial_size,
        })
    }

    /// Claim a free connection, growing the pool when all are busy.
    ///
    /// The connection is released when the returned handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns the connector's error when a new connection cannot be opened.
    pub fn acquire(&self) -> SpfeResult<PooledConnection<C::Transport>> {
        {
            let connections = self.connections.read();
            for (index, connection) in connections.iter().enumerate() {
                if let Some(guard) = connection.try_claim() {
                    return Ok(PooledConnection::new(index, connection, guard));
                }
            }
        }

        let connection = self.connector.connect()?;
        let guard = connection.claim();
        let index = {
            let mut connections = self.connections.write();
            connections.push(connection.clone());
            connections.len() - 1
        };
        debug!(size = index + 1, "SPFE connection pool grown");
        Ok(PooledConnection::new(index, &connection, guard))
    }

    /// Run one request on a claimed connection, releasing it afterwards.
    ///
    /// # Errors
    ///
    /// Propagates acquisition and request errors unchanged.
    pub fn request(
        &self,
        method: Method,
        command: &str,
        params: &RequestParams,
        attempts: u32,
    ) -> SpfeResult<ResponseEnvelope> {
        let mut connection = self.acquire()?;
        connection.request(method, command, params, attempts)
    }

    /// Number of connections currently in the pool.
    #[must_use]
    pub fn size(&self) -> usize {
        self.connections.read().len()
    }

    /// Number of connections opened at construction.
    #[must_use]
    pub const fn initial_size(&self) -> usize {
        self.initial_size
    }

    /// Factory used to grow the pool.
    #[must_use]
    pub const fn connector(&self) -> &C {
        &self.connector
    }
}

/// Exclusive handle to one pooled connection.
pub struct PooledConnection<T: Transport> {
    index: usize,
    endpoint: Arc<str>,
    backoff: Backoff,
    transport: ClaimGuard<T>,
}

impl<T: Transport> fmt::Debug for PooledConnection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("index", &self.index)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> PooledConnection<T> {
    fn new(index: usize, connection: &Connection<T>, transport: ClaimGuard<T>) -> Self {
        Self {
            index,
            endpoint: connection.shared_endpoint(),
            backoff: connection.backoff().clone(),
            transport,
        }
    }

    /// Stable position of this connection in the pool.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Execute one request on this connection.
    ///
    /// # Errors
    ///
    /// Same as [`Connection::request`].
    pub fn request(
        &mut self,
        method: Method,
        command: &str,
        params: &RequestParams,
        attempts: u32,
    ) -> SpfeResult<ResponseEnvelope> {
        connection::execute(
            &mut *self.transport,
            &self.endpoint,
            &self.backoff,
            method,
            command,
            params,
            attempts,
        )
    }

    /// Return the connection to the pool. Equivalent to dropping the handle.
    #[allow(clippy::needless_pass_by_value)]
    pub fn release(self) {}
}
