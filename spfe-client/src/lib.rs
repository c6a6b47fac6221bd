//! Client library for the WWPass SPFE ticket and data service.
//!
//! This crate provides:
//! - Mutually authenticated HTTPS transport (client certificate only)
//! - Form-encoded requests with empty values omitted
//! - Pickled response envelope decoding
//! - Bounded retry on transport failures, immediate by default
//! - A growable connection pool with RAII release
//! - Typed ticket, keyed data and provider record operations
//!
//! ```no_run
//! use spfe_client::{AuthTypes, SpfeClient, TransportConfig};
//!
//! # fn main() -> spfe_client::SpfeResult<()> {
//! let config = TransportConfig::from_files("provider.key", "provider.crt")?;
//! let client = SpfeClient::pooled(config, 2)?;
//! let name = client.get_service_name()?;
//! let puid = client.redeem_identifier("ticket-from-browser", &AuthTypes::none(), true)?;
//! # let _ = (name, puid);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod models;
pub mod params;
pub mod pool;
pub mod retry;
pub mod transport;

pub use client::{Requester, SpfeClient};
pub use codec::{EncodedRequest, Method, ResponseEnvelope, decode_envelope, encode_request};
pub use config::{ClientConfig, DEFAULT_SERVICE_ADDRESS, DEFAULT_TIMEOUT, TransportConfig};
pub use connection::{Connect, Connection};
pub use error::{SpfeError, SpfeResult, TransportError};
pub use models::{ClientKey, Pfid, Puid, SessionKey, StoredData, Ticket};
pub use params::{AuthType, AuthTypes, ParamValue, RequestParams, VALID_AUTH_TYPES};
pub use pool::{ConnectionPool, DEFAULT_POOL_SIZE, PooledConnection};
pub use retry::{Backoff, DEFAULT_ATTEMPTS};
pub use transport::{HttpsTransport, Transport};
