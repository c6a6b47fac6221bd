//! Transport and client configuration.

use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use secrecy::SecretSlice;
use url::Url;

use crate::error::{SpfeError, SpfeResult};
use crate::pool::DEFAULT_POOL_SIZE;
use crate::retry::{Backoff, DEFAULT_ATTEMPTS};

/// Production service address.
pub const DEFAULT_SERVICE_ADDRESS: &str = "spfe.wwpass.com";

/// Per-request timeout used unless configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// WWPass Corporation Primary Root CA, trusted when no CA bundle is given.
pub const DEFAULT_TRUST_ANCHORS: &[u8] = include_bytes!("../certs/wwpass-root-ca.pem");

/// TLS material and service location shared by every connection.
pub struct TransportConfig {
    key_pem: SecretSlice<u8>,
    cert_pem: Vec<u8>,
    trust_anchors: Option<Vec<u8>>,
    service_address: String,
    timeout: Duration,
    backoff: Backoff,
}

// Key material stays out of debug output.
impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportConfig")
            .field("key_pem", &"[REDACTED]")
            .field("service_address", &self.service_address)
            .field("custom_trust_anchors", &self.trust_anchors.is_some())
            .field("timeout", &self.timeout)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl TransportConfig {
    /// Create a configuration from PEM-encoded client key and certificate.
    #[must_use]
    pub fn new(key_pem: impl Into<Vec<u8>>, cert_pem: impl Into<Vec<u8>>) -> Self {
        Self {
            key_pem: SecretSlice::from(key_pem.into()),
            cert_pem: cert_pem.into(),
            trust_anchors: None,
            service_address: DEFAULT_SERVICE_ADDRESS.to_string(),
            timeout: DEFAULT_TIMEOUT,
            backoff: Backoff::default(),
        }
    }

    /// Load the client key and certificate from PEM files.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Config`] when either file cannot be read.
    pub fn from_files(key_path: impl AsRef<Path>, cert_path: impl AsRef<Path>) -> SpfeResult<Self> {
        let key_pem = read_pem("client key", key_path.as_ref())?;
        let cert_pem = read_pem("client certificate", cert_path.as_ref())?;
        Ok(Self::new(key_pem, cert_pem))
    }

    /// Set the service address. A bare host implies `https://`.
    #[must_use]
    pub fn with_service_address(mut self, address: impl Into<String>) -> Self {
        self.service_address = address.into();
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Trust only the certificates in `pem` instead of the embedded root.
    #[must_use]
    pub fn with_trust_anchors(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.trust_anchors = Some(pem.into());
        self
    }

    /// Load trust anchors from a CA bundle file.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Config`] when the file cannot be read.
    pub fn with_ca_file(self, path: impl AsRef<Path>) -> SpfeResult<Self> {
        let pem = read_pem("CA bundle", path.as_ref())?;
        Ok(self.with_trust_anchors(pem))
    }

    /// Set the delay schedule between transport retries.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Client private key (PEM).
    #[must_use]
    pub const fn key_pem(&self) -> &SecretSlice<u8> {
        &self.key_pem
    }

    /// Client certificate chain (PEM).
    #[must_use]
    pub fn cert_pem(&self) -> &[u8] {
        &self.cert_pem
    }

    /// Trust anchors in effect, falling back to [`DEFAULT_TRUST_ANCHORS`].
    #[must_use]
    pub fn trust_anchors(&self) -> &[u8] {
        self.trust_anchors.as_deref().unwrap_or(DEFAULT_TRUST_ANCHORS)
    }

    /// Service address as configured.
    #[must_use]
    pub fn service_address(&self) -> &str {
        &self.service_address
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retry delay schedule.
    #[must_use]
    pub const fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Normalized base URL of the service.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Config`] when the address is empty or not a URL.
    pub fn endpoint(&self) -> SpfeResult<String> {
        normalize_address(&self.service_address)
    }
}

/// Resolve a service address to a base URL without a trailing slash.
///
/// Addresses without a scheme are served over `https://`; an explicit
/// scheme is kept as given.
///
/// # Errors
///
/// Returns [`SpfeError::Config`] when the address is empty or not a URL.
pub fn normalize_address(address: &str) -> SpfeResult<String> {
    let address = address.trim();
    if address.is_empty() {
        return Err(SpfeError::config("service address is empty"));
    }

    let candidate = if address.contains("://") {
        address.to_string()
    } else {
        format!("https://{address}")
    };
    let url = Url::parse(&candidate)
        .map_err(|e| SpfeError::config(format!("invalid service address {address:?}: {e}")))?;
    if url.host_str().is_none() {
        return Err(SpfeError::config(format!(
            "service address {address:?} has no host"
        )));
    }

    Ok(candidate.trim_end_matches('/').to_string())
}

fn read_pem(label: &str, path: &Path) -> SpfeResult<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| SpfeError::config(format!("cannot read {label} {}: {e}", path.display())))
}

/// Complete client configuration, typically loaded from the environment.
#[derive(Debug)]
pub struct ClientConfig {
    /// TLS material and service location
    pub transport: TransportConfig,
    /// Attempts per request (at least 1)
    pub attempts: u32,
    /// Connections opened when the pool is created (at least 1)
    pub pool_size: usize,
}

impl ClientConfig {
    /// Wrap a transport configuration with default attempts and pool size.
    #[must_use]
    pub const fn new(transport: TransportConfig) -> Self {
        Self {
            transport,
            attempts: DEFAULT_ATTEMPTS,
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    /// Loads configuration from `SPFE_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Config`] when a required variable is missing, a
    /// value cannot be parsed, or a referenced file cannot be read.
    pub fn from_env() -> SpfeResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> SpfeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key_file = required(&lookup, "SPFE_KEY_FILE")?;
        let cert_file = required(&lookup, "SPFE_CERT_FILE")?;

        let mut transport = TransportConfig::from_files(key_file, cert_file)?
            .with_timeout(Duration::from_secs(parse_var(
                &lookup,
                "SPFE_TIMEOUT_SECS",
                DEFAULT_TIMEOUT.as_secs(),
            )?));
        if let Some(address) = lookup("SPFE_ADDRESS") {
            transport = transport.with_service_address(address);
        }
        if let Some(ca_file) = lookup("SPFE_CA_FILE") {
            transport = transport.with_ca_file(ca_file)?;
        }

        let config = Self {
            transport,
            attempts: parse_var(&lookup, "SPFE_ATTEMPTS", DEFAULT_ATTEMPTS)?,
            pool_size: parse_var(&lookup, "SPFE_POOL_SIZE", DEFAULT_POOL_SIZE)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Config`] for zero attempts, an empty pool, a
    /// zero timeout or an unusable service address.
    pub fn validate(&self) -> SpfeResult<()> {
        if self.attempts == 0 {
            return Err(SpfeError::config("attempts must be at least 1"));
        }
        if self.pool_size == 0 {
            return Err(SpfeError::config("pool size must be at least 1"));
        }
        if self.transport.timeout().is_zero() {
            return Err(SpfeError::config("timeout must be greater than 0"));
        }
        self.transport.endpoint().map(|_| ())
    }
}

fn required<F>(lookup: &F, name: &str) -> SpfeResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).ok_or_else(|| SpfeError::config(format!("missing required variable {name}")))
}

/// Parse a variable with a default value.
fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> SpfeResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| SpfeError::config(format!("failed to parse {name}: {e}"))),
        None => Ok(default),
    }
}
