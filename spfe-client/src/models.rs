//! Result types returned by [`SpfeClient`](crate::SpfeClient).

use std::time::Duration;

use secrecy::SecretSlice;

/// Authentication ticket issued by the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    /// Opaque ticket, `service-name:token`
    pub ticket: String,
    /// Remaining lifetime
    pub ttl: Duration,
}

/// Persistent user identifier obtained by redeeming a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puid {
    /// Identifier, stable across sessions for one user and provider
    pub puid: String,
}

/// Contents of a data container or provider record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredData {
    /// Stored bytes; `None` when nothing was ever written
    pub data: Option<Vec<u8>>,
}

impl StoredData {
    /// Borrow the stored bytes.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Take the stored bytes.
    #[must_use]
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        self.data
    }
}

/// Provider-scoped record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pfid {
    /// Raw identifier as issued by the service
    pub pfid: Vec<u8>,
}

impl AsRef<[u8]> for Pfid {
    fn as_ref(&self) -> &[u8] {
        &self.pfid
    }
}

/// Session key bound to a ticket.
#[derive(Debug)]
pub struct SessionKey {
    /// Key bytes
    pub session_key: SecretSlice<u8>,
}

/// Client key issued for a ticket.
#[derive(Debug)]
pub struct ClientKey {
    /// Key bytes
    pub client_key: SecretSlice<u8>,
    /// Remaining lifetime
    pub ttl: Duration,
    /// Ticket the key was first issued for, when the service reports it
    pub original_ticket: Option<String>,
}
