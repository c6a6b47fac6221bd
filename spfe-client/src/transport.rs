//! HTTPS transport with mutual TLS.
//!
//! The client certificate is the only credential: there is no token or API
//! key layer on top of it.

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::tls::Version;
use reqwest::{Certificate, Identity};
use secrecy::ExposeSecret;
use zeroize::Zeroizing;

use crate::codec::{EncodedRequest, Method};
use crate::config::TransportConfig;
use crate::error::{SpfeError, SpfeResult, TransportError};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// One request/response exchange with the service.
///
/// A transport is owned by exactly one connection and is only ever driven by
/// one caller at a time.
pub trait Transport: Send {
    /// Send `request` and return the raw response body.
    ///
    /// Any failure returned here is treated as transient and may be retried.
    fn send(&mut self, request: &EncodedRequest) -> Result<Vec<u8>, TransportError>;
}

/// Production transport over a blocking reqwest client with rustls.
#[derive(Debug, Clone)]
pub struct HttpsTransport {
    http: Client,
}

impl HttpsTransport {
    /// Build the TLS context described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Config`] when the key, certificate or trust
    /// anchors cannot be loaded.
    pub fn new(config: &TransportConfig) -> SpfeResult<Self> {
        let mut identity_pem = Zeroizing::new(Vec::with_capacity(
            config.key_pem().expose_secret().len() + config.cert_pem().len() + 1,
        ));
        identity_pem.extend_from_slice(config.key_pem().expose_secret());
        identity_pem.push(b'\n');
        identity_pem.extend_from_slice(config.cert_pem());

        let identity = Identity::from_pem(&identity_pem)
            .map_err(|e| SpfeError::config(format!("invalid client key or certificate: {e}")))?;

        let anchors = Certificate::from_pem_bundle(config.trust_anchors())
            .map_err(|e| SpfeError::config(format!("invalid trust anchors: {e}")))?;
        if anchors.is_empty() {
            return Err(SpfeError::config("trust anchor bundle contains no certificates"));
        }

        let mut builder = Client::builder()
            .use_rustls_tls()
            .tls_built_in_root_certs(false)
            .min_tls_version(Version::TLS_1_2)
            .identity(identity)
            .timeout(config.timeout())
            .pool_max_idle_per_host(1);
        for anchor in anchors {
            builder = builder.add_root_certificate(anchor);
        }

        let http = builder
            .build()
            .map_err(|e| SpfeError::config(format!("cannot build TLS client: {e}")))?;
        Ok(Self { http })
    }
}

impl Transport for HttpsTransport {
    fn send(&mut self, request: &EncodedRequest) -> Result<Vec<u8>, TransportError> {
        let builder = match request.method {
            Method::Get => self.http.get(&request.url),
            Method::Post => self
                .http
                .post(&request.url)
                .header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
                .body(request.body.clone().unwrap_or_default()),
        };

        let response = builder.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        Ok(response.bytes()?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::ClientIdentity;

    fn identity_config() -> TransportConfig {
        let identity = ClientIdentity::generate();
        TransportConfig::new(identity.key_pem, identity.cert_pem)
    }

    #[test]
    fn test_builds_with_embedded_root() {
        assert!(HttpsTransport::new(&identity_config()).is_ok());
    }

    #[test]
    fn test_garbage_trust_anchors_are_config_errors() {
        for anchors in [b"garbage".as_slice(), b"".as_slice()] {
            let config = identity_config().with_trust_anchors(anchors);
            assert!(matches!(
                HttpsTransport::new(&config),
                Err(SpfeError::Config(_))
            ));
        }
    }

    #[test]
    fn test_invalid_identity_is_config_error() {
        let config = TransportConfig::new("not a key", "not a cert");
        assert!(matches!(
            HttpsTransport::new(&config),
            Err(SpfeError::Config(_))
        ));
    }
}
