//! Test fixtures: pickled response envelopes and client identities.

use serde_pickle::{HashableValue, SerOptions, Value};

/// Response envelope as the service would pickle it.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    entries: Vec<(String, Value)>,
}

impl Envelope {
    /// `result = true` with byte-string data.
    #[must_use]
    pub fn success(data: impl Into<Vec<u8>>) -> Self {
        Self::with_result(true, Value::Bytes(data.into()))
    }

    /// `result = true` with `data = None`.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_result(true, Value::None)
    }

    /// `result = false` with a text message.
    #[must_use]
    pub fn failure(message: &str) -> Self {
        Self::with_result(false, Value::String(message.to_string()))
    }

    fn with_result(result: bool, data: Value) -> Self {
        Self {
            entries: vec![
                ("result".to_string(), Value::Bool(result)),
                ("data".to_string(), data),
            ],
        }
    }

    /// Add a `ttl` field in seconds.
    #[must_use]
    pub fn ttl(self, secs: i64) -> Self {
        self.field("ttl", Value::I64(secs))
    }

    /// Add an error `code` field.
    #[must_use]
    pub fn code(self, code: &str) -> Self {
        self.field("code", Value::String(code.to_string()))
    }

    /// Add an arbitrary field.
    #[must_use]
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.entries.push((key.to_string(), value));
        self
    }

    /// Pickled body.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let dict = self
            .entries
            .iter()
            .map(|(key, value)| (HashableValue::String(key.clone()), value.clone()))
            .collect();
        serde_pickle::value_to_vec(&Value::Dict(dict), SerOptions::new())
            .expect("envelope values are always picklable")
    }
}

/// Self-signed client key and certificate in PEM form.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    /// PKCS#8 private key
    pub key_pem: String,
    /// X.509 certificate
    pub cert_pem: String,
}

impl ClientIdentity {
    /// Generate a fresh identity for `provider.test`.
    #[must_use]
    pub fn generate() -> Self {
        let certified = rcgen::generate_simple_self_signed(vec!["provider.test".to_string()])
            .expect("self-signed certificate generation");
        Self {
            key_pem: certified.key_pair.serialize_pem(),
            cert_pem: certified.cert.pem(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_pickle::DeOptions;

    #[test]
    fn test_envelope_pickles_to_mapping() {
        let body = Envelope::failure("bad ticket").code("4").to_bytes();
        let value = serde_pickle::value_from_slice(&body, DeOptions::new()).unwrap();

        let Value::Dict(dict) = value else {
            panic!("expected a mapping");
        };
        assert_eq!(
            dict.get(&HashableValue::String("code".to_string())),
            Some(&Value::String("4".to_string()))
        );
        assert_eq!(
            dict.get(&HashableValue::String("result".to_string())),
            Some(&Value::Bool(false))
        );
    }

    #[test]
    fn test_identity_is_pem() {
        let identity = ClientIdentity::generate();
        assert!(identity.key_pem.contains("PRIVATE KEY"));
        assert!(identity.cert_pem.starts_with("-----BEGIN CERTIFICATE-----"));
    }
}
