//! Request encoding and response envelope decoding.
//!
//! Requests are plain form-encoded HTTP. Responses are a pickled mapping
//! with a mandatory boolean `result` and a mandatory `data` field; any other
//! keys (`ttl`, `originalTicket`, `code`) are command specific.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde_pickle::{DeOptions, HashableValue, Value};

use crate::error::{SpfeError, SpfeResult};
use crate::params::RequestParams;

/// HTTP method used for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Parameters travel in the query string
    Get,
    /// Parameters travel as a form body
    Post,
}

impl Method {
    /// Upper-case method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully encoded request, ready for a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL, including the query string for GET
    pub url: String,
    /// Form body for POST
    pub body: Option<Vec<u8>>,
}

/// Build the request for `command` against `endpoint`.
///
/// `endpoint` must already be normalized (scheme present, no trailing `/`).
#[must_use]
pub fn encode_request(
    endpoint: &str,
    method: Method,
    command: &str,
    params: &RequestParams,
) -> EncodedRequest {
    let form = params.to_form();
    let mut url = format!("{endpoint}/{command}");
    let body = match method {
        Method::Get => {
            if !form.is_empty() {
                url.push('?');
                url.push_str(&form);
            }
            None
        }
        Method::Post => Some(form.into_bytes()),
    };
    EncodedRequest { method, url, body }
}

/// Successful response envelope (`result = true`).
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    data: Value,
    fields: BTreeMap<String, Value>,
}

impl ResponseEnvelope {
    /// Build an envelope from its parts.
    #[must_use]
    pub const fn new(data: Value, fields: BTreeMap<String, Value>) -> Self {
        Self { data, fields }
    }

    /// Raw `data` payload.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Command-specific field other than `result` and `data`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// `data` as bytes; `None` when the service sent no value.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Protocol`] when `data` is not a string or bytes.
    pub fn data_bytes(&self) -> SpfeResult<Option<Vec<u8>>> {
        match &self.data {
            Value::None => Ok(None),
            other => value_bytes(other)
                .map(Some)
                .ok_or_else(|| unexpected("data", other)),
        }
    }

    /// `data` as bytes, required to be present.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Protocol`] when `data` is absent or not bytes.
    pub fn required_data_bytes(&self) -> SpfeResult<Vec<u8>> {
        self.data_bytes()?
            .ok_or_else(|| SpfeError::protocol("`data` is empty"))
    }

    /// `data` as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Protocol`] when `data` is absent or is not valid
    /// UTF-8 text.
    pub fn data_text(&self) -> SpfeResult<String> {
        value_text(&self.data).ok_or_else(|| unexpected("data", &self.data))
    }

    /// `ttl` field in whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Protocol`] when `ttl` is missing or negative.
    pub fn ttl(&self) -> SpfeResult<Duration> {
        match self.field("ttl") {
            Some(Value::I64(secs)) => u64::try_from(*secs)
                .map(Duration::from_secs)
                .map_err(|_| SpfeError::protocol(format!("negative `ttl`: {secs}"))),
            Some(other) => Err(unexpected("ttl", other)),
            None => Err(SpfeError::protocol("missing `ttl` field")),
        }
    }

    /// Optional text field.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Protocol`] when the field is present but not text.
    pub fn text_field(&self, name: &str) -> SpfeResult<Option<String>> {
        match self.field(name) {
            None | Some(Value::None) => Ok(None),
            Some(value) => value_text(value)
                .map(Some)
                .ok_or_else(|| unexpected(name, value)),
        }
    }
}

/// Decode a response body into an envelope.
///
/// # Errors
///
/// A `result = false` envelope becomes [`SpfeError::Service`]; anything that
/// is not a well-formed envelope becomes [`SpfeError::Protocol`].
pub fn decode_envelope(body: &[u8]) -> SpfeResult<ResponseEnvelope> {
    let value = serde_pickle::value_from_slice(body, DeOptions::new())
        .map_err(|e| SpfeError::protocol(format!("undecodable response body: {e}")))?;

    let Value::Dict(entries) = value else {
        return Err(SpfeError::protocol("response is not a mapping"));
    };

    let mut fields = BTreeMap::new();
    for (key, value) in entries {
        let name = match key {
            HashableValue::String(name) => name,
            HashableValue::Bytes(raw) => String::from_utf8(raw)
                .map_err(|_| SpfeError::protocol("response key is not UTF-8"))?,
            other => {
                return Err(SpfeError::protocol(format!(
                    "unexpected response key: {other:?}"
                )));
            }
        };
        fields.insert(name, value);
    }

    let result = match fields.remove("result") {
        Some(Value::Bool(result)) => result,
        Some(other) => return Err(unexpected("result", &other)),
        None => return Err(SpfeError::protocol("missing `result` field")),
    };
    let data = fields
        .remove("data")
        .ok_or_else(|| SpfeError::protocol("missing `data` field"))?;

    if !result {
        let code = fields.remove("code").map(|code| display_value(&code));
        return Err(SpfeError::service(code, display_value(&data)));
    }

    Ok(ResponseEnvelope::new(data, fields))
}

fn value_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::Bytes(bytes) => Some(bytes.clone()),
        Value::String(text) => Some(text.as_bytes().to_vec()),
        _ => None,
    }
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Bytes(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Value::I64(number) => number.to_string(),
        Value::None => String::new(),
        other => format!("{other:?}"),
    }
}

fn unexpected(field: &str, value: &Value) -> SpfeError {
    SpfeError::protocol(format!("unexpected `{field}` value: {value:?}"))
}
