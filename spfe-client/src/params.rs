//! Request parameters and authentication-type selection.
//!
//! A parameter set is an ordered list of `(key, value)` pairs. Values the
//! service treats as "not given" (empty strings, empty byte strings, zero,
//! unset flags) are dropped at insertion, so they never reach the wire.

use std::borrow::Cow;
use std::time::Duration;

use url::form_urlencoded::byte_serialize;

/// Characters accepted in an `auth_type` parameter.
pub const VALID_AUTH_TYPES: &str = "psc";

/// Wire key carrying the requested authentication factors.
pub const AUTH_TYPE_KEY: &str = "auth_type";

/// Authentication factor the service may require for a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthType {
    /// Access code / password
    Password,
    /// Session key
    SessionKey,
    /// Client key
    ClientKey,
}

impl AuthType {
    /// Single-character wire code.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Password => 'p',
            Self::SessionKey => 's',
            Self::ClientKey => 'c',
        }
    }

    /// Parse a wire code, rejecting anything outside [`VALID_AUTH_TYPES`].
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'p' => Some(Self::Password),
            's' => Some(Self::SessionKey),
            'c' => Some(Self::ClientKey),
            _ => None,
        }
    }
}

/// Filtered authentication-type selection.
///
/// Built from free-form input by keeping valid characters in input order.
/// Duplicates are kept; invalid characters are dropped silently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthTypes(String);

impl AuthTypes {
    /// No additional factors.
    #[must_use]
    pub const fn none() -> Self {
        Self(String::new())
    }

    /// Keep only the characters of `input` that name a valid factor.
    #[must_use]
    pub fn filter(input: &str) -> Self {
        Self(
            input
                .chars()
                .filter(|&c| AuthType::from_char(c).is_some())
                .collect(),
        )
    }

    /// Wire form, e.g. `"ps"`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no factor is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selected factors in order.
    pub fn iter(&self) -> impl Iterator<Item = AuthType> + '_ {
        self.0.chars().filter_map(AuthType::from_char)
    }
}

impl From<&str> for AuthTypes {
    fn from(input: &str) -> Self {
        Self::filter(input)
    }
}

impl FromIterator<AuthType> for AuthTypes {
    fn from_iter<I: IntoIterator<Item = AuthType>>(iter: I) -> Self {
        Self(iter.into_iter().map(AuthType::as_char).collect())
    }
}

/// Scalar parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// UTF-8 text
    Text(String),
    /// Raw bytes
    Bytes(Vec<u8>),
    /// Unsigned integer, such as a TTL in seconds
    Int(u64),
    /// Presence-only marker, encoded as `1`
    Flag,
}

impl ParamValue {
    /// Whether the service would treat this value as absent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.is_empty(),
            Self::Bytes(bytes) => bytes.is_empty(),
            Self::Int(value) => *value == 0,
            Self::Flag => false,
        }
    }

    fn wire_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            Self::Text(text) => Cow::Borrowed(text.as_bytes()),
            Self::Bytes(bytes) => Cow::Borrowed(bytes),
            Self::Int(value) => Cow::Owned(value.to_string().into_bytes()),
            Self::Flag => Cow::Borrowed(b"1"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&[u8]> for ParamValue {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        Self::Int(u64::from(value))
    }
}

/// Durations travel as whole seconds.
impl From<Duration> for ParamValue {
    fn from(value: Duration) -> Self {
        Self::Int(value.as_secs())
    }
}

/// Ordered request parameters with empty values omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    entries: Vec<(&'static str, ParamValue)>,
}

impl RequestParams {
    /// Empty parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add `key = value`, skipping empty values.
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Add `key = value` when a value is present.
    #[must_use]
    pub fn with_opt<V: Into<ParamValue>>(self, key: &'static str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self.without(key),
        }
    }

    /// Add a presence-only marker when `set` is true.
    #[must_use]
    pub fn flag(self, key: &'static str, set: bool) -> Self {
        if set {
            self.with(key, ParamValue::Flag)
        } else {
            self.without(key)
        }
    }

    /// Add the filtered `auth_type` selection.
    #[must_use]
    pub fn auth_types(self, auth_types: &AuthTypes) -> Self {
        self.with(AUTH_TYPE_KEY, auth_types.as_str())
    }

    /// Insert or replace `key`. An empty value removes the key instead.
    pub fn insert(&mut self, key: &'static str, value: impl Into<ParamValue>) {
        let value = value.into();
        if value.is_empty() {
            self.remove(key);
            return;
        }
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Remove `key` if present.
    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(existing, _)| *existing != key);
    }

    #[must_use]
    fn without(mut self, key: &str) -> Self {
        self.remove(key);
        self
    }

    /// Value stored for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries
            .iter()
            .find(|(existing, _)| *existing == key)
            .map(|(_, value)| value)
    }

    /// Whether `key` will be sent.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in wire order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(key, _)| *key)
    }

    /// Number of parameters that will be sent.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing will be sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `application/x-www-form-urlencoded` rendering in insertion order.
    #[must_use]
    pub fn to_form(&self) -> String {
        let mut form = String::new();
        for (key, value) in &self.entries {
            if !form.is_empty() {
                form.push('&');
            }
            form.extend(byte_serialize(key.as_bytes()));
            form.push('=');
            form.extend(byte_serialize(&value.wire_bytes()));
        }
        form
    }
}
