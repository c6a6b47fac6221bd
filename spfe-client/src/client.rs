//! Typed ticket and data operations.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretSlice;

use crate::codec::{Method, ResponseEnvelope};
use crate::config::{ClientConfig, TransportConfig};
use crate::connection::{Connect, Connection};
use crate::error::{SpfeError, SpfeResult};
use crate::models::{ClientKey, Pfid, Puid, SessionKey, StoredData, Ticket};
use crate::params::{AuthTypes, RequestParams};
use crate::pool::ConnectionPool;
use crate::retry::DEFAULT_ATTEMPTS;
use crate::transport::Transport;

/// Anything able to execute one SPFE request.
pub trait Requester {
    /// Execute `command` with up to `attempts` tries.
    ///
    /// # Errors
    ///
    /// Transport, service and protocol errors as produced by the connection.
    fn request(
        &self,
        method: Method,
        command: &str,
        params: &RequestParams,
        attempts: u32,
    ) -> SpfeResult<ResponseEnvelope>;
}

impl<T: Transport> Requester for Connection<T> {
    fn request(
        &self,
        method: Method,
        command: &str,
        params: &RequestParams,
        attempts: u32,
    ) -> SpfeResult<ResponseEnvelope> {
        Connection::request(self, method, command, params, attempts)
    }
}

impl<C: Connect> Requester for ConnectionPool<C> {
    fn request(
        &self,
        method: Method,
        command: &str,
        params: &RequestParams,
        attempts: u32,
    ) -> SpfeResult<ResponseEnvelope> {
        ConnectionPool::request(self, method, command, params, attempts)
    }
}

impl<R: Requester + ?Sized> Requester for Arc<R> {
    fn request(
        &self,
        method: Method,
        command: &str,
        params: &RequestParams,
        attempts: u32,
    ) -> SpfeResult<ResponseEnvelope> {
        (**self).request(method, command, params, attempts)
    }
}

/// SPFE client.
///
/// Generic over the [`Requester`], so the same operations run on a single
/// [`Connection`] or on a [`ConnectionPool`]. The pooled client is
/// `Send + Sync` and meant to be shared by reference or through an `Arc`.
#[derive(Debug)]
pub struct SpfeClient<R = ConnectionPool> {
    requester: R,
    attempts: u32,
}

impl SpfeClient<Connection> {
    /// Client over one connection. Concurrent callers are serialized.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Config`] on invalid TLS material or address.
    pub fn connect(config: &TransportConfig) -> SpfeResult<Self> {
        Connection::connect(config).map(Self::new)
    }
}

impl SpfeClient<ConnectionPool> {
    /// Client over a pool opening `initial_size` connections up front.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Config`] on invalid TLS material or address.
    pub fn pooled(config: TransportConfig, initial_size: usize) -> SpfeResult<Self> {
        ConnectionPool::new(config, initial_size).map(Self::new)
    }

    /// Pooled client built from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Config`] when the configuration is invalid.
    pub fn from_config(config: ClientConfig) -> SpfeResult<Self> {
        config.validate()?;
        let ClientConfig {
            transport,
            attempts,
            pool_size,
        } = config;
        Ok(Self::pooled(transport, pool_size)?.with_attempts(attempts))
    }

    /// Pooled client configured from `SPFE_*` environment variables.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_env() -> SpfeResult<Self> {
        Self::from_config(ClientConfig::from_env()?)
    }
}

impl<R: Requester> SpfeClient<R> {
    /// Wrap a requester with the default attempt count.
    #[must_use]
    pub const fn new(requester: R) -> Self {
        Self {
            requester,
            attempts: DEFAULT_ATTEMPTS,
        }
    }

    /// Set the number of tries per request (at least 1).
    #[must_use]
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Tries per request.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Underlying requester.
    #[must_use]
    pub const fn requester(&self) -> &R {
        &self.requester
    }

    fn call(
        &self,
        method: Method,
        command: &str,
        params: &RequestParams,
    ) -> SpfeResult<ResponseEnvelope> {
        self.requester
            .request(method, command, params, self.attempts)
    }

    /// Service provider name, taken from the prefix of a fresh ticket.
    ///
    /// # Errors
    ///
    /// Returns [`SpfeError::Protocol`] when the ticket has no `:` separator.
    pub fn get_service_name(&self) -> SpfeResult<String> {
        let Ticket { ticket, .. } = self.get_ticket(Duration::ZERO, &AuthTypes::none())?;
        ticket
            .split_once(':')
            .map(|(name, _)| name.to_string())
            .ok_or_else(|| {
                SpfeError::protocol("cannot extract service provider name from ticket")
            })
    }

    /// Issue a new ticket.
    ///
    /// A zero `ttl` leaves the lifetime to the service.
    ///
    /// # Errors
    ///
    /// Propagates request errors; [`SpfeError::Protocol`] when `ttl` is missing.
    pub fn get_ticket(&self, ttl: Duration, auth_types: &AuthTypes) -> SpfeResult<Ticket> {
        let params = RequestParams::new()
            .with("ttl", ttl)
            .auth_types(auth_types);
        let envelope = self.call(Method::Get, "get", &params)?;
        into_ticket(&envelope)
    }

    /// Redeem `ticket` for the user's persistent identifier.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn redeem_identifier(
        &self,
        ticket: &str,
        auth_types: &AuthTypes,
        finalize: bool,
    ) -> SpfeResult<Puid> {
        let params = RequestParams::new()
            .with("ticket", ticket)
            .flag("finalize", finalize)
            .auth_types(auth_types);
        let envelope = self.call(Method::Get, "puid", &params)?;
        Ok(Puid {
            puid: envelope.data_text()?,
        })
    }

    /// Exchange `ticket` for a new one with its own lifetime.
    ///
    /// # Errors
    ///
    /// Propagates request errors; [`SpfeError::Protocol`] when `ttl` is missing.
    pub fn put_ticket(
        &self,
        ticket: &str,
        ttl: Duration,
        auth_types: &AuthTypes,
        finalize: bool,
    ) -> SpfeResult<Ticket> {
        let params = RequestParams::new()
            .with("ticket", ticket)
            .with("ttl", ttl)
            .flag("finalize", finalize)
            .auth_types(auth_types);
        let envelope = self.call(Method::Get, "put", &params)?;
        into_ticket(&envelope)
    }

    /// Read a data container. `None` or an empty name selects the default.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn read_data(
        &self,
        ticket: &str,
        container: Option<&str>,
        finalize: bool,
    ) -> SpfeResult<StoredData> {
        let params = RequestParams::new()
            .with("ticket", ticket)
            .with_opt("container", container)
            .flag("finalize", finalize);
        let envelope = self.call(Method::Get, "read", &params)?;
        into_stored(&envelope)
    }

    /// Read a data container and lock it for `lock_timeout`.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn read_data_and_lock(
        &self,
        ticket: &str,
        lock_timeout: Duration,
        container: Option<&str>,
    ) -> SpfeResult<StoredData> {
        let params = RequestParams::new()
            .with("ticket", ticket)
            .with_opt("container", container)
            .flag("lock", true)
            .with("to", lock_timeout);
        let envelope = self.call(Method::Get, "read", &params)?;
        into_stored(&envelope)
    }

    /// Replace the contents of a data container.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn write_data(
        &self,
        ticket: &str,
        data: &[u8],
        container: Option<&str>,
        finalize: bool,
    ) -> SpfeResult<()> {
        let params = RequestParams::new()
            .with("ticket", ticket)
            .with("data", data)
            .with_opt("container", container)
            .flag("finalize", finalize);
        self.call(Method::Post, "write", &params).map(|_| ())
    }

    /// Replace the contents of a locked data container and release the lock.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn write_data_and_unlock(
        &self,
        ticket: &str,
        data: &[u8],
        container: Option<&str>,
        finalize: bool,
    ) -> SpfeResult<()> {
        let params = RequestParams::new()
            .with("ticket", ticket)
            .with("data", data)
            .with_opt("container", container)
            .flag("unlock", true)
            .flag("finalize", finalize);
        self.call(Method::Post, "write", &params).map(|_| ())
    }

    /// Take the named lock for `lock_timeout`.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn lock(&self, ticket: &str, lock_timeout: Duration, lock_id: &str) -> SpfeResult<()> {
        let params = RequestParams::new()
            .with("ticket", ticket)
            .with("lockid", lock_id)
            .with("to", lock_timeout);
        self.call(Method::Get, "lock", &params).map(|_| ())
    }

    /// Release the named lock.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn unlock(&self, ticket: &str, lock_id: &str, finalize: bool) -> SpfeResult<()> {
        let params = RequestParams::new()
            .with("ticket", ticket)
            .with("lockid", lock_id)
            .flag("finalize", finalize);
        self.call(Method::Get, "unlock", &params).map(|_| ())
    }

    /// Session key bound to `ticket`.
    ///
    /// # Errors
    ///
    /// Propagates request errors; [`SpfeError::Protocol`] when no key is sent.
    pub fn get_session_key(&self, ticket: &str, finalize: bool) -> SpfeResult<SessionKey> {
        let params = RequestParams::new()
            .with("ticket", ticket)
            .flag("finalize", finalize);
        let envelope = self.call(Method::Get, "key", &params)?;
        Ok(SessionKey {
            session_key: SecretSlice::from(envelope.required_data_bytes()?),
        })
    }

    /// Client key for `ticket`, with its lifetime.
    ///
    /// # Errors
    ///
    /// Propagates request errors; [`SpfeError::Protocol`] when the key or
    /// `ttl` is missing.
    pub fn get_client_key(&self, ticket: &str) -> SpfeResult<ClientKey> {
        let params = RequestParams::new().with("ticket", ticket);
        let envelope = self.call(Method::Get, "clientkey", &params)?;
        Ok(ClientKey {
            client_key: SecretSlice::from(envelope.required_data_bytes()?),
            ttl: envelope.ttl()?,
            original_ticket: envelope.text_field("originalTicket")?,
        })
    }

    /// Create a provider record, optionally with initial contents.
    ///
    /// # Errors
    ///
    /// Propagates request errors; [`SpfeError::Protocol`] when no PFID is sent.
    pub fn create_record(&self, data: &[u8]) -> SpfeResult<Pfid> {
        let envelope = if data.is_empty() {
            self.call(Method::Get, "sp/create", &RequestParams::new())?
        } else {
            let params = RequestParams::new().with("data", data);
            self.call(Method::Post, "sp/create", &params)?
        };
        Ok(Pfid {
            pfid: envelope.required_data_bytes()?,
        })
    }

    /// Delete a provider record.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn remove_record(&self, pfid: &[u8]) -> SpfeResult<()> {
        let params = RequestParams::new().with("pfid", pfid);
        self.call(Method::Post, "sp/remove", &params).map(|_| ())
    }

    /// Read a provider record.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn read_record(&self, pfid: &[u8]) -> SpfeResult<StoredData> {
        let params = RequestParams::new().with("pfid", pfid);
        let envelope = self.call(Method::Get, "sp/read", &params)?;
        into_stored(&envelope)
    }

    /// Read a provider record and lock it for `lock_timeout`.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn read_record_and_lock(
        &self,
        pfid: &[u8],
        lock_timeout: Duration,
    ) -> SpfeResult<StoredData> {
        let params = RequestParams::new()
            .with("pfid", pfid)
            .with("to", lock_timeout)
            .flag("lock", true);
        let envelope = self.call(Method::Get, "sp/read", &params)?;
        into_stored(&envelope)
    }

    /// Replace the contents of a provider record.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn write_record(&self, pfid: &[u8], data: &[u8]) -> SpfeResult<()> {
        let params = RequestParams::new().with("pfid", pfid).with("data", data);
        self.call(Method::Post, "sp/write", &params).map(|_| ())
    }

    /// Replace the contents of a locked provider record and release the lock.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn write_record_and_unlock(&self, pfid: &[u8], data: &[u8]) -> SpfeResult<()> {
        let params = RequestParams::new()
            .with("pfid", pfid)
            .with("data", data)
            .flag("unlock", true);
        self.call(Method::Post, "sp/write", &params).map(|_| ())
    }

    /// Take a provider-scoped lock for `lock_timeout`.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn lock_provider(&self, lock_id: &str, lock_timeout: Duration) -> SpfeResult<()> {
        let params = RequestParams::new()
            .with("lockid", lock_id)
            .with("to", lock_timeout);
        self.call(Method::Get, "sp/lock", &params).map(|_| ())
    }

    /// Release a provider-scoped lock.
    ///
    /// # Errors
    ///
    /// Propagates request errors unchanged.
    pub fn unlock_provider(&self, lock_id: &str) -> SpfeResult<()> {
        let params = RequestParams::new().with("lockid", lock_id);
        self.call(Method::Get, "sp/unlock", &params).map(|_| ())
    }
}

fn into_ticket(envelope: &ResponseEnvelope) -> SpfeResult<Ticket> {
    Ok(Ticket {
        ticket: envelope.data_text()?,
        ttl: envelope.ttl()?,
    })
}

fn into_stored(envelope: &ResponseEnvelope) -> SpfeResult<StoredData> {
    Ok(StoredData {
        data: envelope.data_bytes()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use secrecy::ExposeSecret;
    use serde_pickle::{HashableValue, SerOptions, Value};

    use crate::codec::EncodedRequest;
    use crate::connection::tests::ScriptedTransport;
    use crate::error::TransportError;

    fn envelope(result: bool, data: Value, extras: Vec<(&str, Value)>) -> Vec<u8> {
        let dict = [("result", Value::Bool(result)), ("data", data)]
            .into_iter()
            .chain(extras)
            .map(|(key, value)| (HashableValue::String(key.to_string()), value))
            .collect();
        serde_pickle::value_to_vec(&Value::Dict(dict), SerOptions::new()).unwrap()
    }

    fn text(value: &str) -> Value {
        Value::Bytes(value.as_bytes().to_vec())
    }

    type Sent = Arc<Mutex<Option<EncodedRequest>>>;

    fn client(
        script: Vec<Result<Vec<u8>, TransportError>>,
    ) -> (SpfeClient<Connection<ScriptedTransport>>, Sent) {
        let transport = ScriptedTransport::new(script);
        let sent = Arc::clone(&transport.last_request);
        let connection = Connection::with_transport("https://spfe.test", transport);
        (SpfeClient::new(connection), sent)
    }

    fn sent_url(sent: &Sent) -> String {
        sent.lock().clone().unwrap().url
    }

    fn sent_body(sent: &Sent) -> String {
        let body = sent.lock().clone().unwrap().body.unwrap();
        String::from_utf8(body).unwrap()
    }

    #[test]
    fn test_get_ticket() {
        let (client, sent) = client(vec![Ok(envelope(
            true,
            text("xyz"),
            vec![("ttl", Value::I64(120))],
        ))]);

        let ticket = client
            .get_ticket(Duration::from_secs(120), &AuthTypes::filter("pxs"))
            .unwrap();

        assert_eq!(ticket.ticket, "xyz");
        assert_eq!(ticket.ttl, Duration::from_secs(120));
        assert_eq!(sent_url(&sent), "https://spfe.test/get?ttl=120&auth_type=ps");
    }

    #[test]
    fn test_get_ticket_omits_defaults() {
        let (client, sent) = client(vec![Ok(envelope(
            true,
            text("sp:abc"),
            vec![("ttl", Value::I64(600))],
        ))]);

        client.get_ticket(Duration::ZERO, &AuthTypes::none()).unwrap();
        assert_eq!(sent_url(&sent), "https://spfe.test/get");
    }

    #[test]
    fn test_service_name_is_ticket_prefix() {
        let (client, _) = client(vec![Ok(envelope(
            true,
            text("mysite.com:abcdef123"),
            vec![("ttl", Value::I64(600))],
        ))]);
        assert_eq!(client.get_service_name().unwrap(), "mysite.com");
    }

    #[test]
    fn test_service_name_without_separator_is_protocol_error() {
        let (client, _) = client(vec![Ok(envelope(
            true,
            text("garbage"),
            vec![("ttl", Value::I64(600))],
        ))]);
        assert!(matches!(
            client.get_service_name(),
            Err(SpfeError::Protocol(_))
        ));
    }

    #[test]
    fn test_redeem_identifier() {
        let (client, sent) = client(vec![Ok(envelope(true, text("puid-1"), vec![]))]);

        let puid = client
            .redeem_identifier("sp:t", &AuthTypes::filter("c"), true)
            .unwrap();

        assert_eq!(puid.puid, "puid-1");
        assert_eq!(
            sent_url(&sent),
            "https://spfe.test/puid?ticket=sp%3At&finalize=1&auth_type=c"
        );
    }

    #[test]
    fn test_put_ticket() {
        let (client, sent) = client(vec![Ok(envelope(
            true,
            text("sp:new"),
            vec![("ttl", Value::I64(300))],
        ))]);

        let ticket = client
            .put_ticket("sp:old", Duration::from_secs(300), &AuthTypes::none(), false)
            .unwrap();

        assert_eq!(ticket.ticket, "sp:new");
        assert_eq!(sent_url(&sent), "https://spfe.test/put?ticket=sp%3Aold&ttl=300");
    }

    #[test]
    fn test_service_error_propagates() {
        let (client, _) = client(vec![Ok(envelope(
            false,
            Value::String("bad ticket".to_string()),
            vec![("code", Value::String("4".to_string()))],
        ))]);

        match client.redeem_identifier("sp:t", &AuthTypes::none(), false) {
            Err(SpfeError::Service { code, message }) => {
                assert_eq!(code.as_deref(), Some("4"));
                assert_eq!(message, "bad ticket");
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn test_read_data_default_container() {
        let (client, sent) = client(vec![Ok(envelope(true, Value::None, vec![]))]);

        let stored = client.read_data("sp:t", None, false).unwrap();

        assert_eq!(stored.data, None);
        assert_eq!(sent_url(&sent), "https://spfe.test/read?ticket=sp%3At");
    }

    #[test]
    fn test_read_data_and_lock() {
        let (client, sent) = client(vec![Ok(envelope(true, text("blob"), vec![]))]);

        let stored = client
            .read_data_and_lock("sp:t", Duration::from_secs(30), Some("box"))
            .unwrap();

        assert_eq!(stored.as_bytes(), Some(&b"blob"[..]));
        assert_eq!(
            sent_url(&sent),
            "https://spfe.test/read?ticket=sp%3At&container=box&lock=1&to=30"
        );
    }

    #[test]
    fn test_write_data_posts_form_body() {
        let (client, sent) = client(vec![Ok(envelope(true, Value::Bool(true), vec![]))]);

        client
            .write_data("sp:t", b"a b", Some(""), true)
            .unwrap();

        assert_eq!(sent_url(&sent), "https://spfe.test/write");
        assert_eq!(sent_body(&sent), "ticket=sp%3At&data=a+b&finalize=1");
    }

    #[test]
    fn test_write_data_and_unlock() {
        let (client, sent) = client(vec![Ok(envelope(true, Value::Bool(true), vec![]))]);

        client
            .write_data_and_unlock("sp:t", b"x", Some("box"), false)
            .unwrap();

        assert_eq!(sent_body(&sent), "ticket=sp%3At&data=x&container=box&unlock=1");
    }

    #[test]
    fn test_lock_and_unlock() {
        let ok = || Ok(envelope(true, Value::Bool(true), vec![]));
        let (client, sent) = client(vec![ok(), ok()]);

        client.lock("sp:t", Duration::from_secs(10), "L1").unwrap();
        assert_eq!(
            sent_url(&sent),
            "https://spfe.test/lock?ticket=sp%3At&lockid=L1&to=10"
        );

        client.unlock("sp:t", "L1", true).unwrap();
        assert_eq!(
            sent_url(&sent),
            "https://spfe.test/unlock?ticket=sp%3At&lockid=L1&finalize=1"
        );
    }

    #[test]
    fn test_session_key() {
        let (client, sent) = client(vec![Ok(envelope(
            true,
            Value::Bytes(vec![1, 2, 3]),
            vec![],
        ))]);

        let key = client.get_session_key("sp:t", false).unwrap();

        assert_eq!(key.session_key.expose_secret(), &[1, 2, 3]);
        assert_eq!(sent_url(&sent), "https://spfe.test/key?ticket=sp%3At");
    }

    #[test]
    fn test_client_key_with_original_ticket() {
        let (client, _) = client(vec![Ok(envelope(
            true,
            Value::Bytes(vec![9; 4]),
            vec![
                ("ttl", Value::I64(60)),
                ("originalTicket", text("sp:first")),
            ],
        ))]);

        let key = client.get_client_key("sp:t").unwrap();

        assert_eq!(key.client_key.expose_secret(), &[9; 4]);
        assert_eq!(key.ttl, Duration::from_secs(60));
        assert_eq!(key.original_ticket.as_deref(), Some("sp:first"));
    }

    #[test]
    fn test_client_key_without_original_ticket() {
        let (client, _) = client(vec![Ok(envelope(
            true,
            Value::Bytes(vec![9; 4]),
            vec![("ttl", Value::I64(60))],
        ))]);
        assert_eq!(client.get_client_key("sp:t").unwrap().original_ticket, None);
    }

    #[test]
    fn test_create_record_without_data_uses_get() {
        let (client, sent) = client(vec![Ok(envelope(true, text("pf-1"), vec![]))]);

        let pfid = client.create_record(b"").unwrap();

        assert_eq!(pfid.pfid, b"pf-1");
        let request = sent.lock().clone().unwrap();
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.url, "https://spfe.test/sp/create");
    }

    #[test]
    fn test_create_record_with_data_uses_post() {
        let (client, sent) = client(vec![Ok(envelope(true, text("pf-2"), vec![]))]);

        client.create_record(b"init").unwrap();

        let request = sent.lock().clone().unwrap();
        assert_eq!(request.method, Method::Post);
        assert_eq!(sent_body(&sent), "data=init");
    }

    #[test]
    fn test_provider_record_commands() {
        let ok = || Ok(envelope(true, Value::Bool(true), vec![]));
        let (client, sent) = client(vec![
            ok(),
            Ok(envelope(true, text("rec"), vec![])),
            Ok(envelope(true, text("rec"), vec![])),
            ok(),
            ok(),
            ok(),
            ok(),
        ]);

        client.remove_record(b"pf").unwrap();
        assert_eq!(sent_body(&sent), "pfid=pf");

        assert_eq!(
            client.read_record(b"pf").unwrap().as_bytes(),
            Some(&b"rec"[..])
        );
        assert_eq!(sent_url(&sent), "https://spfe.test/sp/read?pfid=pf");

        client
            .read_record_and_lock(b"pf", Duration::from_secs(5))
            .unwrap();
        assert_eq!(sent_url(&sent), "https://spfe.test/sp/read?pfid=pf&to=5&lock=1");

        client.write_record(b"pf", b"new").unwrap();
        assert_eq!(sent_body(&sent), "pfid=pf&data=new");

        client.write_record_and_unlock(b"pf", b"new").unwrap();
        assert_eq!(sent_body(&sent), "pfid=pf&data=new&unlock=1");

        client
            .lock_provider("L", Duration::from_secs(15))
            .unwrap();
        assert_eq!(sent_url(&sent), "https://spfe.test/sp/lock?lockid=L&to=15");

        client.unlock_provider("L").unwrap();
        assert_eq!(sent_url(&sent), "https://spfe.test/sp/unlock?lockid=L");
    }

    #[test]
    fn test_client_attempts_are_forwarded() {
        let timeout = || Err(TransportError::Timeout("slow".to_string()));
        let (client, _) = client(vec![timeout(), timeout(), timeout()]);
        let client = client.with_attempts(2);

        assert!(matches!(
            client.read_record(b"pf"),
            Err(SpfeError::Transport { attempts: 2, .. })
        ));
    }

    #[test]
    fn test_pooled_client_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SpfeClient<ConnectionPool>>();
        assert_send_sync::<SpfeClient<Arc<ConnectionPool>>>();
    }
}
