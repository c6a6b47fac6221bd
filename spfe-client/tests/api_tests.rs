//! HTTP-level tests for the SPFE client.
//!
//! Tests validate:
//! - Query and form encoding as seen by the server
//! - Envelope decoding for success and service errors
//! - Retry on timeouts and non-success statuses
//! - Pooled clients over the real HTTPS transport

use std::time::Duration;

use spfe_client::{
    AuthTypes, ClientConfig, SpfeClient, SpfeError, TransportConfig, TransportError,
};
use test_utils::fixtures::{ClientIdentity, Envelope};
use test_utils::mocks::MockSpfe;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn transport_config(server: &MockSpfe) -> TransportConfig {
    let identity = ClientIdentity::generate();
    TransportConfig::new(identity.key_pem, identity.cert_pem)
        .with_service_address(server.uri())
        .with_timeout(Duration::from_secs(5))
}

fn pickled(envelope: &Envelope) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_bytes(envelope.to_bytes())
}

#[test]
fn test_get_ticket_over_http() {
    init_tracing();
    let server = MockSpfe::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/get"))
            .and(query_param("ttl", "120"))
            .respond_with(pickled(&Envelope::success("xyz").ttl(120)))
            .expect(1),
    );

    let client = SpfeClient::connect(&transport_config(&server)).unwrap();
    let ticket = client
        .get_ticket(Duration::from_secs(120), &AuthTypes::none())
        .unwrap();

    assert_eq!(ticket.ticket, "xyz");
    assert_eq!(ticket.ttl, Duration::from_secs(120));
    server.verify();
}

#[test]
fn test_service_error_carries_code() {
    init_tracing();
    let server = MockSpfe::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/puid"))
            .respond_with(pickled(&Envelope::failure("bad ticket").code("4")))
            .expect(1),
    );

    let client = SpfeClient::connect(&transport_config(&server)).unwrap();
    let err = client
        .redeem_identifier("sp:t", &AuthTypes::none(), false)
        .unwrap_err();

    assert_eq!(err.to_string(), "SPFE returned error: 4: bad ticket");
    assert!(!err.is_retryable());
    server.verify();
}

#[test]
fn test_write_sends_form_body() {
    init_tracing();
    let server = MockSpfe::start();
    server.mount(
        Mock::given(method("POST"))
            .and(path("/write"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string("ticket=sp%3At&data=hello+world&container=notes&unlock=1"))
            .respond_with(pickled(&Envelope::success("ok")))
            .expect(1),
    );

    let client = SpfeClient::connect(&transport_config(&server)).unwrap();
    client
        .write_data_and_unlock("sp:t", b"hello world", Some("notes"), false)
        .unwrap();
    server.verify();
}

#[test]
fn test_service_name_from_pooled_client() {
    init_tracing();
    let server = MockSpfe::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/get"))
            .respond_with(pickled(&Envelope::success("mysite.com:abcdef123").ttl(600))),
    );

    let client = SpfeClient::pooled(transport_config(&server), 2).unwrap();
    assert_eq!(client.get_service_name().unwrap(), "mysite.com");

    let requests = server.received_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.query(), None);
}

#[test]
fn test_timeout_is_retried_then_reported() {
    init_tracing();
    let server = MockSpfe::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/sp/read"))
            .respond_with(pickled(&Envelope::success("late")).set_delay(Duration::from_secs(2)))
            .expect(2),
    );

    let config = transport_config(&server).with_timeout(Duration::from_millis(200));
    let client = SpfeClient::connect(&config).unwrap().with_attempts(2);
    let err = client.read_record(b"pf").unwrap_err();

    assert!(matches!(err, SpfeError::Transport { attempts: 2, .. }));
    assert!(err.is_retryable());
    server.verify();
}

#[test]
fn test_error_status_is_a_transport_failure() {
    init_tracing();
    let server = MockSpfe::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/key"))
            .respond_with(ResponseTemplate::new(502))
            .expect(3),
    );

    let client = SpfeClient::connect(&transport_config(&server)).unwrap();
    let err = client.get_session_key("sp:t", false).unwrap_err();

    assert!(matches!(
        err,
        SpfeError::Transport {
            attempts: 3,
            source: TransportError::Status(502)
        }
    ));
    server.verify();
}

#[test]
fn test_non_pickle_body_is_protocol_error() {
    init_tracing();
    let server = MockSpfe::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/read"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .expect(1),
    );

    let client = SpfeClient::connect(&transport_config(&server)).unwrap();
    assert!(matches!(
        client.read_data("sp:t", None, false),
        Err(SpfeError::Protocol(_))
    ));
    server.verify();
}

#[test]
fn test_client_from_config() {
    init_tracing();
    let server = MockSpfe::start();
    server.mount(
        Mock::given(method("GET"))
            .and(path("/sp/unlock"))
            .and(query_param("lockid", "L1"))
            .respond_with(pickled(&Envelope::empty()))
            .expect(1),
    );

    let mut config = ClientConfig::new(transport_config(&server));
    config.pool_size = 1;
    config.attempts = 1;
    let client = SpfeClient::from_config(config).unwrap();

    assert_eq!(client.attempts(), 1);
    assert_eq!(client.requester().size(), 1);
    client.unlock_provider("L1").unwrap();
    server.verify();
}

#[test]
fn test_invalid_identity_is_config_error() {
    let config = TransportConfig::new("not a key", "not a cert");
    assert!(matches!(
        SpfeClient::connect(&config),
        Err(SpfeError::Config(_))
    ));
}
