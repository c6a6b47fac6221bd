//! Local HTTPS server requiring client certificates.
//!
//! A [`TestCa`] issues both the server certificate and trusted client
//! identities, so tests can exercise the full mutual TLS handshake without
//! touching the network.

use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose,
};
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig, ServerConnection, StreamOwned};

use crate::fixtures::ClientIdentity;

/// Throwaway certificate authority.
pub struct TestCa {
    cert: Certificate,
    key: KeyPair,
}

impl std::fmt::Debug for TestCa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCa").finish_non_exhaustive()
    }
}

impl TestCa {
    /// Generate a new root.
    #[must_use]
    pub fn generate() -> Self {
        let key = KeyPair::generate().expect("CA key generation");
        let mut params = CertificateParams::new(Vec::<String>::new()).expect("CA params");
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params
            .distinguished_name
            .push(DnType::CommonName, "SPFE Test Root");
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let cert = params.self_signed(&key).expect("CA self-signing");
        Self { cert, key }
    }

    /// Root certificate in PEM form, usable as a trust anchor bundle.
    #[must_use]
    pub fn cert_pem(&self) -> String {
        self.cert.pem()
    }

    /// Client identity signed by this root.
    #[must_use]
    pub fn issue_client(&self) -> ClientIdentity {
        let (cert, key) = self.issue(
            vec!["provider.test".to_string()],
            ExtendedKeyUsagePurpose::ClientAuth,
        );
        ClientIdentity {
            key_pem: key.serialize_pem(),
            cert_pem: cert.pem(),
        }
    }

    fn issue(
        &self,
        names: Vec<String>,
        usage: ExtendedKeyUsagePurpose,
    ) -> (Certificate, KeyPair) {
        let key = KeyPair::generate().expect("leaf key generation");
        let mut params = CertificateParams::new(names).expect("leaf params");
        params
            .distinguished_name
            .push(DnType::CommonName, "spfe-test-leaf");
        params.extended_key_usages = vec![usage];
        let cert = params
            .signed_by(&key, &self.cert, &self.key)
            .expect("leaf signing");
        (cert, key)
    }
}

/// HTTPS server on `127.0.0.1` answering every request with a fixed body.
///
/// Handshakes without a client certificate chaining to the CA are refused.
#[derive(Debug)]
pub struct TlsServer {
    addr: SocketAddr,
    served: Arc<AtomicUsize>,
}

impl TlsServer {
    /// Start serving `body` with a server certificate issued by `ca`.
    #[must_use]
    pub fn start(ca: &TestCa, body: Vec<u8>) -> Self {
        let (cert, key) = ca.issue(
            vec!["127.0.0.1".to_string(), "localhost".to_string()],
            ExtendedKeyUsagePurpose::ServerAuth,
        );

        let mut roots = RootCertStore::empty();
        roots
            .add(ca.cert.der().clone())
            .expect("CA as client root");
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier =
            WebPkiClientVerifier::builder_with_provider(Arc::new(roots), Arc::clone(&provider))
                .build()
                .expect("client certificate verifier");
        let config = ServerConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .expect("protocol versions")
            .with_client_cert_verifier(verifier)
            .with_single_cert(
                vec![cert.der().clone()],
                PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der())),
            )
            .expect("server certificate");
        let config = Arc::new(config);

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
        let addr = listener.local_addr().expect("listener address");
        let served = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&served);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                // Rejected handshakes surface here and are expected.
                let _ = serve(&config, stream, &body, &counter);
            }
        });

        Self { addr, served }
    }

    /// Base URL, `https://127.0.0.1:<port>`.
    #[must_use]
    pub fn uri(&self) -> String {
        format!("https://{}", self.addr)
    }

    /// Requests answered after a completed mutual TLS handshake.
    #[must_use]
    pub fn served(&self) -> usize {
        self.served.load(Ordering::SeqCst)
    }
}

fn serve(
    config: &Arc<ServerConfig>,
    stream: TcpStream,
    body: &[u8],
    served: &AtomicUsize,
) -> io::Result<()> {
    let connection = ServerConnection::new(Arc::clone(config)).map_err(io::Error::other)?;
    let mut tls = StreamOwned::new(connection, stream);

    let mut request = Vec::new();
    let mut chunk = [0_u8; 1024];
    while !request.windows(4).any(|window| window == b"\r\n\r\n") {
        let read = tls.read(&mut chunk)?;
        if read == 0 {
            return Ok(());
        }
        request.extend_from_slice(&chunk[..read]);
    }
    if tls.conn.peer_certificates().is_none() {
        return Ok(());
    }

    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    served.fetch_add(1, Ordering::SeqCst);
    tls.write_all(head.as_bytes())?;
    tls.write_all(body)?;
    tls.conn.send_close_notify();
    tls.flush()
}
