use crate::acquire::CertificateFetcher;
use crate::config::DEFAULT_TIMEOUT_SECS;
use crate::error::{CheckError, Result};
use crate::{Certificate, Source};
use openssl::ssl::{Ssl, SslContext, SslMethod, SslVerifyMode};
use openssl::x509::X509;
use std::net::{IpAddr, Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;

/// What a completed handshake leaves behind.
#[derive(Debug, Clone)]
pub struct PeerChain {
    /// Peer certificates in the order presented, leaf first
    pub certificates: Vec<X509>,
    /// Address the TCP connection was actually made to
    pub peer_addr: SocketAddr,
}

/// Opens a TLS session and reports what the peer presented.
pub trait Handshake {
    fn handshake(&self, address: &str, server_name: &str) -> Result<PeerChain>;
}

/// Handshake over a real socket with peer verification disabled, so
/// expired and self-signed certificates can still be inspected.
#[derive(Debug, Clone)]
pub struct OpenSslHandshake {
    timeout: Duration,
}

impl OpenSslHandshake {
    pub fn new(timeout: Duration) -> Self {
        OpenSslHandshake { timeout }
    }
}

impl Default for OpenSslHandshake {
    fn default() -> Self {
        OpenSslHandshake::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl Handshake for OpenSslHandshake {
    fn handshake(&self, address: &str, server_name: &str) -> Result<PeerChain> {
        let connection_failed = |details: String| CheckError::ConnectionFailed {
            address: address.to_string(),
            details,
        };

        let mut context = SslContext::builder(SslMethod::tls())?;
        context.set_verify(SslVerifyMode::NONE);
        let context = context.build();

        let mut connector = Ssl::new(&context)?;
        // SNI carries host names only
        if !server_name.is_empty() && server_name.parse::<IpAddr>().is_err() {
            connector.set_hostname(server_name)?;
        }

        let tcp_stream = connect(address, self.timeout)?;
        tcp_stream
            .set_read_timeout(Some(self.timeout))
            .and_then(|_| tcp_stream.set_write_timeout(Some(self.timeout)))
            .map_err(|e| connection_failed(e.to_string()))?;
        let peer_addr = tcp_stream
            .peer_addr()
            .map_err(|e| connection_failed(e.to_string()))?;

        let stream = connector
            .connect(tcp_stream)
            .map_err(|e| connection_failed(format!("TLS handshake failed: {}", e)))?;

        let certificates: Vec<X509> = stream
            .ssl()
            .peer_cert_chain()
            .map(|chain| chain.iter().map(|cert| cert.to_owned()).collect())
            .unwrap_or_default();
        debug!(
            %peer_addr,
            chain_len = certificates.len(),
            version = stream.ssl().version_str(),
            "handshake complete"
        );

        Ok(PeerChain {
            certificates,
            peer_addr,
        })
    }
}

/// Tries every resolved address in turn, keeping the last failure.
fn connect(address: &str, timeout: Duration) -> Result<TcpStream> {
    let connection_failed = |details: String| CheckError::ConnectionFailed {
        address: address.to_string(),
        details,
    };

    let addresses = address
        .to_socket_addrs()
        .map_err(|e| connection_failed(format!("could not resolve address: {}", e)))?;

    let mut last_error = None;
    for socket_addr in addresses {
        debug!(%socket_addr, "connecting");
        match TcpStream::connect_timeout(&socket_addr, timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!(%socket_addr, error = %e, "connect failed");
                last_error = Some(e);
            }
        }
    }

    Err(connection_failed(match last_error {
        Some(e) => e.to_string(),
        None => "address resolved to nothing".to_string(),
    }))
}

/// `host:port`, where host is `ipaddr` when given and `domain` otherwise.
/// IPv6 literals get brackets.
pub fn target_address(domain: &str, port: &str, ipaddr: &str) -> String {
    let host = if ipaddr.is_empty() { domain } else { ipaddr };
    if host.parse::<Ipv6Addr>().is_ok() {
        format!("[{}]:{}", host, port)
    } else {
        format!("{}:{}", host, port)
    }
}

/// Fetches the leaf certificate through a [`Handshake`].
#[derive(Debug, Clone, Default)]
pub struct NetworkFetcher<H = OpenSslHandshake> {
    handshake: H,
}

impl NetworkFetcher<OpenSslHandshake> {
    pub fn with_timeout(timeout: Duration) -> Self {
        NetworkFetcher::new(OpenSslHandshake::new(timeout))
    }
}

impl<H: Handshake> NetworkFetcher<H> {
    pub fn new(handshake: H) -> Self {
        NetworkFetcher { handshake }
    }
}

impl<H: Handshake> CertificateFetcher for NetworkFetcher<H> {
    fn fetch(&self, domain: &str, port: &str, ipaddr: &str) -> Result<Certificate> {
        let address = target_address(domain, port, ipaddr);
        let chain = self.handshake.handshake(&address, domain)?;

        let leaf = chain
            .certificates
            .first()
            .ok_or_else(|| CheckError::NoCertificates {
                address: address.clone(),
            })?;

        Certificate::from_x509(leaf, Source::Network(chain.peer_addr.ip()))
    }
}
