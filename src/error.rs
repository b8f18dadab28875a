//! Error types for certificate acquisition.
//!
//! Every failure is terminal for the process: the binary prints the error
//! on stderr and exits non-zero. Variants carry the address or path they
//! concern so the single diagnostic line is self-explanatory.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CheckError>;

#[derive(Error, Debug)]
pub enum CheckError {
    /// Neither a domain nor a certificate file was given
    #[error("either domain or certfile must be specified")]
    MissingTarget,

    /// DNS resolution, TCP connect or TLS handshake failed
    #[error("failed to connect to {address}: {details}")]
    ConnectionFailed {
        /// The `host:port` that was dialled
        address: String,
        details: String,
    },

    /// The peer completed the handshake without presenting a certificate
    #[error("no certificates found for {address}")]
    NoCertificates { address: String },

    #[error("failed to read certificate file {}: {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file holds no decodable PEM block
    #[error("failed to parse certificate from file {}: {reason}", .path.display())]
    InvalidPem { path: PathBuf, reason: String },

    #[error("expected a CERTIFICATE PEM block in {}, found {found}", .path.display())]
    UnexpectedPemType { path: PathBuf, found: String },

    /// The PEM payload is not a valid DER certificate
    #[error("malformed certificate in {}: {source}", .path.display())]
    InvalidCertificate {
        path: PathBuf,
        #[source]
        source: openssl::error::ErrorStack,
    },

    /// A field of an otherwise parsed certificate could not be read
    #[error("certificate error: {reason}")]
    Certificate { reason: String },

    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),
}
