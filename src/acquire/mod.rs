//! Certificate acquisition.
//!
//! A certificate comes either from a live TLS endpoint or from a PEM file.
//! Both paths sit behind small traits so the network can be swapped out in
//! tests.
//!
//! # Submodules
//!
//! - `network` - TLS fetch with verification disabled
//! - `file` - PEM file loading

pub mod file;
pub mod network;

pub use file::PemFileLoader;
pub use network::{Handshake, NetworkFetcher, OpenSslHandshake, PeerChain};

use crate::cli::Options;
use crate::{Certificate, Result};
use std::path::Path;
use tracing::{info, warn};

/// Fetches the certificate a server presents.
pub trait CertificateFetcher {
    /// Connects to `ipaddr:port` when `ipaddr` is non-empty, otherwise to
    /// `domain:port`, and returns the leaf certificate.
    fn fetch(&self, domain: &str, port: &str, ipaddr: &str) -> Result<Certificate>;
}

/// Loads a certificate from disk.
pub trait CertificateLoader {
    fn load(&self, path: &Path) -> Result<Certificate>;
}

/// Runs exactly one acquisition path: the file when one is given,
/// the network otherwise.
///
/// # Errors
///
/// Whatever the selected fetcher or loader returns.
pub fn acquire(
    options: &Options,
    fetcher: &dyn CertificateFetcher,
    loader: &dyn CertificateLoader,
) -> Result<Certificate> {
    match &options.cert_file {
        Some(path) => {
            if !options.domain.is_empty() {
                warn!(
                    domain = %options.domain,
                    certfile = %path.display(),
                    "both domain and certfile given, using certfile"
                );
            }
            info!(certfile = %path.display(), "loading certificate from file");
            loader.load(path)
        }
        None => {
            info!(domain = %options.domain, port = %options.port, "fetching certificate");
            fetcher.fetch(&options.domain, &options.port, &options.ipaddr)
        }
    }
}
