use crate::acquire::CertificateLoader;
use crate::error::{CheckError, Result};
use crate::{Certificate, Source};
use openssl::x509::X509;
use std::fs;
use std::path::Path;

const CERTIFICATE_TAG: &str = "CERTIFICATE";

/// Loads the first PEM block of a file, which must be a certificate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PemFileLoader;

impl CertificateLoader for PemFileLoader {
    fn load(&self, path: &Path) -> Result<Certificate> {
        let bytes = fs::read(path).map_err(|source| CheckError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let block = pem::parse(&bytes).map_err(|e| CheckError::InvalidPem {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if block.tag() != CERTIFICATE_TAG {
            return Err(CheckError::UnexpectedPemType {
                path: path.to_path_buf(),
                found: block.tag().to_string(),
            });
        }

        let x509 = X509::from_der(block.contents()).map_err(|source| {
            CheckError::InvalidCertificate {
                path: path.to_path_buf(),
                source,
            }
        })?;

        Certificate::from_x509(&x509, Source::File(path.to_path_buf()))
    }
}
