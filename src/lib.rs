//! Certificate expiry inspection.
//!
//! `sslwatch` obtains one X.509 end-entity certificate, either from a live
//! TLS endpoint or from a PEM file on disk, and reports how long it has
//! left before it expires.
//!
//! ```no_run
//! use sslwatch::acquire::{CertificateFetcher, NetworkFetcher};
//! use chrono::Utc;
//! use std::time::Duration;
//!
//! let fetcher = NetworkFetcher::with_timeout(Duration::from_secs(10));
//! let cert = fetcher.fetch("example.com", "443", "")?;
//! println!("{} expires in {} days", cert.common_name, cert.days_remaining(Utc::now()));
//! # Ok::<(), sslwatch::CheckError>(())
//! ```

use chrono::{DateTime, Utc};
use openssl::asn1::{Asn1Time, Asn1TimeRef};
use openssl::nid::Nid;
use openssl::x509::{X509NameRef, X509Ref};
use std::net::IpAddr;
use std::path::PathBuf;
use strum_macros::Display;

pub mod acquire;
pub mod cli;
pub mod config;
pub mod error;
pub mod report;

pub use error::{CheckError, Result};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Where a certificate came from.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum Source {
    /// Loaded from a PEM file on disk
    #[strum(serialize = "file")]
    File(PathBuf),
    /// Fetched over TLS; holds the remote address actually connected to
    #[strum(serialize = "network")]
    Network(IpAddr),
}

/// The parts of an end-entity certificate that the report needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    pub common_name: String,
    pub subject: String,
    pub issuer: String,
    pub not_after: DateTime<Utc>,
    pub source: Source,
}

impl Certificate {
    /// Extracts subject, issuer and expiry from an openssl certificate.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::Certificate`] when a name entry is not valid
    /// UTF-8 or the expiry time cannot be represented.
    pub fn from_x509(cert: &X509Ref, source: Source) -> Result<Certificate> {
        let common_name = cert
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .map(|entry| entry.data().to_string())
            .transpose()
            .map_err(|e| CheckError::Certificate {
                reason: format!("common name could not be decoded: {}", e),
            })?
            .map(|cn| escape_control(&cn))
            .unwrap_or_default();

        Ok(Certificate {
            common_name,
            subject: format_name(cert.subject_name())?,
            issuer: format_name(cert.issuer_name())?,
            not_after: asn1_to_datetime(cert.not_after())?,
            source,
        })
    }

    /// Whole days until expiry, see [`days_remaining`].
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        days_remaining(self.not_after, now)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.not_after <= now
    }

    /// The remote address, only for certificates fetched over the network.
    pub fn used_ip(&self) -> Option<IpAddr> {
        match self.source {
            Source::Network(ip) => Some(ip),
            Source::File(_) => None,
        }
    }
}

/// Days between `now` and `not_after`, truncated toward zero.
///
/// A certificate expiring in 23 hours has 0 days left; an expired one
/// yields a negative count.
pub fn days_remaining(not_after: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (not_after - now).num_seconds() / SECONDS_PER_DAY
}

fn asn1_to_datetime(time: &Asn1TimeRef) -> Result<DateTime<Utc>> {
    let epoch = Asn1Time::from_unix(0)?;
    let diff = epoch.diff(time)?;
    let seconds = i64::from(diff.days) * SECONDS_PER_DAY + i64::from(diff.secs);

    DateTime::from_timestamp(seconds, 0).ok_or_else(|| CheckError::Certificate {
        reason: format!("expiry time {} is out of range", time),
    })
}

/// Renders a distinguished name as `CN=leaf,O=Org,C=US`, most specific
/// entry first.
///
/// Entries of a multi-valued RDN are joined with `,` like any other; the
/// openssl name API does not expose RDN set boundaries.
fn format_name(name: &X509NameRef) -> Result<String> {
    let mut parts = Vec::new();
    for entry in name.entries() {
        let key = match entry.object().nid().short_name() {
            Ok(short) => short.to_string(),
            Err(_) => entry.object().to_string(),
        };
        let value = entry
            .data()
            .to_string()
            .map_err(|e| CheckError::Certificate {
                reason: format!("{} entry could not be decoded: {}", key, e),
            })?;
        parts.push(format!("{}={}", key, escape_value(&value)));
    }
    parts.reverse();
    Ok(parts.join(","))
}

/// RFC 2253 escaping: special characters, a leading `#` or space, a
/// trailing space, and control characters as `\XX`.
fn escape_value(value: &str) -> String {
    let last = value.chars().count().saturating_sub(1);
    let mut escaped = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let special = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';')
            || (i == 0 && matches!(c, '#' | ' '))
            || (i == last && c == ' ');
        if special {
            escaped.push('\\');
            escaped.push(c);
        } else {
            push_char(&mut escaped, c);
        }
    }
    escaped
}

/// Hex-escapes control characters so an embedded NUL cannot hide the
/// rest of a name.
fn escape_control(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        push_char(&mut escaped, c);
    }
    escaped
}

fn push_char(out: &mut String, c: char) {
    if c.is_control() {
        let mut buf = [0u8; 4];
        for byte in c.encode_utf8(&mut buf).bytes() {
            out.push_str(&format!("\\{:02x}", byte));
        }
    } else {
        out.push(c);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Utc};
    use openssl::asn1::Asn1Time;
    use openssl::bn::BigNum;
    use openssl::ec::{EcGroup, EcKey};
    use openssl::hash::MessageDigest;
    use openssl::nid::Nid;
    use openssl::pkey::{PKey, Private};
    use openssl::x509::{X509Name, X509NameBuilder, X509NameRef, X509};

    fn name(entries: &[(Nid, &str)]) -> X509Name {
        let mut builder = X509NameBuilder::new().unwrap();
        for (nid, value) in entries {
            builder.append_entry_by_nid(*nid, value).unwrap();
        }
        builder.build()
    }

    /// Mints an EC P-256 certificate for `cn`, issued by `issuer_cn`.
    pub(crate) fn mint(
        cn: &str,
        issuer_cn: &str,
        not_after: DateTime<Utc>,
    ) -> (X509, PKey<Private>) {
        let subject = name(&[
            (Nid::COUNTRYNAME, "US"),
            (Nid::ORGANIZATIONNAME, "Example Org"),
            (Nid::COMMONNAME, cn),
        ]);
        let issuer = name(&[(Nid::ORGANIZATIONNAME, "Test CA"), (Nid::COMMONNAME, issuer_cn)]);
        build(&subject, &issuer, not_after)
    }

    /// Self-signed certificate with exactly the given subject entries.
    pub(crate) fn mint_with_subject(
        entries: &[(Nid, &str)],
        not_after: DateTime<Utc>,
    ) -> (X509, PKey<Private>) {
        let subject = name(entries);
        build(&subject, &subject, not_after)
    }

    fn build(
        subject: &X509NameRef,
        issuer: &X509NameRef,
        not_after: DateTime<Utc>,
    ) -> (X509, PKey<Private>) {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
        let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

        let mut builder = X509::builder().unwrap();
        builder.set_version(2).unwrap();
        let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
        builder.set_serial_number(&serial).unwrap();
        builder.set_subject_name(subject).unwrap();
        builder.set_issuer_name(issuer).unwrap();
        builder.set_pubkey(&key).unwrap();
        let not_before = Asn1Time::from_unix(not_after.timestamp() - 365 * 86_400).unwrap();
        builder.set_not_before(&not_before).unwrap();
        let expiry = Asn1Time::from_unix(not_after.timestamp()).unwrap();
        builder.set_not_after(&expiry).unwrap();
        builder.sign(&key, MessageDigest::sha256()).unwrap();

        (builder.build(), key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use test_support::mint;

    fn reference_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_days_remaining_exact() {
        let now = reference_time();
        assert_eq!(days_remaining(now + Duration::days(10), now), 10);
    }

    #[test]
    fn test_days_remaining_truncates_partial_days() {
        let now = reference_time();
        assert_eq!(days_remaining(now + Duration::hours(23), now), 0);
        assert_eq!(days_remaining(now + Duration::hours(47), now), 1);
    }

    #[test]
    fn test_days_remaining_negative_when_expired() {
        let now = reference_time();
        assert_eq!(days_remaining(now - Duration::hours(36), now), -1);
        assert_eq!(days_remaining(now - Duration::days(400), now), -400);
        assert_eq!(days_remaining(now - Duration::hours(5), now), 0);
    }

    #[test]
    fn test_from_x509_extracts_names_and_expiry() {
        let expiry = reference_time() + Duration::days(90);
        let (x509, _) = mint("example.com", "Test Issuer", expiry);

        let cert = Certificate::from_x509(&x509, Source::File(PathBuf::from("a.pem"))).unwrap();

        assert_eq!(cert.common_name, "example.com");
        assert_eq!(cert.subject, "CN=example.com,O=Example Org,C=US");
        assert_eq!(cert.issuer, "CN=Test Issuer,O=Test CA");
        assert_eq!(cert.not_after, expiry);
        assert_eq!(cert.days_remaining(reference_time()), 90);
        assert!(!cert.is_expired(reference_time()));
    }

    #[test]
    fn test_used_ip_only_for_network_source() {
        let (x509, _) = mint("example.com", "Test Issuer", reference_time());
        let ip: IpAddr = "192.0.2.1".parse().unwrap();

        let fetched = Certificate::from_x509(&x509, Source::Network(ip)).unwrap();
        let loaded = Certificate::from_x509(&x509, Source::File(PathBuf::from("c.pem"))).unwrap();

        assert_eq!(fetched.used_ip(), Some(ip));
        assert_eq!(loaded.used_ip(), None);
    }

    #[test]
    fn test_escape_value() {
        assert_eq!(escape_value("Acme, Inc."), "Acme\\, Inc.");
        assert_eq!(escape_value("plain"), "plain");
        assert_eq!(escape_value("#tag"), "\\#tag");
        assert_eq!(escape_value(" padded "), "\\ padded\\ ");
        assert_eq!(escape_value("mid#dle"), "mid#dle");
        assert_eq!(escape_value("a\0b"), "a\\00b");
    }

    #[test]
    fn test_interior_nul_is_kept_and_escaped() {
        let (x509, _) = test_support::mint_with_subject(
            &[(Nid::COMMONNAME, "good.com\0.evil.com")],
            reference_time(),
        );

        let cert = Certificate::from_x509(&x509, Source::File(PathBuf::from("n.pem"))).unwrap();

        assert_eq!(cert.common_name, "good.com\\00.evil.com");
        assert_eq!(cert.subject, "CN=good.com\\00.evil.com");
    }

    #[test]
    fn test_source_display() {
        assert_eq!(Source::File(PathBuf::from("x")).to_string(), "file");
        assert_eq!(Source::Network("::1".parse().unwrap()).to_string(), "network");
    }
}
