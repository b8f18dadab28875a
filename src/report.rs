//! Text output for an acquired certificate.

use crate::Certificate;
use chrono::{DateTime, Utc};
use std::io::{self, Write};

/// Same shape as Go's default `time.Time` rendering for a UTC instant.
const EXPIRY_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z UTC";

/// Renders a certificate for the operator.
pub trait CertificatePrinter {
    fn print(&self, out: &mut dyn Write, cert: &Certificate) -> io::Result<()>;
}

/// Line-oriented report, or just the day count in short mode.
///
/// Full mode looks like:
///
/// ```text
/// Certificate for example.com
/// Subject: CN=example.com,O=Example Org,C=US
/// Issuer: CN=Example CA,O=Example Trust
/// Expires on: 2031-06-15 08:30:00 +0000 UTC
/// Days remaining: 42
/// Used IP address: 192.0.2.1
/// ```
///
/// The last line appears only for certificates fetched over the network.
#[derive(Debug, Clone, Copy)]
pub struct TextPrinter {
    short: bool,
    now: DateTime<Utc>,
}

impl TextPrinter {
    /// Counts days from the current time.
    pub fn new(short: bool) -> Self {
        TextPrinter::at(short, Utc::now())
    }

    /// Counts days from a fixed reference time.
    pub fn at(short: bool, now: DateTime<Utc>) -> Self {
        TextPrinter { short, now }
    }
}

impl CertificatePrinter for TextPrinter {
    fn print(&self, out: &mut dyn Write, cert: &Certificate) -> io::Result<()> {
        let days = cert.days_remaining(self.now);

        if self.short {
            return writeln!(out, "{}", days);
        }

        writeln!(out, "Certificate for {}", cert.common_name)?;
        writeln!(out, "Subject: {}", cert.subject)?;
        writeln!(out, "Issuer: {}", cert.issuer)?;
        writeln!(out, "Expires on: {}", cert.not_after.format(EXPIRY_FORMAT))?;
        writeln!(out, "Days remaining: {}", days)?;
        if let Some(ip) = cert.used_ip() {
            writeln!(out, "Used IP address: {}", ip)?;
        }
        Ok(())
    }
}
