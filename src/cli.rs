//! Command-line parsing and input resolution.
//!
//! Flags may be spelled Go-style with a single dash (`-domain example.com`,
//! `-port=8443`) or clap-style with two; [`normalize_args`] rewrites the
//! former before clap sees them.

use crate::config::Config;
use crate::error::{CheckError, Result};
use clap::Parser;
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// Long flag names that are also accepted with a single leading dash.
const LONG_FLAGS: &[&str] = &[
    "domain",
    "certfile",
    "port",
    "ipaddr",
    "short",
    "config",
    "generate-config",
    "version",
    "help",
];

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "sslwatch",
    version,
    about = "Report TLS certificate expiry for a host or a local PEM file"
)]
pub struct Args {
    /// Domain to check the certificate of
    #[arg(long)]
    pub domain: Option<String>,

    /// Path to a local PEM certificate file, used instead of the network
    #[arg(long = "certfile", value_name = "PATH")]
    pub cert_file: Option<String>,

    /// Port to connect to [default: 443]
    #[arg(long)]
    pub port: Option<String>,

    /// IP address to connect to instead of resolving the domain
    #[arg(long)]
    pub ipaddr: Option<String>,

    /// Output only the number of days remaining until certificate expiration
    #[arg(
        long,
        value_name = "BOOL",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub short: Option<bool>,

    /// Configuration file [default: ./sslwatch.toml when present]
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Print an example configuration file and exit
    #[arg(long)]
    pub generate_config: bool,
}

impl Args {
    /// The command-line layer of the configuration.
    pub fn config_layer(&self) -> Config {
        Config::from_cli_args(self.port.clone(), self.ipaddr.clone(), self.short)
    }
}

/// Fully resolved input for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub domain: String,
    pub cert_file: Option<PathBuf>,
    pub port: String,
    pub ipaddr: String,
    pub short: bool,
    pub timeout: Duration,
}

impl Options {
    /// Combines the target flags with the merged configuration. Empty
    /// strings count as not given.
    pub fn resolve(args: &Args, config: &Config) -> Options {
        Options {
            domain: args.domain.clone().unwrap_or_default(),
            cert_file: args
                .cert_file
                .as_deref()
                .filter(|path| !path.is_empty())
                .map(PathBuf::from),
            port: config.port().to_string(),
            ipaddr: config.ipaddr().to_string(),
            short: config.short(),
            timeout: config.timeout(),
        }
    }

    /// Checks that there is something to inspect.
    ///
    /// # Errors
    ///
    /// [`CheckError::MissingTarget`] when both domain and certificate file
    /// are empty.
    pub fn validate(&self) -> Result<()> {
        if self.domain.is_empty() && self.cert_file.is_none() {
            return Err(CheckError::MissingTarget);
        }
        Ok(())
    }
}

/// Rewrites `-name` and `-name=value` into `--name` forms for the flags in
/// [`LONG_FLAGS`]. Everything after a bare `--` is left alone.
pub fn normalize_args<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut passthrough = false;
    args.into_iter()
        .map(|arg| {
            let arg: OsString = arg.into();
            if passthrough {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                passthrough = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split('=').next().unwrap_or(rest);
                    if LONG_FLAGS.contains(&name) {
                        OsString::from(format!("-{}", text))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}
