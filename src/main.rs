use clap::{CommandFactory, Parser};
use sslwatch::acquire::{acquire, NetworkFetcher, PemFileLoader};
use sslwatch::cli::{normalize_args, Args, Options};
use sslwatch::config::Config;
use sslwatch::report::{CertificatePrinter, TextPrinter};
use std::io::{self, Write};
use std::process::exit;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse_from(normalize_args(std::env::args_os()));

    if args.generate_config {
        print!("{}", Config::example_toml());
        exit(0);
    }

    let file_config = match Config::discover(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {}", err);
            exit(1);
        }
    };
    let loaded_file = file_config.is_some();
    let config = Config::defaults()
        .merge_with(file_config.unwrap_or_default())
        .merge_with(args.config_layer());

    init_logging(config.log_level());
    debug!(loaded_file, ?config, "configuration resolved");

    let options = Options::resolve(&args, &config);
    if let Err(err) = options.validate() {
        eprintln!("{}\n", err);
        eprintln!("{}", Args::command().render_help());
        exit(1);
    }

    let fetcher = NetworkFetcher::with_timeout(options.timeout);
    let certificate = match acquire(&options, &fetcher, &PemFileLoader) {
        Ok(certificate) => certificate,
        Err(err) => {
            eprintln!("Error retrieving certificate: {}", err);
            exit(1);
        }
    };
    info!(
        source = %certificate.source,
        common_name = %certificate.common_name,
        not_after = %certificate.not_after,
        "certificate acquired"
    );

    let printer = TextPrinter::new(options.short);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = printer
        .print(&mut out, &certificate)
        .and_then(|_| out.flush())
    {
        eprintln!("Failed to write report: {}", err);
        exit(1);
    }
}

/// Logs go to stderr so stdout carries only the report. `RUST_LOG`
/// overrides the configured level.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
