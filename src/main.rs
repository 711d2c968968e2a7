//! # dns-proxy-store
//!
//! Bootstrap and inspection binary for the DNS proxy configuration store.
//!
//! The default run materializes the configuration file (creating it with
//! default content when absent) and logs a summary, following the same
//! initialization path an embedding proxy performs at startup. `--check`
//! validates an existing file without touching the disk.
//!
//! ## Usage
//!
//! ```bash
//! # Bootstrap or load the default conf/config.json
//! dns-proxy-store
//!
//! # Use a custom location
//! dns-proxy-store -c /var/lib/dns-proxy/config.json
//!
//! # Validate an existing file
//! dns-proxy-store --check -c config.json
//!
//! # Increase verbosity
//! dns-proxy-store -vv
//! ```

use clap::Parser;
use dns_proxy_store::error::{Result, StoreError};
use dns_proxy_store::logging::{self, LogFormat, LogOptions};
use dns_proxy_store::store::{self, ConfigStore, DEFAULT_CONFIG_PATH};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Persistent environment and hostname-override configuration store for a
/// DNS resolution proxy.
#[derive(Parser, Debug)]
#[command(name = "dns-proxy-store")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "DNS_PROXY_STORE_CONFIG")]
    config: Option<PathBuf>,

    /// Validate an existing configuration file without creating one
    #[arg(long)]
    check: bool,

    /// Log format: pretty, compact, or json
    #[arg(long, default_value = "pretty")]
    log_format: LogFormat,

    /// Log destination: stdout, stderr, or a file path
    #[arg(long, default_value = "stdout")]
    log_output: String,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (only errors)
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    /// Converts verbosity count to log level string
    fn log_level(&self) -> Option<String> {
        if self.quiet {
            return Some("error".to_string());
        }
        match self.verbose {
            0 => None, // Use default
            1 => Some("debug".to_string()),
            _ => Some("trace".to_string()),
        }
    }
}

/// Application entry point.
fn main() {
    let args = Args::parse();

    let options = LogOptions {
        output: args.log_output.clone(),
        format: args.log_format.clone(),
        ..LogOptions::default()
    };
    let _log_guard = match logging::init_logging(&options, args.log_level()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            std::process::exit(1);
        }
    };

    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    info!(
        version = env!("CARGO_PKG_VERSION"),
        config_path = %path.display(),
        "Starting dns-proxy-store"
    );

    let result = if args.check {
        check(&path)
    } else {
        open_and_report(&path)
    };

    if let Err(e) = result {
        error!(error = %e, "Startup failed");
        std::process::exit(1);
    }
}

/// Loads and decodes an existing file, without bootstrapping a missing one.
fn check(path: &Path) -> Result<()> {
    let bytes = store::load(path)?.ok_or_else(|| {
        StoreError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        ))
    })?;
    let config = store::decode(&bytes)?;

    info!(
        envs = config.envs.len(),
        dns_servers = config.remote_dns_servers.len(),
        active_env = %config.active_env,
        "Configuration file is valid"
    );
    Ok(())
}

/// Opens the store (bootstrapping if needed) and logs its content.
fn open_and_report(path: &Path) -> Result<()> {
    let store = ConfigStore::open(path)?;
    let config = store.snapshot();

    info!(
        envs = config.envs.len(),
        dns_servers = config.remote_dns_servers.len(),
        active_env = %config.active_env,
        "Configuration store ready"
    );
    for env in &config.envs {
        debug!(name = %env.name, hostnames = env.hostnames.len(), "Environment");
    }
    for addr in config.dns_servers() {
        debug!(addr = %addr, "Remote DNS server");
    }
    Ok(())
}
