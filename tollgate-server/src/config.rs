//! Server configuration and CLI argument parsing
//!
//! Settings are layered, lowest priority first:
//! 1. Built-in defaults
//! 2. Configuration file (`--config`, TOML/YAML/JSON by extension)
//! 3. Environment variables (with TOLLGATE_ prefix)
//! 4. CLI arguments
//!
//! # Example Usage
//!
//! ```bash
//! # Using CLI arguments
//! tollgate --port 9090 --rate 50 --burst 100
//!
//! # Using environment variables
//! export TOLLGATE_RATE=5
//! export TOLLGATE_EXPIRES_IN=600
//! tollgate
//!
//! # File with CLI override
//! tollgate --config tollgate.toml --port 9090
//! ```
//!
//! The limiter parameters go through [`BucketConfig`], so a zero or negative
//! rate, burst or expiry silently selects the library default rather than
//! failing requests later.

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tollgate::BucketConfig;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_STORE_CAPACITY: usize = 100_000;
const MAX_STORE_CAPACITY: usize = 100_000_000;
const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration structure for the server
#[derive(Debug, Clone)]
pub struct Config {
    /// Listener configuration
    pub http: HttpConfig,
    /// Admission limiter configuration
    pub limiter: LimiterConfig,
    /// Take the client identifier from X-Forwarded-For / X-Real-IP
    pub trust_proxy_headers: bool,
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
}

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host address to bind to (e.g., "0.0.0.0")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

/// Admission limiter configuration
#[derive(Debug, Clone)]
pub struct LimiterConfig {
    /// Resolved bucket parameters
    pub bucket: BucketConfig,
    /// Number of client identifiers to pre-allocate room for
    pub capacity: usize,
}

/// Values read from a configuration file
///
/// Every key is optional; missing keys fall through to defaults.
///
/// ```toml
/// rate = 20.0
/// burst = 40
/// expires_in_secs = 180
/// host = "0.0.0.0"
/// port = 8080
/// trust_proxy_headers = true
/// log_level = "info"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub rate: Option<f64>,
    pub burst: Option<u32>,
    pub expires_in_secs: Option<u64>,
    pub store_capacity: Option<usize>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub trust_proxy_headers: Option<bool>,
    pub log_level: Option<String>,
}

/// Command-line arguments for the server
///
/// All arguments can also be set via environment variables with the
/// TOLLGATE_ prefix. CLI arguments take precedence over environment
/// variables, which take precedence over the config file.
#[derive(Parser, Debug, Default)]
#[command(
    name = "tollgate",
    about = "Per-client token bucket admission in front of an HTTP service",
    long_about = "Admits or rejects each HTTP request by client IP using a token bucket per client.\n\nEnvironment variables with TOLLGATE_ prefix are supported. CLI arguments take precedence over environment variables, which take precedence over the config file."
)]
pub struct Args {
    #[arg(
        long,
        value_name = "FILE",
        help = "Configuration file (toml, yaml or json)",
        env = "TOLLGATE_CONFIG"
    )]
    pub config: Option<PathBuf>,

    // HTTP listener
    #[arg(
        long,
        value_name = "HOST",
        help = "HTTP host [default: 127.0.0.1]",
        env = "TOLLGATE_HOST"
    )]
    pub host: Option<String>,
    #[arg(
        long,
        value_name = "PORT",
        help = "HTTP port [default: 8080]",
        env = "TOLLGATE_PORT"
    )]
    pub port: Option<u16>,

    // Limiter
    #[arg(
        long,
        value_name = "TOKENS",
        help = "Tokens refilled per second [default: 20]",
        env = "TOLLGATE_RATE"
    )]
    pub rate: Option<f64>,
    #[arg(
        long,
        value_name = "TOKENS",
        help = "Burst capacity [default: rate rounded]",
        env = "TOLLGATE_BURST"
    )]
    pub burst: Option<u32>,
    #[arg(
        long,
        value_name = "SECS",
        help = "Seconds of inactivity before a client is forgotten [default: 180]",
        env = "TOLLGATE_EXPIRES_IN"
    )]
    pub expires_in: Option<u64>,
    #[arg(
        long,
        value_name = "SIZE",
        help = "Initial store capacity [default: 100000]",
        env = "TOLLGATE_STORE_CAPACITY"
    )]
    pub store_capacity: Option<usize>,

    // Client identification
    #[arg(
        long,
        value_name = "BOOL",
        help = "Identify clients by X-Forwarded-For / X-Real-IP [default: false]",
        num_args = 0..=1,
        default_missing_value = "true",
        env = "TOLLGATE_TRUST_PROXY_HEADERS"
    )]
    pub trust_proxy_headers: Option<bool>,

    // General options
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace [default: info]",
        env = "TOLLGATE_LOG_LEVEL"
    )]
    pub log_level: Option<String>,

    // Utility options
    #[arg(
        long,
        help = "List all environment variables and exit",
        action = clap::ArgAction::SetTrue
    )]
    pub list_env_vars: bool,
}

impl Config {
    /// Build configuration from the config file, environment variables and
    /// CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file cannot be read or parsed
    /// - The host is not an IP address
    /// - The log level is unknown
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        if args.list_env_vars {
            Self::print_env_vars();
            std::process::exit(0);
        }

        let file = match &args.config {
            Some(path) => Some(load_file(path)?),
            None => None,
        };

        Self::from_sources(args, file.unwrap_or_default())
    }

    /// Merge already-parsed arguments over file values and defaults
    pub fn from_sources(args: Args, file: FileConfig) -> Result<Self> {
        let bucket = BucketConfig::new(
            args.rate.or(file.rate).unwrap_or(0.0),
            args.burst.or(file.burst).unwrap_or(0),
            Duration::from_secs(args.expires_in.or(file.expires_in_secs).unwrap_or(0)),
        );

        let config = Config {
            http: HttpConfig {
                host: args
                    .host
                    .or(file.host)
                    .unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
            },
            limiter: LimiterConfig {
                bucket,
                capacity: args
                    .store_capacity
                    .or(file.store_capacity)
                    .unwrap_or(DEFAULT_STORE_CAPACITY),
            },
            trust_proxy_headers: args
                .trust_proxy_headers
                .or(file.trust_proxy_headers)
                .unwrap_or(false),
            log_level: args
                .log_level
                .or(file.log_level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
                .to_lowercase(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Socket address the HTTP listener binds to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .http
            .host
            .parse()
            .map_err(|_| anyhow!("Invalid host: {} (expected an IP address)", self.http.host))?;
        Ok(SocketAddr::new(ip, self.http.port))
    }

    fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level: {}. Valid options are: {}",
                self.log_level,
                LOG_LEVELS.join(", ")
            ));
        }

        if self.limiter.capacity > MAX_STORE_CAPACITY {
            return Err(anyhow!(
                "Store capacity {} is too large (maximum {})",
                self.limiter.capacity,
                MAX_STORE_CAPACITY
            ));
        }

        Ok(())
    }

    /// Print all available environment variables and their descriptions
    fn print_env_vars() {
        println!("Tollgate Environment Variables");
        println!("==============================");
        println!();
        println!("All environment variables use the TOLLGATE_ prefix.");
        println!("CLI arguments take precedence over environment variables.");
        println!();

        println!("Listener:");
        println!("  TOLLGATE_HOST=<host>                  HTTP host [default: 127.0.0.1]");
        println!("  TOLLGATE_PORT=<port>                  HTTP port [default: 8080]");
        println!();

        println!("Limiter:");
        println!("  TOLLGATE_RATE=<tokens>                Tokens refilled per second [default: 20]");
        println!("  TOLLGATE_BURST=<tokens>               Burst capacity [default: rate]");
        println!(
            "  TOLLGATE_EXPIRES_IN=<secs>            Idle seconds before a client is forgotten [default: 180]"
        );
        println!(
            "  TOLLGATE_STORE_CAPACITY=<size>        Initial store capacity [default: 100000]"
        );
        println!(
            "  TOLLGATE_TRUST_PROXY_HEADERS=<bool>   Use X-Forwarded-For / X-Real-IP [default: false]"
        );
        println!();

        println!("General Configuration:");
        println!("  TOLLGATE_CONFIG=<file>                Configuration file (toml, yaml, json)");
        println!(
            "  TOLLGATE_LOG_LEVEL=<level>            Log level: error, warn, info, debug, trace [default: info]"
        );
        println!();

        println!("Examples:");
        println!("  # 5 requests per second, bursts of 10");
        println!("  export TOLLGATE_RATE=5");
        println!("  export TOLLGATE_BURST=10");
        println!();
        println!("  # Run server (CLI args override env vars)");
        println!("  tollgate --port 9090");
    }
}

/// Read a configuration file; the format follows the file extension
pub fn load_file(path: &Path) -> Result<FileConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .build()
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    settings
        .try_deserialize()
        .with_context(|| format!("Invalid config file {}", path.display()))
}
