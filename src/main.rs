//! shadowsocks-l4: configuration checker for the Shadowsocks layer-4 handler
//!
//! Loads a handler configuration, builds the cipher registry exactly as the
//! host would at provisioning time, and reports the usable keys.
//!
//! # Usage
//!
//! ```bash
//! # Check the default configuration
//! shadowsocks-l4
//!
//! # Check a custom configuration
//! shadowsocks-l4 -c /path/to/config.json --check
//!
//! # Run with environment overrides
//! SS_L4_LOG_LEVEL=debug shadowsocks-l4
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

use shadowsocks_l4::cipher::CipherRegistry;
use shadowsocks_l4::config::{load_config_with_env, Config};

/// Command-line arguments
struct Args {
    /// Configuration file path
    config_path: PathBuf,
    /// Generate default configuration
    generate_config: bool,
    /// Check configuration only
    check_config: bool,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config_path = PathBuf::from("/etc/shadowsocks-l4/config.json");
        let mut generate_config = false;
        let mut check_config = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-c" | "--config" => {
                    if let Some(path) = args.next() {
                        config_path = PathBuf::from(path);
                    }
                }
                "-g" | "--generate-config" => {
                    generate_config = true;
                }
                "--check" => {
                    check_config = true;
                }
                "-h" | "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "-v" | "--version" => {
                    println!("shadowsocks-l4 v{}", shadowsocks_l4::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {arg}");
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        Self {
            config_path,
            generate_config,
            check_config,
        }
    }
}

fn print_help() {
    println!(
        r#"shadowsocks-l4 v{}

Validate a multi-user Shadowsocks handler configuration.

USAGE:
    shadowsocks-l4 [OPTIONS]

OPTIONS:
    -c, --config <PATH>     Configuration file path [default: /etc/shadowsocks-l4/config.json]
    -g, --generate-config   Generate default configuration and exit
    --check                 Check configuration and exit
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT:
    SS_L4_LOG_LEVEL         Override log level (trace, debug, info, warn, error)
    SS_L4_LOG_FORMAT        Override log format (text, json)
"#,
        shadowsocks_l4::VERSION
    );
}

/// Build the log subscriber described by the `log` section
fn log_subscriber<W>(config: &Config, writer: W) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let level = match config.log.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.log.target)
        .with_writer(writer);

    if config.log.format == "json" {
        Box::new(builder.json().finish())
    } else {
        Box::new(builder.finish())
    }
}

/// Initialize logging
fn init_logging(config: &Config) -> Result<()> {
    tracing::subscriber::set_global_default(log_subscriber(config, std::io::stdout))
        .context("Failed to install log subscriber")
}

/// Build the cipher registry the way provisioning does
fn build_registry(config: &Config) -> Result<CipherRegistry> {
    CipherRegistry::build(&config.shadowsocks.keys).context("Failed to build cipher registry")
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.generate_config {
        shadowsocks_l4::config::create_default_config(&args.config_path)?;
        println!("Generated default configuration at {:?}", args.config_path);
        return Ok(());
    }

    let config = load_config_with_env(&args.config_path)
        .with_context(|| format!("Failed to load configuration from {:?}", args.config_path))?;

    // Registry warnings matter in check mode too
    init_logging(&config)?;
    info!("shadowsocks-l4 v{}", shadowsocks_l4::VERSION);
    info!("Configuration loaded from {:?}", args.config_path);

    let registry = build_registry(&config)?;

    if args.check_config {
        println!("Configuration is valid");
        return Ok(());
    }

    println!(
        "{} of {} configured keys usable",
        registry.len(),
        config.shadowsocks.keys.len()
    );
    for entry in &registry {
        println!("  {:<24} {}", entry.id(), entry.method());
    }
    for (method, count) in registry.method_counts() {
        info!(%method, count, "Cipher method in use");
    }

    Ok(())
}
