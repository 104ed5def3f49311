//! Tessera demo service - entry point.

use std::path::PathBuf;

use anyhow::Context;
use tracing::{error, info};

use tessera_config::ConfigLoader;
use tessera_server::{demo_app, AppState, Server};
use tessera_telemetry::init_logging;

const DEFAULT_CONFIG_FILE: &str = "tessera.toml";

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("tessera-demo {}", env!("CARGO_PKG_VERSION"));
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r"Tessera demo - request binding and validation example service

USAGE:
    tessera-demo [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON, default: tessera.toml if present)
    -h, --help             Print help information
    -v, --version          Print version information

ENVIRONMENT VARIABLES:
    TESSERA__SERVER__HTTP_ADDR              Listen address (default: 0.0.0.0:8000)
    TESSERA__SERVER__MAX_BODY_BYTES         Largest accepted body (default: 2097152)
    TESSERA__LOGGING__LEVEL                 Log filter (default: info)
    TESSERA__LOGGING__FORMAT                json or pretty (default: json)
    TESSERA__BINDING__DUPLICATE_SCALAR      first or reject (default: first)
"
    );
}

async fn run(args: Args) -> anyhow::Result<()> {
    let loader = match &args.config {
        Some(path) => ConfigLoader::new()
            .with_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ConfigLoader::new().with_optional_file(DEFAULT_CONFIG_FILE)?,
    };
    let config = loader
        .with_dotenv()
        .with_env_prefix("TESSERA")
        .load()
        .context("invalid configuration")?;

    init_logging(&config.logging).context("failed to initialise logging")?;

    let app = demo_app(&config, AppState::default()).context("invalid route contract")?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        addr = %config.server.http_addr,
        "starting tessera demo"
    );

    Server::new(app, &config.server).run().await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run(Args::parse()).await {
        error!(error = %e, "tessera demo failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
