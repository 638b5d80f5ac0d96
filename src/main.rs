use anyhow::Result;
use clap::Parser;
use disk_status_exporter::{config::Config, server};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// Port to listen on for metrics
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,

    /// Probe attempts per device per scrape (overrides config)
    #[arg(long, env = "PROBE_ATTEMPTS")]
    attempts: Option<u32>,

    /// Maximum number of devices probed concurrently (overrides config)
    #[arg(long, env = "MAX_CONCURRENCY")]
    max_concurrency: Option<usize>,

    /// Seconds a timed-out device is excluded from probing (overrides config)
    #[arg(long, env = "COOLDOWN_SECONDS")]
    cooldown_seconds: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Disk Status Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;

    // Override with CLI arguments if provided
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if let Some(attempts) = args.attempts {
        config.probe.attempts = attempts;
    }
    if let Some(max_concurrency) = args.max_concurrency {
        config.probe.max_concurrency = max_concurrency;
    }
    if let Some(cooldown_seconds) = args.cooldown_seconds {
        config.probe.cooldown_seconds = cooldown_seconds;
    }
    config.validate()?;

    info!("Configuration loaded successfully");
    info!(
        "Probing with {} attempt(s), {} concurrent, {}s cooldown",
        config.probe.attempts, config.probe.max_concurrency, config.probe.cooldown_seconds
    );
    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    // Start the metrics server
    if let Err(e) = server::start(config).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
