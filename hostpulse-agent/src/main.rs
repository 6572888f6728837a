//! HostPulse agent binary.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::lookup_host;
use tracing::info;

use hostpulse_agent::agent::Agent;
use hostpulse_agent::config::AgentConfig;
use hostpulse_agent::identity;
use hostpulse_agent::sender::Sender;

#[derive(Parser, Debug)]
#[command(name = "hostpulse-agent")]
#[command(about = "Workstation telemetry agent: samples host metrics and sends them over UDP")]
#[command(version)]
struct Args {
    /// Agent name reported in every record
    name: String,

    /// Collector hostname or IP address
    host: String,

    /// Collector UDP port
    port: u16,

    /// Path to a JSON5 configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Log level override (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Include the per-process list in transmitted records
    #[arg(long)]
    processes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AgentConfig::load(path)
            .with_context(|| format!("Failed to load config from {path}"))?,
        None => AgentConfig::default(),
    };

    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.processes {
        config.collect.process_list = true;
        config.display.processes = true;
    }

    hostpulse_common::init_tracing(&config.logging)?;

    let destination = lookup_host((args.host.as_str(), args.port))
        .await
        .with_context(|| format!("Failed to resolve {}:{}", args.host, args.port))?
        .next()
        .with_context(|| format!("No addresses for {}:{}", args.host, args.port))?;

    let identity = identity::resolve();
    if identity.is_none() {
        info!("no stable host identity available, sending empty uuid");
    }

    let sender = Sender::bind(destination)
        .await
        .context("Failed to bind UDP socket")?;

    let mut agent = Agent::new(args.name, identity, sender, config);

    tokio::select! {
        _ = agent.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("agent stopped");
    Ok(())
}
