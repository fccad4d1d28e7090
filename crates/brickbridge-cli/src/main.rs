//! Bridge server binary.
//!
//! Binds the device-emulation bridge on the given port and runs until
//! interrupted. The harness points the device-under-test process at the
//! same port and drives the bridge through its own embedding; this binary
//! exists for standalone runs and manual poking.

use std::net::{IpAddr, SocketAddr};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use brickbridge_network::{BridgeConfig, BridgeServer};

#[derive(Parser, Debug)]
#[command(name = "brickbridge", version, about = "Device-emulation bridge for the rig's line protocol")]
struct Args {
    /// TCP port the device-under-test connects to.
    port: u16,

    /// Address to bind.
    #[arg(long, default_value = "127.0.0.1")]
    bind: IpAddr,

    /// Firmware image to push after sensor initialization.
    #[arg(long)]
    firmware: Option<String>,

    /// ROM image path. Accepted for invocation parity with the harness;
    /// the ROM is consumed by the external device launcher, not the bridge.
    #[arg(long)]
    rom: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Some(rom) = &args.rom {
        info!(%rom, "ROM image is loaded by the device process, not the bridge");
    }

    let config = BridgeConfig {
        bind_addr: SocketAddr::new(args.bind, args.port),
        firmware_path: args.firmware,
        ..BridgeConfig::default()
    };

    let server = BridgeServer::bind(config)
        .await
        .context("failed to bind bridge server")?;
    let handle = server.handle();
    let server_task = tokio::spawn(server.run());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutdown requested");
    handle.stop();

    server_task
        .await
        .context("server task panicked")?
        .context("bridge server failed")?;
    Ok(())
}
