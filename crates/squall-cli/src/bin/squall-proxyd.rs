//! Reverse-proxy launcher.
//!
//! Reads the virtual-host config file, builds the immutable table and
//! hands it to the proxy accept loop.

use clap::Parser;
use squall_core::{proxy, ProxyConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "squall-proxyd", about = "Virtual-host reverse proxy")]
struct Args {
    /// IP address to bind
    #[arg(long, default_value = "0.0.0.0")]
    server_ip: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = 8080)]
    server_port: u16,

    /// Virtual-host definition file
    #[arg(long, default_value = "config/proxy.conf")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    squall_cli::init_tracing();
    let args = Args::parse();

    let hosts = squall_cli::parse_virtual_hosts(&args.config)?;
    let addr = SocketAddr::new(args.server_ip, args.server_port);
    tracing::info!(%addr, config = %args.config.display(), "squall-proxyd starting");

    proxy::run(Arc::new(hosts), addr, ProxyConfig::default()).await?;
    Ok(())
}
