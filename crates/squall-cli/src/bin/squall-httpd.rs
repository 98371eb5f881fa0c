//! Routed HTTP app server launcher.
//!
//! Serves the tracker registry routes plus static content from the
//! given root. The core consumes only the resolved (ip, port, routes)
//! triple built here.

use clap::Parser;
use squall_core::{App, ServerConfig};
use squall_tracker::Tracker;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "squall-httpd", about = "Routed HTTP app server")]
struct Args {
    /// IP address to bind
    #[arg(long, default_value = "0.0.0.0")]
    server_ip: IpAddr,

    /// Port to listen on
    #[arg(long, default_value_t = 8000)]
    server_port: u16,

    /// Base directory holding www/, static/ and apps/
    #[arg(long, default_value = ".")]
    content_root: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    squall_cli::init_tracing();
    let args = Args::parse();

    let tracker = Arc::new(Tracker::new());
    let app = squall_tracker::routes(
        App::with_config(ServerConfig::with_base(&args.content_root)),
        tracker,
    );

    let addr = SocketAddr::new(args.server_ip, args.server_port);
    tracing::info!(%addr, root = %args.content_root.display(), "squall-httpd starting");
    app.serve(addr).await?;
    Ok(())
}
