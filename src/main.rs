use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use clio::config::{self, SourceArgs};
use clio::manager;
use clio::server;
use clio::Archive;
use tracing::{info, warn};

#[derive(Parser, Clone, Debug)]
#[command(author, version, about = "Read-only HTTP API over the historical record archive", long_about = None)]
struct Args {
    #[command(flatten)]
    source: SourceArgs,

    #[arg(long, env = "CLIO_ADDR", default_value = "127.0.0.1:9000")]
    addr: SocketAddr,

    /// Seconds between background reloads; 0 disables them
    #[arg(long, env = "CLIO_REFRESH_SECS", default_value_t = 60)]
    refresh_secs: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    config::init_tracing("info,clio=info");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?
        .block_on(async_main(args))
}

async fn async_main(args: Args) -> anyhow::Result<()> {
    info!(program = %args.source.program_id, "--- Clio archive node ---");

    let archive = Arc::new(Archive::new(args.source.source(), args.source.program_id));

    // an unreachable node still serves an empty archive
    if let Err(error) = archive.reload().await {
        warn!(%error, "initial load failed");
    }

    if args.refresh_secs > 0 {
        manager::start_refresh_task(archive.clone(), Duration::from_secs(args.refresh_secs));
    }

    let shutdown = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(%error, "could not listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        info!("shutting down");
    };

    server::serve(archive, args.addr, shutdown)
        .await
        .with_context(|| format!("could not serve on {}", args.addr))
}
