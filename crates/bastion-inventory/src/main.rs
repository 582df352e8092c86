mod cli;
mod config;
mod inventory;

use az_control::AzCli;
use clap::Parser;
use cli::Args;
use config::load_tunnels_config;
use process_scan::TerminateOutcome;
use std::io;
use tracing::warn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();
    let args = Args::parse();
    if let Err(err) = run(args).await {
        // One human-readable line, no backtrace.
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    if args.kill_tunnels {
        kill_tunnels();
        return Ok(());
    }
    if args.list_tunnels {
        list_tunnels();
        return Ok(());
    }
    build_inventory(&args).await
}

/// Builds and prints the inventory document. stdout carries the JSON
/// and nothing else; everything diagnostic goes through tracing on
/// stderr.
async fn build_inventory(args: &Args) -> anyhow::Result<()> {
    let az = AzCli::preflight().await?;
    let config = load_tunnels_config(&args.config_file)?;
    let doc = inventory::build(&az, &config).await?;
    println!("{}", doc.render(args.list)?);
    Ok(())
}

fn list_tunnels() {
    let tunnels = process_scan::snapshot();
    if tunnels.is_empty() {
        println!("no active tunnels found");
        return;
    }
    for tunnel in tunnels {
        println!(
            "pid {} [{}] {}",
            tunnel.pid,
            tunnel.status,
            shell_words::join(&tunnel.cmdline)
        );
    }
}

fn kill_tunnels() {
    let tunnels = process_scan::snapshot();
    if tunnels.is_empty() {
        println!("no active tunnels found");
        return;
    }
    for tunnel in tunnels {
        match process_scan::terminate(tunnel.pid) {
            TerminateOutcome::Terminated => println!("terminated tunnel pid {}", tunnel.pid),
            TerminateOutcome::Vanished => {
                warn!(pid = tunnel.pid, "tunnel exited before it could be signalled");
            }
            TerminateOutcome::Failed => {
                warn!(pid = tunnel.pid, "could not signal tunnel");
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);
    tracing_subscriber::registry().with(filter).with(layer).init();
}
