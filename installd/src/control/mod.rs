use crate::config::{BusKind, Config};
use crate::dbus::LiveOsProxy;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use zbus::Connection;

mod status;
use status::status;

/// Installer payload and subscription daemon
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(help = "Path to installd.toml", long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rescan the live image for installed kernels
    Refresh,
    /// Print the kernel versions found in the live image
    Kernels {
        #[arg(help = "Keep printing the list every time it changes", long)]
        follow: bool,
    },
    /// Check whether the subscription service is available
    Subscription {
        #[arg(help = "Seconds to wait for the service to start", long)]
        timeout: Option<f64>,
    },
}

pub enum Outcome {
    /// No subcommand was given, the daemon should run with this config.
    Daemon(Config),
    /// A subcommand ran to completion.
    Done(ExitCode),
}

pub async fn execute() -> Result<Outcome> {
    let args = Args::parse();
    let (config, _) = Config::load(args.config.as_deref())?;

    let outcome = match args.command {
        Some(Commands::Refresh) => {
            refresh(config.bus.kind).await?;
            Outcome::Done(ExitCode::SUCCESS)
        }
        Some(Commands::Kernels { follow }) => {
            kernels(config.bus.kind, follow).await?;
            Outcome::Done(ExitCode::SUCCESS)
        }
        Some(Commands::Subscription { timeout }) => {
            Outcome::Done(status(config.bus.kind, timeout).await?)
        }
        None => Outcome::Daemon(config),
    };

    Ok(outcome)
}

pub(crate) async fn connect(bus: BusKind) -> Result<Connection> {
    let connection = match bus {
        BusKind::System => Connection::system().await,
        BusKind::Session => Connection::session().await,
    };
    connection.with_context(|| format!("Failed to connect to the {bus:?} bus"))
}

pub async fn refresh(bus: BusKind) -> Result<()> {
    let connection = connect(bus).await?;

    let proxy = LiveOsProxy::new(&connection).await?;

    proxy.refresh().await?;

    info!("Kernel version list refreshed");
    Ok(())
}

pub async fn kernels(bus: BusKind, follow: bool) -> Result<()> {
    let connection = connect(bus).await?;

    let proxy = LiveOsProxy::new(&connection).await?;

    // subscribe first so no change slips in between
    let mut changes = proxy.receive_kernel_version_list_changed().await?;

    let kernel_version_list = proxy.get_kernel_version_list().await?;
    print_kernels(&kernel_version_list);

    if !follow {
        return Ok(());
    }

    while let Some(signal) = changes.next().await {
        let args = signal.args()?;
        print_kernels(&args.kernel_version_list);
    }

    Ok(())
}

fn print_kernels(kernel_version_list: &[String]) {
    if kernel_version_list.is_empty() {
        println!("(no kernels)");
    } else {
        println!("{}", kernel_version_list.join("\n"));
    }
}
