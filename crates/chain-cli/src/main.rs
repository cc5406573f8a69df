//! `chainflow`: driver de línea de comandos.
//!
//! Único punto donde un error se vuelve terminal: se registra con su
//! ubicación y el proceso sale con el código de la categoría.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chain_contracts::ContractsEngine;
use chain_core::{fs_error, DeployConfig, DeployLayout, DeployResult, PortalStore, TokioRunner};
use chain_network::{DockerCli, HttpRpc, NetworkEngine, RpcEndpoint};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Orquestador de despliegue: red objetivo y migraciones de contratos.
#[derive(Parser, Debug)]
#[command(name = "chainflow", version, about = "Deploy orchestration for smart-contract modules")]
struct Cli {
    /// Archivo de despliegue (`network` + `contracts`)
    #[arg(short, long, default_value = "deploy.json", global = true)]
    config: PathBuf,
    /// Raíz del layout; los overrides CHAINFLOW_* siguen aplicando
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Crea los directorios de portales y artifacts
    Init,
    /// Aprovisiona/valida la red y publica network.json
    Network {
        #[command(subcommand)]
        action: Action,
    },
    /// Ejecuta las migraciones pendientes y publica los artifacts
    Contracts {
        #[command(subcommand)]
        action: Action,
    },
}

#[derive(Subcommand, Debug)]
enum Action {
    Run {
        /// Nombre de la red objetivo
        #[arg(long)]
        name: String,
    },
    Clean {
        #[arg(long)]
        name: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())))
                                  .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                                  .init();

    let cli = Cli::parse();
    if let Err(e) = dispatch(cli).await {
        error!(at = %e.at(), message = %e, "deployment failed");
        std::process::exit(e.exit_code());
    }
}

async fn dispatch(cli: Cli) -> DeployResult<()> {
    let layout = match &cli.root {
        Some(root) => DeployLayout::from_env_with_root(root),
        None => DeployLayout::from_env(),
    };

    match cli.cmd {
        Cmd::Init => init(&layout),
        Cmd::Network { action } => {
            let cfg = load_config(&cli.config)?;
            let (name, run) = action.split();
            let rpc = Arc::new(HttpRpc::new(&RpcEndpoint::from_config(&cfg.network))?);
            let mut engine = NetworkEngine::new(cfg.network, name, &layout, Arc::new(DockerCli::new(TokioRunner)), rpc)?;
            if run {
                let entry = engine.run().await?;
                info!(%entry, "network.json written");
            } else {
                engine.clean().await?;
            }
            Ok(())
        }
        Cmd::Contracts { action } => {
            let cfg = load_config(&cli.config)?;
            let (name, run) = action.split();
            let engine = ContractsEngine::new(cfg.contracts, name, layout, TokioRunner)?;
            if run {
                let report = engine.run().await?;
                info!(executed = ?report.executed, skipped = ?report.skipped, "contracts deployed");
            } else {
                engine.clean()?;
            }
            Ok(())
        }
    }
}

impl Action {
    /// `(nombre de red, es run)`.
    fn split(self) -> (String, bool) {
        match self {
            Action::Run { name } => (name, true),
            Action::Clean { name } => (name, false),
        }
    }
}

fn load_config(path: &Path) -> DeployResult<DeployConfig> {
    let raw = fs::read_to_string(path).map_err(fs_error(path))?;
    DeployConfig::from_json(&raw)
}

fn init(layout: &DeployLayout) -> DeployResult<()> {
    for dir in [&layout.artifacts, &layout.contracts] {
        fs::create_dir_all(dir).map_err(fs_error(dir))?;
    }
    for portal in [PortalStore::ensure("network", &layout.network_portal)?, PortalStore::ensure("contracts", &layout.contracts_portal)?] {
        info!(domain = portal.domain(), dir = %portal.dir().display(), "portal ready");
    }
    Ok(())
}
