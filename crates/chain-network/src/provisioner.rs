//! Aprovisionamiento de nodos locales en contenedores.
//!
//! Dos perfiles:
//! - ganache (arranque rápido): se crea, se arranca y se devuelve el control.
//!   La disponibilidad queda a cargo del bucle de liveness del engine.
//! - geth (arranque lento): tras arrancar ejecuta su propio protocolo de
//!   espera (`GethReadiness`): coinbase disponible, espera de desbloqueo de
//!   cuentas y una transacción de valor cero minada.

use std::sync::Arc;
use std::time::Duration;

use chain_core::config::{GanacheConfig, GethConfig};
use chain_core::{DeployResult, NetworkConfig, ProviderConfig};
use tracing::{info, warn};

use crate::docker::{ContainerClient, ContainerSpec};
use crate::rpc::NodeRpc;

/// Puerto JSON-RPC dentro del contenedor.
pub const NODE_RPC_PORT: u16 = 8545;

/// Protocolo de espera propio de geth: "espera producción de bloques".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GethReadiness {
    pub coinbase_poll: Duration,
    pub unlock_wait: Duration,
    pub receipt_poll: Duration,
}

impl Default for GethReadiness {
    fn default() -> Self {
        Self { coinbase_poll: Duration::from_secs(30),
               unlock_wait: Duration::from_secs(30),
               receipt_poll: Duration::from_secs(5) }
    }
}

impl GethReadiness {
    pub async fn wait(&self, rpc: &dyn NodeRpc) -> DeployResult<()> {
        let coinbase = loop {
            match rpc.coinbase().await {
                Ok(Some(addr)) => break addr,
                Ok(None) => info!("coinbase not available yet"),
                Err(e) => info!(error = %e, "coinbase not available yet"),
            }
            tokio::time::sleep(self.coinbase_poll).await;
        };
        info!(%coinbase, "coinbase available, waiting for account unlock");
        tokio::time::sleep(self.unlock_wait).await;

        // Una transacción minada garantiza que la generación del DAG terminó.
        let tx = rpc.send_transaction(&coinbase, &coinbase, 0).await?;
        info!(%tx, "waiting for dummy transaction to be mined");
        while rpc.transaction_receipt(&tx).await?.is_none() {
            tokio::time::sleep(self.receipt_poll).await;
        }
        info!(%tx, "dummy transaction mined, node is producing blocks");
        Ok(())
    }
}

pub struct DockerNodeProvisioner {
    containers: Arc<dyn ContainerClient>,
    rpc: Arc<dyn NodeRpc>,
    geth: GethReadiness,
}

impl DockerNodeProvisioner {
    pub fn new(containers: Arc<dyn ContainerClient>, rpc: Arc<dyn NodeRpc>) -> Self {
        Self { containers,
               rpc,
               geth: GethReadiness::default() }
    }

    pub fn with_geth_readiness(mut self, geth: GethReadiness) -> Self {
        self.geth = geth;
        self
    }

    /// Descarga la imagen; los errores de pull se propagan.
    pub async fn pull_image(&self, image: &str, version: &str) -> DeployResult<()> {
        info!(image, version, "pulling image");
        self.containers.pull(image, version).await?;
        info!(image, version, "image pulled");
        Ok(())
    }

    /// Aprovisiona según el perfil. Devuelve el nombre del contenedor creado,
    /// o `None` para nodos remotos.
    pub async fn provision(&self, cfg: &NetworkConfig, provider: &ProviderConfig) -> DeployResult<Option<String>> {
        match provider {
            ProviderConfig::Ganache(g) => {
                self.pull_image(&g.image, &g.version).await?;
                let spec = ganache_spec(cfg, g);
                self.create_and_start(&spec).await?;
                Ok(Some(spec.name))
            }
            ProviderConfig::Geth(g) => {
                self.pull_image(&g.image, &g.version).await?;
                let spec = geth_spec(cfg, g);
                self.create_and_start(&spec).await?;
                self.geth.wait(self.rpc.as_ref()).await?;
                Ok(Some(spec.name))
            }
            ProviderConfig::Remote(_) => Ok(None),
        }
    }

    async fn create_and_start(&self, spec: &ContainerSpec) -> DeployResult<()> {
        let id = self.containers.create(spec).await?;
        self.containers.start(&id).await?;
        info!(container = %spec.name, %id, "container started");
        Ok(())
    }

    /// Mata el contenedor si existe. Nunca falla: un contenedor ausente o un
    /// error del cliente sólo se registran.
    pub async fn kill(&self, name: &str) {
        match self.containers.kill(name).await {
            Ok(outcome) => info!(container = name, ?outcome, "container kill"),
            Err(e) => warn!(container = name, error = %e, "container kill failed, ignoring"),
        }
    }
}

/// Perfil ganache: parámetros de la cadena como argumentos del comando.
pub fn ganache_spec(cfg: &NetworkConfig, g: &GanacheConfig) -> ContainerSpec {
    ContainerSpec { name: g.container_name.clone(),
                    image: g.image.clone(),
                    version: g.version.clone(),
                    ports: vec![(cfg.port, NODE_RPC_PORT)],
                    env: vec![],
                    cmd: vec!["--mnemonic".to_string(),
                              g.mnemonic.clone(),
                              "--gasLimit".to_string(),
                              g.gas_limit.to_string(),
                              "--gasPrice".to_string(),
                              g.gas_price.to_string(),
                              "--networkId".to_string(),
                              cfg.network_id.to_string()],
                    auto_remove: true }
}

/// Perfil geth: parámetros vía variables de entorno.
pub fn geth_spec(cfg: &NetworkConfig, g: &GethConfig) -> ContainerSpec {
    ContainerSpec { name: g.container_name.clone(),
                    image: g.image.clone(),
                    version: g.version.clone(),
                    ports: vec![(cfg.port, NODE_RPC_PORT)],
                    env: vec![("MNEMONIC".to_string(), g.mnemonic.clone()),
                              ("ACCOUNTS".to_string(), g.accounts.to_string()),
                              ("NETWORK_ID".to_string(), cfg.network_id.to_string())],
                    cmd: vec![],
                    auto_remove: true }
}
