//! `NetworkEngine`: aprovisiona (o valida) la red y publica `network.json`.
//!
//! La entrada se escribe en el portal de red y se replica en el portal de
//! contratos, que es donde `ContractsEngine` la exige como precondición.
//!
//! Máquina de estados de `run()`:
//! `Idle -> Provisioning -> LivenessRetry -> IdentityCheck -> Persisted`.
//! Cualquier error corta la secuencia y se devuelve al driver, que lo trata
//! como terminal.

use std::sync::Arc;

use chain_core::{DeployLayout, DeployResult, NetworkConfig, PortalStore, ProviderConfig, Validate, NETWORK_PORTAL_KEY};
use serde_json::Value;
use tracing::{info, info_span, Instrument};

use crate::docker::ContainerClient;
use crate::liveness::{check_identity, wait_until_live, RetryPolicy};
use crate::provisioner::{DockerNodeProvisioner, GethReadiness};
use crate::rpc::NodeRpc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    Idle,
    Provisioning,
    LivenessRetry,
    IdentityCheck,
    Persisted,
}

pub struct NetworkEngine {
    name: String,
    config: NetworkConfig,
    provider: ProviderConfig,
    portal: PortalStore,
    contracts_portal: PortalStore,
    provisioner: DockerNodeProvisioner,
    rpc: Arc<dyn NodeRpc>,
    liveness: RetryPolicy,
    state: NetworkState,
}

impl NetworkEngine {
    /// Valida la configuración y exige que existan los portales de red y de
    /// contratos.
    pub fn new(config: NetworkConfig,
               name: impl Into<String>,
               layout: &DeployLayout,
               containers: Arc<dyn ContainerClient>,
               rpc: Arc<dyn NodeRpc>)
               -> DeployResult<Self> {
        config.validate()?;
        let provider = config.provider()?;
        let portal = PortalStore::open("network", &layout.network_portal)?;
        let contracts_portal = PortalStore::open("contracts", &layout.contracts_portal)?;
        let engine = Self { name: name.into(),
                            provisioner: DockerNodeProvisioner::new(containers, rpc.clone()),
                            config,
                            provider,
                            portal,
                            contracts_portal,
                            rpc,
                            liveness: RetryPolicy::default(),
                            state: NetworkState::Idle };
        info!(network = %engine.name, "{}", engine.summary());
        Ok(engine)
    }

    pub fn with_liveness_policy(mut self, policy: RetryPolicy) -> Self {
        self.liveness = policy;
        self
    }

    pub fn with_geth_readiness(mut self, readiness: GethReadiness) -> Self {
        self.provisioner = self.provisioner.with_geth_readiness(readiness);
        self
    }

    pub fn state(&self) -> NetworkState {
        self.state
    }

    /// Resumen legible de la red objetivo.
    pub fn summary(&self) -> String {
        format!("{} node at {}://{}:{} (network_id {})",
                self.config.kind, self.config.protocol, self.config.host, self.config.port, self.config.network_id)
    }

    /// Ejecuta la secuencia completa y devuelve la entrada publicada.
    pub async fn run(&mut self) -> DeployResult<Value> {
        let span = info_span!("network", name = %self.name);
        self.run_inner().instrument(span).await
    }

    async fn run_inner(&mut self) -> DeployResult<Value> {
        self.state = NetworkState::Provisioning;
        match self.provisioner.provision(&self.config, &self.provider).await? {
            Some(container) => info!(%container, "node provisioned"),
            None => info!("remote node, nothing to provision"),
        }

        self.state = NetworkState::LivenessRetry;
        let actual = wait_until_live(self.rpc.as_ref(), self.liveness).await?;

        self.state = NetworkState::IdentityCheck;
        check_identity(self.config.network_id, actual)?;

        let entry = serde_json::to_value(&self.config)?;
        self.portal.write(NETWORK_PORTAL_KEY, &entry)?;
        self.contracts_portal.write(NETWORK_PORTAL_KEY, &entry)?;
        self.state = NetworkState::Persisted;
        info!(outcome = "success", key = NETWORK_PORTAL_KEY, "network ready and published");
        Ok(entry)
    }

    /// Limpieza best-effort: mata el contenedor (si lo hubiera) y retira
    /// `network.json` de ambos portales. No falla cuando no hay nada que
    /// limpiar.
    pub async fn clean(&mut self) -> DeployResult<()> {
        let span = info_span!("network", name = %self.name);
        self.clean_inner().instrument(span).await
    }

    async fn clean_inner(&mut self) -> DeployResult<()> {
        match &self.provider {
            ProviderConfig::Ganache(g) => self.provisioner.kill(&g.container_name).await,
            ProviderConfig::Geth(g) => self.provisioner.kill(&g.container_name).await,
            ProviderConfig::Remote(_) => {}
        }
        self.portal.remove(NETWORK_PORTAL_KEY)?;
        self.contracts_portal.remove(NETWORK_PORTAL_KEY)?;
        self.state = NetworkState::Idle;
        info!("network cleaned");
        Ok(())
    }
}
