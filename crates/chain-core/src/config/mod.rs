//! Modelo de configuración del despliegue.
//!
//! - `network`: nodo objetivo (`NetworkConfig`) y su config de proveedor.
//! - `contracts`: módulos y migraciones (`ContractsConfig`).
//! - `layout`: raíces de filesystem (`DeployLayout`) leídas de entorno/.env.
//!
//! La validación estructural vive en el trait `Validate`: devuelve
//! `DeployError::ConfigValidation { at, message }` apuntando al campo culpable.

pub mod contracts;
pub mod layout;
pub mod network;

use serde::{Deserialize, Serialize};

use crate::errors::DeployResult;

pub use contracts::{ContractsConfig, MigrationConfig, MigrationStepConfig, ModuleConfig, TruffleStep, ScriptStep};
pub use layout::DeployLayout;
pub use network::{GanacheConfig, GethConfig, NetworkConfig, NodeKind, Protocol, ProviderConfig, RemoteConfig};

/// Validador de configuración.
pub trait Validate {
    fn validate(&self) -> DeployResult<()>;
}

/// Archivo de despliegue completo: `{ "network": .., "contracts": .. }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    pub network: NetworkConfig,
    #[serde(default)]
    pub contracts: ContractsConfig,
}

impl DeployConfig {
    pub fn from_json(raw: &str) -> DeployResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl Validate for DeployConfig {
    fn validate(&self) -> DeployResult<()> {
        self.network.validate()?;
        self.contracts.validate()
    }
}
