//! chain-core: piezas compartidas por los engines de red y de contratos.
//!
//! - `errors`: taxonomía `DeployError` y `DeployResult`.
//! - `config`: modelo y validación de la configuración, layout de filesystem.
//! - `portal`: `PortalStore`, el almacén JSON que une invocaciones.
//! - `process`: `Runner` (costura inyectable) y `TokioRunner`.
//! - `hashing`: JSON canónico y fingerprints blake3.

pub mod config;
pub mod errors;
pub mod hashing;
pub mod portal;
pub mod process;

pub use config::{ContractsConfig, DeployConfig, DeployLayout, MigrationConfig, MigrationStepConfig, ModuleConfig,
                 NetworkConfig, NodeKind, Protocol, ProviderConfig, Validate};
pub use errors::{fs_error, DeployError, DeployResult};
pub use portal::PortalStore;
pub use process::{run_checked, Invocation, ProcessOutput, Runner, TokioRunner};

/// Clave de portal publicada por el engine de red.
pub const NETWORK_PORTAL_KEY: &str = "network.json";
