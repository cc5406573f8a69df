//! Chainflow Rust Library
//!
//! Fachada del workspace de despliegue:
//! - `chain_core`: configuración, errores, portales, procesos y hashing.
//! - `chain_network`: `NetworkEngine` (contenedores, liveness, identidad).
//! - `chain_contracts`: `ContractsEngine` (builds, migraciones, portal).
//!
//! La CLI (`chainflow`) vive en `crates/chain-cli`.

pub use chain_contracts;
pub use chain_core;
pub use chain_network;

pub use chain_contracts::{ContractsEngine, RunReport};
pub use chain_core::{DeployConfig, DeployError, DeployLayout, DeployResult};
pub use chain_network::NetworkEngine;
