//! chain-contracts: pipeline de migraciones de contratos.
//!
//! - `artifacts`: limpieza, recuperación y archivo de builds por red.
//! - `tracker`: progreso persistido (`migration.json`).
//! - `injector`: publicación de artefactos en el portal de contratos.
//! - `run_args`: archivo de argumentos consumido por los scripts de truffle.
//! - `engine`: `ContractsEngine`.

pub mod artifacts;
pub mod engine;
pub mod injector;
pub mod run_args;
pub mod tracker;

pub use artifacts::{ArtifactManager, UPGRADEABLE_PROJECT_FILE};
pub use engine::{ContractsEngine, RunReport};
pub use injector::PortalInjector;
pub use tracker::{MigrationStatus, MigrationStep, MigrationTracker};
