//! Raíces de filesystem del despliegue.
//!
//! Se leen de variables de entorno (con `.env` cargado una sola vez):
//! - `CHAINFLOW_ROOT` (default `.`)
//! - `CHAINFLOW_ARTIFACTS` (default `<root>/artifacts`)
//! - `CHAINFLOW_CONTRACTS` (default `<root>/contracts`)
//! - `CHAINFLOW_NETWORK_PORTAL` (default `<root>/network/portal`)
//! - `CHAINFLOW_CONTRACTS_PORTAL` (default `<root>/contracts/portal`)

use std::env;
use std::path::{Path, PathBuf};

use dotenvy::dotenv;
use once_cell::sync::Lazy;

// `.env` es opcional; se lee como mucho una vez por proceso.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployLayout {
    /// Archivo por red: `<artifacts>/<net>/...`
    pub artifacts: PathBuf,
    /// Workspace de módulos: `<contracts>/<module>/...`
    pub contracts: PathBuf,
    pub network_portal: PathBuf,
    pub contracts_portal: PathBuf,
}

impl DeployLayout {
    /// Layout por defecto bajo `root`.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self { artifacts: root.join("artifacts"),
               contracts: root.join("contracts"),
               network_portal: root.join("network").join("portal"),
               contracts_portal: root.join("contracts").join("portal") }
    }

    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let root = env::var("CHAINFLOW_ROOT").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."));
        Self::from_env_with_root(root)
    }

    /// Como `from_env` pero con una raíz explícita (p. ej. `--root` de la CLI);
    /// los overrides individuales del entorno siguen aplicando.
    pub fn from_env_with_root(root: impl AsRef<Path>) -> Self {
        Lazy::force(&DOTENV_LOADED);
        let base = Self::with_root(root);
        let pick = |var: &str, default: PathBuf| env::var(var).map(PathBuf::from).unwrap_or(default);
        Self { artifacts: pick("CHAINFLOW_ARTIFACTS", base.artifacts),
               contracts: pick("CHAINFLOW_CONTRACTS", base.contracts),
               network_portal: pick("CHAINFLOW_NETWORK_PORTAL", base.network_portal),
               contracts_portal: pick("CHAINFLOW_CONTRACTS_PORTAL", base.contracts_portal) }
    }

    pub fn network_archive(&self, net: &str) -> PathBuf {
        self.artifacts.join(net)
    }

    pub fn migration_file(&self, net: &str) -> PathBuf {
        self.network_archive(net).join("migration.json")
    }

    pub fn module_dir(&self, module: &str) -> PathBuf {
        self.contracts.join(module)
    }

    pub fn module_build(&self, module: &str) -> PathBuf {
        self.module_dir(module).join("build")
    }

    pub fn module_upgradeable(&self, module: &str) -> PathBuf {
        self.module_dir(module).join(".openzeppelin")
    }

    pub fn archived_build(&self, module: &str, net: &str) -> PathBuf {
        self.network_archive(net).join(module).join("build")
    }

    pub fn archived_upgradeable(&self, module: &str, net: &str) -> PathBuf {
        self.network_archive(net).join(module).join("upgradeable")
    }
}
