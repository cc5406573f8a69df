//! Progreso persistido de migraciones por red (`<artifacts>/<net>/migration.json`).
//!
//! La lista se añade una vez por migración completada (no por paso) y se
//! persiste inmediatamente: un fallo a mitad de migración pierde sólo esa
//! migración. Una entrada con `status: true` se salta en corridas
//! posteriores mientras el archivo exista.

use std::fs;

use chain_core::{fs_error, DeployError, DeployLayout, DeployResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Registro de historial: un número de script de migración ejecutado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationStep {
    /// Módulo.
    pub name: String,
    /// Se omite del JSON cuando el paso no declaró argumentos.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
    #[serde(rename = "migrationNumber")]
    pub migration_number: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationStatus {
    pub name: String,
    pub status: bool,
    #[serde(default)]
    pub history: Vec<MigrationStep>,
}

#[derive(Debug, Clone)]
pub struct MigrationTracker {
    layout: DeployLayout,
}

impl MigrationTracker {
    pub fn new(layout: DeployLayout) -> Self {
        Self { layout }
    }

    /// Lee la lista de la red, creando directorio y archivo vacío (`[]`) en el
    /// primer uso.
    pub fn load(&self, net: &str) -> DeployResult<Vec<MigrationStatus>> {
        let dir = self.layout.network_archive(net);
        fs::create_dir_all(&dir).map_err(fs_error(&dir))?;
        let file = self.layout.migration_file(net);
        if !file.is_file() {
            fs::write(&file, "[]").map_err(fs_error(&file))?;
        }
        let raw = fs::read_to_string(&file).map_err(fs_error(&file))?;
        serde_json::from_str(&raw).map_err(|e| DeployError::Filesystem { path: file.clone(),
                                                                        message: format!("corrupted migration status: {e}") })
    }

    /// Sobrescribe `migration.json`. El directorio debe seguir existiendo.
    pub fn commit(&self, net: &str, list: &[MigrationStatus]) -> DeployResult<()> {
        let dir = self.layout.network_archive(net);
        if !dir.is_dir() {
            return Err(DeployError::Filesystem { path: dir,
                                                 message: "network archive directory vanished".to_string() });
        }
        let file = self.layout.migration_file(net);
        let body = serde_json::to_string_pretty(list)?;
        fs::write(&file, body).map_err(fs_error(&file))
    }

    pub fn is_complete(list: &[MigrationStatus], name: &str) -> bool {
        list.iter().any(|m| m.name == name && m.status)
    }
}
