//! `PortalInjector`: publica los artifacts compilados de un módulo en el
//! portal de contratos como una única entrada `<module>.json`.
//!
//! Semántica de reemplazo: la entrada previa del módulo se borra antes de
//! escribir la nueva, nunca se mezclan.

use std::fs;
use std::path::Path;

use chain_core::hashing::hash_value;
use chain_core::{fs_error, DeployResult, PortalStore};
use serde_json::{Map, Value};
use tracing::info;

#[derive(Debug, Clone)]
pub struct PortalInjector {
    portal: PortalStore,
}

impl PortalInjector {
    pub fn new(portal: PortalStore) -> Self {
        Self { portal }
    }

    pub fn portal(&self) -> &PortalStore {
        &self.portal
    }

    /// Clave del módulo en el portal.
    pub fn key(module: &str) -> String {
        format!("{module}.json")
    }

    /// Lee `build_dir/contracts/*.json`, los indexa por nombre de archivo sin
    /// extensión y publica el objeto resultante. Devuelve su fingerprint.
    pub fn publish(&self, build_dir: &Path, module: &str) -> DeployResult<String> {
        let entry = collect_contracts(&build_dir.join("contracts"))?;
        let count = entry.len();
        let entry = Value::Object(entry);

        let key = Self::key(module);
        self.portal.remove(&key)?;
        self.portal.write(&key, &entry)?;

        let fp = hash_value(&entry);
        info!(module, contracts = count, fingerprint = %fp, "artifacts published to portal");
        Ok(fp)
    }
}

fn collect_contracts(dir: &Path) -> DeployResult<Map<String, Value>> {
    let mut out = Map::new();
    for entry in fs::read_dir(dir).map_err(fs_error(dir))? {
        let path = entry.map_err(fs_error(dir))?.path();
        if !path.is_file() || !path.extension().is_some_and(|e| e == "json") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let raw = fs::read_to_string(&path).map_err(fs_error(&path))?;
        out.insert(name.to_string(), serde_json::from_str(&raw)?);
    }
    Ok(out)
}
