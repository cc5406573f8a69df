//! `PortalStore`: almacén clave-valor JSON respaldado por un directorio.
//!
//! Puente entre invocaciones independientes de los engines: el engine de red
//! publica `network.json`, el de contratos lo exige y publica `<module>.json`.
//! Cada clave es un archivo; escribir reemplaza el archivo completo (sin merge).

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::{fs_error, DeployError, DeployResult};

#[derive(Debug, Clone)]
pub struct PortalStore {
    domain: String,
    dir: PathBuf,
}

impl PortalStore {
    /// Abre el portal de `domain`. El directorio debe existir previamente.
    pub fn open(domain: impl Into<String>, dir: impl Into<PathBuf>) -> DeployResult<Self> {
        let domain = domain.into();
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(DeployError::PortalMissing { domain, key: String::new() });
        }
        Ok(Self { domain, dir })
    }

    /// Crea el directorio del portal si hace falta y lo abre.
    pub fn ensure(domain: impl Into<String>, dir: impl Into<PathBuf>) -> DeployResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(fs_error(&dir))?;
        Self::open(domain, dir)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.path_of(key).is_file()
    }

    pub fn read(&self, key: &str) -> DeployResult<Option<Value>> {
        let path = self.path_of(key);
        if !path.is_file() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).map_err(fs_error(&path))?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Como `read`, pero la ausencia de la entrada es un error de hand-off.
    pub fn require(&self, key: &str) -> DeployResult<Value> {
        self.read(key)?.ok_or_else(|| DeployError::PortalMissing { domain: self.domain.clone(),
                                                                    key: key.to_string() })
    }

    pub fn write(&self, key: &str, value: &Value) -> DeployResult<()> {
        let path = self.path_of(key);
        let body = serde_json::to_string_pretty(value)?;
        fs::write(&path, body).map_err(fs_error(&path))?;
        debug!(domain = %self.domain, key, "portal entry written");
        Ok(())
    }

    /// Elimina una entrada; si no existe no hace nada.
    pub fn remove(&self, key: &str) -> DeployResult<()> {
        let path = self.path_of(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(fs_error(&path)(e)),
        }
    }

    /// Claves presentes, ordenadas.
    pub fn keys(&self) -> DeployResult<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(vec![]);
        }
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(fs_error(&self.dir))? {
            let path = entry.map_err(fs_error(&self.dir))?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == "json") {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Limpieza del dominio salvo las claves de `keep`. Un portal vacío o
    /// ausente no es error. Devuelve cuántas entradas se borraron.
    pub fn clean(&self, keep: &[&str]) -> DeployResult<usize> {
        let keys: Vec<String> = self.keys()?.into_iter().filter(|k| !keep.contains(&k.as_str())).collect();
        for key in &keys {
            self.remove(key)?;
        }
        Ok(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn open_requires_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let err = PortalStore::open("network", tmp.path().join("missing")).unwrap_err();
        assert!(matches!(err, DeployError::PortalMissing { ref domain, ref key } if domain == "network" && key.is_empty()));
    }

    #[test]
    fn write_replaces_and_read_returns_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let portal = PortalStore::open("contracts", tmp.path()).unwrap();
        portal.write("core.json", &json!({"A": {"abi": []}, "B": {}})).unwrap();
        portal.write("core.json", &json!({"C": {}})).unwrap();
        assert_eq!(portal.read("core.json").unwrap(), Some(json!({"C": {}})));
        assert_eq!(portal.read("other.json").unwrap(), None);
    }

    #[test]
    fn require_reports_missing_key() {
        let tmp = tempfile::tempdir().unwrap();
        let portal = PortalStore::open("network", tmp.path()).unwrap();
        let err = portal.require("network.json").unwrap_err();
        assert!(matches!(err, DeployError::PortalMissing { ref key, .. } if key == "network.json"));
    }

    #[test]
    fn clean_is_best_effort() {
        let tmp = tempfile::tempdir().unwrap();
        let portal = PortalStore::open("contracts", tmp.path()).unwrap();
        assert_eq!(portal.clean(&[]).unwrap(), 0);
        portal.write("a.json", &json!({})).unwrap();
        portal.write("b.json", &json!({})).unwrap();
        fs::write(tmp.path().join("README"), "keep").unwrap();
        assert_eq!(portal.clean(&[]).unwrap(), 2);
        assert!(portal.keys().unwrap().is_empty());
        assert!(tmp.path().join("README").exists());
        portal.remove("a.json").unwrap();
    }

    #[test]
    fn clean_preserves_kept_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let portal = PortalStore::open("contracts", tmp.path()).unwrap();
        portal.write("network.json", &json!({"network_id": 2702})).unwrap();
        portal.write("core.json", &json!({})).unwrap();
        assert_eq!(portal.clean(&["network.json"]).unwrap(), 1);
        assert_eq!(portal.keys().unwrap(), vec!["network.json".to_string()]);
    }
}
