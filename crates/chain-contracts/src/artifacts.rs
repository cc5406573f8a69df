//! Ciclo de vida de los builds de cada módulo.
//!
//! Un build vive en el workspace del módulo (`<contracts>/<m>/build`) o en el
//! archivo por red (`<artifacts>/<net>/<m>/build`). Antes de cada paso el
//! workspace se limpia y, si existe archivo, se recupera; tras migrar, el
//! build se archiva reemplazando por completo el anterior (sin merge). Lo
//! mismo para la metadata upgradeable (`.openzeppelin` ↔ `upgradeable`),
//! salvo `project.json`, que nunca se borra del workspace.

use std::fs;
use std::io;
use std::path::Path;

use chain_core::hashing::hash_dir;
use chain_core::{fs_error, DeployError, DeployLayout, DeployResult};
use tracing::{debug, info};

/// Archivo de metadata upgradeable que sobrevive a toda limpieza.
pub const UPGRADEABLE_PROJECT_FILE: &str = "project.json";

#[derive(Debug, Clone)]
pub struct ArtifactManager {
    layout: DeployLayout,
}

impl ArtifactManager {
    pub fn new(layout: DeployLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &DeployLayout {
        &self.layout
    }

    /// Borra el build del workspace si existe.
    pub fn clear_build(&self, module: &str) -> DeployResult<()> {
        remove_dir_if_exists(&self.layout.module_build(module))
    }

    /// Borra la metadata upgradeable del workspace excepto `project.json`.
    pub fn clear_upgradeable_build(&self, module: &str) -> DeployResult<()> {
        let dir = self.layout.module_upgradeable(module);
        if !dir.is_dir() {
            return Ok(());
        }
        for entry in fs::read_dir(&dir).map_err(fs_error(&dir))? {
            let path = entry.map_err(fs_error(&dir))?.path();
            if path.file_name().is_some_and(|n| n == UPGRADEABLE_PROJECT_FILE) {
                continue;
            }
            if path.is_dir() {
                fs::remove_dir_all(&path).map_err(fs_error(&path))?;
            } else {
                fs::remove_file(&path).map_err(fs_error(&path))?;
            }
        }
        Ok(())
    }

    pub fn check_build_exists(&self, module: &str, net: &str) -> bool {
        self.layout.archived_build(module, net).is_dir()
    }

    /// Copia el build archivado al workspace (ya limpio). Devuelve `false` si
    /// no había archivo.
    pub fn recover_build(&self, module: &str, net: &str) -> DeployResult<bool> {
        let archive = self.layout.archived_build(module, net);
        if !archive.is_dir() {
            return Ok(false);
        }
        copy_dir(&archive, &self.layout.module_build(module))?;
        debug!(module, net, "build recovered from archive");
        Ok(true)
    }

    pub fn recover_upgradeable_build(&self, module: &str, net: &str) -> DeployResult<bool> {
        let archive = self.layout.archived_upgradeable(module, net);
        if !archive.is_dir() {
            return Ok(false);
        }
        copy_dir(&archive, &self.layout.module_upgradeable(module))?;
        debug!(module, net, "upgradeable metadata recovered from archive");
        Ok(true)
    }

    /// Archiva el build del workspace reemplazando el archivo previo.
    /// Devuelve el fingerprint del árbol archivado.
    pub fn save_build(&self, module: &str, net: &str) -> DeployResult<String> {
        let fp = archive(&self.layout.module_build(module), &self.layout.archived_build(module, net))?;
        info!(module, net, fingerprint = %fp, "build archived");
        Ok(fp)
    }

    pub fn save_upgradeable_build(&self, module: &str, net: &str) -> DeployResult<String> {
        let fp = archive(&self.layout.module_upgradeable(module), &self.layout.archived_upgradeable(module, net))?;
        info!(module, net, fingerprint = %fp, "upgradeable metadata archived");
        Ok(fp)
    }
}

fn archive(source: &Path, dest: &Path) -> DeployResult<String> {
    if !source.is_dir() {
        return Err(DeployError::Filesystem { path: source.to_path_buf(),
                                             message: "no build directory to archive".to_string() });
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(fs_error(parent))?;
    }
    remove_dir_if_exists(dest)?;
    copy_dir(source, dest)?;
    hash_dir(dest)
}

fn remove_dir_if_exists(dir: &Path) -> DeployResult<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(fs_error(dir)(e)),
    }
}

/// Copia recursiva `from` → `to` (crea `to`; sobrescribe archivos existentes).
pub(crate) fn copy_dir(from: &Path, to: &Path) -> DeployResult<()> {
    fs::create_dir_all(to).map_err(fs_error(to))?;
    for entry in fs::read_dir(from).map_err(fs_error(from))? {
        let entry = entry.map_err(fs_error(from))?;
        let src = entry.path();
        let dst = to.join(entry.file_name());
        if src.is_dir() {
            copy_dir(&src, &dst)?;
        } else {
            fs::copy(&src, &dst).map_err(fs_error(&src))?;
        }
    }
    Ok(())
}
