//! Hash helpers (blake3, hex).

use std::fs;
use std::path::{Path, PathBuf};

use blake3::Hasher;
use serde_json::Value;

use super::to_canonical_json;
use crate::errors::{fs_error, DeployResult};

/// Hashea un string y devuelve hex.
pub fn hash_str(input: &str) -> String {
    let mut h = Hasher::new();
    h.update(input.as_bytes());
    h.finalize().to_hex().to_string()
}

/// Hash del JSON canonicalizado (independiente del orden de claves).
pub fn hash_value(value: &Value) -> String {
    hash_str(&to_canonical_json(value))
}

/// Fingerprint de un árbol de directorios: rutas relativas ordenadas + bytes
/// de cada archivo. Dos árboles con el mismo contenido producen el mismo hash.
pub fn hash_dir(root: &Path) -> DeployResult<String> {
    let mut files = Vec::new();
    collect_files(root, root, &mut files)?;
    files.sort();

    let mut h = Hasher::new();
    for rel in files {
        let full = root.join(&rel);
        let bytes = fs::read(&full).map_err(fs_error(&full))?;
        h.update(rel.to_string_lossy().as_bytes());
        h.update(&[0]);
        h.update(&(bytes.len() as u64).to_le_bytes());
        h.update(&bytes);
    }
    Ok(h.finalize().to_hex().to_string())
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> DeployResult<()> {
    for entry in fs::read_dir(dir).map_err(fs_error(dir))? {
        let entry = entry.map_err(fs_error(dir))?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, out)?;
        } else if let Ok(rel) = path.strip_prefix(root) {
            out.push(rel.to_path_buf());
        }
    }
    Ok(())
}
