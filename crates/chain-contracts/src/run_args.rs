//! Argumentos transitorios de un paso, consumibles por los scripts de
//! migración del módulo: `<contracts>/run_args.js` con
//! `module.exports = <JSON>;`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chain_core::{fs_error, DeployResult};
use serde_json::Value;

pub const RUN_ARGS_FILE: &str = "run_args.js";

pub fn path(contracts_dir: &Path) -> PathBuf {
    contracts_dir.join(RUN_ARGS_FILE)
}

pub fn render(args: &Value) -> DeployResult<String> {
    Ok(format!("module.exports = {};\n", serde_json::to_string_pretty(args)?))
}

pub fn write(contracts_dir: &Path, args: &Value) -> DeployResult<PathBuf> {
    let file = path(contracts_dir);
    fs::write(&file, render(args)?).map_err(fs_error(&file))?;
    Ok(file)
}

/// Elimina los argumentos del paso anterior; si no existen no hace nada.
pub fn clear(contracts_dir: &Path) -> DeployResult<()> {
    let file = path(contracts_dir);
    match fs::remove_file(&file) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(fs_error(&file)(e)),
    }
}
