//! Taxonomía de errores del orquestador.
//!
//! Todas las operaciones de los engines devuelven `DeployResult`. Ninguna
//! termina el proceso por sí misma: el driver de la CLI es el único punto que
//! registra el error a nivel fatal y sale con `exit_code()`.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("invalid configuration at `{at}`: {message}")]
    ConfigValidation { at: String, message: String },
    #[error("portal `{domain}` is missing {}", missing_what(.key))]
    PortalMissing { domain: String, key: String },
    #[error("filesystem error on {}: {message}", .path.display())]
    Filesystem { path: PathBuf, message: String },
    #[error("`{command}` exited with code {code}")]
    ProcessExit { command: String, code: i32 },
    #[error("failed to spawn `{command}`: {message}")]
    Spawn { command: String, message: String },
    #[error("node still unreachable after {attempts} attempts")]
    LivenessTimeout { attempts: u32 },
    #[error("network id mismatch: expected {expected}, node reports {actual}")]
    NetworkIdMismatch { expected: u64, actual: u64 },
    #[error("container: {0}")]
    Container(String),
    #[error("rpc: {0}")]
    Rpc(String),
    #[error("serialization: {0}")]
    Serialization(String),
}

fn missing_what(key: &str) -> String {
    if key.is_empty() {
        "its directory".to_string()
    } else {
        format!("entry `{key}`")
    }
}

pub type DeployResult<T> = Result<T, DeployError>;

impl DeployError {
    pub fn config(at: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation { at: at.into(),
                                 message: message.into() }
    }

    /// Código de salida del proceso asociado a cada familia de error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigValidation { .. } => 2,
            Self::PortalMissing { .. } => 3,
            Self::Filesystem { .. } => 4,
            Self::ProcessExit { .. } => 5,
            Self::LivenessTimeout { .. } | Self::NetworkIdMismatch { .. } => 6,
            Self::Container(_) | Self::Rpc(_) => 7,
            Self::Serialization(_) => 8,
            Self::Spawn { .. } => 9,
        }
    }

    /// Contexto `at` para la línea fatal: dónde se detuvo la ejecución.
    pub fn at(&self) -> String {
        match self {
            Self::ConfigValidation { at, .. } => at.clone(),
            Self::PortalMissing { domain, key } => format!("portal:{domain}/{key}"),
            Self::Filesystem { path, .. } => path.display().to_string(),
            Self::ProcessExit { command, .. } | Self::Spawn { command, .. } => command.clone(),
            Self::LivenessTimeout { .. } => "liveness".to_string(),
            Self::NetworkIdMismatch { .. } => "network_id".to_string(),
            Self::Container(_) => "container".to_string(),
            Self::Rpc(_) => "rpc".to_string(),
            Self::Serialization(_) => "serde".to_string(),
        }
    }
}

impl From<serde_json::Error> for DeployError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Construye un mapeador `io::Error -> DeployError::Filesystem` para `path`.
pub fn fs_error(path: &Path) -> impl FnOnce(io::Error) -> DeployError + '_ {
    move |err| DeployError::Filesystem { path: path.to_path_buf(),
                                         message: err.to_string() }
}
