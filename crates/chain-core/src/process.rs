//! Supervisión de procesos externos (truffle, docker).
//!
//! `Runner` es la costura inyectable: los engines nunca lanzan procesos
//! directamente, y los tests sustituyen el runner por un fake que registra
//! las invocaciones. El directorio de trabajo viaja explícito en cada
//! `Invocation`; el cwd global del proceso no se modifica nunca.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::errors::{DeployError, DeployResult};

/// Comando a ejecutar: programa, argumentos y directorio de trabajo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I, cwd: impl AsRef<Path>) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        Self { program: program.into(),
               args: args.into_iter().map(Into::into).collect(),
               cwd: cwd.as_ref().to_path_buf() }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for a in &self.args {
            write!(f, " {a}")?;
        }
        Ok(())
    }
}

/// Resultado de un proceso terminado (éxito o no).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[async_trait]
pub trait Runner: Send + Sync {
    /// Ejecuta `inv` hasta su fin. `Err` sólo si el proceso no pudo lanzarse;
    /// un código de salida distinto de cero se devuelve en `ProcessOutput`.
    async fn run(&self, inv: &Invocation) -> DeployResult<ProcessOutput>;
}

#[async_trait]
impl<T: Runner + ?Sized> Runner for std::sync::Arc<T> {
    async fn run(&self, inv: &Invocation) -> DeployResult<ProcessOutput> {
        (**self).run(inv).await
    }
}

/// Ejecuta `inv` y convierte una salida no cero en `DeployError::ProcessExit`.
pub async fn run_checked<R: Runner + ?Sized>(runner: &R, inv: &Invocation) -> DeployResult<ProcessOutput> {
    let out = runner.run(inv).await?;
    if out.success() {
        Ok(out)
    } else {
        Err(DeployError::ProcessExit { command: inv.to_string(),
                                       code: out.exit_code })
    }
}

/// Runner real sobre `tokio::process`.
///
/// stdout se emite línea a línea con `info!` y stderr con `error!`, dentro del
/// span activo del llamador (módulo/migración).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRunner;

#[async_trait]
impl Runner for TokioRunner {
    async fn run(&self, inv: &Invocation) -> DeployResult<ProcessOutput> {
        debug!(command = %inv, cwd = %inv.cwd.display(), "spawning");
        let mut child = Command::new(&inv.program).args(&inv.args)
                                                  .current_dir(&inv.cwd)
                                                  .stdin(Stdio::null())
                                                  .stdout(Stdio::piped())
                                                  .stderr(Stdio::piped())
                                                  .kill_on_drop(true)
                                                  .spawn()
                                                  .map_err(|e| DeployError::Spawn { command: inv.to_string(),
                                                                                    message: e.to_string() })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let read_stdout = drain_lines(stdout, |line| info!("{line}"));
        let read_stderr = drain_lines(stderr, |line| error!("{line}"));

        let (stdout, stderr, status) = tokio::join!(read_stdout, read_stderr, child.wait());
        let status = status.map_err(|e| DeployError::Spawn { command: inv.to_string(),
                                                             message: e.to_string() })?;
        // Terminado por señal: sin código.
        let exit_code = status.code().unwrap_or(-1);
        Ok(ProcessOutput { exit_code, stdout, stderr })
    }
}

/// Lee el pipe hasta EOF; las líneas que no son UTF-8 se decodifican con
/// pérdida y no cortan la lectura.
async fn drain_lines<P: AsyncRead + Unpin>(pipe: Option<P>, emit: fn(&str)) -> Vec<String> {
    let mut lines = Vec::new();
    let Some(pipe) = pipe else {
        return lines;
    };
    let mut segments = BufReader::new(pipe).split(b'\n');
    loop {
        match segments.next_segment().await {
            Ok(Some(raw)) => {
                let line = String::from_utf8_lossy(&raw).trim_end_matches('\r').to_string();
                emit(&line);
                lines.push(line);
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "output stream read failed");
                break;
            }
        }
    }
    lines
}
