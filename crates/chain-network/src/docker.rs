//! Cliente de contenedores.
//!
//! `ContainerClient` es la interfaz mínima que necesita el aprovisionador
//! (pull, create, start, kill). `DockerCli` la implementa invocando el
//! binario `docker` a través de un `Runner`, de modo que la salida de docker
//! queda en el mismo stream de log que el resto de la corrida.

use async_trait::async_trait;
use chain_core::{DeployError, DeployResult, Invocation, Runner};
use std::path::PathBuf;
use tracing::debug;

/// Especificación de contenedor a crear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub version: String,
    /// Pares `(puerto_host, puerto_contenedor)`.
    pub ports: Vec<(u16, u16)>,
    pub env: Vec<(String, String)>,
    pub cmd: Vec<String>,
    /// `--rm`: el contenedor se elimina al detenerse.
    pub auto_remove: bool,
}

impl ContainerSpec {
    pub fn image_ref(&self) -> String {
        format!("{}:{}", self.image, self.version)
    }
}

/// Resultado de `kill`: un contenedor inexistente no es un error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    Killed,
    NotFound,
}

#[async_trait]
pub trait ContainerClient: Send + Sync {
    /// Descarga la imagen; resuelve cuando el pull terminó.
    async fn pull(&self, image: &str, version: &str) -> DeployResult<()>;
    /// Crea el contenedor y devuelve su id. No espera a que esté listo.
    async fn create(&self, spec: &ContainerSpec) -> DeployResult<String>;
    async fn start(&self, id: &str) -> DeployResult<()>;
    async fn kill(&self, name: &str) -> DeployResult<KillOutcome>;
}

const DOCKER_BINARY: &str = "docker";

/// Implementación sobre el CLI de docker.
pub struct DockerCli<R: Runner> {
    runner: R,
    cwd: PathBuf,
}

impl<R: Runner> DockerCli<R> {
    pub fn new(runner: R) -> Self {
        Self { runner,
               cwd: std::env::temp_dir() }
    }

    fn invocation(&self, args: Vec<String>) -> Invocation {
        Invocation::new(DOCKER_BINARY, args, &self.cwd)
    }

    async fn docker(&self, args: Vec<String>) -> DeployResult<Vec<String>> {
        let inv = self.invocation(args);
        let out = self.runner.run(&inv).await?;
        if out.success() {
            Ok(out.stdout)
        } else {
            Err(DeployError::Container(format!("`{inv}` exited with code {}: {}", out.exit_code, out.stderr.join(" "))))
        }
    }
}

/// Argumentos de `docker create` para `spec`.
pub fn create_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = vec!["create".to_string(), "--name".to_string(), spec.name.clone()];
    if spec.auto_remove {
        args.push("--rm".to_string());
    }
    for (host, container) in &spec.ports {
        args.push("-p".to_string());
        args.push(format!("{host}:{container}"));
    }
    for (k, v) in &spec.env {
        args.push("-e".to_string());
        args.push(format!("{k}={v}"));
    }
    args.push(spec.image_ref());
    args.extend(spec.cmd.iter().cloned());
    args
}

#[async_trait]
impl<R: Runner> ContainerClient for DockerCli<R> {
    async fn pull(&self, image: &str, version: &str) -> DeployResult<()> {
        self.docker(vec!["pull".to_string(), format!("{image}:{version}")]).await?;
        Ok(())
    }

    async fn create(&self, spec: &ContainerSpec) -> DeployResult<String> {
        let stdout = self.docker(create_args(spec)).await?;
        let id = stdout.iter()
                       .rev()
                       .map(|l| l.trim())
                       .find(|l| !l.is_empty())
                       .ok_or_else(|| DeployError::Container(format!("docker create returned no id for `{}`", spec.name)))?;
        debug!(container = %spec.name, id, "container created");
        Ok(id.to_string())
    }

    async fn start(&self, id: &str) -> DeployResult<()> {
        self.docker(vec!["start".to_string(), id.to_string()]).await?;
        Ok(())
    }

    async fn kill(&self, name: &str) -> DeployResult<KillOutcome> {
        let inv = self.invocation(vec!["kill".to_string(), name.to_string()]);
        let out = self.runner.run(&inv).await?;
        if out.success() {
            return Ok(KillOutcome::Killed);
        }
        let stderr = out.stderr.join(" ");
        if stderr.contains("No such container") || stderr.contains("is not running") {
            Ok(KillOutcome::NotFound)
        } else {
            Err(DeployError::Container(format!("`{inv}` exited with code {}: {stderr}", out.exit_code)))
        }
    }
}
