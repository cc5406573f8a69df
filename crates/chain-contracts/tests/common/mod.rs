//! Fakes compartidos: un truffle que "compila" escribiendo artifacts y un
//! sandbox de directorios con los portales ya creados.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chain_core::{ContractsConfig, DeployLayout, DeployResult, Invocation, ProcessOutput, Runner};
use serde_json::{json, Value};
use tempfile::TempDir;

/// Una invocación observada junto con el estado del workspace en ese momento.
#[derive(Debug, Clone)]
pub struct Call {
    pub inv: Invocation,
    /// Archivos en `<module>/build/contracts` al momento de la llamada.
    pub build_files: Vec<String>,
    /// Contenido de `run_args.js` al momento de la llamada.
    pub run_args: Option<String>,
}

impl Call {
    pub fn line(&self) -> String {
        self.inv.to_string()
    }

    pub fn module(&self) -> String {
        self.inv.cwd.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string()
    }
}

pub struct FakeTruffle {
    contracts_dir: PathBuf,
    calls: Mutex<Vec<Call>>,
    /// Módulo cuyo `migrate`/`exec` termina con código 1.
    fail_module: Option<String>,
}

impl FakeTruffle {
    pub fn new(layout: &DeployLayout) -> Self {
        Self { contracts_dir: layout.contracts.clone(),
               calls: Mutex::new(vec![]),
               fail_module: None }
    }

    pub fn failing_on(layout: &DeployLayout, module: &str) -> Self {
        Self { fail_module: Some(module.to_string()),
               ..Self::new(layout) }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.calls().iter().map(Call::line).collect()
    }
}

#[async_trait]
impl Runner for FakeTruffle {
    async fn run(&self, inv: &Invocation) -> DeployResult<ProcessOutput> {
        let build = inv.cwd.join("build").join("contracts");
        let call = Call { inv: inv.clone(),
                          build_files: list(&build),
                          run_args: fs::read_to_string(self.contracts_dir.join("run_args.js")).ok() };
        let module = call.module();
        let seq = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            calls.len()
        };

        let deploys = inv.args.first().is_some_and(|a| a == "migrate" || a == "exec");
        if !deploys {
            return Ok(ProcessOutput::default());
        }
        if self.fail_module.as_deref() == Some(module.as_str()) {
            return Ok(ProcessOutput { exit_code: 1,
                                      stdout: vec![],
                                      stderr: vec!["Error: deployment failed".to_string()] });
        }

        fs::create_dir_all(&build).unwrap();
        let contract = format!("{}Token", capitalize(&module));
        let artifact = json!({ "contractName": contract, "deployment": seq });
        fs::write(build.join(format!("{contract}.json")), artifact.to_string()).unwrap();

        let oz = inv.cwd.join(".openzeppelin");
        if oz.is_dir() {
            fs::write(oz.join("dev.json"), json!({ "deployment": seq }).to_string()).unwrap();
        }
        Ok(ProcessOutput::default())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir).map(|rd| {
                                                      rd.filter_map(|e| e.ok())
                                                        .filter_map(|e| e.file_name().to_str().map(str::to_string))
                                                        .collect()
                                                  })
                                                  .unwrap_or_default();
    names.sort();
    names
}

/// Raíz temporal con portales creados, `network.json` ya replicado en el
/// portal de contratos y un directorio por módulo.
pub struct Sandbox {
    pub dir: TempDir,
    pub layout: DeployLayout,
}

impl Sandbox {
    pub fn new(modules: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let layout = DeployLayout::with_root(dir.path());
        fs::create_dir_all(&layout.network_portal).unwrap();
        fs::create_dir_all(&layout.contracts_portal).unwrap();
        for m in modules {
            fs::create_dir_all(layout.module_dir(m)).unwrap();
        }
        fs::write(layout.contracts_portal.join("network.json"),
                  json!({ "type": "ganache", "host": "localhost", "port": 8545, "protocol": "http", "network_id": 2702 }).to_string())
            .unwrap();
        Self { dir, layout }
    }

    pub fn migration_json(&self, net: &str) -> Value {
        let raw = fs::read_to_string(self.layout.migration_file(net)).unwrap();
        serde_json::from_str(&raw).unwrap()
    }

    pub fn portal_entry(&self, module: &str) -> Value {
        let raw = fs::read_to_string(self.layout.contracts_portal.join(format!("{module}.json"))).unwrap();
        serde_json::from_str(&raw).unwrap()
    }
}

pub fn contracts(value: Value) -> ContractsConfig {
    serde_json::from_value(value).unwrap()
}
