//! Configuración de módulos y migraciones.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Validate;
use crate::errors::{DeployError, DeployResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractsConfig {
    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
    #[serde(default)]
    pub migrations: Vec<MigrationConfig>,
}

/// Un módulo: directorio `<contracts>/<name>` con sus contratos y scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub name: String,
    /// El módulo despliega contratos upgradeable (metadata en `.openzeppelin`).
    #[serde(default)]
    pub upgradeable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MigrationConfig {
    pub name: String,
    pub serie: Vec<MigrationStepConfig>,
}

/// Paso de migración: `truffle` (rango de scripts de migración) o `script`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MigrationStepConfig {
    Truffle(TruffleStep),
    Script(ScriptStep),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruffleStep {
    /// Nombre del módulo.
    pub name: String,
    #[serde(default)]
    pub test: bool,
    /// Rango inclusivo `[from, to]` de scripts de migración.
    pub range: [u32; 2],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub name: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

impl MigrationStepConfig {
    pub fn module_name(&self) -> &str {
        match self {
            Self::Truffle(s) => &s.name,
            Self::Script(s) => &s.name,
        }
    }

    pub fn args(&self) -> Option<&Value> {
        match self {
            Self::Truffle(s) => s.args.as_ref(),
            Self::Script(s) => s.args.as_ref(),
        }
    }

    pub fn runs_tests(&self) -> bool {
        matches!(self, Self::Truffle(TruffleStep { test: true, .. }))
    }

    /// Números de migración cubiertos por el paso, en orden ascendente.
    /// Los pasos `script` no avanzan scripts numerados.
    pub fn migration_numbers(&self) -> std::ops::RangeInclusive<u32> {
        match self {
            Self::Truffle(s) => s.range[0]..=s.range[1],
            #[allow(clippy::reversed_empty_ranges)]
            Self::Script(_) => 1..=0,
        }
    }
}

impl ContractsConfig {
    pub fn module(&self, name: &str) -> Option<&ModuleConfig> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn step_count(&self) -> usize {
        self.migrations.iter().map(|m| m.serie.len()).sum()
    }
}

/// Nombres reservados: el directorio del portal dentro del workspace y la
/// clave de hand-off de la red (`network.json`).
const RESERVED_MODULE_NAMES: [&str; 2] = ["portal", "network"];

/// El nombre de módulo se usa como directorio y como clave de portal.
fn unsafe_module_name(name: &str) -> Option<&'static str> {
    if name.contains(['/', '\\']) || name.starts_with('.') {
        Some("must be a plain directory name")
    } else if RESERVED_MODULE_NAMES.contains(&name) {
        Some("is reserved")
    } else {
        None
    }
}

impl Validate for ContractsConfig {
    fn validate(&self) -> DeployResult<()> {
        let mut modules = HashSet::new();
        for (i, module) in self.modules.iter().enumerate() {
            if module.name.trim().is_empty() {
                return Err(DeployError::config(format!("modules[{i}].name"), "must not be empty"));
            }
            if let Some(reason) = unsafe_module_name(&module.name) {
                return Err(DeployError::config(format!("modules[{i}].name"), format!("`{}` {reason}", module.name)));
            }
            if !modules.insert(module.name.as_str()) {
                return Err(DeployError::config(format!("modules[{i}].name"), format!("duplicated module `{}`", module.name)));
            }
        }

        let mut migrations = HashSet::new();
        for (i, migration) in self.migrations.iter().enumerate() {
            if migration.name.trim().is_empty() {
                return Err(DeployError::config(format!("migrations[{i}].name"), "must not be empty"));
            }
            if !migrations.insert(migration.name.as_str()) {
                return Err(DeployError::config(format!("migrations[{i}].name"),
                                               format!("duplicated migration `{}`", migration.name)));
            }
            for (j, step) in migration.serie.iter().enumerate() {
                let at = format!("migrations[{i}].serie[{j}]");
                if !modules.contains(step.module_name()) {
                    return Err(DeployError::config(format!("{at}.name"), format!("unknown module `{}`", step.module_name())));
                }
                match step {
                    MigrationStepConfig::Truffle(t) if t.range[0] > t.range[1] => {
                        return Err(DeployError::config(format!("{at}.range"),
                                                       format!("from ({}) must be <= to ({})", t.range[0], t.range[1])));
                    }
                    MigrationStepConfig::Script(s) if s.method.trim().is_empty() => {
                        return Err(DeployError::config(format!("{at}.method"), "must not be empty"));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}
