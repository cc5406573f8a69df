//! Configuración del nodo objetivo.
//!
//! La forma de `config` depende de `type`: se mantiene como `Value` crudo en
//! el archivo (y en `network.json`) y se interpreta con `provider()`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Validate;
use crate::errors::{DeployError, DeployResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Ganache,
    Geth,
    Remote,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NodeKind::Ganache => "ganache",
            NodeKind::Geth => "geth",
            NodeKind::Remote => "remote",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
                        Protocol::Http => "http",
                        Protocol::Https => "https",
                    })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub network_id: u64,
    /// Config específica del proveedor (forma según `kind`).
    #[serde(default = "empty_object")]
    pub config: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

/// Perfil de arranque rápido (ganache-cli).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GanacheConfig {
    #[serde(default = "GanacheConfig::default_image")]
    pub image: String,
    #[serde(default = "latest")]
    pub version: String,
    pub container_name: String,
    pub mnemonic: String,
    pub gas_limit: u64,
    pub gas_price: u64,
}

impl GanacheConfig {
    fn default_image() -> String {
        "trufflesuite/ganache-cli".to_string()
    }
}

/// Perfil de arranque lento (geth con cuentas precargadas vía entorno).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GethConfig {
    pub image: String,
    #[serde(default = "latest")]
    pub version: String,
    pub container_name: String,
    pub mnemonic: String,
    pub accounts: u32,
}

/// Nodo ya existente: sólo se sondea.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Ruta opcional del endpoint JSON-RPC (p. ej. `/rpc`).
    #[serde(default)]
    pub path: Option<String>,
}

fn latest() -> String {
    "latest".to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    Ganache(GanacheConfig),
    Geth(GethConfig),
    Remote(RemoteConfig),
}

impl NetworkConfig {
    /// Interpreta `config` según `kind`.
    pub fn provider(&self) -> DeployResult<ProviderConfig> {
        let shape_err = |e: serde_json::Error| DeployError::config("config", format!("invalid {} provider config: {e}", self.kind));
        Ok(match self.kind {
            NodeKind::Ganache => ProviderConfig::Ganache(serde_json::from_value(self.config.clone()).map_err(shape_err)?),
            NodeKind::Geth => ProviderConfig::Geth(serde_json::from_value(self.config.clone()).map_err(shape_err)?),
            NodeKind::Remote => ProviderConfig::Remote(serde_json::from_value(self.config.clone()).map_err(shape_err)?),
        })
    }

    /// Ruta JSON-RPC declarada por un nodo remoto.
    pub fn rpc_path(&self) -> Option<String> {
        match self.provider() {
            Ok(ProviderConfig::Remote(r)) => r.path,
            _ => None,
        }
    }
}

impl Validate for NetworkConfig {
    fn validate(&self) -> DeployResult<()> {
        if self.host.trim().is_empty() {
            return Err(DeployError::config("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(DeployError::config("port", "must be in 1..=65535"));
        }
        if !self.config.is_object() {
            return Err(DeployError::config("config", "must be an object"));
        }
        match self.provider()? {
            ProviderConfig::Ganache(g) => {
                non_empty("config.containerName", &g.container_name)?;
                non_empty("config.mnemonic", &g.mnemonic)?;
            }
            ProviderConfig::Geth(g) => {
                non_empty("config.containerName", &g.container_name)?;
                non_empty("config.mnemonic", &g.mnemonic)?;
                if g.accounts == 0 {
                    return Err(DeployError::config("config.accounts", "at least one account is required"));
                }
            }
            ProviderConfig::Remote(_) => {}
        }
        Ok(())
    }
}

fn non_empty(at: &str, value: &str) -> DeployResult<()> {
    if value.trim().is_empty() {
        Err(DeployError::config(at, "must not be empty"))
    } else {
        Ok(())
    }
}
