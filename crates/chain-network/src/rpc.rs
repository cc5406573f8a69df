//! Cliente JSON-RPC mínimo hacia el nodo.
//!
//! Sólo lo necesario para liveness (`net_version`) y para el protocolo de
//! arranque de geth (`eth_coinbase`, `eth_sendTransaction`,
//! `eth_getTransactionReceipt`).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chain_core::{DeployError, DeployResult, NetworkConfig, Protocol};
use serde_json::{json, Value};

/// Endpoint HTTP(S) del nodo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
    pub protocol: Protocol,
    pub host: String,
    pub port: u16,
    pub path: Option<String>,
}

impl RpcEndpoint {
    pub fn from_config(cfg: &NetworkConfig) -> Self {
        Self { protocol: cfg.protocol,
               host: cfg.host.clone(),
               port: cfg.port,
               path: cfg.rpc_path() }
    }

    pub fn url(&self) -> String {
        let path = self.path.as_deref().unwrap_or("");
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            format!("{}://{}:{}", self.protocol, self.host, self.port)
        } else {
            format!("{}://{}:{}/{}", self.protocol, self.host, self.port, path)
        }
    }
}

#[async_trait]
pub trait NodeRpc: Send + Sync {
    /// Identificador de red reportado por el nodo. Falla si no es alcanzable.
    async fn network_id(&self) -> DeployResult<u64>;
    /// Dirección coinbase, `None` mientras el nodo no tenga una disponible.
    async fn coinbase(&self) -> DeployResult<Option<String>>;
    /// Envía una transacción y devuelve su hash.
    async fn send_transaction(&self, from: &str, to: &str, value: u64) -> DeployResult<String>;
    /// Receipt de la transacción, `None` mientras no esté minada.
    async fn transaction_receipt(&self, hash: &str) -> DeployResult<Option<Value>>;
}

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Implementación HTTP con reqwest.
pub struct HttpRpc {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl HttpRpc {
    pub fn new(endpoint: &RpcEndpoint) -> DeployResult<Self> {
        let client = reqwest::Client::builder().timeout(Duration::from_secs(10))
                                               .build()
                                               .map_err(|e| DeployError::Rpc(format!("cannot build http client: {e}")))?;
        Ok(Self { client,
                  url: endpoint.url(),
                  next_id: AtomicU64::new(1) })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call(&self, method: &str, params: Value) -> DeployResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params });
        let resp = self.client
                       .post(&self.url)
                       .json(&body)
                       .send()
                       .await
                       .map_err(|e| DeployError::Rpc(format!("{method} @ {}: {e}", self.url)))?;
        let payload: Value = resp.json()
                                 .await
                                 .map_err(|e| DeployError::Rpc(format!("{method}: invalid response: {e}")))?;
        unwrap_result(method, payload)
    }
}

/// Extrae `result` de una respuesta JSON-RPC o traduce `error`.
pub fn unwrap_result(method: &str, payload: Value) -> DeployResult<Value> {
    if let Some(err) = payload.get("error") {
        return Err(DeployError::Rpc(format!("{method}: {err}")));
    }
    payload.get("result")
           .cloned()
           .ok_or_else(|| DeployError::Rpc(format!("{method}: response has no result")))
}

/// `net_version` devuelve un string decimal; algunos nodos devuelven número o hex.
pub fn parse_network_id(raw: &Value) -> DeployResult<u64> {
    let parsed = match raw {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => match s.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse().ok(),
        },
        _ => None,
    };
    parsed.ok_or_else(|| DeployError::Rpc(format!("net_version: unexpected value {raw}")))
}

#[async_trait]
impl NodeRpc for HttpRpc {
    async fn network_id(&self) -> DeployResult<u64> {
        let raw = self.call("net_version", json!([])).await?;
        parse_network_id(&raw)
    }

    async fn coinbase(&self) -> DeployResult<Option<String>> {
        let raw = self.call("eth_coinbase", json!([])).await?;
        Ok(raw.as_str()
              .filter(|a| !a.is_empty() && *a != ZERO_ADDRESS)
              .map(str::to_string))
    }

    async fn send_transaction(&self, from: &str, to: &str, value: u64) -> DeployResult<String> {
        let tx = json!({ "from": from, "to": to, "value": format!("0x{value:x}") });
        let raw = self.call("eth_sendTransaction", json!([tx])).await?;
        raw.as_str()
           .map(str::to_string)
           .ok_or_else(|| DeployError::Rpc(format!("eth_sendTransaction: unexpected value {raw}")))
    }

    async fn transaction_receipt(&self, hash: &str) -> DeployResult<Option<Value>> {
        let raw = self.call("eth_getTransactionReceipt", json!([hash])).await?;
        Ok(if raw.is_null() { None } else { Some(raw) })
    }
}
