//! Fakes compartidos: cliente de contenedores y nodo JSON-RPC con guion.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chain_core::{DeployError, DeployResult};
use chain_network::{ContainerClient, ContainerSpec, KillOutcome, NodeRpc};
use serde_json::{json, Value};

/// Registra cada llamada como texto (`pull img:v`, `create name`, ...).
#[derive(Default)]
pub struct FakeContainers {
    pub calls: Mutex<Vec<String>>,
    pub specs: Mutex<Vec<ContainerSpec>>,
    pub missing: bool,
}

impl FakeContainers {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContainerClient for FakeContainers {
    async fn pull(&self, image: &str, version: &str) -> DeployResult<()> {
        self.calls.lock().unwrap().push(format!("pull {image}:{version}"));
        Ok(())
    }

    async fn create(&self, spec: &ContainerSpec) -> DeployResult<String> {
        self.calls.lock().unwrap().push(format!("create {}", spec.name));
        self.specs.lock().unwrap().push(spec.clone());
        Ok(format!("id-{}", spec.name))
    }

    async fn start(&self, id: &str) -> DeployResult<()> {
        self.calls.lock().unwrap().push(format!("start {id}"));
        Ok(())
    }

    async fn kill(&self, name: &str) -> DeployResult<KillOutcome> {
        self.calls.lock().unwrap().push(format!("kill {name}"));
        if self.missing {
            Ok(KillOutcome::NotFound)
        } else {
            Ok(KillOutcome::Killed)
        }
    }
}

/// Nodo con respuestas programadas; cuando una cola se vacía repite el
/// último comportamiento configurado (`net_id` / `coinbase_after`).
pub struct FakeRpc {
    pub id_replies: Mutex<VecDeque<DeployResult<u64>>>,
    pub net_id: Option<u64>,
    pub coinbase_replies: Mutex<VecDeque<Option<String>>>,
    pub pending_receipts: Mutex<u32>,
    pub log: Mutex<Vec<String>>,
}

impl FakeRpc {
    pub fn new(net_id: Option<u64>) -> Self {
        Self { id_replies: Mutex::new(VecDeque::new()),
               net_id,
               coinbase_replies: Mutex::new(VecDeque::new()),
               pending_receipts: Mutex::new(0),
               log: Mutex::new(vec![]) }
    }

    /// Falla `n` sondeos de `net_version` antes de responder `net_id`.
    pub fn failing_first(n: usize, net_id: u64) -> Self {
        let rpc = Self::new(Some(net_id));
        for _ in 0..n {
            rpc.id_replies.lock().unwrap().push_back(Err(DeployError::Rpc("connection refused".into())));
        }
        rpc
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn probes(&self) -> usize {
        self.log().iter().filter(|l| *l == "net_version").count()
    }
}

#[async_trait]
impl NodeRpc for FakeRpc {
    async fn network_id(&self) -> DeployResult<u64> {
        self.log.lock().unwrap().push("net_version".into());
        if let Some(reply) = self.id_replies.lock().unwrap().pop_front() {
            return reply;
        }
        self.net_id.ok_or_else(|| DeployError::Rpc("connection refused".into()))
    }

    async fn coinbase(&self) -> DeployResult<Option<String>> {
        self.log.lock().unwrap().push("eth_coinbase".into());
        Ok(self.coinbase_replies
               .lock()
               .unwrap()
               .pop_front()
               .unwrap_or_else(|| Some("0xc0ffee".to_string())))
    }

    async fn send_transaction(&self, from: &str, to: &str, value: u64) -> DeployResult<String> {
        self.log.lock().unwrap().push(format!("eth_sendTransaction {from}->{to} {value}"));
        Ok("0xtx".into())
    }

    async fn transaction_receipt(&self, hash: &str) -> DeployResult<Option<Value>> {
        self.log.lock().unwrap().push(format!("eth_getTransactionReceipt {hash}"));
        let mut pending = self.pending_receipts.lock().unwrap();
        if *pending > 0 {
            *pending -= 1;
            Ok(None)
        } else {
            Ok(Some(json!({ "transactionHash": hash, "status": "0x1" })))
        }
    }
}
