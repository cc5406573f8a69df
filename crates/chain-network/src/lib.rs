//! chain-network: aprovisionamiento y verificación de la red objetivo.
//!
//! - `docker`: `ContainerClient` y su implementación sobre el CLI de docker.
//! - `provisioner`: perfiles ganache/geth y el protocolo de espera de geth.
//! - `rpc`: cliente JSON-RPC (`NodeRpc`, `HttpRpc`).
//! - `liveness`: bucle de reintento acotado y verificación de identidad.
//! - `engine`: `NetworkEngine`.

pub mod docker;
pub mod engine;
pub mod liveness;
pub mod provisioner;
pub mod rpc;

pub use docker::{ContainerClient, ContainerSpec, DockerCli, KillOutcome};
pub use engine::{NetworkEngine, NetworkState};
pub use liveness::{check_identity, wait_until_live, RetryPolicy};
pub use provisioner::{DockerNodeProvisioner, GethReadiness};
pub use rpc::{HttpRpc, NodeRpc, RpcEndpoint};
