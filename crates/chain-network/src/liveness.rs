//! Liveness del nodo: reintento acotado con espera fija.
//!
//! Es una comprobación de conectividad, distinta del protocolo de arranque de
//! geth (`provisioner::GethReadiness`), que espera producción de bloques.

use std::time::Duration;

use chain_core::{DeployError, DeployResult};
use tracing::{info, warn};

use crate::rpc::NodeRpc;

/// Presupuesto fijo del bucle de liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { attempts: 20,
               delay: Duration::from_secs(5) }
    }
}

/// Sondea el nodo hasta `policy.attempts` veces. Devuelve el network id del
/// primer sondeo exitoso; entre fallos espera `policy.delay` (no tras el
/// último). Agotar el presupuesto es `LivenessTimeout`.
pub async fn wait_until_live(rpc: &dyn NodeRpc, policy: RetryPolicy) -> DeployResult<u64> {
    for attempt in 1..=policy.attempts {
        match rpc.network_id().await {
            Ok(id) => {
                info!(attempt, "node is reachable");
                return Ok(id);
            }
            Err(e) => {
                warn!(attempt, max = policy.attempts, error = %e, "node not reachable yet");
                if attempt < policy.attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
    Err(DeployError::LivenessTimeout { attempts: policy.attempts })
}

/// Verifica que el nodo pertenece a la red configurada.
pub fn check_identity(expected: u64, actual: u64) -> DeployResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DeployError::NetworkIdMismatch { expected, actual })
    }
}
