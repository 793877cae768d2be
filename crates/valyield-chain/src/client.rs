//! Chain session management using subxt.
//!
//! A [`Session`] is an explicitly owned connection to one node. It is created
//! through a retrying connect and, once up, reports drops and transport errors
//! on the status channel supplied by the caller. It never resumes in-flight
//! requests on its own.

use std::future::Future;

use crate::config::RetryPolicy;
use crate::error::{ChainError, ConnectionError};
use valyield_core::{ConnectionStatus, Network};

use subxt::backend::rpc::RpcClient;
use subxt::{OnlineClient, PolkadotConfig};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Publish a status event without waiting on the receiver.
///
/// Events are dropped when the channel is full or closed.
fn report(status_tx: &mpsc::Sender<ConnectionStatus>, status: ConnectionStatus) {
    if let Err(e) = status_tx.try_send(status) {
        tracing::trace!("Status event not delivered: {}", e);
    }
}

/// Run `attempt_fn` until it succeeds or the policy's attempt budget is spent.
///
/// Attempts are counted from 1. Each is bounded by `policy.attempt_timeout`;
/// between failures the task sleeps for `policy.delay_for(attempt)`.
pub async fn connect_with_retry<T, F, Fut>(
    endpoint: &str,
    policy: &RetryPolicy,
    status_tx: &mpsc::Sender<ConnectionStatus>,
    mut attempt_fn: F,
) -> Result<T, ConnectionError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ChainError>>,
{
    let mut last_cause = String::from("no attempt made");

    for attempt in 1..=policy.max_attempts {
        report(status_tx, ConnectionStatus::Connecting { attempt });

        let outcome = match tokio::time::timeout(policy.attempt_timeout, attempt_fn(attempt)).await {
            Ok(result) => result,
            Err(_) => Err(ChainError::Timeout(policy.attempt_timeout)),
        };

        match outcome {
            Ok(value) => {
                tracing::info!("Connected to {} on attempt #{}", endpoint, attempt);
                report(status_tx, ConnectionStatus::Connected);
                return Ok(value);
            }
            Err(e) => {
                last_cause = e.to_string();
                if attempt < policy.max_attempts {
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        "Connection attempt #{} to {} failed: {}. Retrying in {:?}",
                        attempt,
                        endpoint,
                        last_cause,
                        delay
                    );
                    report(
                        status_tx,
                        ConnectionStatus::Retrying {
                            attempt,
                            delay_ms: delay.as_millis() as u64,
                        },
                    );
                    tokio::time::sleep(delay).await;
                } else {
                    tracing::warn!(
                        "Connection attempt #{} to {} failed: {}",
                        attempt,
                        endpoint,
                        last_cause
                    );
                }
            }
        }
    }

    report(status_tx, ConnectionStatus::Error(last_cause.clone()));

    Err(ConnectionError {
        endpoint: endpoint.to_string(),
        attempts: policy.max_attempts,
        last_cause,
    })
}

/// Try each endpoint in order once, returning the first client that comes up.
async fn connect_any(endpoints: &[String]) -> Result<(String, OnlineClient<PolkadotConfig>), ChainError> {
    let mut last_error = None;

    for endpoint in endpoints {
        tracing::debug!("Trying {}", endpoint);

        match RpcClient::from_url(endpoint.as_str()).await {
            Ok(rpc_client) => {
                match OnlineClient::<PolkadotConfig>::from_rpc_client(rpc_client.clone()).await {
                    Ok(client) => {
                        if let Ok(name) = rpc_client
                            .request::<String>("system_chain", subxt::ext::subxt_rpcs::rpc_params![])
                            .await
                        {
                            tracing::info!("Chain reported name: {}", name);
                        }
                        return Ok((endpoint.clone(), client));
                    }
                    Err(e) => {
                        tracing::warn!("Failed to create client from {}: {}", endpoint, e);
                        last_error = Some(e.to_string());
                    }
                }
            }
            Err(e) => {
                tracing::warn!("Failed to connect to {}: {}", endpoint, e);
                last_error = Some(e.to_string());
            }
        }
    }

    Err(ChainError::Connection(
        last_error.unwrap_or_else(|| "No RPC endpoints configured".to_string()),
    ))
}

/// An open session to a node holding staking state.
pub struct Session {
    network: Network,
    endpoint: String,
    client: OnlineClient<PolkadotConfig>,
    watcher: JoinHandle<()>,
}

impl Session {
    /// Connect with retries, trying every endpoint on each attempt.
    pub async fn connect(
        network: Network,
        endpoints: &[String],
        policy: &RetryPolicy,
        status_tx: mpsc::Sender<ConnectionStatus>,
    ) -> Result<Self, ConnectionError> {
        let label = endpoints.join(", ");
        if endpoints.is_empty() {
            return Err(ConnectionError {
                endpoint: label,
                attempts: 0,
                last_cause: "No RPC endpoints configured".to_string(),
            });
        }

        tracing::info!("Connecting to {} via {}", network, label);
        let (endpoint, client) =
            connect_with_retry(&label, policy, &status_tx, |_| connect_any(endpoints)).await?;

        let watcher = spawn_watcher(client.clone(), endpoint.clone(), status_tx);

        Ok(Self {
            network,
            endpoint,
            client,
            watcher,
        })
    }

    /// Get the connected network.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The endpoint that accepted the connection.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the underlying subxt client.
    pub fn client(&self) -> &OnlineClient<PolkadotConfig> {
        &self.client
    }

    /// Get the latest block number and hash to verify connection.
    pub async fn get_latest_block(&self) -> Result<(u32, [u8; 32]), ChainError> {
        let block = self.client.blocks().at_latest().await?;
        Ok((block.number(), block.hash().0))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

/// Follow finalized blocks and report when the subscription breaks.
fn spawn_watcher(
    client: OnlineClient<PolkadotConfig>,
    endpoint: String,
    status_tx: mpsc::Sender<ConnectionStatus>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut blocks = match client.blocks().subscribe_finalized().await {
            Ok(blocks) => blocks,
            Err(e) => {
                tracing::error!("Cannot follow finalized blocks on {}: {}", endpoint, e);
                report(&status_tx, ConnectionStatus::Error(e.to_string()));
                return;
            }
        };

        while let Some(block) = blocks.next().await {
            match block {
                Ok(block) => tracing::trace!("Finalized #{} on {}", block.number(), endpoint),
                Err(e) => {
                    tracing::error!("Transport error on {}: {}", endpoint, e);
                    report(&status_tx, ConnectionStatus::Error(e.to_string()));
                    break;
                }
            }
        }

        tracing::warn!("Disconnected from {}", endpoint);
        report(&status_tx, ConnectionStatus::Disconnected);
    })
}
