//! Network endpoints and connection retry policy.
//!
//! Since the Polkadot 2.0 migration (Nov 2025), staking data lives on Asset Hub,
//! so the default endpoint lists point there.

use std::time::Duration;
use valyield_core::{Network, RunConfig};

/// Get the Asset Hub RPC endpoints for a network.
pub fn get_asset_hub_endpoints(network: Network) -> &'static [&'static str] {
    match network {
        Network::Polkadot => &[
            "wss://polkadot-asset-hub-rpc.polkadot.io",
            "wss://rpc-asset-hub-polkadot.luckyfriday.io",
            "wss://sys.ibp.network/asset-hub-polkadot",
            "wss://sys.dotters.network/asset-hub-polkadot",
            "wss://asset-hub-polkadot-rpc.dwellir.com",
        ],
        Network::Kusama => &[
            "wss://kusama-asset-hub-rpc.polkadot.io",
            "wss://rpc-asset-hub-kusama.luckyfriday.io",
            "wss://sys.ibp.network/asset-hub-kusama",
            "wss://sys.dotters.network/asset-hub-kusama",
            "wss://asset-hub-kusama-rpc.dwellir.com",
        ],
        Network::Westend => &[
            "wss://westend-asset-hub-rpc.polkadot.io",
            "wss://sys.ibp.network/asset-hub-westend",
            "wss://sys.dotters.network/asset-hub-westend",
            "wss://asset-hub-westend-rpc.dwellir.com",
        ],
        Network::Paseo => &[
            "wss://sys.ibp.network/asset-hub-paseo",
            "wss://sys.dotters.network/asset-hub-paseo",
            "wss://asset-hub-paseo-rpc.dwellir.com",
        ],
    }
}

/// Endpoints to try for a run: the custom one alone, or the network defaults.
pub fn endpoints_for(network: Network, custom: Option<&str>) -> Vec<String> {
    match custom {
        Some(endpoint) => vec![endpoint.to_string()],
        None => get_asset_hub_endpoints(network)
            .iter()
            .map(|e| e.to_string())
            .collect(),
    }
}

/// Retry schedule for establishing a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound on a single connection attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(30_000),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            max_attempts: config.max_connect_attempts,
            base_delay: Duration::from_millis(config.backoff_base_ms),
            max_delay: Duration::from_millis(config.backoff_cap_ms),
            attempt_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }

    /// Delay after failed attempt `attempt` (counted from 1): `min(base * 2^attempt, max)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(16));
        assert_eq!(policy.delay_for(5), Duration::from_secs(30));
        assert_eq!(policy.delay_for(64), Duration::from_secs(30));
    }

    #[test]
    fn test_policy_from_config() {
        let config = RunConfig {
            max_connect_attempts: 3,
            backoff_base_ms: 250,
            backoff_cap_ms: 1_000,
            ..Default::default()
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(1_000));
    }

    #[test]
    fn test_endpoints_for() {
        assert_eq!(
            endpoints_for(Network::Polkadot, Some("wss://example.invalid")),
            vec!["wss://example.invalid".to_string()]
        );
        assert_eq!(
            endpoints_for(Network::Paseo, None).len(),
            get_asset_hub_endpoints(Network::Paseo).len()
        );
    }
}
