//! In-memory staking source for driving the pipeline without a node.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use subxt::utils::AccountId32;
use valyield_chain::{ChainError, StakingSource, validator_id};
use valyield_core::{Balance, EraIndex, Exposure, Perbill, RewardPointTally, ValidatorId};

pub const PREFIX: u16 = 0;

/// Route library logs to the test harness output. Safe to call repeatedly.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("valyield_chain=debug")
        .with_test_writer()
        .try_init();
}

/// Deterministic account for test validator `n`.
pub fn account(n: u8) -> AccountId32 {
    let mut bytes = [0u8; 32];
    bytes[0] = n;
    bytes[31] = 0xAB;
    AccountId32::from(bytes)
}

pub fn id(n: u8) -> ValidatorId {
    validator_id(&account(n), PREFIX)
}

#[derive(Default)]
pub struct MockSource {
    pub current_era: Option<EraIndex>,
    pub validators: Vec<AccountId32>,
    pub payouts: BTreeMap<EraIndex, Balance>,
    pub points: BTreeMap<EraIndex, RewardPointTally>,
    pub commissions: BTreeMap<(EraIndex, AccountId32), Perbill>,
    pub exposures: BTreeMap<(EraIndex, AccountId32), Exposure>,
    pub nominations: BTreeMap<AccountId32, Vec<AccountId32>>,
    /// Accounts whose per-validator queries always fail.
    pub failing: BTreeSet<AccountId32>,
    /// Accounts whose per-validator queries fail this many times, then succeed.
    pub flaky: Mutex<BTreeMap<AccountId32, usize>>,
    /// Artificial latency per account, to reorder completions.
    pub delays: BTreeMap<AccountId32, Duration>,
    pub fail_points: bool,
    pub points_queries: AtomicUsize,
    pub exposure_queries: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl MockSource {
    /// An era where validators 1..=count each earned `points` and have `stake`.
    pub fn with_era(era: EraIndex, count: u8, payout: Balance, points: u32, stake: Balance) -> Self {
        let mut source = MockSource {
            current_era: Some(era + 1),
            ..Default::default()
        };
        let mut tally = RewardPointTally::default();
        for n in 1..=count {
            let acc = account(n);
            tally.individual.insert(acc.0, points);
            tally.total += points;
            source.validators.push(acc.clone());
            source
                .commissions
                .insert((era, acc.clone()), Perbill::from_percent(n as u32 % 20));
            source
                .exposures
                .insert((era, acc), Exposure::new(stake, stake / 10, 5));
        }
        source.payouts.insert(era, payout);
        source.points.insert(era, tally);
        source
    }

    async fn per_validator(&self, who: &AccountId32) -> Result<(), ChainError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(who) {
            tokio::time::sleep(*delay).await;
        } else {
            tokio::task::yield_now().await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(who) {
            return Err(ChainError::Rpc("node returned an error".into()));
        }
        let mut flaky = self.flaky.lock().unwrap();
        if let Some(left) = flaky.get_mut(who)
            && *left > 0
        {
            *left -= 1;
            return Err(ChainError::Rpc("temporarily unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl StakingSource for MockSource {
    fn ss58_prefix(&self) -> u16 {
        PREFIX
    }

    async fn current_era(&self) -> Result<Option<EraIndex>, ChainError> {
        Ok(self.current_era)
    }

    async fn active_validators(&self) -> Result<Vec<AccountId32>, ChainError> {
        Ok(self.validators.clone())
    }

    async fn era_payout(&self, era: EraIndex) -> Result<Option<Balance>, ChainError> {
        Ok(self.payouts.get(&era).copied())
    }

    async fn era_reward_points(&self, era: EraIndex) -> Result<RewardPointTally, ChainError> {
        self.points_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_points {
            return Err(ChainError::Storage("ErasRewardPoints unavailable".into()));
        }
        Ok(self.points.get(&era).cloned().unwrap_or_default())
    }

    async fn era_commission(
        &self,
        era: EraIndex,
        validator: &AccountId32,
    ) -> Result<Option<Perbill>, ChainError> {
        self.per_validator(validator).await?;
        Ok(self.commissions.get(&(era, validator.clone())).copied())
    }

    async fn era_exposure(
        &self,
        era: EraIndex,
        validator: &AccountId32,
    ) -> Result<Option<Exposure>, ChainError> {
        self.exposure_queries.fetch_add(1, Ordering::SeqCst);
        self.per_validator(validator).await?;
        Ok(self.exposures.get(&(era, validator.clone())).copied())
    }

    async fn nomination_targets(
        &self,
        nominator: &AccountId32,
    ) -> Result<Vec<AccountId32>, ChainError> {
        Ok(self.nominations.get(nominator).cloned().unwrap_or_default())
    }
}
