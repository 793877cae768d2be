//! Per-validator era fact retrieval.

use std::future::Future;
use std::time::Duration;

use crate::error::{ChainError, FetchError};
use crate::source::StakingSource;
use crate::ss58::validator_account;
use subxt::utils::AccountId32;
use valyield_core::{Balance, EraIndex, Exposure, Perbill, RawFacts, RewardPointTally, ValidatorId};

/// Era-wide reward data shared by every validator of that era.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodSnapshot {
    pub era: EraIndex,
    pub payout: Balance,
    pub tally: RewardPointTally,
}

impl PeriodSnapshot {
    /// Fetch the era payout and reward points together.
    pub async fn load<S: StakingSource + ?Sized>(
        source: &S,
        era: EraIndex,
    ) -> Result<Self, ChainError> {
        let (payout, tally) = tokio::try_join!(source.era_payout(era), source.era_reward_points(era))?;
        Ok(Self {
            era,
            payout: payout.unwrap_or(0),
            tally,
        })
    }

    fn facts_for(
        &self,
        validator_id: ValidatorId,
        account: &AccountId32,
        commission: Option<Perbill>,
        exposure: Option<Exposure>,
    ) -> RawFacts {
        RawFacts {
            validator_id,
            era: self.era,
            payout: self.payout,
            reward_points: self.tally.points_of(&account.0),
            total_reward_points: self.tally.total,
            commission: commission.unwrap_or_default(),
            exposure: exposure.unwrap_or_default(),
        }
    }
}

async fn bounded<T>(
    limit: Option<Duration>,
    fut: impl Future<Output = Result<T, ChainError>>,
) -> Result<T, ChainError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| ChainError::Timeout(limit))?,
        None => fut.await,
    }
}

/// Retrieves the raw facts for single validators. Performs no retries.
pub struct ExposureFetcher<'a, S: ?Sized> {
    source: &'a S,
    timeout: Option<Duration>,
}

impl<'a, S: StakingSource + ?Sized> ExposureFetcher<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            timeout: None,
        }
    }

    /// Fail any single fetch that takes longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fetch all four facts for one validator in one era.
    pub async fn fetch(&self, era: EraIndex, validator_id: &ValidatorId) -> Result<RawFacts, FetchError> {
        let fail = |cause| FetchError::new(validator_id.clone(), era, cause);
        let account = validator_account(validator_id).map_err(fail)?;

        let (payout, tally, commission, exposure) = bounded(self.timeout, async {
            tokio::try_join!(
                self.source.era_payout(era),
                self.source.era_reward_points(era),
                self.source.era_commission(era, &account),
                self.source.era_exposure(era, &account),
            )
        })
        .await
        .map_err(fail)?;

        let snapshot = PeriodSnapshot {
            era,
            payout: payout.unwrap_or(0),
            tally,
        };
        Ok(snapshot.facts_for(validator_id.clone(), &account, commission, exposure))
    }

    /// Fetch commission and exposure, taking payout and points from `snapshot`.
    pub async fn fetch_in(
        &self,
        snapshot: &PeriodSnapshot,
        validator_id: &ValidatorId,
    ) -> Result<RawFacts, FetchError> {
        let era = snapshot.era;
        let fail = |cause| FetchError::new(validator_id.clone(), era, cause);
        let account = validator_account(validator_id).map_err(fail)?;

        let (commission, exposure) = bounded(self.timeout, async {
            tokio::try_join!(
                self.source.era_commission(era, &account),
                self.source.era_exposure(era, &account),
            )
        })
        .await
        .map_err(fail)?;

        if exposure.is_none() {
            tracing::debug!("No exposure for {} in era {}, treating stake as zero", validator_id, era);
        }

        Ok(snapshot.facts_for(validator_id.clone(), &account, commission, exposure))
    }
}
