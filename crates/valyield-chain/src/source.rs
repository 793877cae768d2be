//! The read-only staking data source the pipeline runs against.

use async_trait::async_trait;
use subxt::utils::AccountId32;
use valyield_core::{Balance, EraIndex, Exposure, Perbill, RewardPointTally};

use crate::Session;
use crate::error::ChainError;

/// Finalized per-era staking facts, keyed by era and validator account.
///
/// Implementations must be safe to query concurrently through a shared
/// reference; the retriever fans out one batch of requests at a time.
#[async_trait]
pub trait StakingSource: Send + Sync {
    /// SS58 prefix used to render account ids for this chain.
    fn ss58_prefix(&self) -> u16;

    /// Latest era known to the chain, if any.
    async fn current_era(&self) -> Result<Option<EraIndex>, ChainError>;

    /// Validators active in the current session.
    async fn active_validators(&self) -> Result<Vec<AccountId32>, ChainError>;

    /// Total reward pool for an era.
    async fn era_payout(&self, era: EraIndex) -> Result<Option<Balance>, ChainError>;

    /// Reward points per validator for an era.
    async fn era_reward_points(&self, era: EraIndex) -> Result<RewardPointTally, ChainError>;

    /// Commission declared by a validator for an era.
    async fn era_commission(
        &self,
        era: EraIndex,
        validator: &AccountId32,
    ) -> Result<Option<Perbill>, ChainError>;

    /// Stake backing a validator in an era.
    async fn era_exposure(
        &self,
        era: EraIndex,
        validator: &AccountId32,
    ) -> Result<Option<Exposure>, ChainError>;

    /// Validators currently nominated by an account.
    async fn nomination_targets(&self, nominator: &AccountId32)
    -> Result<Vec<AccountId32>, ChainError>;
}

#[async_trait]
impl StakingSource for Session {
    fn ss58_prefix(&self) -> u16 {
        self.network().ss58_format()
    }

    async fn current_era(&self) -> Result<Option<EraIndex>, ChainError> {
        self.get_current_era().await
    }

    async fn active_validators(&self) -> Result<Vec<AccountId32>, ChainError> {
        match self.get_session_validators().await {
            Ok(Some(validators)) if !validators.is_empty() => return Ok(validators),
            Ok(_) => tracing::debug!("No Session::Validators on this chain, using elected set"),
            Err(e) => tracing::debug!("Session::Validators unavailable ({}), using elected set", e),
        }

        // Asset Hub keeps staking but not the relay session; use the active era's exposures.
        let era = match self.get_active_era().await? {
            Some(era) => era,
            None => self.get_current_era().await?.unwrap_or(0),
        };
        self.get_era_elected(era).await
    }

    async fn era_payout(&self, era: EraIndex) -> Result<Option<Balance>, ChainError> {
        self.get_era_validator_reward(era).await
    }

    async fn era_reward_points(&self, era: EraIndex) -> Result<RewardPointTally, ChainError> {
        self.get_era_reward_points(era).await
    }

    async fn era_commission(
        &self,
        era: EraIndex,
        validator: &AccountId32,
    ) -> Result<Option<Perbill>, ChainError> {
        self.get_era_validator_prefs(era, validator).await
    }

    async fn era_exposure(
        &self,
        era: EraIndex,
        validator: &AccountId32,
    ) -> Result<Option<Exposure>, ChainError> {
        self.get_era_exposure(era, validator).await
    }

    async fn nomination_targets(
        &self,
        nominator: &AccountId32,
    ) -> Result<Vec<AccountId32>, ChainError> {
        self.get_nomination_targets(nominator).await
    }
}
