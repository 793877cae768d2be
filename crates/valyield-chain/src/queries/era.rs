//! Era-related chain queries.

use crate::Session;
use crate::error::ChainError;
use subxt::dynamic::{At, DecodedValueThunk, Value};
use valyield_core::{Balance, EraIndex};

impl Session {
    /// Get the era currently being planned or played, if the chain has one.
    pub async fn get_current_era(&self) -> Result<Option<EraIndex>, ChainError> {
        let storage_query = subxt::dynamic::storage("Staking", "CurrentEra", ());

        let result: Option<DecodedValueThunk> = self
            .client()
            .storage()
            .at_latest()
            .await?
            .fetch(&storage_query)
            .await?;

        let Some(value) = result else {
            tracing::debug!("CurrentEra storage returned None");
            return Ok(None);
        };

        let index = value
            .to_value()?
            .as_u128()
            .ok_or_else(|| ChainError::InvalidData("Invalid current era index".into()))?;

        Ok(Some(index as EraIndex))
    }

    /// Get the index of the active era.
    pub async fn get_active_era(&self) -> Result<Option<EraIndex>, ChainError> {
        let storage_query = subxt::dynamic::storage("Staking", "ActiveEra", ());

        let result: Option<DecodedValueThunk> = self
            .client()
            .storage()
            .at_latest()
            .await?
            .fetch(&storage_query)
            .await?;

        let Some(value) = result else {
            return Ok(None);
        };

        // ActiveEraInfo = { index: u32, start: Option<u64> }
        let index = value
            .to_value()?
            .at("index")
            .and_then(|v: &Value<u32>| v.as_u128())
            .ok_or_else(|| ChainError::InvalidData("Missing era index".into()))?;

        Ok(Some(index as EraIndex))
    }

    /// Get the total validator reward paid for an era.
    pub async fn get_era_validator_reward(
        &self,
        era: EraIndex,
    ) -> Result<Option<Balance>, ChainError> {
        let storage_query = subxt::dynamic::storage(
            "Staking",
            "ErasValidatorReward",
            vec![Value::u128(era as u128)],
        );

        let result: Option<DecodedValueThunk> = self
            .client()
            .storage()
            .at_latest()
            .await?
            .fetch(&storage_query)
            .await?;

        match result {
            Some(value) => Ok(value.to_value()?.as_u128()),
            None => Ok(None),
        }
    }

    /// Get history depth (number of eras for which staking data is kept).
    pub fn get_history_depth(&self) -> Result<u32, ChainError> {
        let constant = subxt::dynamic::constant("Staking", "HistoryDepth");
        let value = self.client().constants().at(&constant)?;
        let decoded = value.to_value()?;
        decoded
            .as_u128()
            .map(|v| v as u32)
            .ok_or_else(|| ChainError::InvalidData("Invalid constant Staking::HistoryDepth".into()))
    }
}
