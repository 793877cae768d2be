//! Validator-related chain queries.

use crate::Session;
use crate::error::ChainError;
use subxt::dynamic::{At, DecodedValueThunk, Value};
use subxt::utils::AccountId32;
use valyield_core::{EraIndex, Exposure, Perbill, RewardPointTally};

/// Read a 32-byte account id out of a decoded value.
///
/// AccountId32 decodes either as a plain byte sequence or as a newtype
/// wrapping one.
pub(crate) fn decode_account(value: &Value<u32>) -> Option<AccountId32> {
    account_bytes(value)
        .or_else(|| value.at(0).and_then(account_bytes))
        .map(AccountId32::from)
}

fn account_bytes(value: &Value<u32>) -> Option<[u8; 32]> {
    let mut bytes = [0u8; 32];
    for (k, slot) in bytes.iter_mut().enumerate() {
        *slot = value.at(k).and_then(|b| b.as_u128())? as u8;
    }
    // A 32-byte sequence must not carry a 33rd element.
    if value.at(32).is_some() {
        return None;
    }
    Some(bytes)
}

/// Extract the trailing account id from a storage map key.
pub(crate) fn account_from_key(key_bytes: &[u8]) -> Result<Option<AccountId32>, ChainError> {
    if key_bytes.len() < 32 {
        return Ok(None);
    }
    let account_bytes: [u8; 32] = key_bytes[key_bytes.len() - 32..]
        .try_into()
        .map_err(|_| ChainError::InvalidData("Invalid account key".into()))?;
    Ok(Some(AccountId32::from(account_bytes)))
}

impl Session {
    /// Get the validator set of the current session.
    pub async fn get_session_validators(&self) -> Result<Option<Vec<AccountId32>>, ChainError> {
        let storage_query = subxt::dynamic::storage("Session", "Validators", ());

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

        let decoded = value.to_value()?;
        let mut validators = Vec::new();
        let mut i = 0;
        while let Some(entry) = decoded.at(i) {
            if let Some(account) = decode_account(entry) {
                validators.push(account);
            }
            i += 1;
        }

        Ok(Some(validators))
    }

    /// Get the accounts with an exposure in an era (the elected set).
    pub async fn get_era_elected(&self, era: EraIndex) -> Result<Vec<AccountId32>, ChainError> {
        let storage_query = subxt::dynamic::storage(
            "Staking",
            "ErasStakersOverview",
            vec![Value::u128(era as u128)],
        );

        let mut elected = Vec::new();
        let mut iter = self
            .client()
            .storage()
            .at_latest()
            .await?
            .iter(storage_query)
            .await?;

        while let Some(result) = iter.next().await {
            let kv = result?;
            // Key format: prefix + era (4 bytes) + account (32 bytes)
            if let Some(account) = account_from_key(&kv.key_bytes)? {
                elected.push(account);
            }
        }

        Ok(elected)
    }

    /// Get reward points for all validators in a specific era.
    pub async fn get_era_reward_points(&self, era: EraIndex) -> Result<RewardPointTally, ChainError> {
        let storage_query = subxt::dynamic::storage(
            "Staking",
            "ErasRewardPoints",
            vec![Value::u128(era as u128)],
        );

        let result: Option<DecodedValueThunk> = self
            .client()
            .storage()
            .at_latest()
            .await?
            .fetch(&storage_query)
            .await?;

        let Some(value) = result else {
            return Ok(RewardPointTally::default());
        };

        let decoded = value.to_value()?;

        // EraRewardPoints = { total: u32, individual: BTreeMap<AccountId, u32> }
        let total = decoded
            .at("total")
            .and_then(|v: &Value<u32>| v.as_u128())
            .unwrap_or(0) as u32;

        let mut tally = RewardPointTally {
            total,
            ..Default::default()
        };

        // The map encodes as a sequence of (account, points) tuples.
        if let Some(individual) = decoded.at("individual") {
            let mut i = 0;
            while let Some(entry) = individual.at(i) {
                if let (Some(account), Some(points)) = (
                    entry.at(0).and_then(decode_account),
                    entry.at(1).and_then(|v| v.as_u128()),
                ) {
                    let key: [u8; 32] = account.0;
                    tally.individual.insert(key, points as u32);
                }
                i += 1;
            }
        }

        tracing::debug!(
            "Era {} reward points: total {}, {} validators",
            era,
            tally.total,
            tally.individual.len()
        );

        Ok(tally)
    }

    /// Get the commission a validator declared for an era.
    pub async fn get_era_validator_prefs(
        &self,
        era: EraIndex,
        validator: &AccountId32,
    ) -> Result<Option<Perbill>, ChainError> {
        let storage_query = subxt::dynamic::storage(
            "Staking",
            "ErasValidatorPrefs",
            vec![Value::u128(era as u128), Value::from_bytes(validator.clone())],
        );

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

        // ValidatorPrefs = { commission: Perbill, blocked: bool }
        let commission = value
            .to_value()?
            .at("commission")
            .and_then(|v: &Value<u32>| v.as_u128().or_else(|| v.at(0).and_then(|p| p.as_u128())))
            .unwrap_or(0);

        Ok(Some(Perbill::from_parts(commission.min(u32::MAX as u128) as u32)))
    }

    /// Get a validator's staking exposure for an era (using ErasStakersOverview).
    pub async fn get_era_exposure(
        &self,
        era: EraIndex,
        validator: &AccountId32,
    ) -> Result<Option<Exposure>, ChainError> {
        let storage_query = subxt::dynamic::storage(
            "Staking",
            "ErasStakersOverview",
            vec![Value::u128(era as u128), Value::from_bytes(validator.clone())],
        );

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

        let decoded = value.to_value()?;

        // PagedExposureMetadata = { total: Balance, own: Balance, nominator_count: u32, page_count: u32 }
        let total = decoded
            .at("total")
            .and_then(|v: &Value<u32>| v.as_u128())
            .unwrap_or(0);
        let own = decoded
            .at("own")
            .and_then(|v: &Value<u32>| v.as_u128())
            .unwrap_or(0);
        let nominator_count = decoded
            .at("nominator_count")
            .and_then(|v: &Value<u32>| v.as_u128())
            .unwrap_or(0) as u32;

        Ok(Some(Exposure::new(total, own, nominator_count)))
    }
}
