//! Nominator queries.

use crate::Session;
use crate::error::ChainError;
use crate::queries::validators::decode_account;
use subxt::dynamic::{At, DecodedValueThunk, Value};
use subxt::utils::AccountId32;

impl Session {
    /// Get the validators a nominator currently backs.
    pub async fn get_nomination_targets(
        &self,
        nominator: &AccountId32,
    ) -> Result<Vec<AccountId32>, ChainError> {
        let storage_query = subxt::dynamic::storage(
            "Staking",
            "Nominators",
            vec![Value::from_bytes(nominator.clone())],
        );

        let result: Option<DecodedValueThunk> = self
            .client()
            .storage()
            .at_latest()
            .await?
            .fetch(&storage_query)
            .await?;

        let Some(value) = result else {
            return Ok(Vec::new());
        };

        // Nominations = { targets: BoundedVec<AccountId>, submitted_in: EraIndex, suppressed: bool }
        let decoded = value.to_value()?;
        let Some(list) = decoded.at("targets") else {
            return Ok(Vec::new());
        };

        let targets = accounts_in(list);
        if !targets.is_empty() {
            return Ok(targets);
        }
        // BoundedVec may appear wrapped in a single-field composite
        Ok(list.at(0).map(accounts_in).unwrap_or_default())
    }
}

fn accounts_in(list: &Value<u32>) -> Vec<AccountId32> {
    let mut accounts = Vec::new();
    let mut i = 0;
    while let Some(entry) = list.at(i) {
        if let Some(account) = decode_account(entry) {
            accounts.push(account);
        }
        i += 1;
    }
    accounts
}
