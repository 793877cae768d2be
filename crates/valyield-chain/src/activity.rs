//! Whether a nominator's targets were active over a range of eras.

use crate::error::ChainError;
use crate::source::StakingSource;
use crate::ss58::{validator_account, validator_id};
use valyield_core::{EraIndex, ValidatorId};

/// Activity of one nominated validator in one era.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominatorEraActivity {
    pub era: EraIndex,
    pub validator: ValidatorId,
    /// The validator had non-zero backing stake in the era.
    pub active: bool,
}

/// Check each of `nominator`'s current targets for every era in `start..=end`.
///
/// Results are ordered by era, then by target order on chain.
pub async fn validator_activity<S: StakingSource + ?Sized>(
    source: &S,
    nominator: &ValidatorId,
    start: EraIndex,
    end: EraIndex,
) -> Result<Vec<NominatorEraActivity>, ChainError> {
    if start > end {
        return Err(ChainError::InvalidArgument(format!(
            "start era {} is after end era {}",
            start, end
        )));
    }

    let account = validator_account(nominator)?;
    let targets = source.nomination_targets(&account).await?;
    tracing::info!(
        "{} nominates {} validators, checking eras {}..={}",
        nominator,
        targets.len(),
        start,
        end
    );

    let prefix = source.ss58_prefix();
    let mut activity = Vec::new();
    for era in start..=end {
        let exposures = futures::future::try_join_all(
            targets.iter().map(|target| source.era_exposure(era, target)),
        )
        .await?;

        for (target, exposure) in targets.iter().zip(exposures) {
            activity.push(NominatorEraActivity {
                era,
                validator: validator_id(target, prefix),
                active: exposure.is_some_and(|e| e.total > 0),
            });
        }
    }

    Ok(activity)
}
