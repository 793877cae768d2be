//! Selection of the era to analyze.

use crate::error::ChainError;
use crate::source::StakingSource;
use valyield_core::EraIndex;

/// Find the most recent completed era whose reward-point total is non-zero.
///
/// Walks back from the chain's current era while the era is above zero and
/// either has no recorded payout yet or paid no points. The payout is only
/// written once an era ends, so an era still in progress is never selected
/// even though its points are already accumulating. Returns 0 when nothing
/// earlier paid out. With `max_lookback` set, at most that many steps back
/// are taken and the oldest inspected era is returned if the bound is hit.
pub async fn last_rewarded_period<S: StakingSource + ?Sized>(
    source: &S,
    max_lookback: Option<u32>,
) -> Result<EraIndex, ChainError> {
    let Some(start) = source.current_era().await? else {
        tracing::warn!("Chain has no current era, using era 0");
        return Ok(0);
    };

    let mut era = start;
    let mut steps = 0u32;

    while era > 0 {
        if source.era_payout(era).await?.is_some() {
            let tally = source.era_reward_points(era).await?;
            if tally.has_rewards() {
                break;
            }
            tracing::debug!("Era {} has no reward points", era);
        } else {
            tracing::debug!("Era {} has not been paid out yet", era);
        }
        if max_lookback.is_some_and(|limit| steps >= limit) {
            tracing::warn!(
                "No rewarded era within {} eras of {}, stopping at era {}",
                steps,
                start,
                era
            );
            break;
        }
        era -= 1;
        steps += 1;
    }

    tracing::info!("Last rewarded era: {} (current era {})", era, start);
    Ok(era)
}
