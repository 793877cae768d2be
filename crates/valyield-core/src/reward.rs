//! Reward, commission and APY arithmetic.
//!
//! Every step runs on arbitrary-precision unsigned integers and floors at
//! each division, so the result is exact for any on-chain balance and never
//! touches floating point.

use num::{BigUint, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::types::{Apy, Balance, Perbill, RawFacts, ValidatorMetrics};

/// Default number of eras per year (one era per day).
pub const DEFAULT_PERIODS_PER_YEAR: u64 = 365;

/// Number of eras per year as an exact rational.
///
/// `365.24219` is expressed as `36_524_219 / 100_000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnualizationFactor {
    pub numerator: u64,
    pub denominator: u64,
}

impl AnnualizationFactor {
    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub const fn whole(periods: u64) -> Self {
        Self::new(periods, 1)
    }
}

impl Default for AnnualizationFactor {
    fn default() -> Self {
        Self::whole(DEFAULT_PERIODS_PER_YEAR)
    }
}

/// Share of the era payout earned by a validator's points.
pub fn validator_share(payout: Balance, points: u32, total_points: u32) -> Balance {
    if total_points == 0 || points == 0 {
        return 0;
    }
    let share = BigUint::from(payout) * BigUint::from(points) / BigUint::from(total_points);
    // points <= total_points keeps this within payout; anything else is a data anomaly.
    share.to_u128().unwrap_or(0)
}

/// Reward left for nominators once the validator's commission is taken.
pub fn reward_after_commission(share: Balance, commission: Perbill) -> Balance {
    let keep = Perbill::DENOMINATOR.saturating_sub(commission.deconstruct());
    let net = BigUint::from(share) * BigUint::from(keep) / BigUint::from(Perbill::DENOMINATOR);
    net.to_u128().unwrap_or(0)
}

/// Annualize one era's net reward over the stake that earned it.
///
/// Returns hundredths of a percent: `reward * factor * 100 * 100 / stake`.
pub fn annualized_apy(reward: Balance, total_stake: Balance, factor: AnnualizationFactor) -> Apy {
    if total_stake == 0 || factor.denominator == 0 {
        return Apy::zero();
    }
    let percent_scale = BigUint::from(100u32) * BigUint::from(Apy::SCALE);
    let numerator = BigUint::from(reward) * BigUint::from(factor.numerator) * percent_scale;
    let denominator = BigUint::from(total_stake) * BigUint::from(factor.denominator);
    if denominator.is_zero() {
        return Apy::zero();
    }
    let value = numerator / denominator;
    Apy::from_centi_percent(value.to_u128().unwrap_or(0))
}

/// Turns raw era facts into validator metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewardCalculator {
    factor: AnnualizationFactor,
}

impl RewardCalculator {
    pub fn new(factor: AnnualizationFactor) -> Self {
        Self { factor }
    }

    pub fn factor(&self) -> AnnualizationFactor {
        self.factor
    }

    pub fn compute(&self, facts: &RawFacts) -> ValidatorMetrics {
        let share = validator_share(facts.payout, facts.reward_points, facts.total_reward_points);
        let net = reward_after_commission(share, facts.commission);
        let apy = annualized_apy(net, facts.exposure.total, self.factor);

        ValidatorMetrics {
            validator_id: facts.validator_id.clone(),
            era: facts.era,
            commission: facts.commission,
            total_stake: facts.exposure.total,
            own_stake: facts.exposure.own,
            nominator_count: facts.exposure.nominator_count,
            reward_points: facts.reward_points,
            validator_share: share,
            reward_after_commission: net,
            apy,
        }
    }
}
