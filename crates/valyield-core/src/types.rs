//! Core domain types for validator yield analysis.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Balance = u128;
pub type EraIndex = u32;

/// Raw 32-byte account key as stored on chain.
pub type AccountKey = [u8; 32];

/// Supported networks - exhaustive match required (no default case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Polkadot,
    Kusama,
    Westend,
    Paseo,
}

impl Network {
    pub fn token_symbol(&self) -> &'static str {
        match self {
            Network::Polkadot => "DOT",
            Network::Kusama => "KSM",
            Network::Westend => "WND",
            Network::Paseo => "PAS",
        }
    }

    pub fn token_decimals(&self) -> u8 {
        match self {
            Network::Polkadot => 10,
            Network::Kusama => 12,
            Network::Westend => 12,
            Network::Paseo => 10,
        }
    }

    pub fn ss58_format(&self) -> u16 {
        match self {
            Network::Polkadot => 0,
            Network::Kusama => 2,
            Network::Westend => 42,
            Network::Paseo => 0,
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Polkadot => write!(f, "Polkadot"),
            Network::Kusama => write!(f, "Kusama"),
            Network::Westend => write!(f, "Westend"),
            Network::Paseo => write!(f, "Paseo"),
        }
    }
}

impl std::str::FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polkadot" | "dot" => Ok(Network::Polkadot),
            "kusama" | "ksm" => Ok(Network::Kusama),
            "westend" | "wnd" => Ok(Network::Westend),
            "paseo" | "pas" => Ok(Network::Paseo),
            _ => Err(format!(
                "Unknown network '{}'. Valid options: polkadot, kusama, westend, paseo",
                s
            )),
        }
    }
}

/// SS58-encoded validator account address.
///
/// Ordering is lexicographic on the encoded string, which is what the
/// ranking tie-break relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatorId(String);

impl ValidatorId {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ValidatorId {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

impl From<String> for ValidatorId {
    fn from(address: String) -> Self {
        Self(address)
    }
}

/// Commission rate in parts per billion (1_000_000_000 = 100%).
///
/// Deserialized values pass through [`Perbill::from_parts`], so they are
/// clamped like any other construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Perbill(u32);

impl From<u32> for Perbill {
    fn from(parts: u32) -> Self {
        Self::from_parts(parts)
    }
}

impl From<Perbill> for u32 {
    fn from(perbill: Perbill) -> Self {
        perbill.0
    }
}

impl Perbill {
    pub const DENOMINATOR: u32 = 1_000_000_000;

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn one() -> Self {
        Self(Self::DENOMINATOR)
    }

    /// Build from raw parts, clamping anything above 100%.
    pub fn from_parts(parts: u32) -> Self {
        Self(parts.min(Self::DENOMINATOR))
    }

    pub fn from_percent(percent: u32) -> Self {
        Self::from_parts(percent.saturating_mul(Self::DENOMINATOR / 100))
    }

    pub fn deconstruct(self) -> u32 {
        self.0
    }

    /// Commission as a fraction (0.0 to 1.0), for display only.
    pub fn as_fraction(self) -> f64 {
        self.0 as f64 / Self::DENOMINATOR as f64
    }
}

/// Reward points earned by validators in one era.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardPointTally {
    pub total: u32,
    pub individual: BTreeMap<AccountKey, u32>,
}

impl RewardPointTally {
    pub fn points_of(&self, account: &AccountKey) -> u32 {
        self.individual.get(account).copied().unwrap_or(0)
    }

    /// Whether the era distributed any rewards at all.
    pub fn has_rewards(&self) -> bool {
        self.total > 0
    }
}

/// Stake backing a validator in one era.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Exposure {
    pub total: Balance,
    pub own: Balance,
    pub nominator_count: u32,
}

impl Exposure {
    /// Build an exposure, capping `own` at `total`.
    pub fn new(total: Balance, own: Balance, nominator_count: u32) -> Self {
        Self {
            total,
            own: own.min(total),
            nominator_count,
        }
    }
}

/// The raw chain facts needed to compute one validator's yield in one era.
///
/// Optional chain records (commission, exposure, payout) default to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFacts {
    pub validator_id: ValidatorId,
    pub era: EraIndex,
    pub payout: Balance,
    pub reward_points: u32,
    pub total_reward_points: u32,
    pub commission: Perbill,
    pub exposure: Exposure,
}

/// Annualized yield in hundredths of a percent.
///
/// `Apy(1_642_500)` is 16425.00%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Apy(u128);

impl Apy {
    /// Number of fixed-point units per whole percent.
    pub const SCALE: u128 = 100;

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn from_centi_percent(value: u128) -> Self {
        Self(value)
    }

    pub fn centi_percent(self) -> u128 {
        self.0
    }

    /// APY as a percentage (e.g. 14.25 for 14.25%), for display only.
    pub fn as_percent(self) -> f64 {
        self.0 as f64 / Self::SCALE as f64
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Apy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}%", self.0 / Self::SCALE, self.0 % Self::SCALE)
    }
}

/// Computed yield metrics for one validator in one era.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorMetrics {
    pub validator_id: ValidatorId,
    pub era: EraIndex,
    pub commission: Perbill,
    pub total_stake: Balance,
    pub own_stake: Balance,
    pub nominator_count: u32,
    pub reward_points: u32,
    /// Gross share of the era payout, before commission.
    pub validator_share: Balance,
    pub reward_after_commission: Balance,
    pub apy: Apy,
}

/// Connection status for a chain session.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting { attempt: u32 },
    Retrying { attempt: u32, delay_ms: u64 },
    Connected,
    Error(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_token_symbols() {
        assert_eq!(Network::Polkadot.token_symbol(), "DOT");
        assert_eq!(Network::Kusama.token_symbol(), "KSM");
        assert_eq!(Network::Westend.token_symbol(), "WND");
        assert_eq!(Network::Paseo.token_symbol(), "PAS");
    }

    #[test]
    fn test_network_ss58_format() {
        assert_eq!(Network::Polkadot.ss58_format(), 0);
        assert_eq!(Network::Kusama.ss58_format(), 2);
        assert_eq!(Network::Westend.ss58_format(), 42);
    }

    #[test]
    fn test_network_from_str() {
        assert_eq!("DOT".parse::<Network>().unwrap(), Network::Polkadot);
        assert_eq!("kusama".parse::<Network>().unwrap(), Network::Kusama);
        assert!("solana".parse::<Network>().is_err());
    }

    #[test]
    fn test_network_serde_lowercase() {
        let json = serde_json::to_string(&Network::Westend).unwrap();
        assert_eq!(json, "\"westend\"");
    }

    #[test]
    fn test_perbill_clamps() {
        assert_eq!(Perbill::from_parts(2_000_000_000), Perbill::one());
        assert_eq!(Perbill::from_percent(10).deconstruct(), 100_000_000);
        assert_eq!(Perbill::from_percent(250), Perbill::one());
    }

    #[test]
    fn test_perbill_deserialize_clamps() {
        let perbill: Perbill = serde_json::from_str("2000000000").unwrap();
        assert_eq!(perbill, Perbill::one());
        let perbill: Perbill = serde_json::from_str("50000000").unwrap();
        assert_eq!(perbill, Perbill::from_percent(5));
        assert_eq!(serde_json::to_string(&perbill).unwrap(), "50000000");
    }

    #[test]
    fn test_exposure_caps_own_stake() {
        let exposure = Exposure::new(100, 250, 3);
        assert_eq!(exposure.own, 100);
        assert_eq!(exposure.total, 100);
    }

    #[test]
    fn test_tally_points_of_missing() {
        let mut tally = RewardPointTally {
            total: 80,
            ..Default::default()
        };
        tally.individual.insert([1u8; 32], 60);
        assert_eq!(tally.points_of(&[1u8; 32]), 60);
        assert_eq!(tally.points_of(&[2u8; 32]), 0);
        assert!(tally.has_rewards());
        assert!(!RewardPointTally::default().has_rewards());
    }

    #[test]
    fn test_apy_display() {
        assert_eq!(Apy::from_centi_percent(1_642_500).to_string(), "16425.00%");
        assert_eq!(Apy::from_centi_percent(1_407).to_string(), "14.07%");
        assert_eq!(Apy::zero().to_string(), "0.00%");
    }

    #[test]
    fn test_validator_id_ordering() {
        let a = ValidatorId::from("1abc");
        let b = ValidatorId::from("1abd");
        assert!(a < b);
        assert_eq!(a.to_string(), "1abc");
    }
}
