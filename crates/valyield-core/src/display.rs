//! Display rows for printing ranked validators.

use serde::{Deserialize, Serialize};

use crate::types::{Balance, Network, ValidatorMetrics};

/// Format a planck amount as whole tokens with two decimals.
pub fn format_balance(amount: Balance, decimals: u8) -> String {
    let unit = 10u128.pow(decimals as u32);
    let whole = amount / unit;
    let cents = (amount % unit) * 100 / unit;
    format!("{}.{:02}", group_thousands(whole), cents)
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// One printable row of a ranking table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRow {
    pub rank: usize,
    pub address: String,
    /// Commission as a percentage string, e.g. "10.00%".
    pub commission: String,
    pub total_stake: String,
    pub own_stake: String,
    pub nominator_count: u32,
    pub points: u32,
    pub reward_after_commission: String,
    pub apy: String,
}

impl MetricsRow {
    pub fn from_metrics(rank: usize, metrics: &ValidatorMetrics, network: Network) -> Self {
        let decimals = network.token_decimals();
        Self {
            rank,
            address: metrics.validator_id.to_string(),
            commission: format!("{:.2}%", metrics.commission.as_fraction() * 100.0),
            total_stake: format_balance(metrics.total_stake, decimals),
            own_stake: format_balance(metrics.own_stake, decimals),
            nominator_count: metrics.nominator_count,
            points: metrics.reward_points,
            reward_after_commission: format_balance(metrics.reward_after_commission, decimals),
            apy: metrics.apy.to_string(),
        }
    }
}

/// Build display rows for an already ranked list.
pub fn rows(ranked: &[ValidatorMetrics], network: Network) -> Vec<MetricsRow> {
    ranked
        .iter()
        .enumerate()
        .map(|(i, m)| MetricsRow::from_metrics(i + 1, m, network))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Apy, Perbill, ValidatorId};

    fn sample() -> ValidatorMetrics {
        ValidatorMetrics {
            validator_id: ValidatorId::from("15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5"),
            era: 1_918,
            commission: Perbill::from_percent(3),
            total_stake: 23_456_789_012_345_678,
            own_stake: 10_000_000_000_000,
            nominator_count: 512,
            reward_points: 80_020,
            validator_share: 1_000_000_000_000,
            reward_after_commission: 970_000_000_000,
            apy: Apy::from_centi_percent(1_412),
        }
    }

    #[test]
    fn test_format_balance() {
        assert_eq!(format_balance(0, 10), "0.00");
        assert_eq!(format_balance(15_000_000_000, 10), "1.50");
        assert_eq!(format_balance(1_234_567 * 10u128.pow(10), 10), "1,234,567.00");
        assert_eq!(format_balance(999, 0), "999.00");
    }

    #[test]
    fn test_row_from_metrics() {
        let row = MetricsRow::from_metrics(1, &sample(), Network::Polkadot);
        assert_eq!(row.rank, 1);
        assert_eq!(row.commission, "3.00%");
        assert_eq!(row.total_stake, "2,345,678.90");
        assert_eq!(row.own_stake, "1,000.00");
        assert_eq!(row.reward_after_commission, "97.00");
        assert_eq!(row.apy, "14.12%");
    }

    #[test]
    fn test_rows_numbering() {
        let list = vec![sample(), sample()];
        let out = rows(&list, Network::Kusama);
        assert_eq!(out.iter().map(|r| r.rank).collect::<Vec<_>>(), vec![1, 2]);
    }
}
