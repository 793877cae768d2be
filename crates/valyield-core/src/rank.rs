//! Validator ranking by yield.

use std::cmp::Ordering;

use crate::types::ValidatorMetrics;

/// Ordering used for rankings: APY descending, then validator id ascending.
pub fn compare_by_apy(a: &ValidatorMetrics, b: &ValidatorMetrics) -> Ordering {
    b.apy
        .cmp(&a.apy)
        .then_with(|| a.validator_id.cmp(&b.validator_id))
}

/// Sort validators by APY and keep the first `top_n` when given.
pub fn rank(mut metrics: Vec<ValidatorMetrics>, top_n: Option<usize>) -> Vec<ValidatorMetrics> {
    metrics.sort_by(compare_by_apy);
    if let Some(n) = top_n {
        metrics.truncate(n);
    }
    metrics
}

/// Fold a freshly delivered batch into an existing ranking.
///
/// Used by consumers that redraw after every batch. With `top_n` set the
/// result never grows beyond `n` entries.
pub fn merge_ranked(
    ranked: Vec<ValidatorMetrics>,
    batch: &[ValidatorMetrics],
    top_n: Option<usize>,
) -> Vec<ValidatorMetrics> {
    let mut merged = ranked;
    merged.extend_from_slice(batch);
    rank(merged, top_n)
}

/// Summary over a ranked set.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RankingSummary {
    pub count: usize,
    pub apy_min: f64,
    pub apy_max: f64,
    pub apy_avg: f64,
}

/// APY spread of a set, in percent.
pub fn summarize(metrics: &[ValidatorMetrics]) -> RankingSummary {
    if metrics.is_empty() {
        return RankingSummary::default();
    }
    let values: Vec<f64> = metrics.iter().map(|m| m.apy.as_percent()).collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    RankingSummary {
        count: values.len(),
        apy_min: min,
        apy_max: max,
        apy_avg: values.iter().sum::<f64>() / values.len() as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Apy, Perbill, ValidatorId};
    use approx::assert_relative_eq;

    fn metrics(id: &str, apy: u128) -> ValidatorMetrics {
        ValidatorMetrics {
            validator_id: ValidatorId::from(id),
            era: 10,
            commission: Perbill::zero(),
            total_stake: 1_000,
            own_stake: 100,
            nominator_count: 1,
            reward_points: 20,
            validator_share: 10,
            reward_after_commission: 10,
            apy: Apy::from_centi_percent(apy),
        }
    }

    fn ids(ranked: &[ValidatorMetrics]) -> Vec<&str> {
        ranked.iter().map(|m| m.validator_id.as_str()).collect()
    }

    #[test]
    fn test_rank_descending_by_apy() {
        let ranked = rank(
            vec![metrics("a", 1_200), metrics("b", 1_500), metrics("c", 900)],
            None,
        );
        assert_eq!(ids(&ranked), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_rank_ties_broken_by_id() {
        let ranked = rank(
            vec![metrics("zed", 1_400), metrics("alpha", 1_400), metrics("mid", 1_400)],
            None,
        );
        assert_eq!(ids(&ranked), vec!["alpha", "mid", "zed"]);
    }

    #[test]
    fn test_rank_top_n() {
        let all = vec![metrics("a", 1), metrics("b", 2), metrics("c", 3)];
        assert_eq!(ids(&rank(all.clone(), Some(2))), vec!["c", "b"]);
        assert_eq!(rank(all.clone(), Some(10)).len(), 3);
        assert!(rank(all, Some(0)).is_empty());
    }

    #[test]
    fn test_merge_ranked_incremental() {
        let first = rank(vec![metrics("a", 500), metrics("b", 700)], Some(3));
        let merged = merge_ranked(first, &[metrics("c", 600), metrics("d", 800)], Some(3));
        assert_eq!(ids(&merged), vec!["d", "b", "c"]);
    }

    #[test]
    fn test_merge_matches_single_rank() {
        let batches = [
            vec![metrics("e", 5), metrics("a", 9)],
            vec![metrics("c", 9), metrics("b", 1)],
            vec![metrics("d", 7)],
        ];
        let mut incremental = Vec::new();
        for batch in &batches {
            incremental = merge_ranked(incremental, batch, None);
        }
        let once = rank(batches.concat(), None);
        assert_eq!(incremental, once);
    }

    #[test]
    fn test_summarize() {
        let summary = summarize(&[metrics("a", 1_000), metrics("b", 2_000), metrics("c", 1_500)]);
        assert_eq!(summary.count, 3);
        assert_relative_eq!(summary.apy_min, 10.0);
        assert_relative_eq!(summary.apy_max, 20.0);
        assert_relative_eq!(summary.apy_avg, 15.0);
    }

    #[test]
    fn test_summarize_empty() {
        assert_eq!(summarize(&[]), RankingSummary::default());
    }
}
