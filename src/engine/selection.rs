//! Candidate scoring and ad selection.
//!
//! Every candidate ad gets a performance score: CTR contributes when the ad
//! has a positive click-through rate, the conversion rate contributes when
//! the ad has recorded clicks, and the deal priority adds a flat bonus. The
//! highest score wins; ties keep the earliest candidate so selection is
//! deterministic for a fixed input order.

use crate::api::models::deals::DealPriority;
use crate::db::models::ads::AdDBResponse;
use crate::types::AdId;

const CTR_WEIGHT: f64 = 100.0;
const CONVERSION_WEIGHT: f64 = 50.0;

/// Flat score bonus contributed by the deal's priority.
pub fn priority_bonus(priority: DealPriority) -> f64 {
    match priority {
        DealPriority::High => 100.0,
        DealPriority::Medium => 50.0,
        DealPriority::Low => 25.0,
    }
}

/// An ad considered for selection, reduced to its scoring inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct AdCandidate {
    pub id: AdId,
    pub ctr: f64,
    pub clicks: i64,
    pub conversions: i64,
}

impl From<&AdDBResponse> for AdCandidate {
    fn from(ad: &AdDBResponse) -> Self {
        Self {
            id: ad.id,
            ctr: ad.ctr,
            clicks: ad.clicks,
            conversions: ad.conversions,
        }
    }
}

/// Score a single candidate under the given deal priority.
pub fn score(candidate: &AdCandidate, priority: DealPriority) -> f64 {
    let mut total = priority_bonus(priority);
    if candidate.ctr > 0.0 {
        total += candidate.ctr * CTR_WEIGHT;
    }
    if candidate.clicks > 0 {
        total += candidate.conversions as f64 / candidate.clicks as f64 * CONVERSION_WEIGHT;
    }
    total
}

/// Pick the highest-scoring candidate. Returns `None` for an empty slate;
/// ties resolve to the earliest candidate.
pub fn select_best(candidates: &[AdCandidate], priority: DealPriority) -> Option<&AdCandidate> {
    let mut best: Option<(&AdCandidate, f64)> = None;
    for candidate in candidates {
        let s = score(candidate, priority);
        match best {
            Some((_, best_score)) if s <= best_score => {}
            _ => best = Some((candidate, s)),
        }
    }
    best.map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn candidate(ctr: f64, clicks: i64, conversions: i64) -> AdCandidate {
        AdCandidate {
            id: Uuid::new_v4(),
            ctr,
            clicks,
            conversions,
        }
    }

    #[test]
    fn score_combines_ctr_conversion_rate_and_priority() {
        // 0.05 * 100 + (10 / 200) * 50 + 100
        let c = candidate(0.05, 200, 10);
        assert_eq!(score(&c, DealPriority::High), 107.5);
        assert_eq!(score(&c, DealPriority::Medium), 57.5);
        assert_eq!(score(&c, DealPriority::Low), 32.5);
    }

    #[test]
    fn zero_ctr_and_zero_clicks_contribute_nothing() {
        let c = candidate(0.0, 0, 0);
        assert_eq!(score(&c, DealPriority::Medium), 50.0);
    }

    #[test]
    fn conversion_term_skipped_without_clicks() {
        // Conversions without clicks must not divide by zero.
        let c = candidate(0.02, 0, 5);
        assert_eq!(score(&c, DealPriority::Low), 0.02 * 100.0 + 25.0);
    }

    #[test]
    fn empty_slate_selects_nothing() {
        assert_eq!(select_best(&[], DealPriority::High), None);
    }

    #[test]
    fn highest_score_wins() {
        let weak = candidate(0.01, 100, 1);
        let strong = candidate(0.08, 100, 20);
        let candidates = [weak.clone(), strong.clone()];
        let picked = select_best(&candidates, DealPriority::Medium);
        assert_eq!(picked, Some(&strong));
    }

    #[test]
    fn ties_keep_the_earliest_candidate() {
        let first = candidate(0.05, 100, 10);
        let second = candidate(0.05, 100, 10);
        let candidates = [first.clone(), second];
        let picked = select_best(&candidates, DealPriority::High);
        assert_eq!(picked.map(|c| c.id), Some(first.id));
    }

    #[test]
    fn priority_shifts_all_candidates_equally() {
        let a = candidate(0.03, 50, 2);
        let b = candidate(0.02, 50, 4);
        let high = select_best(&[a.clone(), b.clone()], DealPriority::High).map(|c| c.id);
        let low = select_best(&[a, b], DealPriority::Low).map(|c| c.id);
        assert_eq!(high, low);
    }
}
