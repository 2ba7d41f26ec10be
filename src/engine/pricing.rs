//! Execution price calculation.
//!
//! The price starts at the deal's floor, is adjusted for the selected ad's
//! CTR and the deal's priority, and is clamped to the `[floor, target_cpm]`
//! corridor. The floor clamp is applied first, so a target below the floor
//! degrades to pricing at the target rather than panicking.

use crate::api::models::deals::DealPriority;

const HIGH_CTR_THRESHOLD: f64 = 0.03;
const LOW_CTR_THRESHOLD: f64 = 0.01;
const HIGH_CTR_MULTIPLIER: f64 = 1.1;
const LOW_CTR_MULTIPLIER: f64 = 0.9;

/// Price multiplier contributed by the deal's priority.
pub fn priority_multiplier(priority: DealPriority) -> f64 {
    match priority {
        DealPriority::High => 1.2,
        DealPriority::Medium => 1.0,
        DealPriority::Low => 0.8,
    }
}

/// Pricing inputs carried by the deal.
#[derive(Debug, Clone, Copy)]
pub struct DealTerms {
    pub floor_price: f64,
    pub target_cpm: f64,
    pub priority: DealPriority,
}

/// Compute the execution price for an ad with the given CTR.
pub fn price(ad_ctr: f64, terms: &DealTerms) -> f64 {
    let mut price = terms.floor_price;
    if ad_ctr > HIGH_CTR_THRESHOLD {
        price *= HIGH_CTR_MULTIPLIER;
    } else if ad_ctr < LOW_CTR_THRESHOLD {
        price *= LOW_CTR_MULTIPLIER;
    }
    price *= priority_multiplier(terms.priority);
    price.max(terms.floor_price).min(terms.target_cpm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(floor: f64, target: f64, priority: DealPriority) -> DealTerms {
        DealTerms {
            floor_price: floor,
            target_cpm: target,
            priority,
        }
    }

    #[test]
    fn high_ctr_high_priority_multiplies_up() {
        // 2.0 * 1.1 * 1.2 = 2.64, inside the corridor.
        let p = price(0.05, &terms(2.0, 10.0, DealPriority::High));
        assert!((p - 2.64).abs() < 1e-9);
    }

    #[test]
    fn low_ctr_discount_never_undercuts_the_floor() {
        // 2.0 * 0.9 * 1.0 = 1.8, clamped back to the floor.
        let p = price(0.005, &terms(2.0, 10.0, DealPriority::Medium));
        assert_eq!(p, 2.0);
    }

    #[test]
    fn mid_ctr_gets_no_ctr_adjustment() {
        let p = price(0.02, &terms(2.0, 10.0, DealPriority::Medium));
        assert_eq!(p, 2.0);
    }

    #[test]
    fn boundary_ctrs_are_not_adjusted() {
        // Thresholds are strict inequalities.
        assert_eq!(price(0.03, &terms(2.0, 10.0, DealPriority::Medium)), 2.0);
        assert_eq!(price(0.01, &terms(2.0, 10.0, DealPriority::Medium)), 2.0);
    }

    #[test]
    fn target_cpm_caps_the_price() {
        // 5.0 * 1.1 * 1.2 = 6.6, capped at the 6.0 target.
        let p = price(0.08, &terms(5.0, 6.0, DealPriority::High));
        assert_eq!(p, 6.0);
    }

    #[test]
    fn target_below_floor_prices_at_the_target() {
        let p = price(0.05, &terms(4.0, 3.0, DealPriority::High));
        assert_eq!(p, 3.0);
    }

    #[test]
    fn low_priority_discount_clamped_to_floor() {
        // 2.0 * 0.8 = 1.6, clamped back up.
        let p = price(0.02, &terms(2.0, 10.0, DealPriority::Low));
        assert_eq!(p, 2.0);
    }

    #[test]
    fn price_always_within_corridor() {
        let cases = [
            (0.0, 1.0, 20.0, DealPriority::Low),
            (0.5, 0.5, 0.6, DealPriority::High),
            (0.04, 3.0, 3.1, DealPriority::High),
            (0.009, 7.0, 100.0, DealPriority::Medium),
        ];
        for (ctr, floor, target, priority) in cases {
            let p = price(ctr, &terms(floor, target, priority));
            assert!(p >= floor.min(target), "price {p} below corridor");
            assert!(p <= target, "price {p} above target");
        }
    }
}
