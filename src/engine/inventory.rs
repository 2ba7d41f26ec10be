//! Inventory estimation for newly created deals.
//!
//! A deal creation request names the ad units it intends to buy. For each
//! unit we derive a write-once snapshot of available impressions from a
//! request-count heuristic scaled by the deal's flight duration and the
//! share of traffic its priority tier can claim, plus an estimated CPM in
//! the deal's price corridor.

use crate::api::models::deals::DealPriority;
use chrono::{DateTime, Utc};

/// Baseline daily ad requests assumed per ad unit.
const DAILY_REQUESTS_PER_AD_UNIT: f64 = 50_000.0;

/// Share of an ad unit's traffic a deal can claim at each priority tier.
fn priority_fill_share(priority: DealPriority) -> f64 {
    match priority {
        DealPriority::High => 0.5,
        DealPriority::Medium => 0.35,
        DealPriority::Low => 0.2,
    }
}

/// One estimated inventory snapshot, prior to persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryEstimate {
    pub ad_unit: String,
    pub available_impressions: i64,
    pub estimated_cpm: f64,
}

/// Metrics derived from a deal's persisted inventory snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DealMetrics {
    pub total_available_impressions: i64,
    pub average_cpm: f64,
    pub estimated_total_value: f64,
}

/// Estimate available impressions and CPM for each requested ad unit.
///
/// A flight shorter than one day still counts as one day of traffic. The
/// estimated CPM sits at the midpoint of the deal's price corridor.
pub fn estimate_inventory(
    ad_units: &[String],
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    priority: DealPriority,
    floor_price: f64,
    target_cpm: f64,
) -> Vec<InventoryEstimate> {
    let days = (end_date - start_date).num_days().max(1) as f64;
    let available =
        (DAILY_REQUESTS_PER_AD_UNIT * days * priority_fill_share(priority)).round() as i64;
    let estimated_cpm = (floor_price + target_cpm) / 2.0;
    ad_units
        .iter()
        .map(|unit| InventoryEstimate {
            ad_unit: unit.clone(),
            available_impressions: available,
            estimated_cpm,
        })
        .collect()
}

/// Summarize a deal's inventory snapshot. Empty inventory yields zeroed
/// metrics rather than dividing by zero.
pub fn deal_metrics(inventory: &[(i64, f64)]) -> DealMetrics {
    if inventory.is_empty() {
        return DealMetrics::default();
    }
    let total: i64 = inventory.iter().map(|(impressions, _)| impressions).sum();
    let average_cpm =
        inventory.iter().map(|(_, cpm)| cpm).sum::<f64>() / inventory.len() as f64;
    DealMetrics {
        total_available_impressions: total,
        average_cpm,
        estimated_total_value: total as f64 / 1000.0 * average_cpm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn units(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn one_estimate_per_ad_unit() {
        let start = Utc::now();
        let end = start + Duration::days(10);
        let estimates = estimate_inventory(
            &units(&["banner-top", "sidebar"]),
            start,
            end,
            DealPriority::Medium,
            2.0,
            6.0,
        );
        assert_eq!(estimates.len(), 2);
        assert_eq!(estimates[0].ad_unit, "banner-top");
        assert_eq!(estimates[1].ad_unit, "sidebar");
        // 50_000 * 10 days * 0.35 share
        assert_eq!(estimates[0].available_impressions, 175_000);
        assert_eq!(estimates[0].estimated_cpm, 4.0);
    }

    #[test]
    fn priority_scales_availability() {
        let start = Utc::now();
        let end = start + Duration::days(2);
        let high = estimate_inventory(&units(&["u"]), start, end, DealPriority::High, 1.0, 3.0);
        let low = estimate_inventory(&units(&["u"]), start, end, DealPriority::Low, 1.0, 3.0);
        assert_eq!(high[0].available_impressions, 100_000);
        assert_eq!(low[0].available_impressions, 40_000);
    }

    #[test]
    fn sub_day_flight_counts_as_one_day() {
        let start = Utc::now();
        let end = start + Duration::hours(6);
        let estimates = estimate_inventory(&units(&["u"]), start, end, DealPriority::Low, 1.0, 3.0);
        assert_eq!(estimates[0].available_impressions, 10_000);
    }

    #[test]
    fn no_ad_units_means_no_estimates() {
        let start = Utc::now();
        let estimates =
            estimate_inventory(&[], start, start + Duration::days(5), DealPriority::High, 1.0, 2.0);
        assert!(estimates.is_empty());
    }

    #[test]
    fn metrics_sum_and_average() {
        let metrics = deal_metrics(&[(100_000, 2.0), (50_000, 4.0)]);
        assert_eq!(metrics.total_available_impressions, 150_000);
        assert_eq!(metrics.average_cpm, 3.0);
        assert_eq!(metrics.estimated_total_value, 450.0);
    }

    #[test]
    fn empty_inventory_yields_zeroed_metrics() {
        assert_eq!(deal_metrics(&[]), DealMetrics::default());
    }
}
