//! Performance aggregation.
//!
//! A plain linear reduction over already-materialized daily records. Totals
//! are summed, derived ratios guard their denominators and report 0.0 when
//! the denominator is zero.

use crate::db::models::performance::PerformanceDBResponse;

/// One day of raw counters for a deal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceRecord {
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub spend: f64,
    pub revenue: f64,
}

impl From<&PerformanceDBResponse> for PerformanceRecord {
    fn from(row: &PerformanceDBResponse) -> Self {
        Self {
            impressions: row.impressions,
            clicks: row.clicks,
            conversions: row.conversions,
            spend: row.spend,
            revenue: row.revenue,
        }
    }
}

/// Aggregated totals and derived ratios.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceSummary {
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub spend: f64,
    pub revenue: f64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpm: f64,
    pub roas: f64,
}

/// Reduce daily records into totals and ratios.
pub fn aggregate(records: &[PerformanceRecord]) -> PerformanceSummary {
    let mut summary = PerformanceSummary::default();
    for r in records {
        summary.impressions += r.impressions;
        summary.clicks += r.clicks;
        summary.conversions += r.conversions;
        summary.spend += r.spend;
        summary.revenue += r.revenue;
    }
    if summary.impressions > 0 {
        summary.ctr = summary.clicks as f64 / summary.impressions as f64;
        summary.cpm = summary.spend / summary.impressions as f64 * 1000.0;
    }
    if summary.clicks > 0 {
        summary.cpc = summary.spend / summary.clicks as f64;
    }
    if summary.spend > 0.0 {
        summary.roas = summary.revenue / summary.spend;
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(impressions: i64, clicks: i64, conversions: i64, spend: f64, revenue: f64) -> PerformanceRecord {
        PerformanceRecord {
            impressions,
            clicks,
            conversions,
            spend,
            revenue,
        }
    }

    #[test]
    fn empty_input_yields_all_zeros() {
        assert_eq!(aggregate(&[]), PerformanceSummary::default());
    }

    #[test]
    fn totals_and_ratios() {
        let summary = aggregate(&[
            record(10_000, 200, 10, 50.0, 150.0),
            record(5_000, 100, 5, 25.0, 50.0),
        ]);
        assert_eq!(summary.impressions, 15_000);
        assert_eq!(summary.clicks, 300);
        assert_eq!(summary.conversions, 15);
        assert_eq!(summary.spend, 75.0);
        assert_eq!(summary.revenue, 200.0);
        assert!((summary.ctr - 0.02).abs() < 1e-9);
        assert!((summary.cpc - 0.25).abs() < 1e-9);
        assert!((summary.cpm - 5.0).abs() < 1e-9);
        assert!((summary.roas - 200.0 / 75.0).abs() < 1e-9);
    }

    #[test]
    fn zero_denominators_never_divide() {
        let summary = aggregate(&[record(0, 0, 0, 0.0, 10.0)]);
        assert_eq!(summary.ctr, 0.0);
        assert_eq!(summary.cpc, 0.0);
        assert_eq!(summary.cpm, 0.0);
        assert_eq!(summary.roas, 0.0);
        assert_eq!(summary.revenue, 10.0);
    }

    #[test]
    fn impressions_without_clicks_still_price_the_cpm() {
        let summary = aggregate(&[record(2_000, 0, 0, 4.0, 0.0)]);
        assert_eq!(summary.ctr, 0.0);
        assert_eq!(summary.cpc, 0.0);
        assert!((summary.cpm - 2.0).abs() < 1e-9);
    }

    #[test]
    fn aggregation_is_order_independent() {
        let a = record(1_000, 50, 2, 10.0, 30.0);
        let b = record(3_000, 10, 1, 5.0, 1.0);
        let c = record(500, 0, 0, 0.0, 0.0);
        assert_eq!(aggregate(&[a, b, c]), aggregate(&[c, a, b]));
    }
}
