//! API models for performance analytics.

use crate::engine::metrics::PerformanceSummary;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Optional date-range bounds for performance queries (inclusive).
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct PerformanceQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Aggregated performance totals and derived ratios for a deal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PerformanceSummaryResponse {
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub spend: f64,
    pub revenue: f64,
    /// Click-through rate: clicks / impressions
    pub ctr: f64,
    /// Cost per click: spend / clicks
    pub cpc: f64,
    /// Cost per mille: spend / impressions * 1000
    pub cpm: f64,
    /// Return on ad spend: revenue / spend
    pub roas: f64,
}

/// Organization-wide rollup across all deals.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationAnalyticsResponse {
    pub total_deals: i64,
    pub active_deals: i64,
    pub summary: PerformanceSummaryResponse,
}

impl From<PerformanceSummary> for PerformanceSummaryResponse {
    fn from(s: PerformanceSummary) -> Self {
        Self {
            impressions: s.impressions,
            clicks: s.clicks,
            conversions: s.conversions,
            spend: s.spend,
            revenue: s.revenue,
            ctr: s.ctr,
            cpc: s.cpc,
            cpm: s.cpm,
            roas: s.roas,
        }
    }
}
