//! Database models for per-day deal performance accumulation.

use crate::types::DealId;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// One accumulated performance row per deal per day.
#[derive(Debug, Clone, FromRow)]
pub struct PerformanceDBResponse {
    pub id: Uuid,
    pub deal_id: DealId,
    pub day: NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub spend: f64,
    pub revenue: f64,
    pub created_at: DateTime<Utc>,
}

/// Increment applied to a deal's performance row for one day. Missing rows
/// are created on first write.
#[derive(Debug, Clone, Copy, Default)]
pub struct PerformanceDeltaDBRequest {
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub spend: f64,
    pub revenue: f64,
}
