//! Database repository for per-day deal performance.
//!
//! Not a full [`super::Repository`] implementation: rows are accumulated by
//! the execution path and read back for aggregation, never updated or
//! deleted individually.

use crate::db::{
    errors::Result,
    models::performance::{PerformanceDBResponse, PerformanceDeltaDBRequest},
};
use crate::types::{abbrev_uuid, DealId, OrganizationId};
use chrono::NaiveDate;
use sqlx::PgConnection;
use tracing::instrument;

pub struct Performance<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Performance<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Accumulate a delta into the deal's row for `day`, creating the row
    /// on first write.
    #[instrument(skip(self, delta), fields(deal_id = %abbrev_uuid(&deal_id), day = %day), err)]
    pub async fn record(
        &mut self,
        deal_id: DealId,
        day: NaiveDate,
        delta: &PerformanceDeltaDBRequest,
    ) -> Result<PerformanceDBResponse> {
        let row = sqlx::query_as::<_, PerformanceDBResponse>(
            r#"
            INSERT INTO deal_performance (deal_id, day, impressions, clicks, conversions, spend, revenue)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (deal_id, day) DO UPDATE SET
                impressions = deal_performance.impressions + EXCLUDED.impressions,
                clicks = deal_performance.clicks + EXCLUDED.clicks,
                conversions = deal_performance.conversions + EXCLUDED.conversions,
                spend = deal_performance.spend + EXCLUDED.spend,
                revenue = deal_performance.revenue + EXCLUDED.revenue
            RETURNING *
            "#,
        )
        .bind(deal_id)
        .bind(day)
        .bind(delta.impressions)
        .bind(delta.clicks)
        .bind(delta.conversions)
        .bind(delta.spend)
        .bind(delta.revenue)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row)
    }

    /// Daily rows for one deal, optionally bounded by an inclusive date range.
    #[instrument(skip(self), fields(deal_id = %abbrev_uuid(&deal_id)), err)]
    pub async fn for_deal(
        &mut self,
        deal_id: DealId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<PerformanceDBResponse>> {
        let rows = sqlx::query_as::<_, PerformanceDBResponse>(
            r#"
            SELECT * FROM deal_performance
            WHERE deal_id = $1
              AND ($2::date IS NULL OR day >= $2)
              AND ($3::date IS NULL OR day <= $3)
            ORDER BY day ASC
            "#,
        )
        .bind(deal_id)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    /// Daily rows across every deal in an organization.
    #[instrument(skip(self), fields(organization_id = %abbrev_uuid(&organization_id)), err)]
    pub async fn for_organization(
        &mut self,
        organization_id: OrganizationId,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<PerformanceDBResponse>> {
        let rows = sqlx::query_as::<_, PerformanceDBResponse>(
            r#"
            SELECT p.* FROM deal_performance p
            JOIN deals d ON d.id = p.deal_id
            WHERE d.organization_id = $1
              AND ($2::date IS NULL OR p.day >= $2)
              AND ($3::date IS NULL OR p.day <= $3)
            ORDER BY p.day ASC
            "#,
        )
        .bind(organization_id)
        .bind(start)
        .bind(end)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }
}
