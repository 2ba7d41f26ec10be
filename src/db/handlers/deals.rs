//! Database repository for programmatic deals.
//!
//! Besides plain CRUD this repository owns the three stateful deal paths:
//! gated status transitions, the write-once inventory snapshot written in
//! the creation transaction, and [`Deals::execute`], which runs the full
//! match/select/price pipeline under a row lock so concurrent executions
//! cannot overspend the budget.

use std::collections::HashMap;

use crate::api::models::deals::{AdRequest, DealStatus, ExecutionResponse};
use crate::db::{
    errors::{DbError, Result},
    handlers::{ads::Ads, performance::Performance, repository::Repository},
    models::{
        deals::{DealCreateDBRequest, DealDBResponse, DealUpdateDBRequest, InventoryDBResponse},
        performance::PerformanceDeltaDBRequest,
    },
};
use crate::engine::{execution, inventory, pricing, selection, targeting};
use crate::types::{abbrev_uuid, DealId, Operation, OrganizationId};
use chrono::{DateTime, Utc};
use sqlx::{Connection, PgConnection};
use tracing::instrument;

/// Filter for listing deals
#[derive(Debug, Clone)]
pub struct DealFilter {
    pub skip: i64,
    pub limit: i64,
    pub organization_id: Option<OrganizationId>,
    pub status: Option<DealStatus>,
}

impl DealFilter {
    pub fn new(skip: i64, limit: i64, organization_id: Option<OrganizationId>, status: Option<DealStatus>) -> Self {
        Self {
            skip,
            limit,
            organization_id,
            status,
        }
    }
}

pub struct Deals<'c> {
    db: &'c mut PgConnection,
}

fn not_executed(deal_id: DealId, reason: String) -> ExecutionResponse {
    ExecutionResponse {
        executed: false,
        ad_id: None,
        price: 0.0,
        deal_id,
        reason: Some(reason),
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Deals<'c> {
    type CreateRequest = DealCreateDBRequest;
    type UpdateRequest = DealUpdateDBRequest;
    type Response = DealDBResponse;
    type Id = DealId;
    type Filter = DealFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        let deal = sqlx::query_as::<_, DealDBResponse>(
            r#"
            INSERT INTO deals (
                organization_id, name, deal_type, priority, floor_price, target_cpm,
                geo_country, geo_region, device_os, device_type, categories,
                budget, start_date, end_date, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(request.organization_id)
        .bind(&request.name)
        .bind(request.deal_type)
        .bind(request.priority)
        .bind(request.floor_price)
        .bind(request.target_cpm)
        .bind(&request.targeting.geo_country)
        .bind(&request.targeting.geo_region)
        .bind(&request.targeting.device_os)
        .bind(&request.targeting.device_type)
        .bind(&request.targeting.categories)
        .bind(request.budget)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.created_by)
        .fetch_one(&mut *tx)
        .await?;

        // Inventory snapshot is written once, in the same transaction.
        let estimates = inventory::estimate_inventory(
            &request.ad_units,
            deal.start_date,
            deal.end_date,
            deal.priority,
            deal.floor_price,
            deal.target_cpm,
        );
        for estimate in &estimates {
            sqlx::query(
                r#"
                INSERT INTO deal_inventory (deal_id, ad_unit, available_impressions, estimated_cpm)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(deal.id)
            .bind(&estimate.ad_unit)
            .bind(estimate.available_impressions)
            .bind(estimate.estimated_cpm)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(deal)
    }

    #[instrument(skip(self), fields(deal_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let deal = sqlx::query_as::<_, DealDBResponse>("SELECT * FROM deals WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(deal)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let deals = sqlx::query_as::<_, DealDBResponse>("SELECT * FROM deals WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(deals.into_iter().map(|d| (d.id, d)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let deals = sqlx::query_as::<_, DealDBResponse>(
            r#"
            SELECT * FROM deals
            WHERE ($1::uuid IS NULL OR organization_id = $1)
              AND ($2::deal_status IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.status)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(deals)
    }

    /// Deals are never physically deleted; retirement is the COMPLETED status.
    #[instrument(skip(self), fields(deal_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        Err(DbError::ProtectedEntity {
            operation: Operation::DeleteAll,
            reason: "deals are retired by completing them, not deleted".to_string(),
            entity_type: "deal".to_string(),
            entity_id: Some(id.to_string()),
        })
    }

    #[instrument(skip(self, request), fields(deal_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // A supplied targeting filter replaces the whole filter, including
        // dimensions it leaves unset.
        let deal = if let Some(t) = &request.targeting {
            sqlx::query_as::<_, DealDBResponse>(
                r#"
                UPDATE deals SET
                    name = COALESCE($2, name),
                    priority = COALESCE($3, priority),
                    floor_price = COALESCE($4, floor_price),
                    target_cpm = COALESCE($5, target_cpm),
                    budget = COALESCE($6, budget),
                    geo_country = $7,
                    geo_region = $8,
                    device_os = $9,
                    device_type = $10,
                    categories = $11,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&request.name)
            .bind(request.priority)
            .bind(request.floor_price)
            .bind(request.target_cpm)
            .bind(request.budget)
            .bind(&t.geo_country)
            .bind(&t.geo_region)
            .bind(&t.device_os)
            .bind(&t.device_type)
            .bind(&t.categories)
            .fetch_optional(&mut *self.db)
            .await?
        } else {
            sqlx::query_as::<_, DealDBResponse>(
                r#"
                UPDATE deals SET
                    name = COALESCE($2, name),
                    priority = COALESCE($3, priority),
                    floor_price = COALESCE($4, floor_price),
                    target_cpm = COALESCE($5, target_cpm),
                    budget = COALESCE($6, budget),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING *
                "#,
            )
            .bind(id)
            .bind(&request.name)
            .bind(request.priority)
            .bind(request.floor_price)
            .bind(request.target_cpm)
            .bind(request.budget)
            .fetch_optional(&mut *self.db)
            .await?
        };

        deal.ok_or(DbError::NotFound)
    }
}

impl<'c> Deals<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Apply a status transition, holding the row lock so the current
    /// status cannot change underneath the check.
    #[instrument(skip(self), fields(deal_id = %abbrev_uuid(&id), to = %to), err)]
    pub async fn transition_status(&mut self, id: DealId, to: DealStatus) -> Result<DealDBResponse> {
        let mut tx = self.db.begin().await?;

        let deal = sqlx::query_as::<_, DealDBResponse>("SELECT * FROM deals WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        if !execution::transition_allowed(deal.status, to) {
            return Err(DbError::CheckViolation {
                constraint: None,
                table: Some("deals".to_string()),
                message: format!("Cannot transition deal from {} to {}", deal.status, to),
            });
        }

        let deal = sqlx::query_as::<_, DealDBResponse>(
            "UPDATE deals SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(to)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(deal)
    }

    /// Run the execution pipeline for one ad request.
    ///
    /// The deal row is locked for the whole pipeline, so the budget gate and
    /// the spend increment are atomic with respect to concurrent executions
    /// of the same deal. A failed gate, a targeting mismatch, or an empty
    /// candidate slate is a domain outcome carried in the response, not an
    /// error.
    #[instrument(skip(self, request), fields(deal_id = %abbrev_uuid(&id)), err)]
    pub async fn execute(
        &mut self,
        id: DealId,
        request: &AdRequest,
        now: DateTime<Utc>,
    ) -> Result<ExecutionResponse> {
        let mut tx = self.db.begin().await?;

        let deal = sqlx::query_as::<_, DealDBResponse>("SELECT * FROM deals WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        let gates = execution::ExecutionGates {
            status: deal.status,
            start_date: deal.start_date,
            end_date: deal.end_date,
            budget: deal.budget,
            spend: deal.spend,
        };
        if let Err(reason) = execution::check_gates(&gates, now) {
            tx.commit().await?;
            return Ok(not_executed(deal.id, reason));
        }

        if !targeting::matches(request, &deal.targeting()) {
            tx.commit().await?;
            return Ok(not_executed(deal.id, "Ad request does not match deal targeting".to_string()));
        }

        let slate: Vec<selection::AdCandidate> = Ads::new(&mut tx)
            .list_active_for_organization(deal.organization_id)
            .await?
            .iter()
            .map(selection::AdCandidate::from)
            .collect();

        let Some(winner) = selection::select_best(&slate, deal.priority) else {
            tx.commit().await?;
            return Ok(not_executed(deal.id, "No available ads for this deal".to_string()));
        };

        let price = pricing::price(
            winner.ctr,
            &pricing::DealTerms {
                floor_price: deal.floor_price,
                target_cpm: deal.target_cpm,
                priority: deal.priority,
            },
        );

        sqlx::query("UPDATE deals SET spend = spend + $2, updated_at = NOW() WHERE id = $1")
            .bind(deal.id)
            .bind(price)
            .execute(&mut *tx)
            .await?;

        Performance::new(&mut tx)
            .record(
                deal.id,
                now.date_naive(),
                &PerformanceDeltaDBRequest {
                    impressions: 1,
                    spend: price,
                    ..Default::default()
                },
            )
            .await?;

        tx.commit().await?;

        Ok(ExecutionResponse {
            executed: true,
            ad_id: Some(winner.id),
            price,
            deal_id: deal.id,
            reason: None,
        })
    }

    /// The write-once inventory snapshot taken at creation.
    #[instrument(skip(self), fields(deal_id = %abbrev_uuid(&id)), err)]
    pub async fn get_inventory(&mut self, id: DealId) -> Result<Vec<InventoryDBResponse>> {
        let rows = sqlx::query_as::<_, InventoryDBResponse>(
            "SELECT * FROM deal_inventory WHERE deal_id = $1 ORDER BY ad_unit ASC",
        )
        .bind(id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows)
    }

    /// Total and ACTIVE deal counts for an organization.
    #[instrument(skip(self), fields(organization_id = %abbrev_uuid(&organization_id)), err)]
    pub async fn count_by_organization(&mut self, organization_id: OrganizationId) -> Result<(i64, i64)> {
        let counts: (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE status = 'ACTIVE')
            FROM deals WHERE organization_id = $1
            "#,
        )
        .bind(organization_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::deals::{DealPriority, DealType, DeviceContext, GeoContext, TargetingSpec};
    use crate::db::{
        handlers::{Ads, Organizations},
        models::{ads::AdCreateDBRequest, ads::AdUpdateDBRequest, organizations::OrganizationCreateDBRequest},
    };
    use chrono::Duration;
    use sqlx::PgPool;

    async fn test_org(conn: &mut PgConnection) -> OrganizationId {
        Organizations::new(conn)
            .create(&OrganizationCreateDBRequest {
                name: "Deals Org".to_string(),
                slug: "deals-org".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn deal_create(org: OrganizationId) -> DealCreateDBRequest {
        let now = Utc::now();
        DealCreateDBRequest::builder()
            .organization_id(org)
            .name("Q3 video buy".to_string())
            .deal_type(DealType::Preferred)
            .priority(DealPriority::High)
            .floor_price(2.0)
            .target_cpm(10.0)
            .budget(1000.0)
            .start_date(now - Duration::days(1))
            .end_date(now + Duration::days(30))
            .build()
    }

    async fn active_deal(conn: &mut PgConnection, org: OrganizationId) -> DealDBResponse {
        let mut repo = Deals::new(conn);
        let deal = repo.create(&deal_create(org)).await.unwrap();
        repo.transition_status(deal.id, DealStatus::Active).await.unwrap()
    }

    async fn active_ad(conn: &mut PgConnection, org: OrganizationId, ctr: f64, clicks: i64, conversions: i64) {
        let mut ads = Ads::new(conn);
        let ad = ads
            .create(&AdCreateDBRequest {
                organization_id: org,
                name: "candidate".to_string(),
                creative_url: None,
                created_by: None,
            })
            .await
            .unwrap();
        ads.update(
            ad.id,
            &AdUpdateDBRequest {
                ctr: Some(ctr),
                clicks: Some(clicks),
                conversions: Some(conversions),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_deal_starts_in_draft(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Deals::new(&mut conn);

        let deal = repo.create(&deal_create(org)).await.unwrap();
        assert_eq!(deal.status, DealStatus::Draft);
        assert_eq!(deal.spend, 0.0);
        assert_eq!(deal.targeting(), TargetingSpec::default());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_writes_inventory_snapshot(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Deals::new(&mut conn);

        let mut request = deal_create(org);
        request.ad_units = vec!["banner-top".to_string(), "sidebar".to_string()];
        let deal = repo.create(&request).await.unwrap();

        let inventory = repo.get_inventory(deal.id).await.unwrap();
        assert_eq!(inventory.len(), 2);
        assert_eq!(inventory[0].ad_unit, "banner-top");
        assert!(inventory[0].available_impressions > 0);
        // Midpoint of the price corridor.
        assert_eq!(inventory[0].estimated_cpm, 6.0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deals_cannot_be_deleted(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Deals::new(&mut conn);

        let deal = repo.create(&deal_create(org)).await.unwrap();
        let err = repo.delete(deal.id).await.unwrap_err();
        assert!(matches!(err, DbError::ProtectedEntity { .. }));
        assert!(repo.get_by_id(deal.id).await.unwrap().is_some());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_status_transitions_are_gated(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Deals::new(&mut conn);

        let deal = repo.create(&deal_create(org)).await.unwrap();

        // DRAFT cannot pause or complete.
        assert!(repo.transition_status(deal.id, DealStatus::Paused).await.is_err());
        assert!(repo.transition_status(deal.id, DealStatus::Completed).await.is_err());

        let deal = repo.transition_status(deal.id, DealStatus::Active).await.unwrap();
        assert_eq!(deal.status, DealStatus::Active);

        // ACTIVE pauses, PAUSED resumes.
        repo.transition_status(deal.id, DealStatus::Paused).await.unwrap();
        repo.transition_status(deal.id, DealStatus::Active).await.unwrap();

        // COMPLETED is terminal.
        repo.transition_status(deal.id, DealStatus::Completed).await.unwrap();
        let err = repo.transition_status(deal.id, DealStatus::Active).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_execute_happy_path_spends_and_records(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let deal = active_deal(&mut conn, org).await;
        active_ad(&mut conn, org, 0.05, 200, 10).await;

        let mut repo = Deals::new(&mut conn);
        let result = repo.execute(deal.id, &AdRequest::default(), Utc::now()).await.unwrap();
        assert!(result.executed);
        assert!(result.ad_id.is_some());
        assert!(result.reason.is_none());
        // floor 2.0 * high-CTR 1.1 * high-priority 1.2
        assert!((result.price - 2.64).abs() < 1e-9);

        let deal = repo.get_by_id(deal.id).await.unwrap().unwrap();
        assert!((deal.spend - 2.64).abs() < 1e-9);

        let mut perf = Performance::new(&mut conn);
        let rows = perf.for_deal(deal.id, None, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].impressions, 1);
        assert!((rows[0].spend - 2.64).abs() < 1e-9);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_execute_paused_deal_reports_status(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let deal = active_deal(&mut conn, org).await;
        Deals::new(&mut conn).transition_status(deal.id, DealStatus::Paused).await.unwrap();

        let result = Deals::new(&mut conn)
            .execute(deal.id, &AdRequest::default(), Utc::now())
            .await
            .unwrap();
        assert!(!result.executed);
        assert_eq!(result.price, 0.0);
        assert_eq!(result.reason.as_deref(), Some("Deal status is PAUSED"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_execute_stops_at_exhausted_budget(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let deal = active_deal(&mut conn, org).await;
        active_ad(&mut conn, org, 0.0, 0, 0).await;

        sqlx::query("UPDATE deals SET spend = budget WHERE id = $1")
            .bind(deal.id)
            .execute(&mut *conn)
            .await
            .unwrap();

        let result = Deals::new(&mut conn)
            .execute(deal.id, &AdRequest::default(), Utc::now())
            .await
            .unwrap();
        assert!(!result.executed);
        assert_eq!(result.reason.as_deref(), Some("Deal budget is exhausted"));
    }

    /// The row lock makes the budget gate and the spend increment atomic:
    /// when two executions race over a budget with room for only one of
    /// them, exactly one wins and the spend is incremented once.
    #[sqlx::test]
    #[test_log::test]
    async fn test_concurrent_executions_cannot_double_spend(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let deal = active_deal(&mut conn, org).await;
        active_ad(&mut conn, org, 0.0, 0, 0).await;

        // Leave room for exactly one more execution.
        sqlx::query("UPDATE deals SET spend = budget - 0.01 WHERE id = $1")
            .bind(deal.id)
            .execute(&mut *conn)
            .await
            .unwrap();
        drop(conn);

        let deal_id = deal.id;
        let now = Utc::now();
        let run = |pool: PgPool| async move {
            let mut conn = pool.acquire().await.unwrap();
            Deals::new(&mut conn).execute(deal_id, &AdRequest::default(), now).await.unwrap()
        };
        let (first, second) = tokio::join!(run(pool.clone()), run(pool.clone()));

        assert_eq!(u8::from(first.executed) + u8::from(second.executed), 1);
        let (winner, loser) = if first.executed { (&first, &second) } else { (&second, &first) };
        assert_eq!(loser.reason.as_deref(), Some("Deal budget is exhausted"));

        let mut conn = pool.acquire().await.unwrap();
        let after = Deals::new(&mut conn).get_by_id(deal_id).await.unwrap().unwrap();
        assert!((after.spend - (after.budget - 0.01 + winner.price)).abs() < 1e-9);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_execute_targeting_mismatch(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let deal = active_deal(&mut conn, org).await;
        active_ad(&mut conn, org, 0.02, 100, 5).await;

        Deals::new(&mut conn)
            .update(
                deal.id,
                &DealUpdateDBRequest {
                    targeting: Some(TargetingSpec {
                        geo_country: Some("US".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let request = AdRequest {
            geo: GeoContext {
                country: Some("DE".to_string()),
                region: None,
            },
            device: DeviceContext::default(),
            categories: None,
        };
        let result = Deals::new(&mut conn).execute(deal.id, &request, Utc::now()).await.unwrap();
        assert!(!result.executed);
        assert_eq!(result.reason.as_deref(), Some("Ad request does not match deal targeting"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_execute_with_no_ads(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let deal = active_deal(&mut conn, org).await;

        let result = Deals::new(&mut conn)
            .execute(deal.id, &AdRequest::default(), Utc::now())
            .await
            .unwrap();
        assert!(!result.executed);
        assert_eq!(result.reason.as_deref(), Some("No available ads for this deal"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_execute_missing_deal_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        test_org(&mut conn).await;

        let err = Deals::new(&mut conn)
            .execute(uuid::Uuid::new_v4(), &AdRequest::default(), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_count_by_organization(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        active_deal(&mut conn, org).await;
        Deals::new(&mut conn).create(&deal_create(org)).await.unwrap();

        let (total, active) = Deals::new(&mut conn).count_by_organization(org).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(active, 1);
    }
}
