//! Database repository for advertiser ads.

use std::collections::HashMap;

use crate::api::models::ads::AdStatus;
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::ads::{AdCreateDBRequest, AdDBResponse, AdUpdateDBRequest},
};
use crate::types::{abbrev_uuid, AdId, OrganizationId};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing ads
#[derive(Debug, Clone)]
pub struct AdFilter {
    pub skip: i64,
    pub limit: i64,
    pub organization_id: Option<OrganizationId>,
    pub status: Option<AdStatus>,
}

impl AdFilter {
    pub fn new(skip: i64, limit: i64, organization_id: Option<OrganizationId>, status: Option<AdStatus>) -> Self {
        Self {
            skip,
            limit,
            organization_id,
            status,
        }
    }
}

pub struct Ads<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Ads<'c> {
    type CreateRequest = AdCreateDBRequest;
    type UpdateRequest = AdUpdateDBRequest;
    type Response = AdDBResponse;
    type Id = AdId;
    type Filter = AdFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let ad = sqlx::query_as::<_, AdDBResponse>(
            r#"
            INSERT INTO ads (organization_id, name, creative_url, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(request.organization_id)
        .bind(&request.name)
        .bind(&request.creative_url)
        .bind(request.created_by)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ad)
    }

    #[instrument(skip(self), fields(ad_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let ad = sqlx::query_as::<_, AdDBResponse>("SELECT * FROM ads WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(ad)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ads = sqlx::query_as::<_, AdDBResponse>("SELECT * FROM ads WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(ads.into_iter().map(|a| (a.id, a)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let ads = sqlx::query_as::<_, AdDBResponse>(
            r#"
            SELECT * FROM ads
            WHERE ($1::uuid IS NULL OR organization_id = $1)
              AND ($2::ad_status IS NULL OR status = $2)
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

        Ok(ads)
    }

    #[instrument(skip(self), fields(ad_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ads WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(ad_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let ad = sqlx::query_as::<_, AdDBResponse>(
            r#"
            UPDATE ads SET
                name = COALESCE($2, name),
                creative_url = COALESCE($3, creative_url),
                status = COALESCE($4, status),
                ctr = COALESCE($5, ctr),
                clicks = COALESCE($6, clicks),
                conversions = COALESCE($7, conversions),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.creative_url)
        .bind(request.status)
        .bind(request.ctr)
        .bind(request.clicks)
        .bind(request.conversions)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(ad)
    }
}

impl<'c> Ads<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Active ads for an organization, the execution path's candidate slate.
    /// Ordered by creation time so tie-breaks in selection are stable.
    #[instrument(skip(self), fields(organization_id = %abbrev_uuid(&organization_id)), err)]
    pub async fn list_active_for_organization(
        &mut self,
        organization_id: OrganizationId,
    ) -> Result<Vec<AdDBResponse>> {
        let ads = sqlx::query_as::<_, AdDBResponse>(
            "SELECT * FROM ads WHERE organization_id = $1 AND status = 'ACTIVE' ORDER BY created_at ASC",
        )
        .bind(organization_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(ads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{handlers::Organizations, models::organizations::OrganizationCreateDBRequest};
    use sqlx::PgPool;

    async fn test_org(conn: &mut PgConnection) -> OrganizationId {
        Organizations::new(conn)
            .create(&OrganizationCreateDBRequest {
                name: "Ads Org".to_string(),
                slug: "ads-org".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn ad_create(org: OrganizationId, name: &str) -> AdCreateDBRequest {
        AdCreateDBRequest {
            organization_id: org,
            name: name.to_string(),
            creative_url: None,
            created_by: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_ad_starts_active_with_zero_counters(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Ads::new(&mut conn);

        let ad = repo.create(&ad_create(org, "banner")).await.unwrap();
        assert_eq!(ad.name, "banner");
        assert_eq!(ad.status, AdStatus::Active);
        assert_eq!(ad.ctr, 0.0);
        assert_eq!(ad.clicks, 0);
        assert_eq!(ad.conversions, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_performance_counters(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Ads::new(&mut conn);

        let ad = repo.create(&ad_create(org, "video")).await.unwrap();
        let updated = repo
            .update(
                ad.id,
                &AdUpdateDBRequest {
                    ctr: Some(0.045),
                    clicks: Some(900),
                    conversions: Some(45),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.ctr, 0.045);
        assert_eq!(updated.clicks, 900);
        assert_eq!(updated.conversions, 45);
        // Untouched fields survive.
        assert_eq!(updated.name, "video");
        assert_eq!(updated.status, AdStatus::Active);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_negative_counters_violate_check(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Ads::new(&mut conn);

        let ad = repo.create(&ad_create(org, "bad")).await.unwrap();
        let err = repo
            .update(
                ad.id,
                &AdUpdateDBRequest {
                    clicks: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_active_slate_excludes_paused_ads(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Ads::new(&mut conn);

        let keep = repo.create(&ad_create(org, "active")).await.unwrap();
        let paused = repo.create(&ad_create(org, "paused")).await.unwrap();
        repo.update(
            paused.id,
            &AdUpdateDBRequest {
                status: Some(AdStatus::Paused),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let slate = repo.list_active_for_organization(org).await.unwrap();
        assert_eq!(slate.len(), 1);
        assert_eq!(slate[0].id, keep.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_status(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Ads::new(&mut conn);

        let a = repo.create(&ad_create(org, "a")).await.unwrap();
        repo.update(
            a.id,
            &AdUpdateDBRequest {
                status: Some(AdStatus::Paused),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        repo.create(&ad_create(org, "b")).await.unwrap();

        let paused = repo
            .list(&AdFilter::new(0, 50, Some(org), Some(AdStatus::Paused)))
            .await
            .unwrap();
        assert_eq!(paused.len(), 1);
        assert_eq!(paused[0].id, a.id);
    }
}
