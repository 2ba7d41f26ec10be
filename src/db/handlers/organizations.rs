//! Database repository for organizations.

use std::collections::HashMap;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::organizations::{OrganizationCreateDBRequest, OrganizationDBResponse, OrganizationUpdateDBRequest},
};
use crate::types::{abbrev_uuid, OrganizationId};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing organizations
#[derive(Debug, Clone)]
pub struct OrganizationFilter {
    pub skip: i64,
    pub limit: i64,
}

impl OrganizationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { skip, limit }
    }
}

pub struct Organizations<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Organizations<'c> {
    type CreateRequest = OrganizationCreateDBRequest;
    type UpdateRequest = OrganizationUpdateDBRequest;
    type Response = OrganizationDBResponse;
    type Id = OrganizationId;
    type Filter = OrganizationFilter;

    #[instrument(skip(self, request), fields(slug = %request.slug), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let org = sqlx::query_as::<_, OrganizationDBResponse>(
            "INSERT INTO organizations (name, slug) VALUES ($1, $2) RETURNING *",
        )
        .bind(&request.name)
        .bind(&request.slug)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(org)
    }

    #[instrument(skip(self), fields(organization_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let org = sqlx::query_as::<_, OrganizationDBResponse>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(org)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let orgs = sqlx::query_as::<_, OrganizationDBResponse>("SELECT * FROM organizations WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(orgs.into_iter().map(|o| (o.id, o)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let orgs = sqlx::query_as::<_, OrganizationDBResponse>(
            "SELECT * FROM organizations ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(orgs)
    }

    #[instrument(skip(self), fields(organization_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(organization_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let org = sqlx::query_as::<_, OrganizationDBResponse>(
            r#"
            UPDATE organizations SET
                name = COALESCE($2, name),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(org)
    }
}

impl<'c> Organizations<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, slug), err)]
    pub async fn get_by_slug(&mut self, slug: &str) -> Result<Option<OrganizationDBResponse>> {
        let org = sqlx::query_as::<_, OrganizationDBResponse>("SELECT * FROM organizations WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(org)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;

    fn org_create(name: &str, slug: &str) -> OrganizationCreateDBRequest {
        OrganizationCreateDBRequest {
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_organization(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Organizations::new(&mut conn);

        let created = repo.create(&org_create("Acme Media", "acme-media")).await.unwrap();
        assert_eq!(created.name, "Acme Media");
        assert_eq!(created.slug, "acme-media");

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, created.id);

        let by_slug = repo.get_by_slug("acme-media").await.unwrap().unwrap();
        assert_eq!(by_slug.id, created.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_slug_is_a_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Organizations::new(&mut conn);

        repo.create(&org_create("First", "same-slug")).await.unwrap();
        let err = repo.create(&org_create("Second", "same-slug")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_organization_name(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Organizations::new(&mut conn);

        let created = repo.create(&org_create("Old Name", "org")).await.unwrap();
        let updated = repo
            .update(
                created.id,
                &OrganizationUpdateDBRequest {
                    name: Some("New Name".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "New Name");
        assert_eq!(updated.slug, "org");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_missing_organization_is_not_found(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Organizations::new(&mut conn);

        let err = repo
            .update(uuid::Uuid::new_v4(), &OrganizationUpdateDBRequest { name: None })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_respects_pagination(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Organizations::new(&mut conn);

        for i in 0..5 {
            repo.create(&org_create(&format!("Org {i}"), &format!("org-{i}"))).await.unwrap();
        }

        let page = repo.list(&OrganizationFilter::new(0, 3)).await.unwrap();
        assert_eq!(page.len(), 3);
        let rest = repo.list(&OrganizationFilter::new(3, 3)).await.unwrap();
        assert_eq!(rest.len(), 2);
    }
}
