//! Database repository for users.

use std::collections::HashMap;

use crate::api::models::users::Role;
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::types::{abbrev_uuid, OrganizationId, UserId};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
    pub organization_id: Option<OrganizationId>,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64, organization_id: Option<OrganizationId>) -> Self {
        Self {
            skip,
            limit,
            organization_id,
        }
    }
}

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

/// Every user carries the StandardUser role.
fn with_standard_role(roles: &[Role]) -> Vec<Role> {
    let mut roles = roles.to_vec();
    if !roles.contains(&Role::StandardUser) {
        roles.push(Role::StandardUser);
    }
    roles
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let roles = with_standard_role(&request.roles);

        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (organization_id, email, display_name, is_admin, roles)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(request.organization_id)
        .bind(&request.email)
        .bind(&request.display_name)
        .bind(request.is_admin)
        .bind(&roles)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(users.into_iter().map(|u| (u.id, u)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let users = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT * FROM users
            WHERE ($1::uuid IS NULL OR organization_id = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.organization_id)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(users)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let roles = request.roles.as_deref().map(with_standard_role);

        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            UPDATE users SET
                display_name = COALESCE($2, display_name),
                roles = COALESCE($3, roles),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.display_name)
        .bind(roles)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_user_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn touch_last_login(&mut self, id: UserId) -> Result<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(())
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
                name: "Test Org".to_string(),
                slug: "test-org".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn user_create(org: OrganizationId, email: &str, roles: Vec<Role>) -> UserCreateDBRequest {
        UserCreateDBRequest {
            organization_id: org,
            email: email.to_string(),
            display_name: None,
            is_admin: false,
            roles,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Users::new(&mut conn);

        let user = repo
            .create(&user_create(org, "ops@example.com", vec![Role::AdOperations]))
            .await
            .unwrap();
        assert_eq!(user.email, "ops@example.com");
        assert_eq!(user.organization_id, org);
        assert!(!user.is_admin);
        // StandardUser is always added.
        assert!(user.roles.contains(&Role::AdOperations));
        assert!(user.roles.contains(&Role::StandardUser));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_email_is_a_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Users::new(&mut conn);

        repo.create(&user_create(org, "dup@example.com", vec![])).await.unwrap();
        let err = repo.create(&user_create(org, "dup@example.com", vec![])).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_user_by_email(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Users::new(&mut conn);

        let created = repo.create(&user_create(org, "find@example.com", vec![])).await.unwrap();
        let found = repo.get_user_by_email("find@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.get_user_by_email("missing@example.com").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_roles_keeps_standard_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Users::new(&mut conn);

        let user = repo
            .create(&user_create(org, "roles@example.com", vec![Role::Analyst]))
            .await
            .unwrap();

        let updated = repo
            .update(
                user.id,
                &UserUpdateDBRequest {
                    display_name: Some("Renamed".to_string()),
                    roles: Some(vec![Role::PlatformManager]),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.display_name, Some("Renamed".to_string()));
        assert!(updated.roles.contains(&Role::PlatformManager));
        assert!(updated.roles.contains(&Role::StandardUser));
        assert!(!updated.roles.contains(&Role::Analyst));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_organization(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org_a = test_org(&mut conn).await;
        let org_b = Organizations::new(&mut conn)
            .create(&OrganizationCreateDBRequest {
                name: "Other Org".to_string(),
                slug: "other-org".to_string(),
            })
            .await
            .unwrap()
            .id;
        let mut repo = Users::new(&mut conn);

        repo.create(&user_create(org_a, "a@example.com", vec![])).await.unwrap();
        repo.create(&user_create(org_b, "b@example.com", vec![])).await.unwrap();

        let scoped = repo.list(&UserFilter::new(0, 50, Some(org_a))).await.unwrap();
        assert_eq!(scoped.len(), 1);
        assert_eq!(scoped[0].email, "a@example.com");

        let all = repo.list(&UserFilter::new(0, 50, None)).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let org = test_org(&mut conn).await;
        let mut repo = Users::new(&mut conn);

        let user = repo.create(&user_create(org, "gone@example.com", vec![])).await.unwrap();
        assert!(repo.delete(user.id).await.unwrap());
        assert!(repo.get_by_id(user.id).await.unwrap().is_none());
        assert!(!repo.delete(user.id).await.unwrap());
    }
}
