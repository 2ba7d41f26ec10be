use std::collections::HashMap;

use crate::crypto::generate_api_key;
use crate::db::errors::{DbError, Result};
use crate::db::handlers::repository::Repository;
use crate::db::models::api_keys::{ApiKeyCreateDBRequest, ApiKeyDBResponse, ApiKeyUpdateDBRequest};
use crate::types::{abbrev_uuid, ApiKeyId, UserId};
use sqlx::PgConnection;
use tracing::instrument;

/// Filter for listing API keys
#[derive(Debug, Clone)]
pub struct ApiKeyFilter {
    pub skip: i64,
    pub limit: i64,
    pub user_id: Option<UserId>,
}

impl ApiKeyFilter {
    pub fn new(skip: i64, limit: i64, user_id: Option<UserId>) -> Self {
        Self { skip, limit, user_id }
    }
}

pub struct ApiKeys<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for ApiKeys<'c> {
    type CreateRequest = ApiKeyCreateDBRequest;
    type UpdateRequest = ApiKeyUpdateDBRequest;
    type Response = ApiKeyDBResponse;
    type Id = ApiKeyId;
    type Filter = ApiKeyFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        // Generate a secure API key
        let secret = generate_api_key();

        let api_key = sqlx::query_as::<_, ApiKeyDBResponse>(
            "INSERT INTO api_keys (name, secret, user_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&request.name)
        .bind(&secret)
        .bind(request.user_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(api_key)
    }

    #[instrument(skip(self), fields(api_key_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let api_key = sqlx::query_as::<_, ApiKeyDBResponse>("SELECT * FROM api_keys WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(api_key)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let api_keys = sqlx::query_as::<_, ApiKeyDBResponse>("SELECT * FROM api_keys WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(api_keys.into_iter().map(|k| (k.id, k)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let api_keys = sqlx::query_as::<_, ApiKeyDBResponse>(
            r#"
            SELECT * FROM api_keys
            WHERE ($1::uuid IS NULL OR user_id = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(api_keys)
    }

    #[instrument(skip(self), fields(api_key_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(api_key_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let api_key = sqlx::query_as::<_, ApiKeyDBResponse>(
            "UPDATE api_keys SET name = COALESCE($2, name) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(&request.name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(api_key)
    }
}

impl<'c> ApiKeys<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Look up a key by its secret and stamp `last_used`. The auth
    /// middleware's hot path.
    #[instrument(skip(self, secret), err)]
    pub async fn get_by_secret(&mut self, secret: &str) -> Result<Option<ApiKeyDBResponse>> {
        let api_key = sqlx::query_as::<_, ApiKeyDBResponse>(
            "UPDATE api_keys SET last_used = NOW() WHERE secret = $1 RETURNING *",
        )
        .bind(secret)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(api_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        handlers::{Organizations, Users},
        models::{organizations::OrganizationCreateDBRequest, users::UserCreateDBRequest},
    };
    use sqlx::PgPool;

    async fn test_user(conn: &mut PgConnection) -> UserId {
        let org = Organizations::new(&mut *conn)
            .create(&OrganizationCreateDBRequest {
                name: "Key Org".to_string(),
                slug: "key-org".to_string(),
            })
            .await
            .unwrap()
            .id;
        Users::new(conn)
            .create(&UserCreateDBRequest {
                organization_id: org,
                email: "keys@example.com".to_string(),
                display_name: None,
                is_admin: false,
                roles: vec![],
            })
            .await
            .unwrap()
            .id
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_api_key(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = test_user(&mut conn).await;
        let mut repo = ApiKeys::new(&mut conn);

        let key = repo
            .create(&ApiKeyCreateDBRequest {
                user_id,
                name: "ci key".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(key.name, "ci key");
        assert_eq!(key.user_id, user_id);
        assert!(key.secret.starts_with("ak-"));
        assert!(key.last_used.is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_by_secret_stamps_last_used(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = test_user(&mut conn).await;
        let mut repo = ApiKeys::new(&mut conn);

        let key = repo
            .create(&ApiKeyCreateDBRequest {
                user_id,
                name: "auth key".to_string(),
            })
            .await
            .unwrap();

        let found = repo.get_by_secret(&key.secret).await.unwrap().unwrap();
        assert_eq!(found.id, key.id);
        assert!(found.last_used.is_some());

        assert!(repo.get_by_secret("ak-nonexistent").await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleting_user_cascades_to_keys(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = test_user(&mut conn).await;

        let key = ApiKeys::new(&mut conn)
            .create(&ApiKeyCreateDBRequest {
                user_id,
                name: "doomed".to_string(),
            })
            .await
            .unwrap();

        Users::new(&mut conn).delete(user_id).await.unwrap();

        assert!(ApiKeys::new(&mut conn).get_by_id(key.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_scoped_to_user(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let user_id = test_user(&mut conn).await;
        let mut repo = ApiKeys::new(&mut conn);

        for i in 0..3 {
            repo.create(&ApiKeyCreateDBRequest {
                user_id,
                name: format!("key {i}"),
            })
            .await
            .unwrap();
        }

        let keys = repo.list(&ApiKeyFilter::new(0, 50, Some(user_id))).await.unwrap();
        assert_eq!(keys.len(), 3);
    }
}
