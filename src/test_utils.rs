//! Test utilities for integration testing (available with `test-utils` feature).

use crate::{
    api::models::users::Role,
    db::{
        handlers::{ApiKeys, Organizations, Repository, Users},
        models::{
            api_keys::{ApiKeyCreateDBRequest, ApiKeyDBResponse},
            organizations::{OrganizationCreateDBRequest, OrganizationDBResponse},
            users::{UserCreateDBRequest, UserDBResponse},
        },
    },
};
use sqlx::PgPool;
use uuid::Uuid;

pub fn create_test_config() -> crate::config::Config {
    crate::config::Config::default()
}

pub async fn create_test_organization(pool: &PgPool) -> OrganizationDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let slug = format!("test-org-{}", Uuid::new_v4().simple());

    Organizations::new(&mut conn)
        .create(&OrganizationCreateDBRequest {
            name: "Test Organization".to_string(),
            slug,
        })
        .await
        .expect("Failed to create test organization")
}

pub async fn create_test_user(pool: &PgPool, role: Role) -> UserDBResponse {
    create_test_user_with_roles(pool, vec![role], false).await
}

pub async fn create_test_admin_user(pool: &PgPool) -> UserDBResponse {
    create_test_user_with_roles(pool, vec![], true).await
}

pub async fn create_test_user_with_roles(pool: &PgPool, roles: Vec<Role>, is_admin: bool) -> UserDBResponse {
    let organization = create_test_organization(pool).await;
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let email = format!("testuser_{}@example.com", Uuid::new_v4().simple());

    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            organization_id: organization.id,
            email,
            display_name: Some("Test User".to_string()),
            is_admin,
            roles,
        })
        .await
        .expect("Failed to create test user")
}

pub async fn create_test_api_key_for_user(pool: &PgPool, user_id: crate::types::UserId) -> ApiKeyDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");

    ApiKeys::new(&mut conn)
        .create(&ApiKeyCreateDBRequest {
            user_id,
            name: "test key".to_string(),
        })
        .await
        .expect("Failed to create test API key")
}
