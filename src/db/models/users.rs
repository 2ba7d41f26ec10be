//! Database models for users.

use crate::api::models::users::{Role, UserCreate, UserUpdate};
use crate::types::{OrganizationId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub organization_id: OrganizationId,
    pub email: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub roles: Vec<Role>,
}

impl From<UserCreate> for UserCreateDBRequest {
    fn from(api: UserCreate) -> Self {
        Self {
            organization_id: api.organization_id,
            email: api.email,
            display_name: api.display_name,
            is_admin: false, // API users cannot create admins
            roles: api.roles,
        }
    }
}

/// Database request for updating a user
#[derive(Debug, Clone)]
pub struct UserUpdateDBRequest {
    pub display_name: Option<String>,
    pub roles: Option<Vec<Role>>,
}

impl From<UserUpdate> for UserUpdateDBRequest {
    fn from(update: UserUpdate) -> Self {
        Self {
            display_name: update.display_name,
            roles: update.roles,
        }
    }
}

/// Database response for a user
#[derive(Debug, Clone, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub organization_id: OrganizationId,
    pub email: String,
    pub display_name: Option<String>,
    pub is_admin: bool,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}
