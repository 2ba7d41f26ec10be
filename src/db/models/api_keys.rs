//! Database models for API keys.

use crate::api::models::api_keys::ApiKeyCreate;
use crate::types::{ApiKeyId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating an API key. The secret is generated by the
/// repository, not supplied by the caller.
#[derive(Debug, Clone)]
pub struct ApiKeyCreateDBRequest {
    pub user_id: UserId,
    pub name: String,
}

impl ApiKeyCreateDBRequest {
    pub fn new(user_id: UserId, api: ApiKeyCreate) -> Self {
        Self {
            user_id,
            name: api.name,
        }
    }
}

/// Database request for updating an API key
#[derive(Debug, Clone, Default)]
pub struct ApiKeyUpdateDBRequest {
    pub name: Option<String>,
}

/// Database response for an API key
#[derive(Debug, Clone, FromRow)]
pub struct ApiKeyDBResponse {
    pub id: ApiKeyId,
    pub name: String,
    pub secret: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub last_used: Option<DateTime<Utc>>,
}
