//! Database models for organizations.

use crate::api::models::organizations::{OrganizationCreate, OrganizationUpdate};
use crate::types::OrganizationId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating an organization
#[derive(Debug, Clone)]
pub struct OrganizationCreateDBRequest {
    pub name: String,
    pub slug: String,
}

impl From<OrganizationCreate> for OrganizationCreateDBRequest {
    fn from(api: OrganizationCreate) -> Self {
        Self {
            name: api.name,
            slug: api.slug,
        }
    }
}

/// Database request for updating an organization
#[derive(Debug, Clone)]
pub struct OrganizationUpdateDBRequest {
    pub name: Option<String>,
}

impl From<OrganizationUpdate> for OrganizationUpdateDBRequest {
    fn from(api: OrganizationUpdate) -> Self {
        Self { name: api.name }
    }
}

/// Database response for an organization
#[derive(Debug, Clone, FromRow)]
pub struct OrganizationDBResponse {
    pub id: OrganizationId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
