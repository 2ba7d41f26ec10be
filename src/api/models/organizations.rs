//! API request/response models for organizations (tenants).

use super::pagination::Pagination;
use crate::db::models::organizations::OrganizationDBResponse;
use crate::types::OrganizationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationCreate {
    pub name: String,
    /// URL-safe identifier, unique across the platform
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrganizationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: OrganizationId,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListOrganizationsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

impl From<OrganizationDBResponse> for OrganizationResponse {
    fn from(db: OrganizationDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            slug: db.slug,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
