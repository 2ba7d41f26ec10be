//! Database models for advertiser ads.

use crate::api::models::ads::{AdCreate, AdStatus, AdUpdate};
use crate::types::{AdId, OrganizationId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating an ad
#[derive(Debug, Clone)]
pub struct AdCreateDBRequest {
    pub organization_id: OrganizationId,
    pub name: String,
    pub creative_url: Option<String>,
    pub created_by: Option<UserId>,
}

impl AdCreateDBRequest {
    pub fn new(organization_id: OrganizationId, created_by: UserId, api: AdCreate) -> Self {
        Self {
            organization_id,
            name: api.name,
            creative_url: api.creative_url,
            created_by: Some(created_by),
        }
    }
}

/// Database request for updating an ad
#[derive(Debug, Clone, Default)]
pub struct AdUpdateDBRequest {
    pub name: Option<String>,
    pub creative_url: Option<String>,
    pub status: Option<AdStatus>,
    pub ctr: Option<f64>,
    pub clicks: Option<i64>,
    pub conversions: Option<i64>,
}

impl From<AdUpdate> for AdUpdateDBRequest {
    fn from(api: AdUpdate) -> Self {
        Self {
            name: api.name,
            creative_url: api.creative_url,
            status: api.status,
            ctr: api.ctr,
            clicks: api.clicks,
            conversions: api.conversions,
        }
    }
}

/// Database response for an ad
#[derive(Debug, Clone, FromRow)]
pub struct AdDBResponse {
    pub id: AdId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub creative_url: Option<String>,
    pub ctr: f64,
    pub clicks: i64,
    pub conversions: i64,
    pub status: AdStatus,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
