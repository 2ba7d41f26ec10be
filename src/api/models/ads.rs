//! API request/response models for advertiser ads.

use super::pagination::Pagination;
use crate::db::models::ads::AdDBResponse;
use crate::types::{AdId, OrganizationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "ad_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdStatus {
    Active,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdCreate {
    pub name: String,
    pub creative_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdUpdate {
    pub name: Option<String>,
    pub creative_url: Option<String>,
    pub status: Option<AdStatus>,
    /// Observed click-through rate, updated by upstream tracking
    pub ctr: Option<f64>,
    pub clicks: Option<i64>,
    pub conversions: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AdId,
    #[schema(value_type = String, format = "uuid")]
    pub organization_id: OrganizationId,
    pub name: String,
    pub creative_url: Option<String>,
    pub ctr: f64,
    pub clicks: i64,
    pub conversions: i64,
    pub status: AdStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListAdsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return ads with this status
    pub status: Option<AdStatus>,
}

impl From<AdDBResponse> for AdResponse {
    fn from(db: AdDBResponse) -> Self {
        Self {
            id: db.id,
            organization_id: db.organization_id,
            name: db.name,
            creative_url: db.creative_url,
            ctr: db.ctr,
            clicks: db.clicks,
            conversions: db.conversions,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
