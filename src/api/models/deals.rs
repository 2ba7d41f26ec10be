//! API request/response models for programmatic deals.
//!
//! A deal is a negotiated inventory-purchase agreement carrying a floor
//! price, a target CPM, a targeting filter, a budget, and a flight window.
//! Execution against a deal is requested with an [`AdRequest`] and answered
//! with an [`ExecutionResponse`] — a tagged result, never an error, for the
//! domain-expected "not executed" cases.

use super::pagination::Pagination;
use crate::db::models::deals::{DealDBResponse, InventoryDBResponse};
use crate::types::{AdId, DealId, OrganizationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "deal_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealType {
    Preferred,
    PrivateMarketplace,
    Guaranteed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "deal_priority", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "deal_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DealStatus {
    Draft,
    Active,
    Paused,
    Completed,
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DealStatus::Draft => "DRAFT",
            DealStatus::Active => "ACTIVE",
            DealStatus::Paused => "PAUSED",
            DealStatus::Completed => "COMPLETED",
        };
        write!(f, "{s}")
    }
}

/// Targeting filter for a deal. Every dimension is optional; an absent
/// dimension is a wildcard that matches any request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct TargetingSpec {
    pub geo_country: Option<String>,
    pub geo_region: Option<String>,
    pub device_os: Option<String>,
    pub device_type: Option<String>,
    pub categories: Option<Vec<String>>,
}

/// Geo portion of an incoming ad request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GeoContext {
    pub country: Option<String>,
    pub region: Option<String>,
}

/// Device portion of an incoming ad request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeviceContext {
    pub os: Option<String>,
    pub device_type: Option<String>,
}

/// An incoming ad request to execute a deal against.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct AdRequest {
    #[serde(default)]
    pub geo: GeoContext,
    #[serde(default)]
    pub device: DeviceContext,
    pub categories: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DealCreate {
    pub name: String,
    pub deal_type: DealType,
    pub priority: DealPriority,
    pub floor_price: f64,
    pub target_cpm: f64,
    #[serde(default)]
    pub targeting: TargetingSpec,
    pub budget: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    /// Ad units to estimate inventory for at creation time
    #[serde(default)]
    pub ad_units: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DealUpdate {
    pub name: Option<String>,
    pub priority: Option<DealPriority>,
    pub floor_price: Option<f64>,
    pub target_cpm: Option<f64>,
    pub targeting: Option<TargetingSpec>,
    pub budget: Option<f64>,
}

/// Request body for `PATCH /deals/{id}/status`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DealStatusUpdate {
    pub status: DealStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DealResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DealId,
    #[schema(value_type = String, format = "uuid")]
    pub organization_id: OrganizationId,
    pub name: String,
    pub deal_type: DealType,
    pub priority: DealPriority,
    pub floor_price: f64,
    pub target_cpm: f64,
    pub targeting: TargetingSpec,
    pub budget: f64,
    pub spend: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: DealStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListDealsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only return deals with this status
    pub status: Option<DealStatus>,
}

/// Outcome of a deal execution attempt.
///
/// `executed: false` with a `reason` is the domain-expected path for an
/// inactive deal, an exhausted budget, an out-of-range date, a targeting
/// mismatch, or an empty candidate set.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExecutionResponse {
    pub executed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub ad_id: Option<AdId>,
    pub price: f64,
    #[schema(value_type = String, format = "uuid")]
    pub deal_id: DealId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: uuid::Uuid,
    pub ad_unit: String,
    pub available_impressions: i64,
    pub estimated_cpm: f64,
    pub created_at: DateTime<Utc>,
}

/// Metrics derived from a deal's inventory snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DealMetricsResponse {
    pub total_available_impressions: i64,
    pub average_cpm: f64,
    /// Estimated value of the full inventory at the average CPM
    pub estimated_total_value: f64,
}

impl From<DealDBResponse> for DealResponse {
    fn from(db: DealDBResponse) -> Self {
        let targeting = db.targeting();
        Self {
            id: db.id,
            organization_id: db.organization_id,
            name: db.name,
            deal_type: db.deal_type,
            priority: db.priority,
            floor_price: db.floor_price,
            target_cpm: db.target_cpm,
            targeting,
            budget: db.budget,
            spend: db.spend,
            start_date: db.start_date,
            end_date: db.end_date,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<InventoryDBResponse> for InventoryResponse {
    fn from(db: InventoryDBResponse) -> Self {
        Self {
            id: db.id,
            ad_unit: db.ad_unit,
            available_impressions: db.available_impressions,
            estimated_cpm: db.estimated_cpm,
            created_at: db.created_at,
        }
    }
}
