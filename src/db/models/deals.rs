//! Database models for programmatic deals and their inventory snapshots.

use crate::api::models::deals::{DealCreate, DealPriority, DealStatus, DealType, DealUpdate, TargetingSpec};
use crate::types::{DealId, OrganizationId, UserId};
use bon::Builder;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database request for creating a deal
#[derive(Debug, Clone, Builder)]
pub struct DealCreateDBRequest {
    pub organization_id: OrganizationId,
    pub name: String,
    pub deal_type: DealType,
    pub priority: DealPriority,
    pub floor_price: f64,
    pub target_cpm: f64,
    #[builder(default)]
    pub targeting: TargetingSpec,
    pub budget: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_by: Option<UserId>,
    /// Ad units inventory is estimated for in the creation transaction
    #[builder(default)]
    pub ad_units: Vec<String>,
}

impl DealCreateDBRequest {
    pub fn new(organization_id: OrganizationId, created_by: UserId, api: DealCreate) -> Self {
        Self {
            organization_id,
            name: api.name,
            deal_type: api.deal_type,
            priority: api.priority,
            floor_price: api.floor_price,
            target_cpm: api.target_cpm,
            targeting: api.targeting,
            budget: api.budget,
            start_date: api.start_date,
            end_date: api.end_date,
            created_by: Some(created_by),
            ad_units: api.ad_units,
        }
    }
}

/// Database request for updating a deal's mutable terms. Status changes go
/// through the dedicated transition path, not this request.
#[derive(Debug, Clone, Default)]
pub struct DealUpdateDBRequest {
    pub name: Option<String>,
    pub priority: Option<DealPriority>,
    pub floor_price: Option<f64>,
    pub target_cpm: Option<f64>,
    pub targeting: Option<TargetingSpec>,
    pub budget: Option<f64>,
}

impl From<DealUpdate> for DealUpdateDBRequest {
    fn from(api: DealUpdate) -> Self {
        Self {
            name: api.name,
            priority: api.priority,
            floor_price: api.floor_price,
            target_cpm: api.target_cpm,
            targeting: api.targeting,
            budget: api.budget,
        }
    }
}

/// Database response for a deal. Targeting dimensions are stored as discrete
/// nullable columns; NULL means wildcard.
#[derive(Debug, Clone, FromRow)]
pub struct DealDBResponse {
    pub id: DealId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub deal_type: DealType,
    pub priority: DealPriority,
    pub floor_price: f64,
    pub target_cpm: f64,
    pub geo_country: Option<String>,
    pub geo_region: Option<String>,
    pub device_os: Option<String>,
    pub device_type: Option<String>,
    pub categories: Option<Vec<String>>,
    pub budget: f64,
    pub spend: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: DealStatus,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DealDBResponse {
    /// Reassemble the targeting filter from its column representation.
    pub fn targeting(&self) -> TargetingSpec {
        TargetingSpec {
            geo_country: self.geo_country.clone(),
            geo_region: self.geo_region.clone(),
            device_os: self.device_os.clone(),
            device_type: self.device_type.clone(),
            categories: self.categories.clone(),
        }
    }
}

/// Write-once inventory estimation row, produced at deal creation.
#[derive(Debug, Clone, FromRow)]
pub struct InventoryDBResponse {
    pub id: Uuid,
    pub deal_id: DealId,
    pub ad_unit: String,
    pub available_impressions: i64,
    pub estimated_cpm: f64,
    pub created_at: DateTime<Utc>,
}
