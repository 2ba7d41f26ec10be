//! Handlers for programmatic deals.
//!
//! Besides CRUD these handlers expose the deal lifecycle endpoints:
//! status transitions, execution, the inventory snapshot, derived metrics,
//! and per-deal performance rollups. Deals are never deleted through the
//! API; they are retired by completing them.

use crate::{
    api::models::{
        analytics::{PerformanceQuery, PerformanceSummaryResponse},
        deals::{
            AdRequest, DealCreate, DealMetricsResponse, DealResponse, DealStatusUpdate, DealUpdate,
            ExecutionResponse, InventoryResponse, ListDealsQuery,
        },
        users::CurrentUser,
    },
    auth::permissions::{
        can_create_org_resource, can_read_all_resources, can_read_org_resource, can_update_all_resources,
        can_update_org_resource,
    },
    db::errors::DbError,
    db::handlers::{deals::DealFilter, Deals, Performance, Repository},
    db::models::deals::{DealCreateDBRequest, DealDBResponse, DealUpdateDBRequest},
    engine::{inventory, metrics},
    errors::{Error, Result},
    types::{DealId, Operation, Permission, Resource},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;

#[utoipa::path(
    post,
    path = "/deals",
    tag = "deals",
    summary = "Create deal",
    description = "Create a deal in the caller's organization. New deals start in DRAFT; an inventory \
snapshot is estimated for the requested ad units in the same transaction.",
    responses(
        (status = 201, description = "Deal created successfully", body = DealResponse),
        (status = 400, description = "Bad request - invalid deal data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn create_deal(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(data): Json<DealCreate>,
) -> Result<(StatusCode, Json<DealResponse>)> {
    if !can_create_org_resource(&current_user, Resource::Deals, current_user.organization_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Deals, Operation::CreateOwn),
            action: Operation::CreateOwn,
            resource: "deals".to_string(),
        });
    }

    if data.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Deal name cannot be empty".to_string(),
        });
    }
    if data.end_date <= data.start_date {
        return Err(Error::BadRequest {
            message: "Deal end date must be after its start date".to_string(),
        });
    }
    if data.floor_price < 0.0 || data.target_cpm < 0.0 || data.budget < 0.0 {
        return Err(Error::BadRequest {
            message: "Deal prices and budget cannot be negative".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Deals::new(&mut pool_conn);
    let db_request = DealCreateDBRequest::new(current_user.organization_id, current_user.id, data);

    let deal = repo.create(&db_request).await?;
    Ok((StatusCode::CREATED, Json(DealResponse::from(deal))))
}

#[utoipa::path(
    get,
    path = "/deals",
    tag = "deals",
    summary = "List deals",
    description = "List deals in the caller's organization. Platform-wide readers see deals across all organizations.",
    params(ListDealsQuery),
    responses(
        (status = 200, description = "List of deals", body = Vec<DealResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn list_deals(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListDealsQuery>,
) -> Result<Json<Vec<DealResponse>>> {
    let organization_scope = if can_read_all_resources(&current_user, Resource::Deals) {
        None
    } else if can_read_org_resource(&current_user, Resource::Deals, current_user.organization_id) {
        Some(current_user.organization_id)
    } else {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::Deals, Operation::ReadAll),
                Permission::Allow(Resource::Deals, Operation::ReadOwn),
            ]),
            action: Operation::ReadOwn,
            resource: "deals".to_string(),
        });
    };

    let (skip, limit) = query.pagination.params();
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Deals::new(&mut pool_conn);

    let deals = repo.list(&DealFilter::new(skip, limit, organization_scope, query.status)).await?;
    Ok(Json(deals.into_iter().map(DealResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/deals/{deal_id}",
    tag = "deals",
    summary = "Get deal",
    params(
        ("deal_id" = String, Path, description = "Deal ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Deal details", body = DealResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Deal not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn get_deal(
    State(state): State<AppState>,
    Path(deal_id): Path<DealId>,
    current_user: CurrentUser,
) -> Result<Json<DealResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Deals::new(&mut pool_conn);

    let deal = fetch_deal(&mut repo, deal_id).await?;
    authorize_deal_read(&current_user, &deal)?;
    Ok(Json(DealResponse::from(deal)))
}

#[utoipa::path(
    patch,
    path = "/deals/{deal_id}",
    tag = "deals",
    summary = "Update deal",
    description = "Update a deal's terms. Supplying `targeting` replaces the whole targeting spec. \
Status is changed through the dedicated transition endpoint, not here.",
    params(
        ("deal_id" = String, Path, description = "Deal ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Deal updated successfully", body = DealResponse),
        (status = 400, description = "Bad request - invalid deal data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Deal not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn update_deal(
    State(state): State<AppState>,
    Path(deal_id): Path<DealId>,
    current_user: CurrentUser,
    Json(data): Json<DealUpdate>,
) -> Result<Json<DealResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Deals::new(&mut pool_conn);

    let deal = fetch_deal(&mut repo, deal_id).await?;
    authorize_deal_update(&current_user, &deal)?;

    let updated = repo.update(deal_id, &DealUpdateDBRequest::from(data)).await?;
    Ok(Json(DealResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/deals/{deal_id}",
    tag = "deals",
    summary = "Delete deal",
    description = "Deals cannot be deleted; this always fails. Complete a deal to retire it.",
    params(
        ("deal_id" = String, Path, description = "Deal ID (UUID)"),
    ),
    responses(
        (status = 403, description = "Deals cannot be deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn delete_deal(
    State(state): State<AppState>,
    Path(deal_id): Path<DealId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Deals::new(&mut pool_conn);

    let deal = fetch_deal(&mut repo, deal_id).await?;
    authorize_deal_update(&current_user, &deal)?;

    // Always refused by the repository; surfaces as 403 with the reason.
    repo.delete(deal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/deals/{deal_id}/status",
    tag = "deals",
    summary = "Transition deal status",
    description = "Move a deal through its lifecycle: DRAFT -> ACTIVE -> PAUSED/COMPLETED. \
COMPLETED is terminal and invalid transitions are rejected.",
    params(
        ("deal_id" = String, Path, description = "Deal ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Deal transitioned successfully", body = DealResponse),
        (status = 400, description = "Transition not allowed from the current status"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Deal not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn transition_deal_status(
    State(state): State<AppState>,
    Path(deal_id): Path<DealId>,
    current_user: CurrentUser,
    Json(data): Json<DealStatusUpdate>,
) -> Result<Json<DealResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Deals::new(&mut pool_conn);

    let deal = fetch_deal(&mut repo, deal_id).await?;
    authorize_deal_update(&current_user, &deal)?;

    match repo.transition_status(deal_id, data.status).await {
        Ok(deal) => Ok(Json(DealResponse::from(deal))),
        // Surface the exact transition failure instead of the generic
        // check-violation message.
        Err(DbError::CheckViolation { message, .. }) => Err(Error::BadRequest { message }),
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    post,
    path = "/deals/{deal_id}/execute",
    tag = "deals",
    summary = "Execute deal",
    description = "Run the full execution pipeline for one ad request: eligibility gates, targeting \
match, ad selection, pricing, and budget spend. A deal that cannot serve returns `executed: false` \
with a reason rather than an error.",
    params(
        ("deal_id" = String, Path, description = "Deal ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Execution outcome", body = ExecutionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Deal not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn execute_deal(
    State(state): State<AppState>,
    Path(deal_id): Path<DealId>,
    current_user: CurrentUser,
    Json(request): Json<AdRequest>,
) -> Result<Json<ExecutionResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Deals::new(&mut pool_conn);

    let deal = fetch_deal(&mut repo, deal_id).await?;
    authorize_deal_update(&current_user, &deal)?;

    let outcome = repo.execute(deal_id, &request, Utc::now()).await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    get,
    path = "/deals/{deal_id}/inventory",
    tag = "deals",
    summary = "Get deal inventory",
    description = "The inventory snapshot estimated when the deal was created",
    params(
        ("deal_id" = String, Path, description = "Deal ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Inventory snapshot rows", body = Vec<InventoryResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Deal not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn get_deal_inventory(
    State(state): State<AppState>,
    Path(deal_id): Path<DealId>,
    current_user: CurrentUser,
) -> Result<Json<Vec<InventoryResponse>>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Deals::new(&mut pool_conn);

    let deal = fetch_deal(&mut repo, deal_id).await?;
    authorize_deal_read(&current_user, &deal)?;

    let rows = repo.get_inventory(deal_id).await?;
    Ok(Json(rows.into_iter().map(InventoryResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/deals/{deal_id}/metrics",
    tag = "deals",
    summary = "Get deal metrics",
    description = "Totals derived from the deal's inventory snapshot",
    params(
        ("deal_id" = String, Path, description = "Deal ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Derived inventory metrics", body = DealMetricsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Deal not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn get_deal_metrics(
    State(state): State<AppState>,
    Path(deal_id): Path<DealId>,
    current_user: CurrentUser,
) -> Result<Json<DealMetricsResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Deals::new(&mut pool_conn);

    let deal = fetch_deal(&mut repo, deal_id).await?;
    authorize_deal_read(&current_user, &deal)?;

    let rows = repo.get_inventory(deal_id).await?;
    let snapshot: Vec<(i64, f64)> = rows
        .iter()
        .map(|row| (row.available_impressions, row.estimated_cpm))
        .collect();
    let metrics = inventory::deal_metrics(&snapshot);

    Ok(Json(DealMetricsResponse {
        total_available_impressions: metrics.total_available_impressions,
        average_cpm: metrics.average_cpm,
        estimated_total_value: metrics.estimated_total_value,
    }))
}

#[utoipa::path(
    get,
    path = "/deals/{deal_id}/performance",
    tag = "deals",
    summary = "Get deal performance",
    description = "Aggregated delivery totals and derived ratios for one deal, optionally bounded \
by an inclusive date range",
    params(
        ("deal_id" = String, Path, description = "Deal ID (UUID)"),
        PerformanceQuery
    ),
    responses(
        (status = 200, description = "Aggregated performance summary", body = PerformanceSummaryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Deal not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn get_deal_performance(
    State(state): State<AppState>,
    Path(deal_id): Path<DealId>,
    current_user: CurrentUser,
    Query(query): Query<PerformanceQuery>,
) -> Result<Json<PerformanceSummaryResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let deal = fetch_deal(&mut Deals::new(&mut pool_conn), deal_id).await?;
    authorize_deal_read(&current_user, &deal)?;

    let rows = Performance::new(&mut pool_conn)
        .for_deal(deal_id, query.start, query.end)
        .await?;
    let records: Vec<metrics::PerformanceRecord> = rows.iter().map(metrics::PerformanceRecord::from).collect();

    Ok(Json(PerformanceSummaryResponse::from(metrics::aggregate(&records))))
}

async fn fetch_deal(repo: &mut Deals<'_>, deal_id: DealId) -> Result<DealDBResponse> {
    repo.get_by_id(deal_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Deal".to_string(),
        id: deal_id.to_string(),
    })
}

fn authorize_deal_read(current_user: &CurrentUser, deal: &DealDBResponse) -> Result<()> {
    if can_read_all_resources(current_user, Resource::Deals)
        || can_read_org_resource(current_user, Resource::Deals, deal.organization_id)
    {
        return Ok(());
    }
    Err(Error::InsufficientPermissions {
        required: Permission::Any(vec![
            Permission::Allow(Resource::Deals, Operation::ReadAll),
            Permission::Allow(Resource::Deals, Operation::ReadOwn),
        ]),
        action: Operation::ReadOwn,
        resource: format!("deal {}", deal.id),
    })
}

fn authorize_deal_update(current_user: &CurrentUser, deal: &DealDBResponse) -> Result<()> {
    if can_update_all_resources(current_user, Resource::Deals)
        || can_update_org_resource(current_user, Resource::Deals, deal.organization_id)
    {
        return Ok(());
    }
    Err(Error::InsufficientPermissions {
        required: Permission::Any(vec![
            Permission::Allow(Resource::Deals, Operation::UpdateAll),
            Permission::Allow(Resource::Deals, Operation::UpdateOwn),
        ]),
        action: Operation::UpdateOwn,
        resource: format!("deal {}", deal.id),
    })
}
