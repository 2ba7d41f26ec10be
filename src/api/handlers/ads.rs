//! Handlers for creative (ad) management.
//!
//! Ads are organization-scoped: every route operates within the caller's
//! organization unless the caller holds platform-wide access.

use crate::{
    api::models::{
        ads::{AdCreate, AdResponse, AdUpdate, ListAdsQuery},
        users::CurrentUser,
    },
    auth::permissions::{
        can_create_org_resource, can_delete_all_resources, can_delete_org_resource, can_read_all_resources,
        can_read_org_resource, can_update_all_resources, can_update_org_resource,
    },
    db::handlers::{ads::AdFilter, Ads, Repository},
    db::models::ads::{AdCreateDBRequest, AdDBResponse, AdUpdateDBRequest},
    errors::{Error, Result},
    types::{AdId, Operation, Permission, Resource},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

#[utoipa::path(
    post,
    path = "/ads",
    tag = "ads",
    summary = "Create ad",
    description = "Create an ad in the caller's organization. New ads start ACTIVE with zeroed performance counters.",
    responses(
        (status = 201, description = "Ad created successfully", body = AdResponse),
        (status = 400, description = "Bad request - invalid ad data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn create_ad(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(data): Json<AdCreate>,
) -> Result<(StatusCode, Json<AdResponse>)> {
    if !can_create_org_resource(&current_user, Resource::Ads, current_user.organization_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Ads, Operation::CreateOwn),
            action: Operation::CreateOwn,
            resource: "ads".to_string(),
        });
    }

    if data.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Ad name cannot be empty".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Ads::new(&mut pool_conn);
    let db_request = AdCreateDBRequest::new(current_user.organization_id, current_user.id, data);

    let ad = repo.create(&db_request).await?;
    Ok((StatusCode::CREATED, Json(AdResponse::from(ad))))
}

#[utoipa::path(
    get,
    path = "/ads",
    tag = "ads",
    summary = "List ads",
    description = "List ads in the caller's organization. Platform-wide readers see ads across all organizations.",
    params(ListAdsQuery),
    responses(
        (status = 200, description = "List of ads", body = Vec<AdResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn list_ads(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListAdsQuery>,
) -> Result<Json<Vec<AdResponse>>> {
    let organization_scope = if can_read_all_resources(&current_user, Resource::Ads) {
        None
    } else if can_read_org_resource(&current_user, Resource::Ads, current_user.organization_id) {
        Some(current_user.organization_id)
    } else {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::Ads, Operation::ReadAll),
                Permission::Allow(Resource::Ads, Operation::ReadOwn),
            ]),
            action: Operation::ReadOwn,
            resource: "ads".to_string(),
        });
    };

    let (skip, limit) = query.pagination.params();
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Ads::new(&mut pool_conn);

    let ads = repo.list(&AdFilter::new(skip, limit, organization_scope, query.status)).await?;
    Ok(Json(ads.into_iter().map(AdResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/ads/{ad_id}",
    tag = "ads",
    summary = "Get ad",
    params(
        ("ad_id" = String, Path, description = "Ad ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Ad details", body = AdResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Ad not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn get_ad(
    State(state): State<AppState>,
    Path(ad_id): Path<AdId>,
    current_user: CurrentUser,
) -> Result<Json<AdResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Ads::new(&mut pool_conn);

    let ad = fetch_ad(&mut repo, ad_id).await?;
    if !can_read_all_resources(&current_user, Resource::Ads)
        && !can_read_org_resource(&current_user, Resource::Ads, ad.organization_id)
    {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::Ads, Operation::ReadAll),
                Permission::Allow(Resource::Ads, Operation::ReadOwn),
            ]),
            action: Operation::ReadOwn,
            resource: format!("ad {ad_id}"),
        });
    }

    Ok(Json(AdResponse::from(ad)))
}

#[utoipa::path(
    patch,
    path = "/ads/{ad_id}",
    tag = "ads",
    summary = "Update ad",
    description = "Update an ad's profile, status, or performance counters",
    params(
        ("ad_id" = String, Path, description = "Ad ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Ad updated successfully", body = AdResponse),
        (status = 400, description = "Bad request - counters out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Ad not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn update_ad(
    State(state): State<AppState>,
    Path(ad_id): Path<AdId>,
    current_user: CurrentUser,
    Json(data): Json<AdUpdate>,
) -> Result<Json<AdResponse>> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Ads::new(&mut pool_conn);

    let ad = fetch_ad(&mut repo, ad_id).await?;
    if !can_update_all_resources(&current_user, Resource::Ads)
        && !can_update_org_resource(&current_user, Resource::Ads, ad.organization_id)
    {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::Ads, Operation::UpdateAll),
                Permission::Allow(Resource::Ads, Operation::UpdateOwn),
            ]),
            action: Operation::UpdateOwn,
            resource: format!("ad {ad_id}"),
        });
    }

    let updated = repo.update(ad_id, &AdUpdateDBRequest::from(data)).await?;
    Ok(Json(AdResponse::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/ads/{ad_id}",
    tag = "ads",
    summary = "Delete ad",
    params(
        ("ad_id" = String, Path, description = "Ad ID (UUID)"),
    ),
    responses(
        (status = 204, description = "Ad deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Ad not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn delete_ad(
    State(state): State<AppState>,
    Path(ad_id): Path<AdId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Ads::new(&mut pool_conn);

    let ad = fetch_ad(&mut repo, ad_id).await?;
    if !can_delete_all_resources(&current_user, Resource::Ads)
        && !can_delete_org_resource(&current_user, Resource::Ads, ad.organization_id)
    {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::Ads, Operation::DeleteAll),
                Permission::Allow(Resource::Ads, Operation::DeleteOwn),
            ]),
            action: Operation::DeleteOwn,
            resource: format!("ad {ad_id}"),
        });
    }

    repo.delete(ad_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_ad(repo: &mut Ads<'_>, ad_id: AdId) -> Result<AdDBResponse> {
    repo.get_by_id(ad_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Ad".to_string(),
        id: ad_id.to_string(),
    })
}
