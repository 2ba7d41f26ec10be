//! Handlers for organization management.

use crate::{
    api::models::{
        organizations::{ListOrganizationsQuery, OrganizationCreate, OrganizationResponse, OrganizationUpdate},
        users::CurrentUser,
    },
    auth::permissions::{
        can_create_all_resources, can_delete_all_resources, can_read_all_resources, can_read_org_resource,
        can_update_all_resources, can_update_org_resource,
    },
    db::handlers::{organizations::OrganizationFilter, Organizations, Repository},
    db::models::organizations::{OrganizationCreateDBRequest, OrganizationUpdateDBRequest},
    errors::{Error, Result},
    types::{Operation, OrganizationId, Permission, Resource},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

#[utoipa::path(
    post,
    path = "/organizations",
    tag = "organizations",
    summary = "Create organization",
    responses(
        (status = 201, description = "Organization created successfully", body = OrganizationResponse),
        (status = 400, description = "Bad request - invalid organization data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "Organization slug already taken"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn create_organization(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(data): Json<OrganizationCreate>,
) -> Result<(StatusCode, Json<OrganizationResponse>)> {
    if !can_create_all_resources(&current_user, Resource::Organizations) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Organizations, Operation::CreateAll),
            action: Operation::CreateAll,
            resource: "organizations".to_string(),
        });
    }

    if data.name.trim().is_empty() || data.slug.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "Organization name and slug cannot be empty".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Organizations::new(&mut pool_conn);

    let organization = repo.create(&OrganizationCreateDBRequest::from(data)).await?;
    Ok((StatusCode::CREATED, Json(OrganizationResponse::from(organization))))
}

#[utoipa::path(
    get,
    path = "/organizations",
    tag = "organizations",
    summary = "List organizations",
    params(ListOrganizationsQuery),
    responses(
        (status = 200, description = "List of organizations", body = Vec<OrganizationResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn list_organizations(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListOrganizationsQuery>,
) -> Result<Json<Vec<OrganizationResponse>>> {
    if !can_read_all_resources(&current_user, Resource::Organizations) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Organizations, Operation::ReadAll),
            action: Operation::ReadAll,
            resource: "organizations".to_string(),
        });
    }

    let (skip, limit) = query.pagination.params();
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Organizations::new(&mut pool_conn);

    let organizations = repo.list(&OrganizationFilter::new(skip, limit)).await?;
    Ok(Json(organizations.into_iter().map(OrganizationResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/organizations/{org_id}",
    tag = "organizations",
    summary = "Get organization",
    params(
        ("org_id" = String, Path, description = "Organization ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Organization details", body = OrganizationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Organization not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn get_organization(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    current_user: CurrentUser,
) -> Result<Json<OrganizationResponse>> {
    if !can_read_all_resources(&current_user, Resource::Organizations)
        && !can_read_org_resource(&current_user, Resource::Organizations, org_id)
    {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::Organizations, Operation::ReadAll),
                Permission::Allow(Resource::Organizations, Operation::ReadOwn),
            ]),
            action: Operation::ReadOwn,
            resource: format!("organization {org_id}"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Organizations::new(&mut pool_conn);

    let organization = repo.get_by_id(org_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Organization".to_string(),
        id: org_id.to_string(),
    })?;
    Ok(Json(OrganizationResponse::from(organization)))
}

#[utoipa::path(
    patch,
    path = "/organizations/{org_id}",
    tag = "organizations",
    summary = "Update organization",
    params(
        ("org_id" = String, Path, description = "Organization ID (UUID)"),
    ),
    responses(
        (status = 200, description = "Organization updated successfully", body = OrganizationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Organization not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn update_organization(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    current_user: CurrentUser,
    Json(data): Json<OrganizationUpdate>,
) -> Result<Json<OrganizationResponse>> {
    if !can_update_all_resources(&current_user, Resource::Organizations)
        && !can_update_org_resource(&current_user, Resource::Organizations, org_id)
    {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::Organizations, Operation::UpdateAll),
                Permission::Allow(Resource::Organizations, Operation::UpdateOwn),
            ]),
            action: Operation::UpdateOwn,
            resource: format!("organization {org_id}"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Organizations::new(&mut pool_conn);

    let organization = repo.update(org_id, &OrganizationUpdateDBRequest::from(data)).await?;
    Ok(Json(OrganizationResponse::from(organization)))
}

#[utoipa::path(
    delete,
    path = "/organizations/{org_id}",
    tag = "organizations",
    summary = "Delete organization",
    description = "Delete an organization and, via cascade, its users, ads and deals",
    params(
        ("org_id" = String, Path, description = "Organization ID (UUID)"),
    ),
    responses(
        (status = 204, description = "Organization deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Organization not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn delete_organization(
    State(state): State<AppState>,
    Path(org_id): Path<OrganizationId>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    if !can_delete_all_resources(&current_user, Resource::Organizations) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Organizations, Operation::DeleteAll),
            action: Operation::DeleteAll,
            resource: format!("organization {org_id}"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Organizations::new(&mut pool_conn);

    if repo.delete(org_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "Organization".to_string(),
            id: org_id.to_string(),
        })
    }
}
