//! Handlers for user management.

use crate::{
    api::models::users::{CurrentUser, ListUsersQuery, UserCreate, UserResponse, UserUpdate},
    auth::permissions::{
        can_create_all_resources, can_delete_all_resources, can_delete_own_resource, can_read_all_resources,
        can_read_own_resource, can_update_all_resources, can_update_own_resource,
    },
    db::handlers::{users::UserFilter, Repository, Users},
    db::models::users::{UserCreateDBRequest, UserUpdateDBRequest},
    errors::{Error, Result},
    types::{Operation, Permission, Resource, UserId, UserIdOrCurrent},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    description = "Create a user inside an organization. Users created through the API are never admins.",
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Bad request - invalid user data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 409, description = "A user with this email already exists"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(data): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    if !can_create_all_resources(&current_user, Resource::Users) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Users, Operation::CreateAll),
            action: Operation::CreateAll,
            resource: "users".to_string(),
        });
    }

    if data.email.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "User email cannot be empty".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    let user = repo.create(&UserCreateDBRequest::from(data)).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    if !can_read_all_resources(&current_user, Resource::Users) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Users, Operation::ReadAll),
            action: Operation::ReadAll,
            resource: "users".to_string(),
        });
    }

    let (skip, limit) = query.pagination.params();
    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    let users = repo.list(&UserFilter::new(skip, limit, query.organization_id)).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "users",
    summary = "Get user",
    params(
        ("user_id" = String, Path, description = "User ID (UUID) or 'current' for current user"),
    ),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - can only read own account unless permitted"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
) -> Result<Json<UserResponse>> {
    let target_user_id = resolve_target(&user_id, &current_user);

    if !can_read_all_resources(&current_user, Resource::Users)
        && !can_read_own_resource(&current_user, Resource::Users, target_user_id)
    {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::Users, Operation::ReadAll),
                Permission::Allow(Resource::Users, Operation::ReadOwn),
            ]),
            action: Operation::ReadOwn,
            resource: format!("user {target_user_id}"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    let user = repo.get_by_id(target_user_id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: target_user_id.to_string(),
    })?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    patch,
    path = "/users/{user_id}",
    tag = "users",
    summary = "Update user",
    description = "Update a user's profile. Changing roles requires user administration rights.",
    params(
        ("user_id" = String, Path, description = "User ID (UUID) or 'current' for current user"),
    ),
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
    Json(data): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    let target_user_id = resolve_target(&user_id, &current_user);

    let can_update_all = can_update_all_resources(&current_user, Resource::Users);
    if !can_update_all && !can_update_own_resource(&current_user, Resource::Users, target_user_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::Users, Operation::UpdateAll),
                Permission::Allow(Resource::Users, Operation::UpdateOwn),
            ]),
            action: Operation::UpdateOwn,
            resource: format!("user {target_user_id}"),
        });
    }

    // Self-service updates are limited to profile fields. Role grants stay
    // with user administrators.
    if data.roles.is_some() && !can_update_all {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Users, Operation::UpdateAll),
            action: Operation::UpdateAll,
            resource: format!("roles of user {target_user_id}"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    let user = repo.update(target_user_id, &UserUpdateDBRequest::from(data)).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "users",
    summary = "Delete user",
    params(
        ("user_id" = String, Path, description = "User ID (UUID) or 'current' for current user"),
    ),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let target_user_id = resolve_target(&user_id, &current_user);

    if !can_delete_all_resources(&current_user, Resource::Users)
        && !can_delete_own_resource(&current_user, Resource::Users, target_user_id)
    {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::Users, Operation::DeleteAll),
                Permission::Allow(Resource::Users, Operation::DeleteOwn),
            ]),
            action: Operation::DeleteOwn,
            resource: format!("user {target_user_id}"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Users::new(&mut pool_conn);

    if repo.delete(target_user_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "User".to_string(),
            id: target_user_id.to_string(),
        })
    }
}

fn resolve_target(user_id: &UserIdOrCurrent, current_user: &CurrentUser) -> UserId {
    match user_id {
        UserIdOrCurrent::Current(_) => current_user.id,
        UserIdOrCurrent::Id(id) => *id,
    }
}
