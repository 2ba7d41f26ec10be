//! Handlers for user API keys.

use crate::{
    api::models::{
        api_keys::{ApiKeyCreate, ApiKeyInfoResponse, ApiKeyResponse, ListApiKeysQuery},
        users::CurrentUser,
    },
    auth::permissions::{
        can_create_all_resources, can_create_own_resource, can_delete_all_resources, can_delete_own_resource,
        can_read_all_resources, can_read_own_resource,
    },
    db::handlers::{api_keys::ApiKeyFilter, ApiKeys, Repository},
    db::models::api_keys::ApiKeyCreateDBRequest,
    errors::{Error, Result},
    types::{ApiKeyId, Operation, Permission, Resource, UserId, UserIdOrCurrent},
    AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};

/// Create an API key for the current user or a specified user.
/// This returns `ApiKeyResponse`, which contains the actual API key.
///
/// This should be the only time that the API key is returned in a response.
#[utoipa::path(
    post,
    path = "/users/{user_id}/api-keys",
    tag = "api_keys",
    summary = "Create API key",
    description = "Create an API key for the current user or a specified user",
    params(
        ("user_id" = String, Path, description = "User ID (UUID) or 'current' for current user"),
    ),
    responses(
        (status = 201, description = "API key created successfully", body = ApiKeyResponse),
        (status = 400, description = "Bad request - invalid API key data"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - can only manage own API keys unless admin"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn create_user_api_key(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
    Json(data): Json<ApiKeyCreate>,
) -> Result<(StatusCode, Json<ApiKeyResponse>)> {
    if data.name.trim().is_empty() {
        return Err(Error::BadRequest {
            message: "API key name cannot be empty".to_string(),
        });
    }

    let target_user_id = match user_id {
        UserIdOrCurrent::Current(_) => {
            if !can_create_own_resource(&current_user, Resource::ApiKeys, current_user.id) {
                return Err(Error::InsufficientPermissions {
                    required: Permission::Allow(Resource::ApiKeys, Operation::CreateOwn),
                    action: Operation::CreateOwn,
                    resource: "API keys for current user".to_string(),
                });
            }
            current_user.id
        }
        UserIdOrCurrent::Id(uuid) => {
            let can_create_all_api_keys = can_create_all_resources(&current_user, Resource::ApiKeys);
            let can_create_own_api_keys = can_create_own_resource(&current_user, Resource::ApiKeys, uuid);

            if !can_create_all_api_keys && !can_create_own_api_keys {
                return Err(Error::InsufficientPermissions {
                    required: Permission::Any(vec![
                        Permission::Allow(Resource::ApiKeys, Operation::CreateAll),
                        Permission::Allow(Resource::ApiKeys, Operation::CreateOwn),
                    ]),
                    action: Operation::CreateOwn,
                    resource: format!("API keys for user {uuid}"),
                });
            }
            uuid
        }
    };

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ApiKeys::new(&mut pool_conn);
    let db_request = ApiKeyCreateDBRequest::new(target_user_id, data);

    let api_key = repo.create(&db_request).await?;
    Ok((StatusCode::CREATED, Json(ApiKeyResponse::from(api_key))))
}

/// List the API keys for the current user or a specified user.
/// This should never contain the actual API key value.
#[utoipa::path(
    get,
    path = "/users/{user_id}/api-keys",
    tag = "api_keys",
    summary = "List API keys",
    description = "List API keys for the current user or a specified user",
    params(
        ("user_id" = String, Path, description = "User ID (UUID) or 'current' for current user"),
        ListApiKeysQuery
    ),
    responses(
        (status = 200, description = "List of API keys", body = Vec<ApiKeyInfoResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - can only list own API keys unless admin"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn list_user_api_keys(
    State(state): State<AppState>,
    Path(user_id): Path<UserIdOrCurrent>,
    current_user: CurrentUser,
    Query(query): Query<ListApiKeysQuery>,
) -> Result<Json<Vec<ApiKeyInfoResponse>>> {
    let target_user_id = authorize_read(&current_user, &user_id)?;

    let skip = query.skip.unwrap_or(0);
    let limit = query.limit.unwrap_or(100).min(1000);

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ApiKeys::new(&mut pool_conn);

    let api_keys = repo.list(&ApiKeyFilter::new(skip, limit, Some(target_user_id))).await?;
    Ok(Json(api_keys.into_iter().map(ApiKeyInfoResponse::from).collect()))
}

/// Fetch a single API key by id. Like listing, this only exposes key
/// metadata, never the secret.
#[utoipa::path(
    get,
    path = "/users/{user_id}/api-keys/{key_id}",
    tag = "api_keys",
    summary = "Get API key",
    description = "Get an API key belonging to the current user or a specified user",
    params(
        ("user_id" = String, Path, description = "User ID (UUID) or 'current' for current user"),
        ("key_id" = String, Path, description = "API key ID (UUID)"),
    ),
    responses(
        (status = 200, description = "API key details", body = ApiKeyInfoResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - can only read own API keys unless admin"),
        (status = 404, description = "API key not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn get_user_api_key(
    State(state): State<AppState>,
    Path((user_id, key_id)): Path<(UserIdOrCurrent, ApiKeyId)>,
    current_user: CurrentUser,
) -> Result<Json<ApiKeyInfoResponse>> {
    let target_user_id = authorize_read(&current_user, &user_id)?;

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ApiKeys::new(&mut pool_conn);

    let api_key = repo.get_by_id(key_id).await?.ok_or_else(|| Error::NotFound {
        resource: "API key".to_string(),
        id: key_id.to_string(),
    })?;
    if api_key.user_id != target_user_id {
        return Err(Error::NotFound {
            resource: "API key".to_string(),
            id: key_id.to_string(),
        });
    }

    Ok(Json(ApiKeyInfoResponse::from(api_key)))
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}/api-keys/{key_id}",
    tag = "api_keys",
    summary = "Delete API key",
    description = "Delete an API key belonging to the current user or a specified user",
    params(
        ("user_id" = String, Path, description = "User ID (UUID) or 'current' for current user"),
        ("key_id" = String, Path, description = "API key ID (UUID)"),
    ),
    responses(
        (status = 204, description = "API key deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - can only delete own API keys unless admin"),
        (status = 404, description = "API key not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn delete_user_api_key(
    State(state): State<AppState>,
    Path((user_id, key_id)): Path<(UserIdOrCurrent, ApiKeyId)>,
    current_user: CurrentUser,
) -> Result<StatusCode> {
    let target_user_id = match user_id {
        UserIdOrCurrent::Current(_) => current_user.id,
        UserIdOrCurrent::Id(uuid) => uuid,
    };

    let can_delete_all_api_keys = can_delete_all_resources(&current_user, Resource::ApiKeys);
    let can_delete_own_api_keys = can_delete_own_resource(&current_user, Resource::ApiKeys, target_user_id);

    if !can_delete_all_api_keys && !can_delete_own_api_keys {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::ApiKeys, Operation::DeleteAll),
                Permission::Allow(Resource::ApiKeys, Operation::DeleteOwn),
            ]),
            action: Operation::DeleteOwn,
            resource: format!("API keys for user {target_user_id}"),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = ApiKeys::new(&mut pool_conn);

    // The key must belong to the target user; a valid key id under another
    // user's path segment is still a 404.
    let api_key = repo.get_by_id(key_id).await?.ok_or_else(|| Error::NotFound {
        resource: "API key".to_string(),
        id: key_id.to_string(),
    })?;
    if api_key.user_id != target_user_id {
        return Err(Error::NotFound {
            resource: "API key".to_string(),
            id: key_id.to_string(),
        });
    }

    repo.delete(key_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn authorize_read(current_user: &CurrentUser, user_id: &UserIdOrCurrent) -> Result<UserId> {
    let target_user_id = match user_id {
        UserIdOrCurrent::Current(_) => current_user.id,
        UserIdOrCurrent::Id(uuid) => *uuid,
    };

    let can_read_all_api_keys = can_read_all_resources(current_user, Resource::ApiKeys);
    let can_read_own_api_keys = can_read_own_resource(current_user, Resource::ApiKeys, target_user_id);

    if !can_read_all_api_keys && !can_read_own_api_keys {
        return Err(Error::InsufficientPermissions {
            required: Permission::Any(vec![
                Permission::Allow(Resource::ApiKeys, Operation::ReadAll),
                Permission::Allow(Resource::ApiKeys, Operation::ReadOwn),
            ]),
            action: Operation::ReadOwn,
            resource: format!("API keys for user {target_user_id}"),
        });
    }

    Ok(target_user_id)
}
