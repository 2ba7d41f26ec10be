//! Extractors for getting the authenticated user in handlers.

use crate::{
    api::models::users::CurrentUser,
    db::{
        errors::DbError,
        handlers::{ApiKeys, Repository, Users},
    },
    errors::{Error, Result},
    AppState,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use sqlx::PgPool;
use tracing::{debug, instrument, trace};

/// Extract user from API key in Authorization header if present and valid
/// Returns:
/// - None: No Authorization header or not a Bearer token
/// - Some(Ok(user)): Valid API key found and user authenticated
/// - Some(Err(error)): Bearer token present but invalid
#[instrument(skip(parts, db))]
async fn try_api_key_auth(parts: &Parts, db: &PgPool) -> Option<Result<CurrentUser>> {
    let auth_header = parts.headers.get(axum::http::header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }))
        }
    };

    // Check for Bearer token format
    let secret = match auth_str.strip_prefix("Bearer ") {
        Some(key) => key,
        None => return None, // Not a Bearer token, try other auth methods
    };

    let mut conn = match db.acquire().await {
        Ok(conn) => conn,
        Err(e) => return Some(Err(DbError::from(e).into())),
    };

    let api_key = match ApiKeys::new(&mut conn).get_by_secret(secret).await {
        Ok(Some(key)) => key,
        Ok(None) => {
            return Some(Err(Error::Unauthenticated {
                message: Some("Invalid API key".to_string()),
            }))
        }
        Err(e) => return Some(Err(Error::Database(e))),
    };

    match Users::new(&mut conn).get_by_id(api_key.user_id).await {
        Ok(Some(user)) => Some(Ok(CurrentUser::from(user))),
        // Should be unreachable: keys cascade with their user.
        Ok(None) => Some(Err(Error::Unauthenticated {
            message: Some("Invalid API key".to_string()),
        })),
        Err(e) => Some(Err(Error::Database(e))),
    }
}

/// Extract user from proxy header if present and valid
/// Returns:
/// - None: No proxy header present
/// - Some(Ok(user)): Valid proxy header found and user authenticated
/// - Some(Err(error)): Proxy header present but user lookup failed
#[instrument(skip(parts, config, db))]
async fn try_proxy_header_auth(
    parts: &Parts,
    config: &crate::config::Config,
    db: &PgPool,
) -> Option<Result<CurrentUser>> {
    let user_email = parts
        .headers
        .get(&config.auth.proxy_header.header_name)
        .and_then(|h| h.to_str().ok())?;

    let mut conn = match db.acquire().await {
        Ok(conn) => conn,
        Err(e) => return Some(Err(DbError::from(e).into())),
    };
    let mut user_repo = Users::new(&mut conn);

    match user_repo.get_user_by_email(user_email).await {
        Ok(Some(user)) => {
            if let Err(e) = user_repo.touch_last_login(user.id).await {
                return Some(Err(Error::Database(e)));
            }
            Some(Ok(CurrentUser::from(user)))
        }
        Ok(None) => Some(Err(Error::Unauthenticated {
            message: Some("Unknown user".to_string()),
        })),
        Err(e) => Some(Err(Error::Database(e))),
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Try all authentication methods in order of specificity. Each
        // returns Option<Result<CurrentUser>>: None means the method is not
        // applicable (no credentials present), Some(Err) means credentials
        // were present but invalid.

        match try_api_key_auth(parts, &state.db).await {
            Some(Ok(user)) => {
                debug!("Found API key authenticated user: {}", user.id);
                return Ok(user);
            }
            Some(Err(e)) => {
                trace!("API key authentication failed: {:?}", e);
                return Err(e);
            }
            None => {
                trace!("No API key authentication attempted");
            }
        }

        if state.config.auth.proxy_header.enabled {
            match try_proxy_header_auth(parts, &state.config, &state.db).await {
                Some(Ok(user)) => {
                    debug!("Found proxy header authenticated user: {}", user.id);
                    return Ok(user);
                }
                Some(Err(e)) => {
                    trace!("Proxy header authentication failed: {:?}", e);
                    return Err(e);
                }
                None => {
                    trace!("No proxy header authentication attempted");
                }
            }
        }

        trace!("No authentication credentials found in request");
        Err(Error::Unauthenticated { message: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::test_utils::{create_test_config, create_test_user};
    use axum::extract::FromRequestParts as _;

    fn parts_with_header(header_name: &str, header_value: &str) -> Parts {
        let request = axum::http::Request::builder()
            .uri("http://localhost/test")
            .header(header_name, header_value)
            .body(())
            .unwrap();
        let (parts, _body) = request.into_parts();
        parts
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_proxy_header_extraction(pool: PgPool) {
        let state = AppState::builder().db(pool.clone()).config(create_test_config()).build();
        let user = create_test_user(&pool, Role::StandardUser).await;

        let mut parts = parts_with_header("x-adctl-user", &user.email);
        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current.email, user.email);
        assert_eq!(current.organization_id, user.organization_id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_proxy_user_is_rejected(pool: PgPool) {
        let state = AppState::builder().db(pool.clone()).config(create_test_config()).build();

        let mut parts = parts_with_header("x-adctl-user", "nobody@example.com");
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_api_key_extraction(pool: PgPool) {
        let state = AppState::builder().db(pool.clone()).config(create_test_config()).build();
        let user = create_test_user(&pool, Role::AdOperations).await;

        let mut conn = pool.acquire().await.unwrap();
        let key = ApiKeys::new(&mut conn)
            .create(&crate::db::models::api_keys::ApiKeyCreateDBRequest {
                user_id: user.id,
                name: "extractor test".to_string(),
            })
            .await
            .unwrap();

        let mut parts = parts_with_header("authorization", &format!("Bearer {}", key.secret));
        let current = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(current.id, user.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_api_key_is_rejected(pool: PgPool) {
        let state = AppState::builder().db(pool.clone()).config(create_test_config()).build();

        let mut parts = parts_with_header("authorization", "Bearer ak-bogus");
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_no_credentials(pool: PgPool) {
        let state = AppState::builder().db(pool.clone()).config(create_test_config()).build();

        let request = axum::http::Request::builder().uri("http://localhost/test").body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        let err = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { message: None }));
    }
}
