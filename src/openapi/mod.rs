//! OpenAPI documentation configuration.
//!
//! The full management API at `/api/v1/*` is described by [`ApiDoc`] and
//! served at `/docs` by the router.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api::{handlers, models};

/// Registers the two supported authentication schemes: `Bearer` API keys
/// and the trusted proxy header.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .description(Some(
                            "API key authentication. Include your key in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer ak-YOUR_API_KEY\n```",
                        ))
                        .build(),
                ),
            );
            components.security_schemes.insert(
                "X-Adctl-User".to_string(),
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "x-adctl-user",
                    "Email of the authenticated user, set by a trusted reverse proxy",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::organizations::create_organization,
        handlers::organizations::list_organizations,
        handlers::organizations::get_organization,
        handlers::organizations::update_organization,
        handlers::organizations::delete_organization,
        handlers::users::create_user,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::api_keys::create_user_api_key,
        handlers::api_keys::list_user_api_keys,
        handlers::api_keys::get_user_api_key,
        handlers::api_keys::delete_user_api_key,
        handlers::ads::create_ad,
        handlers::ads::list_ads,
        handlers::ads::get_ad,
        handlers::ads::update_ad,
        handlers::ads::delete_ad,
        handlers::deals::create_deal,
        handlers::deals::list_deals,
        handlers::deals::get_deal,
        handlers::deals::update_deal,
        handlers::deals::delete_deal,
        handlers::deals::transition_deal_status,
        handlers::deals::execute_deal,
        handlers::deals::get_deal_inventory,
        handlers::deals::get_deal_metrics,
        handlers::deals::get_deal_performance,
        handlers::analytics::get_organization_analytics,
    ),
    components(schemas(
        models::organizations::OrganizationCreate,
        models::organizations::OrganizationUpdate,
        models::organizations::OrganizationResponse,
        models::users::UserCreate,
        models::users::UserUpdate,
        models::users::UserResponse,
        models::users::Role,
        models::api_keys::ApiKeyCreate,
        models::api_keys::ApiKeyResponse,
        models::api_keys::ApiKeyInfoResponse,
        models::ads::AdCreate,
        models::ads::AdUpdate,
        models::ads::AdResponse,
        models::ads::AdStatus,
        models::deals::DealCreate,
        models::deals::DealUpdate,
        models::deals::DealStatusUpdate,
        models::deals::DealResponse,
        models::deals::DealType,
        models::deals::DealPriority,
        models::deals::DealStatus,
        models::deals::TargetingSpec,
        models::deals::GeoContext,
        models::deals::DeviceContext,
        models::deals::AdRequest,
        models::deals::ExecutionResponse,
        models::deals::InventoryResponse,
        models::deals::DealMetricsResponse,
        models::analytics::PerformanceSummaryResponse,
        models::analytics::OrganizationAnalyticsResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "organizations", description = "Organization management"),
        (name = "users", description = "User management"),
        (name = "api_keys", description = "API key management"),
        (name = "ads", description = "Creative inventory"),
        (name = "deals", description = "Deal lifecycle and execution"),
        (name = "analytics", description = "Performance analytics"),
    ),
    info(
        title = "adctl API",
        description = "Multi-tenant ad-tech control plane: organizations, advertiser ads, programmatic deals, and performance analytics"
    )
)]
pub struct ApiDoc;
