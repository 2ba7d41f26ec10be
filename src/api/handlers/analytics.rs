//! Handlers for organization-wide analytics.

use crate::{
    api::models::{
        analytics::{OrganizationAnalyticsResponse, PerformanceQuery, PerformanceSummaryResponse},
        users::CurrentUser,
    },
    auth::permissions::can_read_org_resource,
    db::handlers::{Deals, Performance},
    engine::metrics,
    errors::{Error, Result},
    types::{Operation, Permission, Resource},
    AppState,
};
use axum::{
    extract::{Query, State},
    response::Json,
};

#[utoipa::path(
    get,
    path = "/analytics/organization",
    tag = "analytics",
    summary = "Get organization analytics",
    description = "Deal counts and aggregated delivery performance across every deal in the \
caller's organization, optionally bounded by an inclusive date range",
    params(PerformanceQuery),
    responses(
        (status = 200, description = "Organization analytics", body = OrganizationAnalyticsResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(
        ("X-Adctl-User" = [])
    )
)]
pub async fn get_organization_analytics(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<PerformanceQuery>,
) -> Result<Json<OrganizationAnalyticsResponse>> {
    let organization_id = current_user.organization_id;

    if !can_read_org_resource(&current_user, Resource::Analytics, organization_id) {
        return Err(Error::InsufficientPermissions {
            required: Permission::Allow(Resource::Analytics, Operation::ReadOwn),
            action: Operation::ReadOwn,
            resource: "organization analytics".to_string(),
        });
    }

    let mut pool_conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let (total_deals, active_deals) = Deals::new(&mut pool_conn).count_by_organization(organization_id).await?;

    let rows = Performance::new(&mut pool_conn)
        .for_organization(organization_id, query.start, query.end)
        .await?;
    let records: Vec<metrics::PerformanceRecord> = rows.iter().map(metrics::PerformanceRecord::from).collect();

    Ok(Json(OrganizationAnalyticsResponse {
        total_deals,
        active_deals,
        summary: PerformanceSummaryResponse::from(metrics::aggregate(&records)),
    }))
}
