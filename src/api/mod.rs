//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! The API is divided into several functional areas:
//!
//! - **Organizations** (`/api/v1/organizations/*`): Tenant management
//! - **Users** (`/api/v1/users/*`): User management and API keys
//! - **Ads** (`/api/v1/ads/*`): Creative inventory management
//! - **Deals** (`/api/v1/deals/*`): Deal lifecycle, execution, inventory and performance
//! - **Analytics** (`/api/v1/analytics/*`): Organization-wide performance rollups
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
